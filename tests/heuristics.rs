use hyperheuristic::config::{AppConfig, InnerTournament};
use hyperheuristic::engines::evaluation::Problem;
use hyperheuristic::engines::generation::{ChannelObserver, GeneSpace, GeneSpec, ProgressMessage};
use hyperheuristic::heuristics::{
    self, DeHyperHeuristic, EnsembleHyperHeuristic, HyperHeuristic, PsoHyperHeuristic,
};
use hyperheuristic::types::Bounds;
use std::sync::mpsc;

fn sphere_problem() -> Problem {
    let sphere = |x: &[f64]| x.iter().map(|v| v * v).sum::<f64>();
    Problem::new(sphere, 2, Bounds::uniform(2, -5.0, 5.0)).unwrap()
}

fn quick_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.evolution.population_size = 6;
    config.evolution.num_generations = 3;
    config.evolution.num_parents_mating = 3;
    config.evolution.keep_parents = 2;
    config.pso.swarm_size = 8;
    config.pso.iterations = 6;
    config.de.particle_quota = 8;
    config.de.iterations = 6;
    config.ssa.swarm_size = 8;
    config.ssa.iterations = 6;
    config.runtime.seed = Some(2024);
    config
}

#[test]
fn test_every_preset_runs() {
    for name in ["pso", "de", "ssa", "ensemble"] {
        let mut heuristic = heuristics::preset(name, quick_config()).unwrap();
        let outcome = heuristic.optimize(sphere_problem()).unwrap();

        assert_eq!(outcome.history.len(), 3, "{}", heuristic.name());
        assert!(outcome.best_fitness().is_finite(), "{}", heuristic.name());
        for pair in outcome.best_fitness_sequence().windows(2) {
            assert!(pair[1] <= pair[0]);
        }
    }
    assert!(heuristics::preset("aco", quick_config()).is_err());
}

#[test]
fn test_pso_preset_uses_original_probabilities() {
    let heuristic = PsoHyperHeuristic::new(AppConfig::default());
    assert_eq!(heuristic.config().evolution.mutation_probability, Some(0.2));
    assert_eq!(heuristic.config().evolution.crossover_probability, Some(0.8));
}

#[test]
fn test_seeded_runs_are_reproducible() {
    let first = DeHyperHeuristic::new(quick_config()).optimize(sphere_problem()).unwrap();
    let second = DeHyperHeuristic::new(quick_config()).optimize(sphere_problem()).unwrap();
    assert_eq!(first.best_fitness_sequence(), second.best_fitness_sequence());
    assert_eq!(first.best_genome, second.best_genome);
}

#[test]
fn test_observer_receives_every_generation() {
    let (tx, rx) = mpsc::channel();
    let mut heuristic = DeHyperHeuristic::new(quick_config()).with_observer(ChannelObserver::new(tx));
    heuristic.optimize(sphere_problem()).unwrap();
    drop(heuristic);

    let completed = rx
        .iter()
        .filter(|m| matches!(m, ProgressMessage::GenerationComplete { .. }))
        .count();
    assert_eq!(completed, 3);
}

#[test]
fn test_presets_accept_inner_tournament() {
    let mut config = quick_config();
    config.evolution.inner_tournament = Some(InnerTournament { start: 2, end: 6 });
    for name in ["pso", "de", "ssa"] {
        let outcome = heuristics::preset(name, config.clone()).unwrap().optimize(sphere_problem()).unwrap();
        assert_eq!(outcome.history.len(), 3, "{}", name);
        assert!(outcome.best_fitness().is_finite(), "{}", name);
    }
}

#[test]
fn test_ensemble_with_custom_gene_space() {
    // Third gene doubles as PSO inertia and DE strategy index 0
    let space = GeneSpace::new(vec![
        GeneSpec::continuous(0.5, 1.0),
        GeneSpec::continuous(0.5, 1.0),
        GeneSpec::continuous(0.3, 0.45),
    ]);
    let mut heuristic = EnsembleHyperHeuristic::new(quick_config()).with_gene_space(space.clone());
    let outcome = heuristic.optimize(sphere_problem()).unwrap();

    assert!(space.contains(&outcome.best_genome));
    assert!(outcome.best_fitness().is_finite());
}
