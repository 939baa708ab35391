use crate::config::{ConfigSection, EvolutionConfig};
use crate::engines::generation::{
    genome::{GeneSpace, Genome},
    operators::{crossover, mutate_by_probability, mutate_num_genes, ranked_indices, select_parents},
    progress::{GenerationObserver, GenerationSnapshot},
    scheduler::{LinearTournament, MutationControls, ParameterSchedule, TournamentSchedule},
};
use crate::engines::orchestration::{FitnessGuard, Orchestrator};
use crate::error::{HyperError, Result};
use crate::types::{OptimizationDirection, Particle};
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationRecord {
    pub generation: usize,
    /// Best-so-far global particle value after this generation
    pub best_fitness: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    GenerationLimit,
    EarlyStopping,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOutcome {
    pub history: Vec<GenerationRecord>,
    pub best_genome: Genome,
    pub best_particle: Particle,
    pub stop_reason: StopReason,
    pub non_finite_substitutions: usize,
    /// Generations in which an ensemble had to fall back to a neutral fitness vector
    pub combination_fallbacks: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunOutcome {
    pub fn best_fitness(&self) -> f64 {
        self.best_particle.value
    }

    pub fn best_fitness_sequence(&self) -> Vec<f64> {
        self.history.iter().map(|r| r.best_fitness).collect()
    }

    pub fn generations_completed(&self) -> usize {
        self.history.len()
    }
}

/// Outer genetic algorithm over hyperparameter genomes.
///
/// Each generation hands the whole population to the orchestrator, which runs the inner
/// metaheuristic and reports one fitness per genome. Elites survive in the first
/// `keep_parents` slots; the rest is bred from the selected parents.
pub struct HyperEvolutionEngine {
    config: EvolutionConfig,
    gene_space: GeneSpace,
    orchestrator: Box<dyn Orchestrator>,
    schedule: Option<Box<dyn ParameterSchedule>>,
    tournament: Option<Box<dyn TournamentSchedule>>,
    controls: MutationControls,
    rng: StdRng,
}

/// Per-generation state carried across the loop.
struct RunState {
    best_so_far: f64,
    best_particle: Particle,
    best_genome: Genome,
    stale_generations: usize,
    non_finite_substitutions: usize,
    combination_fallbacks: usize,
}

impl HyperEvolutionEngine {
    pub fn new(
        config: EvolutionConfig,
        gene_space: GeneSpace,
        orchestrator: Box<dyn Orchestrator>,
        seed: Option<u64>,
    ) -> Result<Self> {
        config.validate()?;
        gene_space.validate()?;
        config.validate_for_genes(gene_space.len())?;

        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let controls = MutationControls {
            mutation_num_genes: config.mutation_num_genes,
            mutation_probability: config.mutation_probability,
        };
        let tournament = config.inner_tournament.map(|t| {
            Box::new(LinearTournament {
                start: t.start,
                end: t.end,
                generations: config.num_generations,
            }) as Box<dyn TournamentSchedule>
        });

        Ok(Self {
            config,
            gene_space,
            orchestrator,
            schedule: None,
            tournament,
            controls,
            rng,
        })
    }

    pub fn with_schedule(mut self, schedule: impl ParameterSchedule + 'static) -> Self {
        self.schedule = Some(Box::new(schedule));
        self
    }

    /// Replaces any schedule built from `inner_tournament`.
    pub fn with_tournament_schedule(mut self, schedule: impl TournamentSchedule + 'static) -> Self {
        self.tournament = Some(Box::new(schedule));
        self
    }

    pub fn config(&self) -> &EvolutionConfig {
        &self.config
    }

    pub fn gene_space(&self) -> &GeneSpace {
        &self.gene_space
    }

    pub fn orchestrator(&self) -> &dyn Orchestrator {
        self.orchestrator.as_ref()
    }

    pub fn controls(&self) -> MutationControls {
        self.controls
    }

    /// Run the evolution process
    pub fn run<C: GenerationObserver>(&mut self, mut callback: C) -> Result<RunOutcome> {
        let started_at = Utc::now();
        let direction = self.orchestrator.direction();

        log::info!(
            "Starting {} hyper-heuristic: {} genomes x {} generations",
            self.orchestrator.name(),
            self.config.population_size,
            self.config.num_generations
        );

        // Initialize population
        let mut population = self.initialize_population();
        let mut history = Vec::with_capacity(self.config.num_generations);
        let mut state = RunState {
            best_so_far: direction.worst(),
            best_particle: Particle::worst(0, direction),
            best_genome: population[0].clone(),
            stale_generations: 0,
            non_finite_substitutions: 0,
            combination_fallbacks: 0,
        };
        let mut stop_reason = StopReason::GenerationLimit;

        // Evolution loop
        for generation in 0..self.config.num_generations {
            callback.on_generation_start(generation);

            let tournament_size = self.tournament.as_ref().and_then(|t| t.size_for(generation));
            let result = self.orchestrator.orchestrate(&population, tournament_size)?;

            let mut guard = FitnessGuard::new(direction);
            let mut fitness = self.align_fitness(result.fitness, direction);
            guard.check_all(&mut fitness);
            let substitutions = result.diagnostics.non_finite_substitutions + guard.substitutions();
            state.non_finite_substitutions += substitutions;
            if result.diagnostics.combination_fallback.is_some() {
                state.combination_fallbacks += 1;
            }

            let ranked = ranked_indices(&fitness, direction);
            let top = ranked[0];
            let generation_best = fitness[top];

            if direction.is_better(result.global_particle.value, state.best_so_far) {
                state.best_so_far = result.global_particle.value;
                state.best_particle = result.global_particle.clone();
                state.best_genome = population[top].clone();
                state.stale_generations = 0;
            } else {
                if generation == 0 {
                    state.best_genome = population[top].clone();
                }
                state.stale_generations += 1;
            }

            history.push(GenerationRecord {
                generation,
                best_fitness: state.best_so_far,
            });

            log::info!(
                "Generation {}: best so far {:.6e}, generation best {:.6e}",
                generation + 1,
                state.best_so_far,
                generation_best
            );

            callback.on_generation_complete(&GenerationSnapshot {
                generation,
                population: &population,
                fitness: &fitness,
                best_fitness: state.best_so_far,
                generation_best,
                best_genome: &population[top],
                non_finite_substitutions: substitutions,
                combination_fallback: result.diagnostics.combination_fallback.as_deref(),
            });

            // Check termination
            if let Some(rounds) = self.config.early_stopping_rounds {
                if state.stale_generations >= rounds {
                    log::info!("No improvement for {} generations, stopping early", rounds);
                    stop_reason = StopReason::EarlyStopping;
                    break;
                }
            }
            if generation == self.config.num_generations - 1 {
                break;
            }

            // Create next generation
            population = self.create_next_generation(&population, &fitness, &ranked, direction)?;

            if let Some(schedule) = self.schedule.as_mut() {
                schedule.on_generation_end(generation + 1, self.orchestrator.as_mut(), &mut self.controls);
            }
        }

        let outcome = RunOutcome {
            history,
            best_genome: state.best_genome,
            best_particle: state.best_particle,
            stop_reason,
            non_finite_substitutions: state.non_finite_substitutions,
            combination_fallbacks: state.combination_fallbacks,
            started_at,
            finished_at: Utc::now(),
        };

        log::info!(
            "{} finished after {} generations ({:?}): best {:.6e}, genome {:?}",
            self.orchestrator.name(),
            outcome.generations_completed(),
            outcome.stop_reason,
            outcome.best_fitness(),
            outcome.best_genome
        );

        Ok(outcome)
    }

    fn initialize_population(&mut self) -> Vec<Genome> {
        (0..self.config.population_size)
            .map(|_| self.gene_space.sample(&mut self.rng))
            .collect()
    }

    /// Pads a short fitness vector with the sentinel and truncates a long one.
    fn align_fitness(&self, mut fitness: Vec<f64>, direction: OptimizationDirection) -> Vec<f64> {
        let expected = self.config.population_size;
        if fitness.len() != expected {
            log::warn!(
                "{} returned {} fitness values for {} genomes",
                self.orchestrator.name(),
                fitness.len(),
                expected
            );
            fitness.resize(expected, direction.sentinel());
        }
        fitness
    }

    fn create_next_generation(
        &mut self,
        population: &[Genome],
        fitness: &[f64],
        ranked: &[usize],
        direction: OptimizationDirection,
    ) -> Result<Vec<Genome>> {
        let parents = select_parents(
            self.config.selection_method,
            fitness,
            self.config.num_parents_mating,
            self.config.k_tournament,
            direction,
            &mut self.rng,
        );
        if parents.is_empty() {
            return Err(HyperError::config(
                "num_parents_mating",
                self.config.num_parents_mating,
                "selection produced no parents",
            ));
        }

        let mut next_generation = Vec::with_capacity(self.config.population_size);
        for k in 0..self.config.population_size {
            let parent1 = &population[parents[k % parents.len()]];
            let parent2 = &population[parents[(k + 1) % parents.len()]];

            let recombine = match self.config.crossover_probability {
                Some(p) => self.rng.gen::<f64>() < p,
                None => true,
            };
            let mut child = if recombine {
                crossover(self.config.crossover_type, parent1, parent2, &mut self.rng)
            } else {
                parent1.clone()
            };

            match self.controls.mutation_probability {
                Some(p) => mutate_by_probability(&mut child, &self.gene_space, p, &mut self.rng),
                None => mutate_num_genes(
                    &mut child,
                    &self.gene_space,
                    self.controls.mutation_num_genes.min(self.gene_space.len()),
                    &mut self.rng,
                ),
            }

            next_generation.push(child);
        }

        // Elitism: top performers overwrite the first slots
        for (slot, &idx) in ranked.iter().take(self.config.keep_parents).enumerate() {
            next_generation[slot] = population[idx].clone();
        }

        Ok(next_generation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::generation::genome::GeneSpec;
    use crate::engines::generation::progress::{HistoryRecorder, NoopObserver};
    use crate::engines::orchestration::{BestParticles, OrchestrationDiagnostics, OrchestrationResult};

    /// Fitness is the distance of the genome to the origin; the global particle mirrors it.
    struct DistanceOrchestrator {
        calls: usize,
        short_by: usize,
    }

    impl Orchestrator for DistanceOrchestrator {
        fn name(&self) -> &str {
            "distance"
        }

        fn direction(&self) -> OptimizationDirection {
            OptimizationDirection::Minimize
        }

        fn orchestrate(&mut self, population: &[Genome], _t: Option<usize>) -> Result<OrchestrationResult> {
            self.calls += 1;
            let mut fitness: Vec<f64> = population.iter().map(|g| g.iter().map(|x| x * x).sum()).collect();
            let best = OptimizationDirection::Minimize.best_index(&fitness).unwrap_or(0);
            let global = Particle::new(population[best].clone(), fitness[best]);
            fitness.truncate(population.len() - self.short_by);
            Ok(OrchestrationResult {
                best_particles: BestParticles::PerGenome(Vec::new()),
                fitness,
                global_particle: global,
                diagnostics: OrchestrationDiagnostics::default(),
            })
        }
    }

    struct FitnessProbe(Vec<Vec<f64>>);

    impl GenerationObserver for FitnessProbe {
        fn on_generation_complete(&mut self, snapshot: &GenerationSnapshot<'_>) {
            self.0.push(snapshot.fitness.to_vec());
        }
    }

    fn space() -> GeneSpace {
        GeneSpace::new(vec![GeneSpec::continuous(-1.0, 1.0); 3])
    }

    fn config() -> EvolutionConfig {
        EvolutionConfig {
            population_size: 8,
            num_generations: 6,
            num_parents_mating: 4,
            keep_parents: 2,
            ..Default::default()
        }
    }

    #[test]
    fn test_elites_keep_best_so_far_monotone() {
        let orchestrator = Box::new(DistanceOrchestrator { calls: 0, short_by: 0 });
        let mut engine = HyperEvolutionEngine::new(config(), space(), orchestrator, Some(42)).unwrap();
        let mut recorder = HistoryRecorder::new();
        let outcome = engine.run(&mut recorder).unwrap();

        assert_eq!(outcome.history.len(), 6);
        assert_eq!(recorder.generations(), 6);
        for pair in outcome.best_fitness_sequence().windows(2) {
            assert!(pair[1] <= pair[0]);
        }
        // Elites make the generation best monotone too
        for pair in recorder.generation_best.windows(2) {
            assert!(pair[1] <= pair[0]);
        }
        assert_eq!(outcome.stop_reason, StopReason::GenerationLimit);
    }

    #[test]
    fn test_short_fitness_is_padded_with_sentinel() {
        let orchestrator = Box::new(DistanceOrchestrator { calls: 0, short_by: 2 });
        let cfg = EvolutionConfig {
            num_generations: 1,
            ..config()
        };
        let mut engine = HyperEvolutionEngine::new(cfg, space(), orchestrator, Some(1)).unwrap();
        let mut probe = FitnessProbe(Vec::new());
        engine.run(&mut probe).unwrap();

        let fitness = &probe.0[0];
        assert_eq!(fitness.len(), 8);
        assert_eq!(fitness[6], f64::INFINITY);
        assert_eq!(fitness[7], f64::INFINITY);
    }

    #[test]
    fn test_early_stopping() {
        let flat = GeneSpace::new(vec![GeneSpec::Discrete(vec![0.5]); 2]);
        let cfg = EvolutionConfig {
            num_generations: 50,
            early_stopping_rounds: Some(3),
            ..config()
        };
        let orchestrator = Box::new(DistanceOrchestrator { calls: 0, short_by: 0 });
        let mut engine = HyperEvolutionEngine::new(cfg, flat, orchestrator, Some(5)).unwrap();
        let outcome = engine.run(NoopObserver).unwrap();

        assert_eq!(outcome.stop_reason, StopReason::EarlyStopping);
        assert_eq!(outcome.generations_completed(), 4);
    }

    #[test]
    fn test_invalid_configuration_rejected() {
        let cfg = EvolutionConfig {
            mutation_num_genes: 4,
            ..config()
        };
        let orchestrator = Box::new(DistanceOrchestrator { calls: 0, short_by: 0 });
        assert!(HyperEvolutionEngine::new(cfg, space(), orchestrator, None).is_err());
    }
}
