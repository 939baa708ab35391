use super::guard::FitnessGuard;
use super::traits::{BestParticles, OrchestrationDiagnostics, OrchestrationResult};
use crate::config::MappingPolicy;
use crate::engines::evaluation::Evaluator;
use crate::engines::generation::genome::Genome;
use crate::error::{HyperError, Result};
use crate::types::{OptimizationDirection, Particle};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

/// Result of one inner-optimizer run.
#[derive(Debug, Clone)]
pub(crate) struct InnerRun {
    /// Personal best of every agent, in agent order
    pub agent_best: Vec<Particle>,
    pub global: Particle,
    pub substitutions: usize,
}

/// One inner metaheuristic, run over agents that each carry their own control genome.
pub(crate) trait InnerSearch: Sync {
    fn direction(&self) -> OptimizationDirection;

    fn dimensions(&self) -> usize;

    /// Number of agents a run uses when it is not raised to the population size.
    fn inner_size(&self) -> usize;

    fn run(
        &self,
        agents: &[&[f64]],
        tournament_size: Option<usize>,
        rng: &mut StdRng,
    ) -> Result<InnerRun>;
}

/// Maps a population onto inner runs according to `policy` and gathers per-genome fitness.
pub(crate) fn dispatch<S: InnerSearch>(
    search: &S,
    policy: MappingPolicy,
    evaluator: &Evaluator,
    population: &[Genome],
    tournament_size: Option<usize>,
    rng: &mut StdRng,
) -> Result<OrchestrationResult> {
    if population.is_empty() {
        return Err(HyperError::config("population", 0, "cannot orchestrate an empty population"));
    }

    let direction = search.direction();
    let (best_particles, global, substitutions) = match policy {
        MappingPolicy::AgentPerGenome => {
            agent_per_genome(search, population, tournament_size, rng)?
        }
        MappingPolicy::RunPerGenome => {
            run_per_genome(search, evaluator, population, tournament_size, rng)?
        }
    };

    let mut fitness: Vec<f64> = best_particles.iter().map(|p| p.value).collect();
    let mut guard = FitnessGuard::new(direction);
    guard.check_all(&mut fitness);

    Ok(OrchestrationResult {
        best_particles: BestParticles::PerGenome(best_particles),
        fitness,
        global_particle: global,
        diagnostics: OrchestrationDiagnostics {
            non_finite_substitutions: substitutions + guard.substitutions(),
            combination_fallback: None,
        },
    })
}

fn agent_per_genome<S: InnerSearch>(
    search: &S,
    population: &[Genome],
    tournament_size: Option<usize>,
    rng: &mut StdRng,
) -> Result<(Vec<Particle>, Particle, usize)> {
    let direction = search.direction();
    let genomes = population.len();
    let agent_count = search.inner_size().max(genomes);
    let agents: Vec<&[f64]> = (0..agent_count)
        .map(|j| population[j % genomes].as_slice())
        .collect();

    let run = search.run(&agents, tournament_size, rng)?;

    let mut per_genome: Vec<Particle> = (0..genomes)
        .map(|_| Particle::worst(search.dimensions(), direction))
        .collect();
    for (j, particle) in run.agent_best.iter().enumerate() {
        let slot = &mut per_genome[j % genomes];
        if direction.is_better(particle.value, slot.value) {
            *slot = particle.clone();
        }
    }

    log::debug!(
        "Inner run over {} agents for {} genomes, best {:.6e}",
        agent_count,
        genomes,
        run.global.value
    );

    Ok((per_genome, run.global, run.substitutions))
}

fn run_per_genome<S: InnerSearch>(
    search: &S,
    evaluator: &Evaluator,
    population: &[Genome],
    tournament_size: Option<usize>,
    rng: &mut StdRng,
) -> Result<(Vec<Particle>, Particle, usize)> {
    let direction = search.direction();
    let agent_count = search.inner_size();
    // Seeds are drawn up-front so results do not depend on dispatch order
    let seeds: Vec<u64> = population.iter().map(|_| rng.gen()).collect();

    let single = |(genome, seed): (&Genome, &u64)| -> Result<InnerRun> {
        let agents = vec![genome.as_slice(); agent_count];
        let mut run_rng = StdRng::seed_from_u64(*seed);
        search.run(&agents, tournament_size, &mut run_rng)
    };

    let runs: Vec<InnerRun> = if evaluator.should_parallelize(population.len()) {
        population.par_iter().zip(seeds.par_iter()).map(single).collect::<Result<Vec<_>>>()?
    } else {
        population.iter().zip(seeds.iter()).map(single).collect::<Result<Vec<_>>>()?
    };

    let mut global = Particle::worst(search.dimensions(), direction);
    let mut substitutions = 0;
    let mut per_genome = Vec::with_capacity(runs.len());
    for run in runs {
        substitutions += run.substitutions;
        if direction.is_better(run.global.value, global.value) {
            global = run.global.clone();
        }
        per_genome.push(run.global);
    }

    log::debug!(
        "{} independent inner runs of {} agents, best {:.6e}",
        per_genome.len(),
        agent_count,
        global.value
    );

    Ok((per_genome, global, substitutions))
}

/// Reads gene `index`, falling back when the genome is shorter or the gene is not finite.
pub(crate) fn gene(genome: &[f64], index: usize, fallback: f64) -> f64 {
    genome
        .get(index)
        .copied()
        .filter(|g| g.is_finite())
        .unwrap_or(fallback)
}

/// Index of the reference agent: the best overall, or the winner of a random tournament.
pub(crate) fn reference_index(
    values: &[f64],
    direction: OptimizationDirection,
    tournament_size: Option<usize>,
    rng: &mut StdRng,
) -> usize {
    match tournament_size {
        Some(k) if k > 0 && k < values.len() => {
            let mut best = rng.gen_range(0..values.len());
            for _ in 1..k {
                let idx = rng.gen_range(0..values.len());
                if direction.is_better(values[idx], values[best]) {
                    best = idx;
                }
            }
            best
        }
        _ => direction.best_index(values).unwrap_or(0),
    }
}

/// Uniform random position inside the problem bounds.
pub(crate) fn random_position(evaluator: &Evaluator, rng: &mut StdRng) -> Vec<f64> {
    let bounds = evaluator.problem().bounds();
    bounds
        .lower
        .iter()
        .zip(bounds.upper.iter())
        .map(|(&lo, &hi)| rng.gen_range(lo..=hi))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gene_fallback() {
        assert_eq!(gene(&[0.3, 0.4], 1, 9.0), 0.4);
        assert_eq!(gene(&[0.3], 2, 9.0), 9.0);
        assert_eq!(gene(&[f64::NAN], 0, 9.0), 9.0);
    }

    #[test]
    fn test_reference_without_tournament_is_best() {
        let mut rng = StdRng::seed_from_u64(1);
        let values = [4.0, 1.0, 3.0];
        assert_eq!(reference_index(&values, OptimizationDirection::Minimize, None, &mut rng), 1);
        assert_eq!(reference_index(&values, OptimizationDirection::Maximize, None, &mut rng), 0);
    }

    #[test]
    fn test_tournament_reference_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let values: Vec<f64> = (0..20).map(|i| i as f64).collect();
        for _ in 0..100 {
            let idx = reference_index(&values, OptimizationDirection::Minimize, Some(3), &mut rng);
            assert!(idx < values.len());
        }
    }
}
