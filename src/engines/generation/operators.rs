use crate::config::{CrossoverType, SelectionMethod};
use crate::engines::generation::genome::{GeneSpace, Genome};
use crate::types::OptimizationDirection;
use rand::seq::index;
use rand::Rng;

/// Population indices sorted best first. Ties keep population order.
pub fn ranked_indices(fitness: &[f64], direction: OptimizationDirection) -> Vec<usize> {
    let mut order: Vec<usize> = (0..fitness.len()).collect();
    order.sort_by(|&a, &b| direction.compare(fitness[a], fitness[b]));
    order
}

/// Steady-state selection: the `count` best genomes
pub fn steady_state_selection(
    fitness: &[f64],
    count: usize,
    direction: OptimizationDirection,
) -> Vec<usize> {
    ranked_indices(fitness, direction).into_iter().take(count).collect()
}

/// Tournament selection: each parent is the best of K random candidates
pub fn tournament_selection<R: Rng>(
    fitness: &[f64],
    count: usize,
    tournament_size: usize,
    direction: OptimizationDirection,
    rng: &mut R,
) -> Vec<usize> {
    (0..count)
        .map(|_| {
            let mut best_idx = rng.gen_range(0..fitness.len());
            for _ in 1..tournament_size {
                let idx = rng.gen_range(0..fitness.len());
                if direction.is_better(fitness[idx], fitness[best_idx]) {
                    best_idx = idx;
                }
            }
            best_idx
        })
        .collect()
}

/// Rank selection: probability proportional to rank, the best genome holding rank N
pub fn rank_selection<R: Rng>(
    fitness: &[f64],
    count: usize,
    direction: OptimizationDirection,
    rng: &mut R,
) -> Vec<usize> {
    let ranked = ranked_indices(fitness, direction);
    let n = ranked.len();
    let total = (n * (n + 1) / 2) as f64;

    (0..count)
        .map(|_| {
            let mut spin = rng.gen::<f64>() * total;
            for (position, &idx) in ranked.iter().enumerate() {
                spin -= (n - position) as f64;
                if spin <= 0.0 {
                    return idx;
                }
            }
            // Fallback
            ranked[n - 1]
        })
        .collect()
}

/// Random selection: uniform, fitness ignored
pub fn random_selection<R: Rng>(len: usize, count: usize, rng: &mut R) -> Vec<usize> {
    (0..count).map(|_| rng.gen_range(0..len)).collect()
}

pub fn select_parents<R: Rng>(
    method: SelectionMethod,
    fitness: &[f64],
    count: usize,
    tournament_size: usize,
    direction: OptimizationDirection,
    rng: &mut R,
) -> Vec<usize> {
    if fitness.is_empty() {
        return Vec::new();
    }
    match method {
        SelectionMethod::SteadyState => steady_state_selection(fitness, count, direction),
        SelectionMethod::Tournament => {
            tournament_selection(fitness, count, tournament_size.max(1), direction, rng)
        }
        SelectionMethod::Rank => rank_selection(fitness, count, direction, rng),
        SelectionMethod::Random => random_selection(fitness.len(), count, rng),
    }
}

/// Single-point crossover: head of `parent1`, tail of `parent2`
pub fn single_point_crossover<R: Rng>(parent1: &Genome, parent2: &Genome, rng: &mut R) -> Genome {
    let len = parent1.len().min(parent2.len());
    if len <= 1 {
        return parent1.clone();
    }

    let point = rng.gen_range(1..len);
    let mut child = parent1.clone();
    child[point..len].copy_from_slice(&parent2[point..len]);
    child
}

/// Two-point crossover: the middle segment comes from `parent2`
pub fn two_points_crossover<R: Rng>(parent1: &Genome, parent2: &Genome, rng: &mut R) -> Genome {
    let len = parent1.len().min(parent2.len());
    if len <= 2 {
        return single_point_crossover(parent1, parent2, rng);
    }

    let a = rng.gen_range(1..len);
    let b = rng.gen_range(1..len);
    let (start, end) = if a <= b { (a, b) } else { (b, a) };
    let mut child = parent1.clone();
    child[start..end].copy_from_slice(&parent2[start..end]);
    child
}

/// Uniform crossover: every gene from either parent with equal probability
pub fn uniform_crossover<R: Rng>(parent1: &Genome, parent2: &Genome, rng: &mut R) -> Genome {
    parent1
        .iter()
        .enumerate()
        .map(|(i, &g)| match parent2.get(i) {
            Some(&other) if rng.gen_bool(0.5) => other,
            _ => g,
        })
        .collect()
}

pub fn crossover<R: Rng>(
    kind: CrossoverType,
    parent1: &Genome,
    parent2: &Genome,
    rng: &mut R,
) -> Genome {
    match kind {
        CrossoverType::SinglePoint => single_point_crossover(parent1, parent2, rng),
        CrossoverType::TwoPoints => two_points_crossover(parent1, parent2, rng),
        CrossoverType::Uniform => uniform_crossover(parent1, parent2, rng),
    }
}

/// Mutation: resample each gene from its `GeneSpec` with probability `mutation_rate`
pub fn mutate_by_probability<R: Rng>(
    genome: &mut Genome,
    space: &GeneSpace,
    mutation_rate: f64,
    rng: &mut R,
) {
    for i in 0..genome.len() {
        if rng.gen::<f64>() < mutation_rate {
            space.resample(genome, i, rng);
        }
    }
}

/// Mutation: resample exactly `num_genes` distinct genes
pub fn mutate_num_genes<R: Rng>(genome: &mut Genome, space: &GeneSpace, num_genes: usize, rng: &mut R) {
    let amount = num_genes.min(genome.len());
    for i in index::sample(rng, genome.len(), amount).into_iter() {
        space.resample(genome, i, rng);
    }
}
