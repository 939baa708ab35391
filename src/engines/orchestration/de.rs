//! Differential Evolution orchestrator.
//!
//! Each genome is `[F, CR, strategy_index]`. Agents are driven round-robin by the
//! genomes of the outer population, so one inner population mixes several control
//! settings and strategies at once.

use super::guard::FitnessGuard;
use super::mapping::{dispatch, gene, random_position, reference_index, InnerRun, InnerSearch};
use super::traits::{ControlKnob, OrchestrationResult, Orchestrator};
use crate::config::{ConfigSection, DeConfig};
use crate::engines::evaluation::Evaluator;
use crate::engines::generation::genome::Genome;
use crate::error::Result;
use crate::types::{OptimizationDirection, Particle};
use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// DE mutation strategy, selected by the third gene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DeStrategy {
    /// v = xₐ + F·(xᵦ − xᵧ)
    #[default]
    Rand1Bin,
    /// v = x_best + F·(xₐ − xᵦ)
    Best1Bin,
    /// v = xₐ + F·(xᵦ − xᵧ) + F·(xδ − xε)
    Rand2Bin,
    /// v = x_best + F·(xₐ − xᵦ) + F·(xᵧ − xδ)
    Best2Bin,
    /// v = xᵢ + F·(x_best − xᵢ) + F·(xₐ − xᵦ)
    CurrentToBest1Bin,
    /// v = xₐ + F·(x_best − xₐ) + F·(xᵦ − xᵧ)
    RandToBest1Bin,
}

impl DeStrategy {
    pub const COUNT: usize = 6;

    /// Maps a gene to a strategy; out-of-range values are clamped.
    pub fn from_gene(value: f64) -> Self {
        let index = if value.is_finite() {
            value.round().clamp(0.0, (Self::COUNT - 1) as f64) as usize
        } else {
            0
        };
        match index {
            0 => DeStrategy::Rand1Bin,
            1 => DeStrategy::Best1Bin,
            2 => DeStrategy::Rand2Bin,
            3 => DeStrategy::Best2Bin,
            4 => DeStrategy::CurrentToBest1Bin,
            _ => DeStrategy::RandToBest1Bin,
        }
    }

    /// Random donor vectors the strategy needs besides the target and the best.
    fn donors(self) -> usize {
        match self {
            DeStrategy::Rand1Bin | DeStrategy::RandToBest1Bin => 3,
            DeStrategy::Best1Bin | DeStrategy::CurrentToBest1Bin => 2,
            DeStrategy::Rand2Bin => 5,
            DeStrategy::Best2Bin => 4,
        }
    }
}

pub struct DeOrchestrator {
    config: DeConfig,
    evaluator: Arc<Evaluator>,
    rng: StdRng,
}

impl DeOrchestrator {
    pub fn new(config: DeConfig, evaluator: Arc<Evaluator>, seed: Option<u64>) -> Result<Self> {
        config.validate()?;
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            config,
            evaluator,
            rng,
        })
    }

    pub fn config(&self) -> &DeConfig {
        &self.config
    }
}

struct DeSearch<'a> {
    config: &'a DeConfig,
    evaluator: &'a Evaluator,
}

#[derive(Debug, Clone, Copy)]
struct AgentParams {
    scale: f64,
    crossover: f64,
    strategy: DeStrategy,
}

/// Picks `count` donor indices different from `target`; repeats are allowed only when
/// the population is too small to avoid them.
fn pick_donors(rng: &mut StdRng, n: usize, target: usize, count: usize) -> Vec<usize> {
    if n > count {
        sample(rng, n - 1, count)
            .into_iter()
            .map(|i| if i >= target { i + 1 } else { i })
            .collect()
    } else {
        (0..count).map(|_| rng.gen_range(0..n)).collect()
    }
}

impl DeSearch<'_> {
    fn agent_params(&self, genome: &[f64]) -> AgentParams {
        AgentParams {
            scale: gene(genome, 0, self.config.scale_factor).max(0.0),
            crossover: gene(genome, 1, self.config.crossover_rate).clamp(0.0, 1.0),
            strategy: DeStrategy::from_gene(gene(genome, 2, 0.0)),
        }
    }

    fn mutant(
        &self,
        population: &[Vec<f64>],
        target: usize,
        best: usize,
        params: AgentParams,
        rng: &mut StdRng,
    ) -> Vec<f64> {
        let f = params.scale;
        let d = pick_donors(rng, population.len(), target, params.strategy.donors());
        let x = |i: usize, j: usize| population[i][j];

        (0..population[target].len())
            .map(|j| match params.strategy {
                DeStrategy::Rand1Bin => x(d[0], j) + f * (x(d[1], j) - x(d[2], j)),
                DeStrategy::Best1Bin => x(best, j) + f * (x(d[0], j) - x(d[1], j)),
                DeStrategy::Rand2Bin => {
                    x(d[0], j) + f * (x(d[1], j) - x(d[2], j)) + f * (x(d[3], j) - x(d[4], j))
                }
                DeStrategy::Best2Bin => {
                    x(best, j) + f * (x(d[0], j) - x(d[1], j)) + f * (x(d[2], j) - x(d[3], j))
                }
                DeStrategy::CurrentToBest1Bin => {
                    x(target, j) + f * (x(best, j) - x(target, j)) + f * (x(d[0], j) - x(d[1], j))
                }
                DeStrategy::RandToBest1Bin => {
                    x(d[0], j) + f * (x(best, j) - x(d[0], j)) + f * (x(d[1], j) - x(d[2], j))
                }
            })
            .collect()
    }
}

impl InnerSearch for DeSearch<'_> {
    fn direction(&self) -> OptimizationDirection {
        OptimizationDirection::from_maximize(self.config.maximize)
    }

    fn dimensions(&self) -> usize {
        self.evaluator.problem().dimensions()
    }

    fn inner_size(&self) -> usize {
        self.config.particle_quota
    }

    fn run(
        &self,
        agents: &[&[f64]],
        tournament_size: Option<usize>,
        rng: &mut StdRng,
    ) -> Result<InnerRun> {
        let direction = self.direction();
        let bounds = self.evaluator.problem().bounds();
        let dims = self.dimensions();
        let params: Vec<AgentParams> = agents.iter().map(|g| self.agent_params(g)).collect();
        let mut guard = FitnessGuard::new(direction);

        let mut population: Vec<Vec<f64>> =
            agents.iter().map(|_| random_position(self.evaluator, rng)).collect();
        let mut fitness: Vec<f64> = self
            .evaluator
            .evaluate_batch(&population)?
            .into_iter()
            .map(|v| guard.check(v))
            .collect();

        let mut best_value = direction
            .best_index(&fitness)
            .map(|i| fitness[i])
            .unwrap_or_else(|| direction.worst());
        let mut stagnant = 0;

        for _ in 1..self.config.iterations {
            let mut trials = Vec::with_capacity(population.len());
            for (i, &agent) in params.iter().enumerate() {
                let best = reference_index(&fitness, direction, tournament_size, rng);
                let mutant = self.mutant(&population, i, best, agent, rng);

                // Binomial crossover, one dimension always taken from the mutant
                let j_rand = rng.gen_range(0..dims);
                let mut trial: Vec<f64> = (0..dims)
                    .map(|j| {
                        if j == j_rand || rng.gen::<f64>() < agent.crossover {
                            mutant[j]
                        } else {
                            population[i][j]
                        }
                    })
                    .collect();
                bounds.clamp(&mut trial);
                trials.push(trial);
            }

            let trial_fitness = self.evaluator.evaluate_batch(&trials)?;
            for (i, (trial, value)) in trials.into_iter().zip(trial_fitness).enumerate() {
                let value = guard.check(value);
                if !direction.is_better(fitness[i], value) {
                    population[i] = trial;
                    fitness[i] = value;
                }
            }

            let generation_best = direction
                .best_index(&fitness)
                .map(|i| fitness[i])
                .unwrap_or(best_value);
            if direction.is_better(generation_best, best_value) {
                best_value = generation_best;
                stagnant = 0;
            } else {
                stagnant += 1;
                if stagnant >= self.config.window_size {
                    log::debug!("DE run stagnated for {} iterations", stagnant);
                    break;
                }
            }
        }

        // Greedy selection keeps every agent at its personal best
        let agent_best: Vec<Particle> = population
            .into_iter()
            .zip(fitness.iter())
            .map(|(position, &value)| Particle::new(position, value))
            .collect();
        let global = direction
            .best_index(&fitness)
            .map(|i| agent_best[i].clone())
            .unwrap_or_else(|| Particle::worst(dims, direction));

        Ok(InnerRun {
            agent_best,
            global,
            substitutions: guard.substitutions(),
        })
    }
}

impl Orchestrator for DeOrchestrator {
    fn name(&self) -> &str {
        "DE"
    }

    fn direction(&self) -> OptimizationDirection {
        OptimizationDirection::from_maximize(self.config.maximize)
    }

    fn orchestrate(
        &mut self,
        population: &[Genome],
        tournament_size: Option<usize>,
    ) -> Result<OrchestrationResult> {
        let search = DeSearch {
            config: &self.config,
            evaluator: &self.evaluator,
        };
        dispatch(
            &search,
            self.config.mapping,
            &self.evaluator,
            population,
            tournament_size,
            &mut self.rng,
        )
    }

    fn knob(&self, knob: ControlKnob) -> Option<f64> {
        match knob {
            ControlKnob::ParticleQuota | ControlKnob::InnerPopulation => {
                Some(self.config.particle_quota as f64)
            }
            ControlKnob::WindowSize => Some(self.config.window_size as f64),
            ControlKnob::Iterations => Some(self.config.iterations as f64),
            ControlKnob::ScaleFactor => Some(self.config.scale_factor),
            ControlKnob::CrossoverRate => Some(self.config.crossover_rate),
            _ => None,
        }
    }

    fn set_knob(&mut self, knob: ControlKnob, value: f64) -> bool {
        if !value.is_finite() {
            return false;
        }
        let count = value.round().max(1.0) as usize;
        match knob {
            ControlKnob::ParticleQuota | ControlKnob::InnerPopulation => {
                self.config.particle_quota = count
            }
            ControlKnob::WindowSize => self.config.window_size = count,
            ControlKnob::Iterations => self.config.iterations = count,
            ControlKnob::ScaleFactor => self.config.scale_factor = value.max(0.0),
            ControlKnob::CrossoverRate => self.config.crossover_rate = value.clamp(0.0, 1.0),
            _ => return false,
        }
        true
    }
}
