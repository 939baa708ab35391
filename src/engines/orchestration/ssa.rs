use super::guard::FitnessGuard;
use super::mapping::{dispatch, gene, random_position, reference_index, InnerRun, InnerSearch};
use super::traits::{ControlKnob, OrchestrationResult, Orchestrator};
use crate::config::{ConfigSection, SsaConfig};
use crate::engines::evaluation::Evaluator;
use crate::engines::generation::genome::Genome;
use crate::error::Result;
use crate::types::{OptimizationDirection, Particle};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

/// Salp Swarm orchestrator. Genome layout: `[leader_ratio, exploration_scale]`.
///
/// Leaders jump around the food source with a step that shrinks as
/// `2·exp(−(4l/L)²)`; followers move halfway toward the salp ahead of them.
pub struct SsaOrchestrator {
    config: SsaConfig,
    evaluator: Arc<Evaluator>,
    rng: StdRng,
}

impl SsaOrchestrator {
    pub fn new(config: SsaConfig, evaluator: Arc<Evaluator>, seed: Option<u64>) -> Result<Self> {
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

    pub fn config(&self) -> &SsaConfig {
        &self.config
    }
}

struct SsaSearch<'a> {
    config: &'a SsaConfig,
    evaluator: &'a Evaluator,
}

impl InnerSearch for SsaSearch<'_> {
    fn direction(&self) -> OptimizationDirection {
        OptimizationDirection::from_maximize(self.config.maximize)
    }

    fn dimensions(&self) -> usize {
        self.evaluator.problem().dimensions()
    }

    fn inner_size(&self) -> usize {
        self.config.swarm_size
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
        let iterations = self.config.iterations;
        let leader_ratio: Vec<f64> = agents
            .iter()
            .map(|g| gene(g, 0, self.config.leader_ratio).clamp(0.0, 1.0))
            .collect();
        let scale: Vec<f64> = agents
            .iter()
            .map(|g| gene(g, 1, self.config.exploration_scale).max(0.0))
            .collect();
        let mut guard = FitnessGuard::new(direction);

        let mut salps: Vec<Vec<f64>> =
            agents.iter().map(|_| random_position(self.evaluator, rng)).collect();
        let mut best_positions = salps.clone();
        let mut best_values = vec![direction.worst(); agents.len()];

        for l in 0..iterations {
            let values = self.evaluator.evaluate_batch(&salps)?;
            for (i, value) in values.into_iter().enumerate() {
                let value = guard.check(value);
                if direction.is_better(value, best_values[i]) {
                    best_values[i] = value;
                    best_positions[i].copy_from_slice(&salps[i]);
                }
            }

            if l + 1 == iterations {
                break;
            }

            let progress = 4.0 * (l + 1) as f64 / iterations as f64;
            let c1 = 2.0 * (-(progress * progress)).exp();

            for i in 0..salps.len() {
                if i == 0 || rng.gen::<f64>() < leader_ratio[i] {
                    let food = reference_index(&best_values, direction, tournament_size, rng);
                    for d in 0..dims {
                        let c2 = rng.gen::<f64>();
                        let c3 = rng.gen::<f64>();
                        let step = scale[i] * c1 * (bounds.range(d) * c2 + bounds.lower[d]);
                        salps[i][d] = if c3 < 0.5 {
                            best_positions[food][d] + step
                        } else {
                            best_positions[food][d] - step
                        };
                    }
                } else {
                    for d in 0..dims {
                        salps[i][d] = (salps[i][d] + salps[i - 1][d]) / 2.0;
                    }
                }
                bounds.clamp(&mut salps[i]);
            }
        }

        let global = direction
            .best_index(&best_values)
            .map(|i| Particle::new(best_positions[i].clone(), best_values[i]))
            .unwrap_or_else(|| Particle::worst(dims, direction));
        let agent_best = best_positions
            .into_iter()
            .zip(best_values)
            .map(|(position, value)| Particle::new(position, value))
            .collect();

        Ok(InnerRun {
            agent_best,
            global,
            substitutions: guard.substitutions(),
        })
    }
}

impl Orchestrator for SsaOrchestrator {
    fn name(&self) -> &str {
        "SSA"
    }

    fn direction(&self) -> OptimizationDirection {
        OptimizationDirection::from_maximize(self.config.maximize)
    }

    fn orchestrate(
        &mut self,
        population: &[Genome],
        tournament_size: Option<usize>,
    ) -> Result<OrchestrationResult> {
        let search = SsaSearch {
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
            ControlKnob::Iterations => Some(self.config.iterations as f64),
            ControlKnob::InnerPopulation => Some(self.config.swarm_size as f64),
            ControlKnob::LeaderRatio => Some(self.config.leader_ratio),
            ControlKnob::ExplorationScale => Some(self.config.exploration_scale),
            _ => None,
        }
    }

    fn set_knob(&mut self, knob: ControlKnob, value: f64) -> bool {
        if !value.is_finite() {
            return false;
        }
        match knob {
            ControlKnob::Iterations => self.config.iterations = value.round().max(1.0) as usize,
            ControlKnob::InnerPopulation => self.config.swarm_size = value.round().max(1.0) as usize,
            ControlKnob::LeaderRatio => self.config.leader_ratio = value.clamp(0.0, 1.0),
            ControlKnob::ExplorationScale => self.config.exploration_scale = value.max(0.0),
            _ => return false,
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::evaluation::Problem;
    use crate::types::Bounds;

    fn sphere_evaluator() -> Arc<Evaluator> {
        let sphere = |x: &[f64]| x.iter().map(|v| v * v).sum::<f64>();
        let problem = Problem::new(sphere, 2, Bounds::uniform(2, -10.0, 10.0)).unwrap();
        Arc::new(Evaluator::new(Arc::new(problem), 50))
    }

    #[test]
    fn test_salps_stay_in_bounds_and_report_per_genome() {
        let mut ssa = SsaOrchestrator::new(SsaConfig::default(), sphere_evaluator(), Some(21)).unwrap();
        let population = vec![vec![0.5, 1.0], vec![0.1, 0.5], vec![0.9, 1.5]];
        let result = ssa.orchestrate(&population, None).unwrap();

        assert_eq!(result.fitness.len(), 3);
        assert!(result.global_particle.position.iter().all(|x| (-10.0..=10.0).contains(x)));
        let best = result.fitness.iter().cloned().fold(f64::INFINITY, f64::min);
        assert_eq!(best, result.global_particle.value);
    }

    #[test]
    fn test_short_genome_uses_config_fallbacks() {
        let config = SsaConfig {
            swarm_size: 8,
            iterations: 10,
            ..Default::default()
        };
        let mut ssa = SsaOrchestrator::new(config, sphere_evaluator(), Some(3)).unwrap();
        let result = ssa.orchestrate(&[vec![]], Some(4)).unwrap();
        assert_eq!(result.fitness.len(), 1);
        assert!(result.fitness[0].is_finite());
    }
}
