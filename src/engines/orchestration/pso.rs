use super::guard::FitnessGuard;
use super::mapping::{dispatch, gene, random_position, reference_index, InnerRun, InnerSearch};
use super::traits::{ControlKnob, OrchestrationResult, Orchestrator};
use crate::config::{ConfigSection, PsoConfig};
use crate::engines::evaluation::Evaluator;
use crate::engines::generation::genome::Genome;
use crate::error::Result;
use crate::types::{OptimizationDirection, Particle};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

/// Particle Swarm orchestrator. Genome layout: `[c1, c2, w]`.
///
/// The configured inertia weight is a ceiling on every agent's own `w`, so decaying it
/// between generations tightens the whole swarm.
pub struct PsoOrchestrator {
    config: PsoConfig,
    evaluator: Arc<Evaluator>,
    rng: StdRng,
}

impl PsoOrchestrator {
    pub fn new(config: PsoConfig, evaluator: Arc<Evaluator>, seed: Option<u64>) -> Result<Self> {
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

    pub fn config(&self) -> &PsoConfig {
        &self.config
    }
}

struct PsoSearch<'a> {
    config: &'a PsoConfig,
    evaluator: &'a Evaluator,
}

/// Control parameters of one agent.
#[derive(Debug, Clone, Copy)]
struct AgentParams {
    cognitive: f64,
    social: f64,
    inertia: f64,
}

impl PsoSearch<'_> {
    fn agent_params(&self, genome: &[f64]) -> AgentParams {
        AgentParams {
            cognitive: gene(genome, 0, self.config.cognitive_constant),
            social: gene(genome, 1, self.config.social_constant),
            inertia: gene(genome, 2, self.config.inertia_weight).min(self.config.inertia_weight),
        }
    }
}

impl InnerSearch for PsoSearch<'_> {
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
        let n = self.dimensions();
        let params: Vec<AgentParams> = agents.iter().map(|g| self.agent_params(g)).collect();

        // Initialize swarm
        let mut particles: Vec<Vec<f64>> = agents
            .iter()
            .map(|_| random_position(self.evaluator, rng))
            .collect();
        let mut velocities: Vec<Vec<f64>> = agents
            .iter()
            .map(|_| {
                (0..n)
                    .map(|i| {
                        let range = bounds.range(i);
                        rng.gen_range(-range * 0.1..=range * 0.1)
                    })
                    .collect()
            })
            .collect();
        let mut personal_best_positions = particles.clone();
        let mut personal_best_costs = vec![direction.worst(); agents.len()];
        let mut guard = FitnessGuard::new(direction);

        for iter in 0..self.config.iterations {
            // Evaluate all particles
            let costs = self.evaluator.evaluate_batch(&particles)?;
            for (p, cost) in costs.into_iter().enumerate() {
                let cost = guard.check(cost);
                if direction.is_better(cost, personal_best_costs[p]) {
                    personal_best_costs[p] = cost;
                    personal_best_positions[p].copy_from_slice(&particles[p]);
                }
            }

            if iter + 1 == self.config.iterations {
                break;
            }

            // Update velocities and positions for all particles
            for p in 0..agents.len() {
                let attractor =
                    reference_index(&personal_best_costs, direction, tournament_size, rng);
                let AgentParams {
                    cognitive,
                    social,
                    inertia,
                } = params[p];

                for i in 0..n {
                    let r1 = rng.gen::<f64>();
                    let r2 = rng.gen::<f64>();

                    velocities[p][i] = inertia * velocities[p][i]
                        + cognitive * r1 * (personal_best_positions[p][i] - particles[p][i])
                        + social * r2 * (personal_best_positions[attractor][i] - particles[p][i]);

                    // Clamp velocity to fraction of search space
                    let v_max = bounds.range(i) * self.config.max_velocity;
                    velocities[p][i] = velocities[p][i].clamp(-v_max, v_max);

                    particles[p][i] += velocities[p][i];
                }

                bounds.clamp(&mut particles[p]);
            }
        }

        let agent_best: Vec<Particle> = personal_best_positions
            .into_iter()
            .zip(personal_best_costs)
            .map(|(position, value)| Particle::new(position, value))
            .collect();
        let global = direction
            .best_index(&agent_best.iter().map(|p| p.value).collect::<Vec<_>>())
            .map(|i| agent_best[i].clone())
            .unwrap_or_else(|| Particle::worst(n, direction));

        Ok(InnerRun {
            agent_best,
            global,
            substitutions: guard.substitutions(),
        })
    }
}

impl Orchestrator for PsoOrchestrator {
    fn name(&self) -> &str {
        "PSO"
    }

    fn direction(&self) -> OptimizationDirection {
        OptimizationDirection::from_maximize(self.config.maximize)
    }

    fn orchestrate(
        &mut self,
        population: &[Genome],
        tournament_size: Option<usize>,
    ) -> Result<OrchestrationResult> {
        let search = PsoSearch {
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
            ControlKnob::InertiaWeight => Some(self.config.inertia_weight),
            ControlKnob::CognitiveConstant => Some(self.config.cognitive_constant),
            ControlKnob::SocialConstant => Some(self.config.social_constant),
            ControlKnob::MaxVelocity => Some(self.config.max_velocity),
            ControlKnob::Iterations => Some(self.config.iterations as f64),
            ControlKnob::InnerPopulation => Some(self.config.swarm_size as f64),
            _ => None,
        }
    }

    fn set_knob(&mut self, knob: ControlKnob, value: f64) -> bool {
        if !value.is_finite() {
            return false;
        }
        match knob {
            ControlKnob::InertiaWeight => self.config.inertia_weight = value.max(0.0),
            ControlKnob::CognitiveConstant => self.config.cognitive_constant = value.max(0.0),
            ControlKnob::SocialConstant => self.config.social_constant = value.max(0.0),
            ControlKnob::MaxVelocity => self.config.max_velocity = value.max(0.0),
            ControlKnob::Iterations => self.config.iterations = value.round().max(1.0) as usize,
            ControlKnob::InnerPopulation => self.config.swarm_size = value.round().max(1.0) as usize,
            _ => return false,
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MappingPolicy;
    use crate::engines::evaluation::Problem;
    use crate::types::Bounds;

    fn sphere_evaluator() -> Arc<Evaluator> {
        let sphere = |x: &[f64]| x.iter().map(|v| v * v).sum::<f64>();
        let problem = Problem::new(sphere, 3, Bounds::uniform(3, -5.0, 5.0)).unwrap();
        Arc::new(Evaluator::new(Arc::new(problem), 50))
    }

    fn population() -> Vec<Genome> {
        vec![
            vec![1.5, 1.5, 0.7],
            vec![0.5, 2.5, 0.3],
            vec![2.0, 1.0, 0.9],
            vec![1.0, 1.0, 0.5],
        ]
    }

    #[test]
    fn test_fitness_aligns_with_population() {
        let config = PsoConfig {
            swarm_size: 10,
            iterations: 15,
            ..Default::default()
        };
        let mut pso = PsoOrchestrator::new(config, sphere_evaluator(), Some(3)).unwrap();
        let result = pso.orchestrate(&population(), None).unwrap();

        assert_eq!(result.fitness.len(), 4);
        assert_eq!(result.best_particles.count(), 4);
        let best = result.fitness.iter().cloned().fold(f64::INFINITY, f64::min);
        assert_eq!(result.global_particle.value, best);
        assert!(result.global_particle.position.iter().all(|x| (-5.0..=5.0).contains(x)));
    }

    #[test]
    fn test_swarm_improves_on_sphere() {
        let config = PsoConfig {
            swarm_size: 20,
            iterations: 60,
            ..Default::default()
        };
        let mut pso = PsoOrchestrator::new(config, sphere_evaluator(), Some(11)).unwrap();
        let result = pso.orchestrate(&population(), Some(3)).unwrap();
        assert!(result.global_particle.value < 1.0);
    }

    #[test]
    fn test_run_per_genome_reports_each_run() {
        let config = PsoConfig {
            swarm_size: 5,
            iterations: 5,
            mapping: MappingPolicy::RunPerGenome,
            ..Default::default()
        };
        let mut pso = PsoOrchestrator::new(config, sphere_evaluator(), Some(5)).unwrap();
        let result = pso.orchestrate(&population(), None).unwrap();
        assert_eq!(result.fitness.len(), 4);
        assert!(result.fitness.iter().all(|f| *f >= result.global_particle.value));
    }

    #[test]
    fn test_inertia_knob_round_trip() {
        let mut pso = PsoOrchestrator::new(PsoConfig::default(), sphere_evaluator(), Some(1)).unwrap();
        assert!(pso.set_knob(ControlKnob::InertiaWeight, 0.5));
        assert_eq!(pso.knob(ControlKnob::InertiaWeight), Some(0.5));
        assert!(!pso.set_knob(ControlKnob::WindowSize, 3.0));
        assert_eq!(pso.knob(ControlKnob::WindowSize), None);
    }
}
