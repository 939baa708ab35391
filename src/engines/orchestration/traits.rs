use crate::engines::generation::genome::Genome;
use crate::error::Result;
use crate::types::{OptimizationDirection, Particle};
use serde::{Deserialize, Serialize};

/// Best particles reported by an orchestration call.
#[derive(Debug, Clone, PartialEq)]
pub enum BestParticles {
    /// One best particle per genome, in population order
    PerGenome(Vec<Particle>),
    /// One entry per ensemble contributor, in contributor order
    Ensemble(Vec<BestParticles>),
}

impl BestParticles {
    /// Total number of particles, flattening ensembles.
    pub fn count(&self) -> usize {
        match self {
            BestParticles::PerGenome(particles) => particles.len(),
            BestParticles::Ensemble(members) => members.iter().map(|m| m.count()).sum(),
        }
    }
}

/// Recoverable conditions met during one orchestration call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrchestrationDiagnostics {
    pub non_finite_substitutions: usize,
    pub combination_fallback: Option<String>,
}

impl OrchestrationDiagnostics {
    pub fn absorb(&mut self, other: &OrchestrationDiagnostics) {
        self.non_finite_substitutions += other.non_finite_substitutions;
        if self.combination_fallback.is_none() {
            self.combination_fallback = other.combination_fallback.clone();
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrchestrationResult {
    pub best_particles: BestParticles,
    /// One entry per genome, same order as the population
    pub fitness: Vec<f64>,
    /// Best particle found anywhere during the call
    pub global_particle: Particle,
    pub diagnostics: OrchestrationDiagnostics,
}

/// Live inner-optimizer parameters the scheduler may adjust between generations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControlKnob {
    InertiaWeight,
    CognitiveConstant,
    SocialConstant,
    MaxVelocity,
    Iterations,
    InnerPopulation,
    ParticleQuota,
    WindowSize,
    ScaleFactor,
    CrossoverRate,
    LeaderRatio,
    ExplorationScale,
}

/// Runs an inner metaheuristic for a population of hyperparameter genomes.
pub trait Orchestrator: Send {
    fn name(&self) -> &str;

    fn direction(&self) -> OptimizationDirection;

    /// `tournament_size` restricts the inner best/attractor reference to the best of a
    /// random subset of that many agents. `None` compares against the whole population.
    fn orchestrate(
        &mut self,
        population: &[Genome],
        tournament_size: Option<usize>,
    ) -> Result<OrchestrationResult>;

    fn knob(&self, _knob: ControlKnob) -> Option<f64> {
        None
    }

    /// Returns false when the knob is not supported.
    fn set_knob(&mut self, _knob: ControlKnob, _value: f64) -> bool {
        false
    }
}
