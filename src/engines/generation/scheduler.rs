//! Adaptive parameter schedules applied between generations.
//!
//! A schedule runs once a generation has been replaced, so it only ever changes the
//! settings of the next evaluation.

use crate::engines::orchestration::{ControlKnob, Orchestrator};
use crate::error::{HyperError, Result};
use serde::{Deserialize, Serialize};

/// Outer-loop mutation settings a schedule may adjust.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MutationControls {
    pub mutation_num_genes: usize,
    pub mutation_probability: Option<f64>,
}

pub trait ParameterSchedule: Send {
    /// `generation_completed` counts finished generations, starting at 1.
    fn on_generation_end(
        &mut self,
        generation_completed: usize,
        orchestrator: &mut dyn Orchestrator,
        controls: &mut MutationControls,
    );
}

/// Multiplicative decay of the PSO inertia ceiling: `w ← max(w·multiplier, floor)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InertiaDecay {
    multiplier: f64,
    floor: f64,
}

impl InertiaDecay {
    pub fn new(multiplier: f64, floor: f64) -> Result<Self> {
        if !(multiplier > 0.0 && multiplier < 1.0) {
            return Err(HyperError::config(
                "inertia_decay.multiplier",
                multiplier,
                "must lie strictly between 0 and 1",
            ));
        }
        if !floor.is_finite() || floor < 0.0 {
            return Err(HyperError::config("inertia_decay.floor", floor, "must be finite and non-negative"));
        }
        Ok(Self { multiplier, floor })
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    pub fn floor(&self) -> f64 {
        self.floor
    }
}

impl Default for InertiaDecay {
    fn default() -> Self {
        Self {
            multiplier: 0.99,
            floor: 0.0,
        }
    }
}

impl ParameterSchedule for InertiaDecay {
    fn on_generation_end(
        &mut self,
        _generation_completed: usize,
        orchestrator: &mut dyn Orchestrator,
        _controls: &mut MutationControls,
    ) {
        if let Some(w) = orchestrator.knob(ControlKnob::InertiaWeight) {
            let next = (w * self.multiplier).max(self.floor);
            orchestrator.set_knob(ControlKnob::InertiaWeight, next);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum StepTarget {
    Knob(ControlKnob),
    MutationNumGenes,
}

/// Adds `delta` to `target` every `every` generations, clamped to `[floor, ceiling]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepRule {
    pub every: usize,
    pub target: StepTarget,
    pub delta: f64,
    pub floor: Option<f64>,
    pub ceiling: Option<f64>,
}

impl StepRule {
    fn fires_at(&self, generation_completed: usize) -> bool {
        self.every > 0 && generation_completed > 0 && generation_completed % self.every == 0
    }

    fn step(&self, value: f64) -> f64 {
        let mut next = value + self.delta;
        if let Some(ceiling) = self.ceiling {
            next = next.min(ceiling);
        }
        if let Some(floor) = self.floor {
            next = next.max(floor);
        }
        next
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepSchedule {
    rules: Vec<StepRule>,
}

impl StepSchedule {
    pub fn new(rules: Vec<StepRule>) -> Self {
        Self { rules }
    }

    /// DE adaptation: every 20 generations one more mutated gene and two fewer agents,
    /// every 40 a shorter stagnation window.
    pub fn de_default(num_genes: usize) -> Self {
        Self::new(vec![
            StepRule {
                every: 20,
                target: StepTarget::MutationNumGenes,
                delta: 1.0,
                floor: Some(1.0),
                ceiling: Some(num_genes as f64),
            },
            StepRule {
                every: 20,
                target: StepTarget::Knob(ControlKnob::ParticleQuota),
                delta: -2.0,
                floor: Some(10.0),
                ceiling: None,
            },
            StepRule {
                every: 40,
                target: StepTarget::Knob(ControlKnob::WindowSize),
                delta: -1.0,
                floor: Some(3.0),
                ceiling: None,
            },
        ])
    }

    pub fn rules(&self) -> &[StepRule] {
        &self.rules
    }
}

impl ParameterSchedule for StepSchedule {
    fn on_generation_end(
        &mut self,
        generation_completed: usize,
        orchestrator: &mut dyn Orchestrator,
        controls: &mut MutationControls,
    ) {
        for rule in self.rules.iter().filter(|r| r.fires_at(generation_completed)) {
            match rule.target {
                StepTarget::MutationNumGenes => {
                    let next = rule.step(controls.mutation_num_genes as f64).round().max(1.0);
                    controls.mutation_num_genes = next as usize;
                    log::debug!(
                        "Generation {}: mutation_num_genes -> {}",
                        generation_completed,
                        controls.mutation_num_genes
                    );
                }
                StepTarget::Knob(knob) => {
                    if let Some(current) = orchestrator.knob(knob) {
                        let next = rule.step(current);
                        orchestrator.set_knob(knob, next);
                        log::debug!("Generation {}: {:?} {} -> {}", generation_completed, knob, current, next);
                    }
                }
            }
        }
    }
}

/// Runs several schedules in order.
#[derive(Default)]
pub struct ScheduleChain {
    schedules: Vec<Box<dyn ParameterSchedule>>,
}

impl ScheduleChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, schedule: impl ParameterSchedule + 'static) -> Self {
        self.schedules.push(Box::new(schedule));
        self
    }

    pub fn len(&self) -> usize {
        self.schedules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schedules.is_empty()
    }
}

impl ParameterSchedule for ScheduleChain {
    fn on_generation_end(
        &mut self,
        generation_completed: usize,
        orchestrator: &mut dyn Orchestrator,
        controls: &mut MutationControls,
    ) {
        for schedule in self.schedules.iter_mut() {
            schedule.on_generation_end(generation_completed, orchestrator, controls);
        }
    }
}

/// Inner tournament size per generation (0-based). `None` compares against every agent.
pub trait TournamentSchedule: Send {
    fn size_for(&self, generation: usize) -> Option<usize>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedTournament(pub Option<usize>);

impl TournamentSchedule for FixedTournament {
    fn size_for(&self, _generation: usize) -> Option<usize> {
        self.0
    }
}

/// Linear interpolation from `start` to `end` over `generations`, then held at `end`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearTournament {
    pub start: usize,
    pub end: usize,
    pub generations: usize,
}

impl TournamentSchedule for LinearTournament {
    fn size_for(&self, generation: usize) -> Option<usize> {
        if self.generations <= 1 {
            return Some(self.end.max(1));
        }
        let t = (generation as f64 / (self.generations - 1) as f64).min(1.0);
        let size = self.start as f64 + t * (self.end as f64 - self.start as f64);
        Some((size.round() as usize).max(1))
    }
}
