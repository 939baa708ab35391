//! Ready-made hyper-heuristics: an outer GA wired to one inner optimizer (or an ensemble)
//! with the gene space and schedules that suit it.

pub mod de;
pub mod ensemble;
pub mod pso;
pub mod ssa;

pub use de::DeHyperHeuristic;
pub use ensemble::EnsembleHyperHeuristic;
pub use pso::PsoHyperHeuristic;
pub use ssa::SsaHyperHeuristic;

use crate::config::{AppConfig, RuntimeConfig};
use crate::engines::evaluation::{Evaluator, Problem};
use crate::engines::generation::{GenerationObserver, HyperEvolutionEngine, NoopObserver, RunOutcome};
use crate::error::{HyperError, Result};
use std::sync::Arc;

pub trait HyperHeuristic {
    fn name(&self) -> &str;

    /// Evolves inner-optimizer hyperparameters against `problem`.
    fn optimize(&mut self, problem: Problem) -> Result<RunOutcome>;
}

/// Preset by name: `pso`, `de`, `ssa` or `ensemble`.
pub fn preset(name: &str, config: AppConfig) -> Result<Box<dyn HyperHeuristic>> {
    match name.to_ascii_lowercase().as_str() {
        "pso" => Ok(Box::new(PsoHyperHeuristic::new(config))),
        "de" => Ok(Box::new(DeHyperHeuristic::new(config))),
        "ssa" => Ok(Box::new(SsaHyperHeuristic::new(config))),
        "ensemble" => Ok(Box::new(EnsembleHyperHeuristic::new(config))),
        other => Err(HyperError::config("preset", other, "expected pso, de, ssa or ensemble")),
    }
}

pub(crate) fn shared_evaluator(problem: Problem, runtime: &RuntimeConfig) -> Arc<Evaluator> {
    Arc::new(Evaluator::new(Arc::new(problem), runtime.parallel_threshold))
}

/// Distinct, reproducible seed per component when a run seed is configured.
pub(crate) fn component_seed(runtime: &RuntimeConfig, component: u64) -> Option<u64> {
    runtime
        .seed
        .map(|seed| seed.wrapping_add(component.wrapping_mul(0x9E37_79B9_7F4A_7C15)))
}

pub(crate) fn run_engine(
    mut engine: HyperEvolutionEngine,
    evaluator: &Evaluator,
    observer: &mut Option<Box<dyn GenerationObserver>>,
) -> Result<RunOutcome> {
    let outcome = match observer.as_mut() {
        Some(observer) => engine.run(&mut **observer)?,
        None => engine.run(NoopObserver)?,
    };
    log::info!(
        "Objective cache: {} entries, {} hits, {} misses",
        evaluator.cache().len(),
        evaluator.cache().hits(),
        evaluator.cache().misses()
    );
    Ok(outcome)
}
