use super::{component_seed, run_engine, shared_evaluator, HyperHeuristic};
use crate::config::AppConfig;
use crate::engines::evaluation::Problem;
use crate::engines::generation::{
    GeneSpace, GeneSpec, GenerationObserver, HyperEvolutionEngine, RunOutcome, StepSchedule,
};
use crate::engines::orchestration::{DeOrchestrator, DeStrategy};
use crate::error::Result;

/// `[F, CR, strategy_index]` with `F, CR ∈ [0, 1]` and one index per DE strategy.
pub fn de_gene_space() -> GeneSpace {
    GeneSpace::new(vec![
        GeneSpec::continuous(0.0, 1.0),
        GeneSpec::continuous(0.0, 1.0),
        GeneSpec::int_range(0, DeStrategy::COUNT as i64 - 1),
    ])
}

/// Outer GA over DE control genomes. Mutation intensity grows and the inner population
/// shrinks as the run ages.
pub struct DeHyperHeuristic {
    config: AppConfig,
    gene_space: GeneSpace,
    observer: Option<Box<dyn GenerationObserver>>,
}

impl DeHyperHeuristic {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            gene_space: de_gene_space(),
            observer: None,
        }
    }

    pub fn with_observer(mut self, observer: impl GenerationObserver + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

impl HyperHeuristic for DeHyperHeuristic {
    fn name(&self) -> &str {
        "DE hyper-heuristic"
    }

    fn optimize(&mut self, problem: Problem) -> Result<RunOutcome> {
        let runtime = &self.config.runtime;
        let evaluator = shared_evaluator(problem, runtime);
        let orchestrator = DeOrchestrator::new(
            self.config.de.clone(),
            evaluator.clone(),
            component_seed(runtime, 2),
        )?;
        let engine = HyperEvolutionEngine::new(
            self.config.evolution.clone(),
            self.gene_space.clone(),
            Box::new(orchestrator),
            component_seed(runtime, 0),
        )?
        .with_schedule(StepSchedule::de_default(self.gene_space.len()));

        run_engine(engine, &evaluator, &mut self.observer)
    }
}
