use super::{component_seed, run_engine, shared_evaluator, HyperHeuristic};
use crate::config::AppConfig;
use crate::engines::evaluation::Problem;
use crate::engines::generation::{GeneSpace, GeneSpec, GenerationObserver, HyperEvolutionEngine, RunOutcome};
use crate::engines::orchestration::SsaOrchestrator;
use crate::error::Result;

/// `[leader_ratio, exploration_scale]`.
pub fn ssa_gene_space() -> GeneSpace {
    GeneSpace::new(vec![GeneSpec::continuous(0.0, 1.0), GeneSpec::continuous(0.1, 2.0)])
}

pub struct SsaHyperHeuristic {
    config: AppConfig,
    gene_space: GeneSpace,
    observer: Option<Box<dyn GenerationObserver>>,
}

impl SsaHyperHeuristic {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            gene_space: ssa_gene_space(),
            observer: None,
        }
    }

    pub fn with_observer(mut self, observer: impl GenerationObserver + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }
}

impl HyperHeuristic for SsaHyperHeuristic {
    fn name(&self) -> &str {
        "SSA hyper-heuristic"
    }

    fn optimize(&mut self, problem: Problem) -> Result<RunOutcome> {
        let runtime = &self.config.runtime;
        let evaluator = shared_evaluator(problem, runtime);
        let orchestrator = SsaOrchestrator::new(
            self.config.ssa.clone(),
            evaluator.clone(),
            component_seed(runtime, 3),
        )?;
        let engine = HyperEvolutionEngine::new(
            self.config.evolution.clone(),
            self.gene_space.clone(),
            Box::new(orchestrator),
            component_seed(runtime, 0),
        )?;

        run_engine(engine, &evaluator, &mut self.observer)
    }
}
