use super::{component_seed, run_engine, shared_evaluator, HyperHeuristic};
use crate::config::AppConfig;
use crate::engines::evaluation::Problem;
use crate::engines::generation::{
    GeneSpace, GeneSpec, GenerationObserver, HyperEvolutionEngine, InertiaDecay, RunOutcome,
};
use crate::engines::orchestration::PsoOrchestrator;
use crate::error::Result;

/// `[c1, c2, w]` with `c1, c2 ∈ [0.5, 2.5]` and `w ∈ [0.3, 0.9]`.
pub fn pso_gene_space() -> GeneSpace {
    GeneSpace::new(vec![
        GeneSpec::continuous(0.5, 2.5),
        GeneSpec::continuous(0.5, 2.5),
        GeneSpec::continuous(0.3, 0.9),
    ])
}

/// Outer GA over PSO control genomes, with the inertia ceiling decaying 1% per generation.
pub struct PsoHyperHeuristic {
    config: AppConfig,
    gene_space: GeneSpace,
    decay: InertiaDecay,
    observer: Option<Box<dyn GenerationObserver>>,
}

impl PsoHyperHeuristic {
    pub fn new(mut config: AppConfig) -> Self {
        if config.evolution.mutation_probability.is_none() {
            config.evolution.mutation_probability = Some(0.2);
        }
        if config.evolution.crossover_probability.is_none() {
            config.evolution.crossover_probability = Some(0.8);
        }
        Self {
            config,
            gene_space: pso_gene_space(),
            decay: InertiaDecay::default(),
            observer: None,
        }
    }

    pub fn with_gene_space(mut self, gene_space: GeneSpace) -> Self {
        self.gene_space = gene_space;
        self
    }

    pub fn with_decay(mut self, decay: InertiaDecay) -> Self {
        self.decay = decay;
        self
    }

    pub fn with_observer(mut self, observer: impl GenerationObserver + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

impl HyperHeuristic for PsoHyperHeuristic {
    fn name(&self) -> &str {
        "PSO hyper-heuristic"
    }

    fn optimize(&mut self, problem: Problem) -> Result<RunOutcome> {
        let runtime = &self.config.runtime;
        let evaluator = shared_evaluator(problem, runtime);
        let orchestrator = PsoOrchestrator::new(
            self.config.pso.clone(),
            evaluator.clone(),
            component_seed(runtime, 1),
        )?;
        let engine = HyperEvolutionEngine::new(
            self.config.evolution.clone(),
            self.gene_space.clone(),
            Box::new(orchestrator),
            component_seed(runtime, 0),
        )?
        .with_schedule(self.decay);

        run_engine(engine, &evaluator, &mut self.observer)
    }
}
