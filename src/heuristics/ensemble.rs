use super::de::de_gene_space;
use super::{component_seed, run_engine, shared_evaluator, HyperHeuristic};
use crate::config::{AppConfig, OrchestratorKind};
use crate::engines::evaluation::{Evaluator, Problem};
use crate::engines::generation::{
    GeneSpace, GenerationObserver, HyperEvolutionEngine, InertiaDecay, RunOutcome,
};
use crate::engines::orchestration::{
    DeOrchestrator, EnsembleOrchestrator, Orchestrator, PsoOrchestrator, SsaOrchestrator,
};
use crate::error::Result;
use std::sync::Arc;

/// Outer GA scored by several inner optimizers at once.
///
/// Every member reads the same genome positionally, so the default gene space is the DE
/// layout (the default first member). The PSO inertia ceiling still decays when PSO is
/// among the members; the decay is a no-op otherwise.
///
/// With the DE layout a PSO member reads `strategy_index` (0 to 5) as its `w` gene, so any
/// index of 1 or more leaves `w` pinned at the decaying inertia ceiling. Pass a gene space
/// through `with_gene_space` when PSO's `w` should be evolved.
pub struct EnsembleHyperHeuristic {
    config: AppConfig,
    gene_space: GeneSpace,
    observer: Option<Box<dyn GenerationObserver>>,
}

impl EnsembleHyperHeuristic {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            gene_space: de_gene_space(),
            observer: None,
        }
    }

    pub fn with_gene_space(mut self, gene_space: GeneSpace) -> Self {
        self.gene_space = gene_space;
        self
    }

    pub fn with_observer(mut self, observer: impl GenerationObserver + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    fn member(
        &self,
        kind: OrchestratorKind,
        evaluator: &Arc<Evaluator>,
        index: u64,
    ) -> Result<Box<dyn Orchestrator>> {
        let runtime = &self.config.runtime;
        let seed = component_seed(runtime, 10 + index);
        Ok(match kind {
            OrchestratorKind::Pso => {
                Box::new(PsoOrchestrator::new(self.config.pso.clone(), evaluator.clone(), seed)?)
            }
            OrchestratorKind::De => {
                Box::new(DeOrchestrator::new(self.config.de.clone(), evaluator.clone(), seed)?)
            }
            OrchestratorKind::Ssa => {
                Box::new(SsaOrchestrator::new(self.config.ssa.clone(), evaluator.clone(), seed)?)
            }
        })
    }
}

impl HyperHeuristic for EnsembleHyperHeuristic {
    fn name(&self) -> &str {
        "Ensemble hyper-heuristic"
    }

    fn optimize(&mut self, problem: Problem) -> Result<RunOutcome> {
        let evaluator = shared_evaluator(problem, &self.config.runtime);
        let members = self
            .config
            .ensemble
            .members
            .iter()
            .enumerate()
            .map(|(i, kind)| self.member(*kind, &evaluator, i as u64))
            .collect::<Result<Vec<_>>>()?;

        let ensemble = if self.config.ensemble.weights.is_empty() {
            EnsembleOrchestrator::new(members, self.config.ensemble.maximize)?
        } else {
            EnsembleOrchestrator::with_weights(
                members,
                self.config.ensemble.weights.clone(),
                self.config.ensemble.maximize,
            )?
        };

        let engine = HyperEvolutionEngine::new(
            self.config.evolution.clone(),
            self.gene_space.clone(),
            Box::new(ensemble),
            component_seed(&self.config.runtime, 0),
        )?
        .with_schedule(InertiaDecay::default());

        run_engine(engine, &evaluator, &mut self.observer)
    }
}
