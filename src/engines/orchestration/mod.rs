pub mod de;
pub mod ensemble;
pub mod guard;
pub(crate) mod mapping;
pub mod pso;
pub mod ssa;
pub mod traits;

pub use de::{DeOrchestrator, DeStrategy};
pub use ensemble::EnsembleOrchestrator;
pub use guard::FitnessGuard;
pub use pso::PsoOrchestrator;
pub use ssa::SsaOrchestrator;
pub use traits::{
    BestParticles, ControlKnob, OrchestrationDiagnostics, OrchestrationResult, Orchestrator,
};
