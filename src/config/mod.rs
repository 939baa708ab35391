pub mod traits;
pub mod evolution;
pub mod orchestrator;
pub mod runtime;
pub mod manager;

pub use manager::{ConfigManager, AppConfig};
pub use evolution::{EvolutionConfig, InnerTournament, SelectionMethod, CrossoverType};
pub use orchestrator::{DeConfig, EnsembleConfig, MappingPolicy, OrchestratorKind, PsoConfig, SsaConfig};
pub use runtime::RuntimeConfig;
pub use traits::ConfigSection;
