pub mod evolution_engine;
pub mod genome;
pub mod operators;
pub mod progress;
pub mod scheduler;

pub use evolution_engine::{GenerationRecord, HyperEvolutionEngine, RunOutcome, StopReason};
pub use genome::{GeneSpace, GeneSpec, Genome};
pub use progress::{
    ChannelObserver, ConsoleObserver, GenerationObserver, GenerationSnapshot, HistoryRecorder,
    NoopObserver, ProgressMessage,
};
pub use scheduler::{
    FixedTournament, InertiaDecay, LinearTournament, MutationControls, ParameterSchedule,
    ScheduleChain, StepRule, StepSchedule, StepTarget, TournamentSchedule,
};
