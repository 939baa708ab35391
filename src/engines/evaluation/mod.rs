pub mod cache;
pub mod evaluator;
pub mod objective;

pub use cache::{CacheKey, EvaluationCache};
pub use evaluator::Evaluator;
pub use objective::{FallibleObjective, Objective, Problem};
