pub mod config;
pub mod engines;
pub mod error;
pub mod heuristics;
pub mod types;

pub use error::{HyperError, Result};
