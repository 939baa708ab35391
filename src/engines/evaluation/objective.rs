use crate::error::{HyperError, Result};
use crate::types::Bounds;
use std::fmt;

/// The user objective. Must be deterministic and side-effect-free so results can be cached.
pub trait Objective: Send + Sync {
    fn evaluate(&self, x: &[f64]) -> Result<f64>;
}

impl<F> Objective for F
where
    F: Fn(&[f64]) -> f64 + Send + Sync,
{
    fn evaluate(&self, x: &[f64]) -> Result<f64> {
        Ok(self(x))
    }
}

/// Adapts an objective that can fail; its error aborts the run as `HyperError::Evaluation`.
pub struct FallibleObjective<F>(pub F);

impl<F, E> Objective for FallibleObjective<F>
where
    F: Fn(&[f64]) -> std::result::Result<f64, E> + Send + Sync,
    E: fmt::Display,
{
    fn evaluate(&self, x: &[f64]) -> Result<f64> {
        (self.0)(x).map_err(|e| HyperError::Evaluation(e.to_string()))
    }
}

/// Objective function together with its dimensionality and bounds.
pub struct Problem {
    objective: Box<dyn Objective>,
    dimensions: usize,
    bounds: Bounds,
}

impl Problem {
    pub fn new<O>(objective: O, dimensions: usize, bounds: Bounds) -> Result<Self>
    where
        O: Objective + 'static,
    {
        if dimensions == 0 {
            return Err(HyperError::config("dimensions", dimensions, "must be positive"));
        }
        if bounds.lower.len() != dimensions {
            return Err(HyperError::config(
                "bounds.lower",
                bounds.lower.len(),
                format!("length must equal dimensions ({})", dimensions),
            ));
        }
        if bounds.upper.len() != dimensions {
            return Err(HyperError::config(
                "bounds.upper",
                bounds.upper.len(),
                format!("length must equal dimensions ({})", dimensions),
            ));
        }
        for d in 0..dimensions {
            let (lo, hi) = (bounds.lower[d], bounds.upper[d]);
            if !lo.is_finite() || !hi.is_finite() || lo > hi {
                return Err(HyperError::config(
                    format!("bounds[{}]", d),
                    format!("({}, {})", lo, hi),
                    "bounds must be finite with lower <= upper",
                ));
            }
        }

        Ok(Self {
            objective: Box::new(objective),
            dimensions,
            bounds,
        })
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    pub fn objective(&self) -> &dyn Objective {
        self.objective.as_ref()
    }
}

impl fmt::Debug for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Problem")
            .field("dimensions", &self.dimensions)
            .field("bounds", &self.bounds)
            .finish()
    }
}
