use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Defines whether an objective should be maximized or minimized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OptimizationDirection {
    Maximize,
    #[default]
    Minimize,
}

impl OptimizationDirection {
    pub fn from_maximize(maximize: bool) -> Self {
        if maximize {
            OptimizationDirection::Maximize
        } else {
            OptimizationDirection::Minimize
        }
    }

    pub fn is_maximize(self) -> bool {
        self == OptimizationDirection::Maximize
    }

    /// Value substituted for non-finite fitness so it never wins selection.
    pub fn sentinel(self) -> f64 {
        match self {
            OptimizationDirection::Minimize => f64::INFINITY,
            OptimizationDirection::Maximize => f64::NEG_INFINITY,
        }
    }

    /// Worst possible starting value for a running best.
    pub fn worst(self) -> f64 {
        self.sentinel()
    }

    /// True when `a` is strictly better than `b`.
    pub fn is_better(self, a: f64, b: f64) -> bool {
        match self {
            OptimizationDirection::Minimize => a < b,
            OptimizationDirection::Maximize => a > b,
        }
    }

    /// Ordering that sorts the best value first.
    pub fn compare(self, a: f64, b: f64) -> Ordering {
        let ord = a.partial_cmp(&b).unwrap_or(Ordering::Equal);
        match self {
            OptimizationDirection::Minimize => ord,
            OptimizationDirection::Maximize => ord.reverse(),
        }
    }

    /// Index of the best entry, `None` for an empty slice.
    pub fn best_index(self, values: &[f64]) -> Option<usize> {
        values
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| self.compare(**a, **b))
            .map(|(i, _)| i)
    }

    pub fn best_of(self, a: f64, b: f64) -> f64 {
        if self.is_better(b, a) {
            b
        } else {
            a
        }
    }
}

/// A candidate solution to the objective problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub position: Vec<f64>,
    pub value: f64,
}

impl Particle {
    pub fn new(position: Vec<f64>, value: f64) -> Self {
        Self { position, value }
    }

    /// Placeholder particle holding the worst value for `direction`.
    pub fn worst(dimensions: usize, direction: OptimizationDirection) -> Self {
        Self {
            position: vec![0.0; dimensions],
            value: direction.worst(),
        }
    }
}

/// Per-dimension lower and upper bounds of the objective problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

impl Bounds {
    pub fn new(lower: Vec<f64>, upper: Vec<f64>) -> Self {
        Self { lower, upper }
    }

    /// Same `[low, high]` range on every dimension.
    pub fn uniform(dimensions: usize, low: f64, high: f64) -> Self {
        Self {
            lower: vec![low; dimensions],
            upper: vec![high; dimensions],
        }
    }

    pub fn range(&self, d: usize) -> f64 {
        self.upper[d] - self.lower[d]
    }

    #[inline]
    pub fn clamp(&self, position: &mut [f64]) {
        for (d, x) in position.iter_mut().enumerate() {
            *x = x.clamp(self.lower[d], self.upper[d]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_comparisons() {
        let min = OptimizationDirection::Minimize;
        let max = OptimizationDirection::Maximize;

        assert!(min.is_better(1.0, 2.0));
        assert!(max.is_better(2.0, 1.0));
        assert_eq!(min.best_index(&[3.0, 1.0, 2.0]), Some(1));
        assert_eq!(max.best_index(&[3.0, 1.0, 2.0]), Some(0));
        assert_eq!(min.best_index(&[]), None);
    }

    #[test]
    fn test_sentinel_never_wins() {
        let min = OptimizationDirection::Minimize;
        assert!(!min.is_better(min.sentinel(), 1e300));

        let max = OptimizationDirection::Maximize;
        assert!(!max.is_better(max.sentinel(), -1e300));
    }

    #[test]
    fn test_bounds_clamp() {
        let bounds = Bounds::uniform(3, -1.0, 1.0);
        let mut x = vec![-5.0, 0.5, 7.0];
        bounds.clamp(&mut x);
        assert_eq!(x, vec![-1.0, 0.5, 1.0]);
    }
}
