use crate::types::OptimizationDirection;

/// Replaces non-finite fitness with the direction's sentinel and counts each substitution.
#[derive(Debug, Clone, Copy)]
pub struct FitnessGuard {
    direction: OptimizationDirection,
    substitutions: usize,
}

impl FitnessGuard {
    pub fn new(direction: OptimizationDirection) -> Self {
        Self {
            direction,
            substitutions: 0,
        }
    }

    pub fn check(&mut self, value: f64) -> f64 {
        if value.is_finite() {
            return value;
        }
        self.substitutions += 1;
        let sentinel = self.direction.sentinel();
        log::warn!("Non-finite fitness {} replaced with sentinel {}", value, sentinel);
        sentinel
    }

    /// Sanitizes in place. Entries already equal to the sentinel are left uncounted.
    pub fn check_all(&mut self, values: &mut [f64]) {
        let sentinel = self.direction.sentinel();
        for v in values.iter_mut() {
            if *v != sentinel {
                *v = self.check(*v);
            }
        }
    }

    pub fn substitutions(&self) -> usize {
        self.substitutions
    }
}
