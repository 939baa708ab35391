use super::objective::Objective;
use crate::error::Result;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

/// Immutable value snapshot of an objective input.
///
/// `-0.0` and `0.0` share a key, as do all NaN payloads.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(Box<[u64]>);

impl CacheKey {
    pub fn from_slice(x: &[f64]) -> Self {
        CacheKey(x.iter().map(|&v| canonical_bits(v)).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn canonical_bits(v: f64) -> u64 {
    if v == 0.0 {
        0.0f64.to_bits()
    } else if v.is_nan() {
        f64::NAN.to_bits()
    } else {
        v.to_bits()
    }
}

/// Memoizes objective results for the lifetime of one run. No eviction.
///
/// Reads are concurrent. Two workers missing on the same key at the same time
/// may both invoke the objective.
#[derive(Debug, Default)]
pub struct EvaluationCache {
    entries: RwLock<HashMap<CacheKey, f64>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl EvaluationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, x: &[f64]) -> Option<f64> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(&CacheKey::from_slice(x)).copied()
    }

    /// Returns the cached value for `x`, invoking `objective` only on a miss.
    /// Objective errors propagate and nothing is stored.
    pub fn evaluate(&self, objective: &dyn Objective, x: &[f64]) -> Result<f64> {
        let key = CacheKey::from_slice(x);
        {
            let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
            if let Some(&value) = entries.get(&key) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Ok(value);
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let value = objective.evaluate(x)?;

        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.entry(key).or_insert(value);
        Ok(value)
    }

    /// Scalar inputs are stored as one-element vectors.
    pub fn evaluate_scalar(&self, objective: &dyn Objective, x: f64) -> Result<f64> {
        self.evaluate(objective, std::slice::from_ref(&x))
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }

    /// Number of objective invocations made through the cache.
    pub fn misses(&self) -> usize {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
