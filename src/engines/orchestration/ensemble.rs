//! Ensemble combinator: runs several orchestrators on the same population and merges
//! their fitness into one signal.
//!
//! Each contributor's fitness vector is standardized on its own, flipped when its
//! direction disagrees with the ensemble's, and averaged with fixed weights. Global
//! particles are compared, never merged.

use super::traits::{
    BestParticles, ControlKnob, OrchestrationDiagnostics, OrchestrationResult, Orchestrator,
};
use crate::engines::generation::genome::Genome;
use crate::error::{HyperError, Result};
use crate::types::{OptimizationDirection, Particle};
use rayon::prelude::*;

pub struct EnsembleOrchestrator {
    name: String,
    members: Vec<Box<dyn Orchestrator>>,
    weights: Vec<f64>,
    direction: OptimizationDirection,
}

impl EnsembleOrchestrator {
    /// Equal weights over at least two contributors.
    pub fn new(members: Vec<Box<dyn Orchestrator>>, maximize: bool) -> Result<Self> {
        let weights = vec![1.0; members.len()];
        Self::with_weights(members, weights, maximize)
    }

    pub fn with_weights(
        members: Vec<Box<dyn Orchestrator>>,
        weights: Vec<f64>,
        maximize: bool,
    ) -> Result<Self> {
        if members.len() < 2 {
            return Err(HyperError::config(
                "ensemble.members",
                members.len(),
                "an ensemble needs at least two orchestrators",
            ));
        }
        if weights.len() != members.len() {
            return Err(HyperError::config(
                "ensemble.weights",
                weights.len(),
                format!("expected one weight per member ({})", members.len()),
            ));
        }
        let total: f64 = weights.iter().sum();
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) || total <= 0.0 {
            return Err(HyperError::config(
                "ensemble.weights",
                format!("{:?}", weights),
                "weights must be non-negative, finite and not all zero",
            ));
        }

        let name = format!(
            "Ensemble({})",
            members.iter().map(|m| m.name()).collect::<Vec<_>>().join("+")
        );
        let weights = weights.into_iter().map(|w| w / total).collect();

        Ok(Self {
            name,
            members,
            weights,
            direction: OptimizationDirection::from_maximize(maximize),
        })
    }

    pub fn members(&self) -> &[Box<dyn Orchestrator>] {
        &self.members
    }

    /// Normalised weights, summing to 1.
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    fn combine(&self, results: &[OrchestrationResult], population_size: usize) -> Result<Vec<f64>> {
        let mut vectors = Vec::with_capacity(results.len());
        for (member, result) in self.members.iter().zip(results) {
            let aligned = align(&result.fitness, population_size).map_err(|e| {
                HyperError::Combination(format!("{}: {}", member.name(), e))
            })?;
            let mut z = standardize(&aligned);
            if member.direction() != self.direction {
                z.iter_mut().for_each(|v| *v = -*v);
            }
            vectors.push(z);
        }
        weighted_average(&vectors, &self.weights, population_size)
    }
}

/// `(x − mean) / std` with the population standard deviation.
///
/// A zero deviation only centres the values. Non-finite entries are left out of the
/// statistics and placed one unit beyond the most extreme standardized value on their side.
pub fn standardize(values: &[f64]) -> Vec<f64> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return vec![0.0; values.len()];
    }

    let n = finite.len() as f64;
    let mean = finite.iter().sum::<f64>() / n;
    let std = (finite.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt();
    let scale = |v: f64| if std == 0.0 { v - mean } else { (v - mean) / std };

    let max_z = finite.iter().map(|&v| scale(v)).fold(f64::NEG_INFINITY, f64::max);
    let min_z = finite.iter().map(|&v| scale(v)).fold(f64::INFINITY, f64::min);

    values
        .iter()
        .map(|&v| {
            if v.is_finite() {
                scale(v)
            } else if v == f64::NEG_INFINITY {
                min_z - 1.0
            } else {
                max_z + 1.0
            }
        })
        .collect()
}

/// Truncates to `len`; a shorter vector cannot be aligned.
pub fn align(values: &[f64], len: usize) -> Result<Vec<f64>> {
    if values.len() < len {
        return Err(HyperError::Combination(format!(
            "fitness vector has {} entries, population has {}",
            values.len(),
            len
        )));
    }
    Ok(values[..len].to_vec())
}

pub fn weighted_average(vectors: &[Vec<f64>], weights: &[f64], len: usize) -> Result<Vec<f64>> {
    if vectors.len() != weights.len() {
        return Err(HyperError::Combination(format!(
            "{} vectors for {} weights",
            vectors.len(),
            weights.len()
        )));
    }
    let mut combined = vec![0.0; len];
    for (vector, &w) in vectors.iter().zip(weights) {
        if vector.len() != len {
            return Err(HyperError::Combination(format!(
                "shape mismatch: {} vs {}",
                vector.len(),
                len
            )));
        }
        for (c, v) in combined.iter_mut().zip(vector) {
            *c += w * v;
        }
    }
    combined.truncate(len);
    Ok(combined)
}

impl Orchestrator for EnsembleOrchestrator {
    fn name(&self) -> &str {
        &self.name
    }

    fn direction(&self) -> OptimizationDirection {
        self.direction
    }

    fn orchestrate(
        &mut self,
        population: &[Genome],
        tournament_size: Option<usize>,
    ) -> Result<OrchestrationResult> {
        // Every member owns its RNG, so running them concurrently cannot change results
        let results: Vec<OrchestrationResult> = self
            .members
            .par_iter_mut()
            .map(|member| member.orchestrate(population, tournament_size))
            .collect::<Result<Vec<_>>>()?;

        let mut diagnostics = OrchestrationDiagnostics::default();
        for result in &results {
            diagnostics.absorb(&result.diagnostics);
        }

        let fitness = match self.combine(&results, population.len()) {
            Ok(fitness) => fitness,
            Err(e) => {
                log::warn!("{}: {}; using a neutral fitness vector this generation", self.name, e);
                diagnostics.combination_fallback = Some(e.to_string());
                vec![0.0; population.len()]
            }
        };

        let global_particle = results
            .iter()
            .map(|r| &r.global_particle)
            .fold(None::<&Particle>, |best, p| match best {
                Some(b) if !self.direction.is_better(p.value, b.value) => Some(b),
                _ => Some(p),
            })
            .cloned()
            .unwrap_or_else(|| Particle::worst(0, self.direction));

        let best_particles =
            BestParticles::Ensemble(results.into_iter().map(|r| r.best_particles).collect());

        Ok(OrchestrationResult {
            best_particles,
            fitness,
            global_particle,
            diagnostics,
        })
    }

    fn knob(&self, knob: ControlKnob) -> Option<f64> {
        self.members.iter().find_map(|m| m.knob(knob))
    }

    fn set_knob(&mut self, knob: ControlKnob, value: f64) -> bool {
        let mut applied = false;
        for member in self.members.iter_mut() {
            applied |= member.set_knob(knob, value);
        }
        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standardize_constant_is_zero() {
        assert_eq!(standardize(&[4.0, 4.0, 4.0]), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_standardize_unit_variance() {
        let z = standardize(&[1.0, 2.0, 3.0]);
        let mean: f64 = z.iter().sum::<f64>() / 3.0;
        let var: f64 = z.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / 3.0;
        assert!(mean.abs() < 1e-12);
        assert!((var - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_standardize_places_sentinels_at_the_extremes() {
        let z = standardize(&[1.0, f64::INFINITY, 3.0, f64::NEG_INFINITY]);
        assert!(z.iter().all(|v| v.is_finite()));
        assert!((z[1] - 2.0).abs() < 1e-12);
        assert!((z[3] + 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_align_truncates_excess() {
        assert_eq!(align(&[1.0, 2.0, 3.0], 2).unwrap(), vec![1.0, 2.0]);
        assert!(align(&[1.0], 2).is_err());
    }

    #[test]
    fn test_weighted_average_shape_mismatch() {
        let vectors = vec![vec![1.0, 1.0], vec![1.0]];
        assert!(weighted_average(&vectors, &[0.5, 0.5], 2).is_err());
        let vectors = vec![vec![1.0, 3.0], vec![3.0, 1.0]];
        assert_eq!(weighted_average(&vectors, &[0.5, 0.5], 2).unwrap(), vec![2.0, 2.0]);
    }
}
