/// Genome representation for the outer genetic algorithm
///
/// A genome is the hyperparameter vector of one inner metaheuristic agent. Each gene
/// is read positionally by the orchestrator driving that agent:
/// - PSO: `[c1, c2, w]`
/// - DE: `[F, CR, strategy_index]`
/// - SSA: `[leader_ratio, exploration_scale]`
///
/// Discrete genes (like the DE strategy index) are stored as integral `f64` values so
/// crossover and mutation stay plain slice operations.
///
/// # Example
///
/// ```
/// use hyperheuristic::engines::generation::genome::{GeneSpace, GeneSpec};
///
/// let space = GeneSpace::new(vec![
///     GeneSpec::continuous(0.0, 1.0),
///     GeneSpec::continuous(0.0, 1.0),
///     GeneSpec::int_range(0, 5),
/// ]);
/// assert!(space.validate().is_ok());
/// assert_eq!(space.len(), 3);
/// ```
pub type Genome = Vec<f64>;

use crate::error::{HyperError, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Admissible values of one gene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GeneSpec {
    /// Uniform in `[low, high]`
    Continuous { low: f64, high: f64 },
    /// Uniform over the listed values
    Discrete(Vec<f64>),
}

impl GeneSpec {
    pub fn continuous(low: f64, high: f64) -> Self {
        GeneSpec::Continuous { low, high }
    }

    /// Integers `lo..=hi` as a discrete set.
    pub fn int_range(lo: i64, hi: i64) -> Self {
        GeneSpec::Discrete((lo..=hi).map(|v| v as f64).collect())
    }

    pub fn sample<R: Rng>(&self, rng: &mut R) -> f64 {
        match self {
            GeneSpec::Continuous { low, high } if low < high => rng.gen_range(*low..=*high),
            GeneSpec::Continuous { low, .. } => *low,
            GeneSpec::Discrete(values) => values[rng.gen_range(0..values.len())],
        }
    }

    /// Whether `value` is an admissible gene.
    pub fn contains(&self, value: f64) -> bool {
        match self {
            GeneSpec::Continuous { low, high } => (*low..=*high).contains(&value),
            GeneSpec::Discrete(values) => values.contains(&value),
        }
    }

    fn validate(&self, index: usize) -> Result<()> {
        match self {
            GeneSpec::Continuous { low, high } => {
                if !low.is_finite() || !high.is_finite() || low > high {
                    return Err(HyperError::config(
                        format!("gene_space[{}]", index),
                        format!("[{}, {}]", low, high),
                        "continuous bounds must be finite with low <= high",
                    ));
                }
            }
            GeneSpec::Discrete(values) => {
                if values.is_empty() || values.iter().any(|v| !v.is_finite()) {
                    return Err(HyperError::config(
                        format!("gene_space[{}]", index),
                        format!("{:?}", values),
                        "discrete set must be non-empty and finite",
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Ordered gene specs; its length is the genome length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneSpace {
    genes: Vec<GeneSpec>,
}

impl GeneSpace {
    pub fn new(genes: Vec<GeneSpec>) -> Self {
        Self { genes }
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    pub fn genes(&self) -> &[GeneSpec] {
        &self.genes
    }

    pub fn validate(&self) -> Result<()> {
        if self.genes.is_empty() {
            return Err(HyperError::config("gene_space", 0, "must contain at least one gene"));
        }
        for (i, spec) in self.genes.iter().enumerate() {
            spec.validate(i)?;
        }
        Ok(())
    }

    /// Random genome drawn gene by gene.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> Genome {
        self.genes.iter().map(|spec| spec.sample(rng)).collect()
    }

    /// Redraws gene `index` of `genome` from its spec.
    pub fn resample<R: Rng>(&self, genome: &mut Genome, index: usize, rng: &mut R) {
        if let (Some(spec), Some(gene)) = (self.genes.get(index), genome.get_mut(index)) {
            *gene = spec.sample(rng);
        }
    }

    pub fn contains(&self, genome: &[f64]) -> bool {
        genome.len() == self.genes.len()
            && self.genes.iter().zip(genome).all(|(spec, g)| spec.contains(*g))
    }
}
