use super::traits::{
    require_positive, require_probability, ConfigManifest, ConfigSection, FieldManifest,
};
use crate::error::HyperError;
use serde::{Deserialize, Serialize};

/// Outer genetic-algorithm knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionConfig {
    pub population_size: usize,
    pub num_generations: usize,
    pub num_parents_mating: usize,
    /// Elitism count: top genomes copied unchanged into the next generation
    pub keep_parents: usize,
    pub selection_method: SelectionMethod,
    pub k_tournament: usize,
    pub crossover_type: CrossoverType,
    /// `None` always recombines, as pygad does without a probability
    pub crossover_probability: Option<f64>,
    /// When set, every gene mutates with this probability and `mutation_num_genes` is ignored
    pub mutation_probability: Option<f64>,
    pub mutation_num_genes: usize,
    pub early_stopping_rounds: Option<usize>,
    /// Inner tournament size ramped linearly over the run. `None` uses the global best.
    pub inner_tournament: Option<InnerTournament>,
}

/// Tournament size at the first and the last generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InnerTournament {
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionMethod {
    SteadyState,
    Tournament,
    Rank,
    Random,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CrossoverType {
    SinglePoint,
    TwoPoints,
    Uniform,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            population_size: 10,
            num_generations: 40,
            num_parents_mating: 5,
            keep_parents: 5,
            selection_method: SelectionMethod::SteadyState,
            k_tournament: 3,
            crossover_type: CrossoverType::SinglePoint,
            crossover_probability: None,
            mutation_probability: None,
            mutation_num_genes: 1,
            early_stopping_rounds: None,
            inner_tournament: None,
        }
    }
}

impl EvolutionConfig {
    /// Checks that depend on the genome length, run once the gene space is known.
    pub fn validate_for_genes(&self, num_genes: usize) -> Result<(), HyperError> {
        require_positive("num_genes", num_genes)?;
        if self.mutation_probability.is_none() && self.mutation_num_genes > num_genes {
            return Err(HyperError::config(
                "mutation_num_genes",
                self.mutation_num_genes,
                format!("cannot exceed the number of genes ({})", num_genes),
            ));
        }
        Ok(())
    }
}

impl ConfigSection for EvolutionConfig {
    fn section_name() -> &'static str {
        "evolution"
    }

    fn validate(&self) -> Result<(), HyperError> {
        require_positive("population_size", self.population_size)?;
        require_positive("num_generations", self.num_generations)?;
        require_positive("num_parents_mating", self.num_parents_mating)?;
        if self.num_parents_mating > self.population_size {
            return Err(HyperError::config(
                "num_parents_mating",
                self.num_parents_mating,
                format!("cannot exceed population_size ({})", self.population_size),
            ));
        }
        if self.keep_parents > self.population_size {
            return Err(HyperError::config(
                "keep_parents",
                self.keep_parents,
                format!("cannot exceed population_size ({})", self.population_size),
            ));
        }
        if self.selection_method == SelectionMethod::Tournament {
            require_positive("k_tournament", self.k_tournament)?;
        }
        if let Some(p) = self.crossover_probability {
            require_probability("crossover_probability", p)?;
        }
        match self.mutation_probability {
            Some(p) => {
                require_probability("mutation_probability", p)?;
                if p == 0.0 {
                    return Err(HyperError::config("mutation_probability", p, "must be positive"));
                }
            }
            None => require_positive("mutation_num_genes", self.mutation_num_genes)?,
        }
        if let Some(rounds) = self.early_stopping_rounds {
            require_positive("early_stopping_rounds", rounds)?;
        }
        if let Some(tournament) = self.inner_tournament {
            require_positive("inner_tournament.start", tournament.start)?;
            require_positive("inner_tournament.end", tournament.end)?;
        }
        Ok(())
    }

    fn to_manifest(&self) -> ConfigManifest {
        ConfigManifest {
            section: "Evolution".to_string(),
            fields: vec![
                FieldManifest::new(
                    "population_size",
                    "integer",
                    serde_json::json!(self.population_size),
                    Some(1.0),
                    None,
                    "Number of hyperparameter genomes per generation",
                ),
                FieldManifest::new(
                    "num_generations",
                    "integer",
                    serde_json::json!(self.num_generations),
                    Some(1.0),
                    None,
                    "Generation budget of the outer loop",
                ),
                FieldManifest::new(
                    "num_parents_mating",
                    "integer",
                    serde_json::json!(self.num_parents_mating),
                    Some(1.0),
                    None,
                    "Parents selected for recombination each generation",
                ),
                FieldManifest::new(
                    "keep_parents",
                    "integer",
                    serde_json::json!(self.keep_parents),
                    Some(0.0),
                    None,
                    "Elite genomes surviving unchanged",
                ),
                FieldManifest::new(
                    "crossover_probability",
                    "float",
                    serde_json::json!(self.crossover_probability),
                    Some(0.0),
                    Some(1.0),
                    "Probability a selected parent is recombined",
                ),
                FieldManifest::new(
                    "mutation_probability",
                    "float",
                    serde_json::json!(self.mutation_probability),
                    Some(0.0),
                    Some(1.0),
                    "Per-gene mutation probability",
                ),
                FieldManifest::new(
                    "mutation_num_genes",
                    "integer",
                    serde_json::json!(self.mutation_num_genes),
                    Some(1.0),
                    None,
                    "Genes resampled per offspring when no probability is set",
                ),
                FieldManifest::new(
                    "early_stopping_rounds",
                    "integer",
                    serde_json::json!(self.early_stopping_rounds),
                    Some(1.0),
                    None,
                    "Generations without improvement before stopping",
                ),
                FieldManifest::new(
                    "inner_tournament",
                    "object",
                    serde_json::json!(self.inner_tournament),
                    None,
                    None,
                    "Inner tournament size from start to end over the run",
                ),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(EvolutionConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_population_names_parameter() {
        let config = EvolutionConfig {
            population_size: 0,
            ..Default::default()
        };
        match config.validate() {
            Err(HyperError::Configuration { parameter, value, .. }) => {
                assert_eq!(parameter, "population_size");
                assert_eq!(value, "0");
            }
            other => panic!("expected configuration error, got {:?}", other),
        }
    }

    #[test]
    fn test_mutation_num_genes_must_fit_genome() {
        let config = EvolutionConfig {
            mutation_num_genes: 4,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
        assert!(config.validate_for_genes(3).is_err());
        assert!(config.validate_for_genes(4).is_ok());
    }

    #[test]
    fn test_inner_tournament_sizes_must_be_positive() {
        let config = EvolutionConfig {
            inner_tournament: Some(InnerTournament { start: 0, end: 4 }),
            ..Default::default()
        };
        match config.validate() {
            Err(HyperError::Configuration { parameter, .. }) => {
                assert_eq!(parameter, "inner_tournament.start")
            }
            other => panic!("expected configuration error, got {:?}", other),
        }
    }

    #[test]
    fn test_probability_range() {
        let config = EvolutionConfig {
            mutation_probability: Some(1.5),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
