use super::traits::{
    require_finite_positive, require_positive, require_probability, ConfigManifest,
    ConfigSection, FieldManifest,
};
use crate::error::HyperError;
use serde::{Deserialize, Serialize};

/// How outer genomes are mapped onto inner-optimizer runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum MappingPolicy {
    /// One inner run per call; genomes drive the inner agents round-robin.
    #[default]
    AgentPerGenome,
    /// One full inner run per genome.
    RunPerGenome,
}

/// Inner optimizer families an ensemble can be assembled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrchestratorKind {
    De,
    Pso,
    Ssa,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PsoConfig {
    pub swarm_size: usize,
    /// Live ceiling on every agent's inertia; decays under `InertiaDecay`
    pub inertia_weight: f64,
    pub cognitive_constant: f64,
    pub social_constant: f64,
    /// Velocity limit as a fraction of each dimension's range
    pub max_velocity: f64,
    pub iterations: usize,
    pub mapping: MappingPolicy,
    pub maximize: bool,
}

impl Default for PsoConfig {
    fn default() -> Self {
        Self {
            swarm_size: 30,
            inertia_weight: 0.7,
            cognitive_constant: 1.5,
            social_constant: 1.5,
            max_velocity: 0.5,
            iterations: 40,
            mapping: MappingPolicy::AgentPerGenome,
            maximize: false,
        }
    }
}

impl ConfigSection for PsoConfig {
    fn section_name() -> &'static str {
        "pso"
    }

    fn validate(&self) -> Result<(), HyperError> {
        require_positive("pso.swarm_size", self.swarm_size)?;
        require_positive("pso.iterations", self.iterations)?;
        require_finite_positive("pso.inertia_weight", self.inertia_weight)?;
        require_finite_positive("pso.max_velocity", self.max_velocity)?;
        if !self.cognitive_constant.is_finite() || self.cognitive_constant < 0.0 {
            return Err(HyperError::config(
                "pso.cognitive_constant",
                self.cognitive_constant,
                "must be a non-negative finite number",
            ));
        }
        if !self.social_constant.is_finite() || self.social_constant < 0.0 {
            return Err(HyperError::config(
                "pso.social_constant",
                self.social_constant,
                "must be a non-negative finite number",
            ));
        }
        Ok(())
    }

    fn to_manifest(&self) -> ConfigManifest {
        ConfigManifest {
            section: "PSO".to_string(),
            fields: vec![
                FieldManifest::new(
                    "swarm_size",
                    "integer",
                    serde_json::json!(self.swarm_size),
                    Some(1.0),
                    None,
                    "Inner swarm size (raised to the outer population size if smaller)",
                ),
                FieldManifest::new(
                    "inertia_weight",
                    "float",
                    serde_json::json!(self.inertia_weight),
                    Some(0.0),
                    None,
                    "Ceiling on the per-agent inertia weight",
                ),
                FieldManifest::new(
                    "max_velocity",
                    "float",
                    serde_json::json!(self.max_velocity),
                    Some(0.0),
                    None,
                    "Velocity limit as a fraction of the dimension range",
                ),
                FieldManifest::new(
                    "iterations",
                    "integer",
                    serde_json::json!(self.iterations),
                    Some(1.0),
                    None,
                    "Inner iterations per orchestration",
                ),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeConfig {
    /// Inner population size
    pub particle_quota: usize,
    /// Iterations without improvement before an inner run stops
    pub window_size: usize,
    pub iterations: usize,
    /// Fallback F for genomes without a scale gene
    pub scale_factor: f64,
    /// Fallback CR for genomes without a crossover gene
    pub crossover_rate: f64,
    pub mapping: MappingPolicy,
    pub maximize: bool,
}

impl Default for DeConfig {
    fn default() -> Self {
        Self {
            particle_quota: 25,
            window_size: 5,
            iterations: 40,
            scale_factor: 0.5,
            crossover_rate: 0.9,
            mapping: MappingPolicy::AgentPerGenome,
            maximize: false,
        }
    }
}

impl ConfigSection for DeConfig {
    fn section_name() -> &'static str {
        "de"
    }

    fn validate(&self) -> Result<(), HyperError> {
        require_positive("de.particle_quota", self.particle_quota)?;
        require_positive("de.window_size", self.window_size)?;
        require_positive("de.iterations", self.iterations)?;
        require_finite_positive("de.scale_factor", self.scale_factor)?;
        require_probability("de.crossover_rate", self.crossover_rate)?;
        Ok(())
    }

    fn to_manifest(&self) -> ConfigManifest {
        ConfigManifest {
            section: "DE".to_string(),
            fields: vec![
                FieldManifest::new(
                    "particle_quota",
                    "integer",
                    serde_json::json!(self.particle_quota),
                    Some(1.0),
                    None,
                    "Inner population size",
                ),
                FieldManifest::new(
                    "window_size",
                    "integer",
                    serde_json::json!(self.window_size),
                    Some(1.0),
                    None,
                    "Stagnation window of an inner run",
                ),
                FieldManifest::new(
                    "iterations",
                    "integer",
                    serde_json::json!(self.iterations),
                    Some(1.0),
                    None,
                    "Inner iterations per orchestration",
                ),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SsaConfig {
    pub swarm_size: usize,
    pub iterations: usize,
    /// Fallback leader probability for genomes without that gene
    pub leader_ratio: f64,
    /// Fallback multiplier on the c1 exploration coefficient
    pub exploration_scale: f64,
    pub mapping: MappingPolicy,
    pub maximize: bool,
}

impl Default for SsaConfig {
    fn default() -> Self {
        Self {
            swarm_size: 30,
            iterations: 40,
            leader_ratio: 0.5,
            exploration_scale: 1.0,
            mapping: MappingPolicy::AgentPerGenome,
            maximize: false,
        }
    }
}

impl ConfigSection for SsaConfig {
    fn section_name() -> &'static str {
        "ssa"
    }

    fn validate(&self) -> Result<(), HyperError> {
        require_positive("ssa.swarm_size", self.swarm_size)?;
        require_positive("ssa.iterations", self.iterations)?;
        require_probability("ssa.leader_ratio", self.leader_ratio)?;
        require_finite_positive("ssa.exploration_scale", self.exploration_scale)?;
        Ok(())
    }

    fn to_manifest(&self) -> ConfigManifest {
        ConfigManifest {
            section: "SSA".to_string(),
            fields: vec![
                FieldManifest::new(
                    "swarm_size",
                    "integer",
                    serde_json::json!(self.swarm_size),
                    Some(1.0),
                    None,
                    "Salp chain length",
                ),
                FieldManifest::new(
                    "iterations",
                    "integer",
                    serde_json::json!(self.iterations),
                    Some(1.0),
                    None,
                    "Inner iterations per orchestration",
                ),
                FieldManifest::new(
                    "leader_ratio",
                    "float",
                    serde_json::json!(self.leader_ratio),
                    Some(0.0),
                    Some(1.0),
                    "Probability an agent moves as a leader",
                ),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnsembleConfig {
    pub members: Vec<OrchestratorKind>,
    /// Empty means equal weights
    pub weights: Vec<f64>,
    pub maximize: bool,
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self {
            members: vec![OrchestratorKind::De, OrchestratorKind::Pso],
            weights: Vec::new(),
            maximize: false,
        }
    }
}

impl ConfigSection for EnsembleConfig {
    fn section_name() -> &'static str {
        "ensemble"
    }

    fn validate(&self) -> Result<(), HyperError> {
        if self.members.len() < 2 {
            return Err(HyperError::config(
                "ensemble.members",
                self.members.len(),
                "an ensemble needs at least two orchestrators",
            ));
        }
        if !self.weights.is_empty() {
            if self.weights.len() != self.members.len() {
                return Err(HyperError::config(
                    "ensemble.weights",
                    self.weights.len(),
                    format!("expected one weight per member ({})", self.members.len()),
                ));
            }
            if let Some(w) = self.weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
                return Err(HyperError::config(
                    "ensemble.weights",
                    w,
                    "weights must be non-negative finite numbers",
                ));
            }
            if self.weights.iter().sum::<f64>() <= 0.0 {
                return Err(HyperError::config(
                    "ensemble.weights",
                    format!("{:?}", self.weights),
                    "weights must not all be zero",
                ));
            }
        }
        Ok(())
    }

    fn to_manifest(&self) -> ConfigManifest {
        ConfigManifest {
            section: "Ensemble".to_string(),
            fields: vec![
                FieldManifest::new(
                    "members",
                    "list",
                    serde_json::json!(self.members),
                    None,
                    None,
                    "Inner orchestrators combined into one fitness signal",
                ),
                FieldManifest::new(
                    "weights",
                    "list",
                    serde_json::json!(self.weights),
                    Some(0.0),
                    None,
                    "Per-member weights, empty for equal weighting",
                ),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(PsoConfig::default().validate().is_ok());
        assert!(DeConfig::default().validate().is_ok());
        assert!(SsaConfig::default().validate().is_ok());
        assert!(EnsembleConfig::default().validate().is_ok());
    }

    #[test]
    fn test_ensemble_requires_two_members() {
        let config = EnsembleConfig {
            members: vec![OrchestratorKind::Pso],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_ensemble_weight_count() {
        let config = EnsembleConfig {
            weights: vec![1.0],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_de_crossover_rate_range() {
        let config = DeConfig {
            crossover_rate: 1.2,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
