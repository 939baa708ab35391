use super::traits::{require_positive, ConfigManifest, ConfigSection, FieldManifest};
use crate::error::HyperError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub seed: Option<u64>,
    /// Batches at least this large are evaluated on the rayon pool
    pub parallel_threshold: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            seed: None,
            parallel_threshold: 50,
        }
    }
}

impl ConfigSection for RuntimeConfig {
    fn section_name() -> &'static str {
        "runtime"
    }

    fn validate(&self) -> Result<(), HyperError> {
        require_positive("runtime.parallel_threshold", self.parallel_threshold)
    }

    fn to_manifest(&self) -> ConfigManifest {
        ConfigManifest {
            section: "Runtime".to_string(),
            fields: vec![
                FieldManifest::new(
                    "seed",
                    "integer",
                    serde_json::json!(self.seed),
                    Some(0.0),
                    None,
                    "Seed for every random source; entropy when absent",
                ),
                FieldManifest::new(
                    "parallel_threshold",
                    "integer",
                    serde_json::json!(self.parallel_threshold),
                    Some(1.0),
                    None,
                    "Smallest batch evaluated in parallel",
                ),
            ],
        }
    }
}
