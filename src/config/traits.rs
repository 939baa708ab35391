use crate::error::HyperError;
use serde::{Deserialize, Serialize};

/// Trait for configuration sections
pub trait ConfigSection: Serialize + for<'de> Deserialize<'de> + Default + Clone {
    fn section_name() -> &'static str;
    fn validate(&self) -> Result<(), HyperError>;
    fn to_manifest(&self) -> ConfigManifest;
}

/// Configuration manifest for external tooling (`hyperheuristic describe`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigManifest {
    pub section: String,
    pub fields: Vec<FieldManifest>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldManifest {
    pub name: String,
    pub field_type: String,
    pub default: serde_json::Value,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub description: String,
}

impl FieldManifest {
    pub fn new(
        name: &str,
        field_type: &str,
        default: serde_json::Value,
        min: Option<f64>,
        max: Option<f64>,
        description: &str,
    ) -> Self {
        Self {
            name: name.to_string(),
            field_type: field_type.to_string(),
            default,
            min,
            max,
            description: description.to_string(),
        }
    }
}

pub(crate) fn require_positive(parameter: &str, value: usize) -> Result<(), HyperError> {
    if value == 0 {
        return Err(HyperError::config(parameter, value, "must be positive"));
    }
    Ok(())
}

pub(crate) fn require_probability(parameter: &str, value: f64) -> Result<(), HyperError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(HyperError::config(parameter, value, "must be between 0 and 1"));
    }
    Ok(())
}

pub(crate) fn require_finite_positive(parameter: &str, value: f64) -> Result<(), HyperError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(HyperError::config(parameter, value, "must be a positive finite number"));
    }
    Ok(())
}
