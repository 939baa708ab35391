use thiserror::Error;

#[derive(Error, Debug)]
pub enum HyperError {
    #[error("Configuration error: {parameter} = {value} ({reason})")]
    Configuration {
        parameter: String,
        value: String,
        reason: String,
    },

    #[error("Evaluation error: {0}")]
    Evaluation(String),

    #[error("Combination error: {0}")]
    Combination(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("TOML write error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("Config source error: {0}")]
    Config(#[from] config::ConfigError),
}

impl HyperError {
    /// Shorthand for a configuration error naming the offending parameter and its value.
    pub fn config(
        parameter: impl Into<String>,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        HyperError::Configuration {
            parameter: parameter.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, HyperError>;
