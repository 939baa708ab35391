use super::{
    evolution::EvolutionConfig,
    orchestrator::{DeConfig, EnsembleConfig, PsoConfig, SsaConfig},
    runtime::RuntimeConfig,
    traits::{ConfigManifest, ConfigSection},
};
use crate::error::HyperError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, RwLock};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub evolution: EvolutionConfig,
    pub pso: PsoConfig,
    pub de: DeConfig,
    pub ssa: SsaConfig,
    pub ensemble: EnsembleConfig,
    pub runtime: RuntimeConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), HyperError> {
        self.evolution.validate()?;
        self.pso.validate()?;
        self.de.validate()?;
        self.ssa.validate()?;
        self.ensemble.validate()?;
        self.runtime.validate()?;
        Ok(())
    }

    pub fn manifests(&self) -> Vec<ConfigManifest> {
        vec![
            self.evolution.to_manifest(),
            self.pso.to_manifest(),
            self.de.to_manifest(),
            self.ssa.to_manifest(),
            self.ensemble.to_manifest(),
            self.runtime.to_manifest(),
        ]
    }
}

pub struct ConfigManager {
    config: Arc<RwLock<AppConfig>>,
}

impl ConfigManager {
    pub fn new() -> Self {
        Self {
            config: Arc::new(RwLock::new(AppConfig::default())),
        }
    }

    pub fn load_from_file<P: AsRef<Path>>(&self, path: P) -> Result<(), HyperError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;

        *self.config.write().unwrap_or_else(|e| e.into_inner()) = config;
        Ok(())
    }

    /// Loads an optional file, then applies `PREFIX__SECTION__KEY` environment overrides.
    pub fn load_layered<P: AsRef<Path>>(
        &self,
        path: Option<P>,
        env_prefix: &str,
    ) -> Result<(), HyperError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path.as_ref()));
        }
        builder = builder.add_source(
            config::Environment::with_prefix(env_prefix)
                .separator("__")
                .try_parsing(true),
        );

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;

        *self.config.write().unwrap_or_else(|e| e.into_inner()) = config;
        Ok(())
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), HyperError> {
        let toml_str = {
            let config = self.config.read().unwrap_or_else(|e| e.into_inner());
            toml::to_string_pretty(&*config)?
        };
        std::fs::write(path, toml_str)?;
        Ok(())
    }

    pub fn get(&self) -> AppConfig {
        self.config.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Applies `f` and keeps the result only if it validates.
    pub fn update<F>(&self, f: F) -> Result<(), HyperError>
    where
        F: FnOnce(&mut AppConfig),
    {
        let mut config = self.config.write().unwrap_or_else(|e| e.into_inner());
        let mut candidate = config.clone();
        f(&mut candidate);
        candidate.validate()?;
        *config = candidate;
        Ok(())
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [evolution]
            population_size = 12

            [pso]
            inertia_weight = 0.8
            "#,
        )
        .unwrap();

        assert_eq!(config.evolution.population_size, 12);
        assert_eq!(config.evolution.num_generations, 40);
        assert_eq!(config.pso.inertia_weight, 0.8);
        assert_eq!(config.de.particle_quota, 25);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_update_rejects_invalid_and_keeps_previous() {
        let manager = ConfigManager::new();
        let result = manager.update(|c| c.evolution.population_size = 0);
        assert!(result.is_err());
        assert_eq!(manager.get().evolution.population_size, 10);
    }

    #[test]
    fn test_manifests_cover_every_section() {
        let sections: Vec<String> = AppConfig::default()
            .manifests()
            .into_iter()
            .map(|m| m.section)
            .collect();
        assert_eq!(sections, vec!["Evolution", "PSO", "DE", "SSA", "Ensemble", "Runtime"]);
    }
}
