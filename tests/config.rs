use hyperheuristic::config::{
    AppConfig, ConfigManager, ConfigSection, CrossoverType, MappingPolicy, SelectionMethod,
};
use hyperheuristic::HyperError;
use std::path::PathBuf;

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("hyperheuristic-{}-{}", std::process::id(), name))
}

#[test]
fn test_save_and_reload_round_trip() {
    let path = temp_path("roundtrip.toml");
    let manager = ConfigManager::new();
    manager
        .update(|c| {
            c.evolution.population_size = 16;
            c.evolution.selection_method = SelectionMethod::Tournament;
            c.evolution.crossover_type = CrossoverType::Uniform;
            c.evolution.early_stopping_rounds = Some(7);
            c.pso.mapping = MappingPolicy::RunPerGenome;
            c.runtime.seed = Some(99);
        })
        .unwrap();
    manager.save_to_file(&path).unwrap();

    let reloaded = ConfigManager::new();
    reloaded.load_from_file(&path).unwrap();
    let config = reloaded.get();
    std::fs::remove_file(&path).ok();

    assert_eq!(config.evolution.population_size, 16);
    assert_eq!(config.evolution.selection_method, SelectionMethod::Tournament);
    assert_eq!(config.evolution.crossover_type, CrossoverType::Uniform);
    assert_eq!(config.evolution.early_stopping_rounds, Some(7));
    assert_eq!(config.evolution.mutation_probability, None);
    assert_eq!(config.pso.mapping, MappingPolicy::RunPerGenome);
    assert_eq!(config.runtime.seed, Some(99));
}

#[test]
fn test_invalid_file_is_rejected_and_previous_config_kept() {
    let path = temp_path("invalid.toml");
    std::fs::write(&path, "[evolution]\npopulation_size = 4\nnum_parents_mating = 2\nkeep_parents = 9\n").unwrap();

    let manager = ConfigManager::new();
    let result = manager.load_from_file(&path);
    std::fs::remove_file(&path).ok();

    match result {
        Err(HyperError::Configuration { parameter, .. }) => assert_eq!(parameter, "keep_parents"),
        other => panic!("expected a configuration error, got {:?}", other),
    }
    assert_eq!(manager.get().evolution.population_size, 10);
}

#[test]
fn test_layered_file_and_environment() {
    let path = temp_path("layered.toml");
    std::fs::write(&path, "[evolution]\npopulation_size = 14\nnum_generations = 3\n\n[de]\nwindow_size = 4\n").unwrap();
    std::env::set_var("HYPERTEST__EVOLUTION__NUM_GENERATIONS", "9");

    let manager = ConfigManager::new();
    let result = manager.load_layered(Some(&path), "HYPERTEST");
    std::env::remove_var("HYPERTEST__EVOLUTION__NUM_GENERATIONS");
    std::fs::remove_file(&path).ok();
    result.unwrap();

    let config = manager.get();
    assert_eq!(config.evolution.population_size, 14);
    assert_eq!(config.evolution.num_generations, 9);
    assert_eq!(config.de.window_size, 4);
    assert_eq!(config.de.particle_quota, 25);
}

#[test]
fn test_every_section_describes_itself() {
    let config = AppConfig::default();
    assert!(config.validate().is_ok());
    let json = serde_json::to_string(&config.manifests()).unwrap();
    for field in ["population_size", "inertia_weight", "particle_quota", "leader_ratio", "parallel_threshold"] {
        assert!(json.contains(field), "manifest is missing {}", field);
    }
    assert_eq!(hyperheuristic::config::EvolutionConfig::section_name(), "evolution");
}
