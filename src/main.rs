use anyhow::Context;
use clap::{Parser, Subcommand};
use hyperheuristic::config::ConfigManager;
use hyperheuristic::engines::evaluation::Problem;
use hyperheuristic::engines::generation::ConsoleObserver;
use hyperheuristic::heuristics::{
    DeHyperHeuristic, EnsembleHyperHeuristic, HyperHeuristic, PsoHyperHeuristic, SsaHyperHeuristic,
};
use hyperheuristic::types::Bounds;
use std::f64::consts::PI;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hyperheuristic")]
#[command(about = "Evolves metaheuristic hyperparameters on the Ackley benchmark")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// TOML configuration file, overridden by HYPER__SECTION__KEY variables
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Ackley dimensions
    #[arg(long, global = true, default_value = "5")]
    dims: usize,
}

#[derive(Subcommand, Clone, Copy)]
enum Commands {
    /// Particle swarm preset (default)
    Pso,
    /// Differential evolution preset
    De,
    /// Salp swarm preset
    Ssa,
    /// Weighted ensemble of the configured members
    Ensemble,
    /// Print the configuration manifests as JSON
    Describe,
}

/// Ackley function, minimum 0 at the origin.
fn ackley(x: &[f64]) -> f64 {
    let n = x.len() as f64;
    let sum_sq = x.iter().map(|v| v * v).sum::<f64>() / n;
    let sum_cos = x.iter().map(|v| (2.0 * PI * v).cos()).sum::<f64>() / n;
    -20.0 * (-0.2 * sum_sq.sqrt()).exp() - sum_cos.exp() + 20.0 + std::f64::consts::E
}

fn main() -> anyhow::Result<()> {
    // Configure logging (RUST_LOG=info for per-generation output)
    env_logger::init();

    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Pso);
    let dims = cli.dims;
    if dims == 0 {
        anyhow::bail!("--dims must be at least 1");
    }

    let manager = ConfigManager::new();
    manager
        .load_layered(cli.config.as_deref(), "HYPER")
        .context("failed to load configuration")?;
    let config = manager.get();

    let mut heuristic: Box<dyn HyperHeuristic> = match command {
        Commands::Describe => {
            println!("{}", serde_json::to_string_pretty(&config.manifests())?);
            return Ok(());
        }
        Commands::Pso => Box::new(PsoHyperHeuristic::new(config).with_observer(ConsoleObserver::new())),
        Commands::De => Box::new(DeHyperHeuristic::new(config).with_observer(ConsoleObserver::new())),
        Commands::Ssa => Box::new(SsaHyperHeuristic::new(config).with_observer(ConsoleObserver::new())),
        Commands::Ensemble => {
            Box::new(EnsembleHyperHeuristic::new(config).with_observer(ConsoleObserver::new()))
        }
    };

    let problem = Problem::new(ackley, dims, Bounds::uniform(dims, -32.768, 32.768))?;
    println!("Running {} on Ackley ({} dimensions)", heuristic.name(), dims);

    let outcome = heuristic.optimize(problem)?;

    println!(
        "Finished after {} generations ({:?}) in {} ms",
        outcome.generations_completed(),
        outcome.stop_reason,
        (outcome.finished_at - outcome.started_at).num_milliseconds()
    );
    println!("Best fitness: {:.6e}", outcome.best_fitness());
    println!("Best position: {:?}", outcome.best_particle.position);
    println!("Best hyperparameters: {:?}", outcome.best_genome);
    if outcome.non_finite_substitutions > 0 {
        println!("Non-finite fitness values substituted: {}", outcome.non_finite_substitutions);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_preset_with_options() {
        let cli = Cli::try_parse_from(["hyperheuristic", "de", "--dims", "3", "--config", "run.toml"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::De)));
        assert_eq!(cli.dims, 3);
        assert_eq!(cli.config, Some(PathBuf::from("run.toml")));
    }

    #[test]
    fn test_defaults_and_rejections() {
        let cli = Cli::try_parse_from(["hyperheuristic"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.dims, 5);

        assert!(Cli::try_parse_from(["hyperheuristic", "annealing"]).is_err());
        assert!(Cli::try_parse_from(["hyperheuristic", "pso", "--dims", "many"]).is_err());
    }
}
