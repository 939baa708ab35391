use super::genome::Genome;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::mpsc::Sender;

/// Read-only view of a finished generation.
#[derive(Debug, Clone, Copy)]
pub struct GenerationSnapshot<'a> {
    pub generation: usize,
    pub population: &'a [Genome],
    /// Sanitized fitness, aligned with `population`
    pub fitness: &'a [f64],
    /// Best-so-far global particle value
    pub best_fitness: f64,
    /// Best fitness of this generation alone
    pub generation_best: f64,
    /// Highest-ranked genome of this generation
    pub best_genome: &'a [f64],
    pub non_finite_substitutions: usize,
    pub combination_fallback: Option<&'a str>,
}

pub trait GenerationObserver: Send {
    fn on_generation_start(&mut self, _generation: usize) {}
    fn on_generation_complete(&mut self, snapshot: &GenerationSnapshot<'_>);
}

impl<T: GenerationObserver + ?Sized> GenerationObserver for &mut T {
    fn on_generation_start(&mut self, generation: usize) {
        (**self).on_generation_start(generation)
    }

    fn on_generation_complete(&mut self, snapshot: &GenerationSnapshot<'_>) {
        (**self).on_generation_complete(snapshot)
    }
}

pub struct NoopObserver;

impl GenerationObserver for NoopObserver {
    fn on_generation_complete(&mut self, _snapshot: &GenerationSnapshot<'_>) {}
}

/// Prints every generation to stdout, with the change since the previous one.
#[derive(Default)]
pub struct ConsoleObserver {
    last_best: Option<f64>,
}

impl ConsoleObserver {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GenerationObserver for ConsoleObserver {
    fn on_generation_start(&mut self, generation: usize) {
        println!("Generation {} starting...", generation + 1);
    }

    fn on_generation_complete(&mut self, snapshot: &GenerationSnapshot<'_>) {
        let change = self.last_best.map(|last| snapshot.generation_best - last).unwrap_or(0.0);
        println!(
            "Generation {} complete. Best fitness: {:.6e}, generation best: {:.6e} (change {:+.3e}), best genome: {:?}",
            snapshot.generation + 1,
            snapshot.best_fitness,
            snapshot.generation_best,
            change,
            snapshot.best_genome
        );
        if let Some(reason) = snapshot.combination_fallback {
            println!("  Ensemble fell back to a neutral fitness vector: {}", reason);
        }
        self.last_best = Some(snapshot.generation_best);
    }
}

// For consumers on another thread
pub struct ChannelObserver {
    sender: Sender<ProgressMessage>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProgressMessage {
    GenerationStart(usize),
    GenerationComplete {
        generation: usize,
        best_fitness: f64,
        generation_best: f64,
        best_genome: Genome,
    },
}

impl ChannelObserver {
    pub fn new(sender: Sender<ProgressMessage>) -> Self {
        Self { sender }
    }
}

impl GenerationObserver for ChannelObserver {
    fn on_generation_start(&mut self, generation: usize) {
        let _ = self.sender.send(ProgressMessage::GenerationStart(generation));
    }

    fn on_generation_complete(&mut self, snapshot: &GenerationSnapshot<'_>) {
        let _ = self.sender.send(ProgressMessage::GenerationComplete {
            generation: snapshot.generation,
            best_fitness: snapshot.best_fitness,
            generation_best: snapshot.generation_best,
            best_genome: snapshot.best_genome.to_vec(),
        });
    }
}

/// Per-gene history of every generation, for plotting hyperparameter drift.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecorder {
    /// `genes[g][generation]` holds gene `g` of every genome in that generation
    pub genes: Vec<Vec<Vec<f64>>>,
    /// Best genome of each generation
    pub best_genomes: Vec<Genome>,
    pub generation_best: Vec<f64>,
    pub best_fitness: Vec<f64>,
}

impl HistoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generations(&self) -> usize {
        self.best_fitness.len()
    }

    /// Values of gene `index` across all generations, flattened with the generation number.
    pub fn gene_series(&self, index: usize) -> Vec<(usize, f64)> {
        self.genes
            .get(index)
            .map(|per_generation| {
                per_generation
                    .iter()
                    .enumerate()
                    .flat_map(|(generation, values)| values.iter().map(move |v| (generation, *v)))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}

impl GenerationObserver for HistoryRecorder {
    fn on_generation_complete(&mut self, snapshot: &GenerationSnapshot<'_>) {
        let num_genes = snapshot.best_genome.len();
        if self.genes.len() < num_genes {
            self.genes.resize(num_genes, Vec::new());
        }
        for (g, history) in self.genes.iter_mut().enumerate() {
            history.push(
                snapshot
                    .population
                    .iter()
                    .filter_map(|genome| genome.get(g).copied())
                    .collect(),
            );
        }
        self.best_genomes.push(snapshot.best_genome.to_vec());
        self.generation_best.push(snapshot.generation_best);
        self.best_fitness.push(snapshot.best_fitness);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    fn snapshot<'a>(population: &'a [Genome], fitness: &'a [f64]) -> GenerationSnapshot<'a> {
        GenerationSnapshot {
            generation: 0,
            population,
            fitness,
            best_fitness: 1.0,
            generation_best: 1.0,
            best_genome: &population[0],
            non_finite_substitutions: 0,
            combination_fallback: None,
        }
    }

    #[test]
    fn test_history_records_per_gene_values() {
        let population = vec![vec![0.1, 2.0], vec![0.3, 4.0]];
        let fitness = vec![1.0, 2.0];
        let mut recorder = HistoryRecorder::new();
        recorder.on_generation_complete(&snapshot(&population, &fitness));
        recorder.on_generation_complete(&snapshot(&population, &fitness));

        assert_eq!(recorder.generations(), 2);
        assert_eq!(recorder.genes[1][0], vec![2.0, 4.0]);
        assert_eq!(recorder.gene_series(0).len(), 4);
        assert!(recorder.gene_series(5).is_empty());
    }

    #[test]
    fn test_history_saves_as_json() {
        let population = vec![vec![0.1, 2.0], vec![0.3, 4.0]];
        let fitness = vec![1.0, 2.0];
        let mut recorder = HistoryRecorder::new();
        recorder.on_generation_complete(&snapshot(&population, &fitness));

        let path = std::env::temp_dir().join(format!("hyper_history_{}.json", std::process::id()));
        recorder.save_json(&path).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();

        let restored: HistoryRecorder = serde_json::from_str(&contents).unwrap();
        assert_eq!(restored, recorder);
        assert_eq!(restored.best_genomes, vec![vec![0.1, 2.0]]);
    }

    #[test]
    fn test_channel_observer_forwards_messages() {
        let (tx, rx) = mpsc::channel();
        let mut observer = ChannelObserver::new(tx);
        let population = vec![vec![0.5]];
        let fitness = vec![1.0];

        observer.on_generation_start(0);
        observer.on_generation_complete(&snapshot(&population, &fitness));

        assert_eq!(rx.recv().unwrap(), ProgressMessage::GenerationStart(0));
        match rx.recv().unwrap() {
            ProgressMessage::GenerationComplete { best_genome, .. } => assert_eq!(best_genome, vec![0.5]),
            other => panic!("unexpected message {:?}", other),
        }
    }
}
