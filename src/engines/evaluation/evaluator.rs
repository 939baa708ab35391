use super::cache::EvaluationCache;
use super::objective::Problem;
use crate::error::Result;
use rayon::prelude::*;
use std::sync::Arc;

/// Cached objective evaluation with size-based dispatch to the rayon pool.
///
/// Batches smaller than `parallel_threshold` run on the calling thread.
#[derive(Debug)]
pub struct Evaluator {
    problem: Arc<Problem>,
    cache: EvaluationCache,
    parallel_threshold: usize,
}

impl Evaluator {
    pub fn new(problem: Arc<Problem>, parallel_threshold: usize) -> Self {
        Self {
            problem,
            cache: EvaluationCache::new(),
            parallel_threshold: parallel_threshold.max(1),
        }
    }

    pub fn problem(&self) -> &Problem {
        &self.problem
    }

    pub fn cache(&self) -> &EvaluationCache {
        &self.cache
    }

    pub fn parallel_threshold(&self) -> usize {
        self.parallel_threshold
    }

    /// Objective calls made so far, failed ones included. Cache hits are not counted.
    pub fn invocations(&self) -> usize {
        self.cache.misses()
    }

    pub fn should_parallelize(&self, work_size: usize) -> bool {
        work_size >= self.parallel_threshold
    }

    pub fn evaluate(&self, x: &[f64]) -> Result<f64> {
        self.cache.evaluate(self.problem.objective(), x)
    }

    /// Evaluates every position, preserving order. The first error aborts the batch.
    pub fn evaluate_batch(&self, positions: &[Vec<f64>]) -> Result<Vec<f64>> {
        if self.should_parallelize(positions.len()) {
            positions.par_iter().map(|p| self.evaluate(p)).collect()
        } else {
            positions.iter().map(|p| self.evaluate(p)).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Bounds;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_batch_order_is_preserved_in_parallel() {
        let problem = Problem::new(|x: &[f64]| x[0] * 10.0, 1, Bounds::uniform(1, 0.0, 100.0)).unwrap();
        let evaluator = Evaluator::new(Arc::new(problem), 4);

        let positions: Vec<Vec<f64>> = (0..64).map(|i| vec![i as f64]).collect();
        let values = evaluator.evaluate_batch(&positions).unwrap();

        assert!(evaluator.should_parallelize(positions.len()));
        for (i, v) in values.iter().enumerate() {
            assert_eq!(*v, i as f64 * 10.0);
        }
    }

    #[test]
    fn test_repeated_positions_hit_cache() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);
        let objective = |x: &[f64]| {
            CALLS.fetch_add(1, Ordering::SeqCst);
            x.iter().sum::<f64>()
        };
        let problem = Problem::new(objective, 2, Bounds::uniform(2, -1.0, 1.0)).unwrap();
        let evaluator = Evaluator::new(Arc::new(problem), 50);

        let batch = vec![vec![0.1, 0.2], vec![0.1, 0.2], vec![0.3, 0.4]];
        evaluator.evaluate_batch(&batch).unwrap();
        evaluator.evaluate_batch(&batch).unwrap();

        assert_eq!(CALLS.load(Ordering::SeqCst), 2);
        assert_eq!(evaluator.invocations(), 2);
        assert_eq!(evaluator.cache().misses(), 2);
        assert_eq!(evaluator.cache().hits(), 4);
    }
}
