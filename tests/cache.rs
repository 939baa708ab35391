use hyperheuristic::engines::evaluation::{EvaluationCache, Evaluator, Problem};
use hyperheuristic::types::Bounds;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[test]
fn test_identical_inputs_invoke_objective_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let objective = move |x: &[f64]| {
        counter.fetch_add(1, Ordering::SeqCst);
        x.iter().sum::<f64>()
    };

    let cache = EvaluationCache::new();
    assert_eq!(cache.evaluate(&objective, &[1.0, 2.0]).unwrap(), 3.0);
    assert_eq!(cache.evaluate(&objective, &[1.0, 2.0]).unwrap(), 3.0);
    assert_eq!(cache.evaluate(&objective, &[2.0, 1.0]).unwrap(), 3.0);

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(cache.hits(), 1);
    assert_eq!(cache.misses(), 2);
    assert_eq!(cache.len(), 2);
}

#[test]
fn test_scalar_and_single_element_vector_share_entry() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let objective = move |x: &[f64]| {
        counter.fetch_add(1, Ordering::SeqCst);
        x[0] * 2.0
    };

    let cache = EvaluationCache::new();
    assert_eq!(cache.evaluate_scalar(&objective, 4.0).unwrap(), 8.0);
    assert_eq!(cache.evaluate(&objective, &[4.0]).unwrap(), 8.0);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_evaluator_batches_share_cache_across_threads() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let objective = move |x: &[f64]| {
        counter.fetch_add(1, Ordering::SeqCst);
        x[0]
    };
    let problem = Problem::new(objective, 1, Bounds::uniform(1, 0.0, 10.0)).unwrap();
    let evaluator = Evaluator::new(Arc::new(problem), 8);

    let positions: Vec<Vec<f64>> = (0..100).map(|i| vec![(i % 10) as f64]).collect();
    let first = evaluator.evaluate_batch(&positions).unwrap();
    let second = evaluator.evaluate_batch(&positions).unwrap();

    assert_eq!(first, second);
    assert_eq!(evaluator.cache().len(), 10);
    // Concurrent misses on one key may both reach the objective; the second batch never does
    let after_first = calls.load(Ordering::SeqCst);
    assert!(after_first >= 10 && after_first <= 100);
    evaluator.evaluate_batch(&positions).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), after_first);
}
