//! Chunked batch execution with a circuit breaker
//!
//! Items run concurrently within a chunk of `batch_size`, chunks run one after
//! another with `delay` in between. Once `failure_threshold` consecutive items
//! fail the breaker opens and every remaining item is reported as skipped.

use futures::future::join_all;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::config::BatchConfig;

pub const CIRCUIT_OPEN: &str = "circuit breaker open";

/// Per-item outcome of a batch run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary<K: Ord> {
    pub outcomes: BTreeMap<K, bool>,
    pub errors: BTreeMap<K, String>,
    /// Items never attempted because the breaker opened
    pub skipped: Vec<K>,
    pub tripped: bool,
}

impl<K: Ord> Default for RunSummary<K> {
    fn default() -> Self {
        Self { outcomes: BTreeMap::new(), errors: BTreeMap::new(), skipped: Vec::new(), tripped: false }
    }
}

impl<K: Ord> RunSummary<K> {
    pub fn succeeded(&self) -> usize {
        self.outcomes.values().filter(|ok| **ok).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.values().filter(|ok| !**ok).count()
    }
}

/// Runs per-item async operations in bounded chunks
#[derive(Debug, Clone)]
pub struct BatchRunner {
    batch_size: usize,
    delay: Duration,
    failure_threshold: usize,
}

impl BatchRunner {
    pub fn new(batch_size: usize, delay: Duration, failure_threshold: usize) -> Self {
        Self { batch_size: batch_size.max(1), delay, failure_threshold: failure_threshold.max(1) }
    }

    pub fn from_config(config: &BatchConfig) -> Self {
        Self::new(config.batch_size, config.delay(), config.failure_threshold)
    }

    /// Run `op` over every item; outcomes are keyed by each item's key
    pub async fn run<K, T, R, E, F, Fut>(
        &self,
        operation: &str,
        items: Vec<(K, T)>,
        op: F,
    ) -> RunSummary<K>
    where
        K: Ord + Clone + Display,
        F: Fn(T) -> Fut,
        Fut: Future<Output = Result<R, E>>,
        E: Display,
    {
        let mut summary = RunSummary::default();
        let mut consecutive_failures = 0usize;
        let total = items.len();
        let mut remaining = items.into_iter().peekable();
        let mut chunk_index = 0usize;

        while remaining.peek().is_some() {
            if chunk_index > 0 && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            chunk_index += 1;

            let chunk: Vec<(K, T)> = remaining.by_ref().take(self.batch_size).collect();
            let keys: Vec<K> = chunk.iter().map(|(k, _)| k.clone()).collect();
            let results = join_all(chunk.into_iter().map(|(_, item)| op(item))).await;

            for (key, result) in keys.into_iter().zip(results) {
                match result {
                    Ok(_) => {
                        consecutive_failures = 0;
                        summary.outcomes.insert(key, true);
                    }
                    Err(e) => {
                        consecutive_failures += 1;
                        warn!("{} item {} failed: {}", operation, key, e);
                        summary.outcomes.insert(key.clone(), false);
                        summary.errors.insert(key, e.to_string());
                    }
                }
            }

            if consecutive_failures >= self.failure_threshold {
                error!(
                    "{}: {} consecutive failures, opening circuit breaker",
                    operation, consecutive_failures
                );
                summary.tripped = true;
                for (key, _) in remaining.by_ref() {
                    summary.outcomes.insert(key.clone(), false);
                    summary.errors.insert(key.clone(), CIRCUIT_OPEN.to_string());
                    summary.skipped.push(key);
                }
            }
        }

        info!(
            "{} finished: {} succeeded, {} failed, {} skipped of {}",
            operation,
            summary.succeeded(),
            summary.failed(),
            summary.skipped.len(),
            total
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn runner(batch_size: usize, threshold: usize) -> BatchRunner {
        BatchRunner::new(batch_size, Duration::from_millis(1), threshold)
    }

    #[tokio::test]
    async fn test_outcomes_keyed_by_item() {
        let items: Vec<(i64, i64)> = (1..=7).map(|i| (i, i)).collect();
        let summary = runner(3, 10)
            .run("even_only", items, |n| async move {
                if n % 2 == 0 {
                    Ok(n)
                } else {
                    Err(format!("{n} is odd"))
                }
            })
            .await;

        assert_eq!(summary.succeeded(), 3);
        assert_eq!(summary.failed(), 4);
        assert_eq!(summary.errors.get(&5).map(String::as_str), Some("5 is odd"));
        assert!(!summary.tripped);
    }

    #[tokio::test]
    async fn test_circuit_breaker_skips_remaining() {
        let calls = Arc::new(AtomicUsize::new(0));
        let items: Vec<(u32, ())> = (0..10).map(|i| (i, ())).collect();

        let counter = calls.clone();
        let summary = runner(2, 3)
            .run("always_fails", items, move |_| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>("store unavailable")
                }
            })
            .await;

        // breaker checks after each chunk: 2 fail, then 4 >= 3
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert!(summary.tripped);
        assert_eq!(summary.skipped, vec![4, 5, 6, 7, 8, 9]);
        assert_eq!(summary.failed(), 10);
        assert_eq!(summary.errors.get(&9).map(String::as_str), Some(CIRCUIT_OPEN));
    }

    #[tokio::test]
    async fn test_success_resets_failure_run() {
        let items: Vec<(u32, u32)> = (0..6).map(|i| (i, i)).collect();
        let summary = runner(1, 3)
            .run("alternating", items, |n| async move {
                if n % 3 == 2 {
                    Ok(())
                } else {
                    Err("miss")
                }
            })
            .await;

        assert!(!summary.tripped);
        assert_eq!(summary.succeeded(), 2);
        assert_eq!(summary.outcomes.len(), 6);
    }
}
