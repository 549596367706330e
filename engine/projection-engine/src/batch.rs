//! Batch variants of the per-entity operations
//!
//! Every item gets its own outcome. A failure is recorded against the item's
//! identifier with its reason and never rolls back or stops sibling items.
//! An adjustment batch naming the same projection more than once fails that
//! projection without applying any of its maps.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt::Display;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::adjustment::Adjustments;
use crate::engine::ProjectionEngine;
use crate::error::ProjectionError;

/// Per-item outcomes of a batch call, keyed by the caller's identifiers
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport<K: Ord> {
    pub outcomes: BTreeMap<K, bool>,
    pub errors: BTreeMap<K, String>,
    /// Issue messages written by validation batches
    pub issues: BTreeMap<K, Vec<String>>,
}

impl<K: Ord> Default for BatchReport<K> {
    fn default() -> Self {
        Self { outcomes: BTreeMap::new(), errors: BTreeMap::new(), issues: BTreeMap::new() }
    }
}

impl<K: Ord + Clone + Display> BatchReport<K> {
    pub fn record_success(&mut self, key: K) {
        self.outcomes.insert(key, true);
    }

    pub fn record_failure(&mut self, key: K, err: &ProjectionError) {
        if err.is_entity_scoped() {
            warn!("Batch item {} failed: {}", key, err);
        } else {
            error!("Batch item {} failed: {}", key, err);
        }
        self.outcomes.insert(key.clone(), false);
        self.errors.insert(key, err.to_string());
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.values().filter(|ok| **ok).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.values().filter(|ok| !**ok).count()
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    fn log_summary(&self, operation: &str) {
        info!(
            "{} finished: {} succeeded, {} failed of {}",
            operation,
            self.succeeded(),
            self.failed(),
            self.total()
        );
    }
}

impl ProjectionEngine {
    /// Apply an independent adjustment map to each projection
    pub async fn batch_adjust_projections(
        &self,
        items: &[(Uuid, Adjustments)],
    ) -> BatchReport<Uuid> {
        let mut report = BatchReport::default();
        let mut occurrences: HashMap<Uuid, usize> = HashMap::new();
        for (id, _) in items {
            *occurrences.entry(*id).or_default() += 1;
        }

        for (id, adjustments) in items {
            let count = occurrences[id];
            if count > 1 {
                if !report.outcomes.contains_key(id) {
                    let err = ProjectionError::invalid_input(format!(
                        "projection {id} appears {count} times in one batch"
                    ));
                    report.record_failure(*id, &err);
                }
                continue;
            }
            match self.update_projection(*id, adjustments).await {
                Ok(_) => report.record_success(*id),
                Err(e) => report.record_failure(*id, &e),
            }
        }
        report.log_summary("batch_adjust_projections");
        report
    }

    /// Build the base projection for each player
    pub async fn batch_build_projections(
        &self,
        player_ids: &[i64],
        season: i32,
        scenario_id: Option<&str>,
    ) -> BatchReport<i64> {
        let mut report = BatchReport::default();
        for &player_id in player_ids {
            match self.create_base_projection(player_id, season, scenario_id).await {
                Ok(_) => report.record_success(player_id),
                Err(e) => report.record_failure(player_id, &e),
            }
        }
        report.log_summary("batch_build_projections");
        report
    }

    /// Validate and correct each player's stored season
    pub async fn batch_validate_players(&self, player_ids: &[i64], season: i32) -> BatchReport<i64> {
        let mut report = BatchReport::default();
        for &player_id in player_ids {
            match self.validate_player_data(player_id, season).await {
                Ok(issues) => {
                    report.record_success(player_id);
                    if !issues.is_empty() {
                        report
                            .issues
                            .insert(player_id, issues.iter().map(|i| i.to_string()).collect());
                    }
                }
                Err(e) => report.record_failure(player_id, &e),
            }
        }
        report.log_summary("batch_validate_players");
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_counts() {
        let mut report: BatchReport<i64> = BatchReport::default();
        report.record_success(1);
        report.record_failure(2, &ProjectionError::not_found("player 2"));
        report.record_success(3);

        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.errors.get(&2).map(String::as_str), Some("Not found: player 2"));
    }
}
