//! Store-backed projection operations
//!
//! `ProjectionEngine` ties the pure modules to a [`StatStore`]. Each public
//! operation works on one entity and can run concurrently with operations on
//! other entities. Writes against the same projection are serialized.

use dashmap::DashMap;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::adjustment::{apply_adjustments, refresh_derived, AdjustmentSummary, Adjustments};
use crate::aggregation::{InvalidValue, StatAggregator};
use crate::comparison::{ComparisonModel, Tier};
use crate::config::EngineConfig;
use crate::derive::{derive_efficiency, is_derived};
use crate::error::{ProjectionError, Result};
use crate::models::{PlayerRecord, PlayerStatus};
use crate::projection::{Projection, ProjectionSource, StatLine};
use crate::rookie::{RookieBuild, RookieProjector};
use crate::scoring::score_all;
use crate::stats::{Position, StatType};
use crate::store::StatStore;
use crate::team_context::{enhance_with_team_context, BlendStep};
use crate::team_validation::validate_team;
use crate::templates::TemplateSet;
use crate::validation::{check_projection, PlayerValidator, ValidationIssue};

/// Async mutexes handed out per key
#[derive(Debug)]
pub struct KeyedLocks<K: Eq + Hash> {
    locks: DashMap<K, Arc<Mutex<()>>>,
}

impl<K: Eq + Hash + Clone> KeyedLocks<K> {
    pub fn new() -> Self {
        Self { locks: DashMap::new() }
    }

    pub async fn lock(&self, key: K) -> KeyedGuard<'_, K> {
        let mutex = self.locks.entry(key.clone()).or_default().clone();
        let guard = mutex.lock_owned().await;
        KeyedGuard { locks: &self.locks, key, guard: Some(guard) }
    }

    /// Keys currently held or waited on
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

/// Held lock for one key; the key's entry is removed once nobody holds or awaits it
pub struct KeyedGuard<'a, K: Eq + Hash> {
    locks: &'a DashMap<K, Arc<Mutex<()>>>,
    key: K,
    guard: Option<OwnedMutexGuard<()>>,
}

impl<K: Eq + Hash> Drop for KeyedGuard<'_, K> {
    fn drop(&mut self) {
        drop(self.guard.take());
        // waiters hold a clone of the Arc, so a count of 1 means only the map is left
        self.locks.remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

impl<K: Eq + Hash + Clone> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of aggregating one player's season into stored totals
#[derive(Debug, Clone, Default)]
pub struct AggregationReport {
    pub player_id: i64,
    pub season: i32,
    pub games: usize,
    pub rows_written: usize,
    pub invalid: Vec<InvalidValue>,
}

/// Projection operations over a storage collaborator
pub struct ProjectionEngine {
    store: Arc<dyn StatStore>,
    config: EngineConfig,
    templates: Arc<TemplateSet>,
    projection_locks: KeyedLocks<Uuid>,
    key_locks: KeyedLocks<(i64, i32, Option<String>)>,
}

impl ProjectionEngine {
    pub fn new(store: Arc<dyn StatStore>, config: EngineConfig) -> Self {
        Self::with_templates(store, config, Arc::new(TemplateSet::global().clone()))
    }

    pub fn with_templates(
        store: Arc<dyn StatStore>,
        config: EngineConfig,
        templates: Arc<TemplateSet>,
    ) -> Self {
        info!(
            "Projection engine ready: {} rookie templates, comparison model {}",
            templates.len(),
            ComparisonModel::global().version()
        );
        Self {
            store,
            config,
            templates,
            projection_locks: KeyedLocks::new(),
            key_locks: KeyedLocks::new(),
        }
    }

    pub fn store(&self) -> &Arc<dyn StatStore> {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    async fn player(&self, player_id: i64) -> Result<PlayerRecord> {
        self.store
            .get_player(player_id)
            .await?
            .ok_or_else(|| ProjectionError::not_found(format!("player {player_id}")))
    }

    /// Sum stored game records into season totals and write them back
    pub async fn aggregate_season(&self, player_id: i64, season: i32) -> Result<AggregationReport> {
        let player = self.player(player_id).await?;
        let position = player.position()?;
        let games = self.store.game_records(player_id, season).await?;

        let mut report = AggregationReport { player_id, season, ..Default::default() };
        if games.is_empty() {
            debug!("No game records for {} season {}", player.name, season);
            return Ok(report);
        }

        let aggregate = StatAggregator::new(position).aggregate(&games);
        for invalid in &aggregate.invalid {
            warn!(
                "{} week {}: {} value {:?} is not numeric; left out of the total",
                player.name, invalid.week, invalid.column, invalid.raw
            );
        }

        let rows = aggregate.to_season_stats(position, player_id, season);
        for row in &rows {
            self.store.upsert_season_stat(row).await?;
        }

        report.games = aggregate.games;
        report.rows_written = rows.len();
        report.invalid = aggregate.invalid;
        info!(
            "Aggregated {} season {}: {} games, {} stats",
            player.name, season, report.games, report.rows_written
        );
        Ok(report)
    }

    /// Build or rebuild the projection for (player, season, scenario)
    ///
    /// Veterans carry prior-season totals forward; rookies without history go
    /// through the rookie path. A repeated call updates the existing projection.
    pub async fn create_base_projection(
        &self,
        player_id: i64,
        season: i32,
        scenario_id: Option<&str>,
    ) -> Result<Projection> {
        let player = self.player(player_id).await?;
        let position = player.position()?;

        let prior = self.store.season_stats(player_id, season - 1).await?;
        let (stats, games, source) = if !prior.is_empty() {
            let mut line = StatLine::for_position(position);
            let mut games = None;
            for row in &prior {
                match row.stat_type {
                    StatType::Games => games = Some(row.value),
                    stat if is_derived(stat) => {}
                    stat => {
                        line.set(stat, Some(row.value));
                    }
                }
            }
            derive_efficiency(&mut line);
            (line, games, ProjectionSource::CarryForward { from_season: season - 1 })
        } else if player.is_rookie() {
            let build = self.rookie_build(&player, position, player.draft_position, season).await?;
            (build.stats, Some(build.games), build.source)
        } else {
            return Err(ProjectionError::missing_data(format!(
                "{} has no {} season stats and is not a rookie",
                player.name,
                season - 1
            )));
        };

        self.store_projection(player_id, season, scenario_id, position, stats, games, source).await
    }

    /// Build a rookie projection from a draft slot
    pub async fn create_draft_based_projection(
        &self,
        player_id: i64,
        draft_position: u32,
        season: i32,
        scenario_id: Option<&str>,
    ) -> Result<Projection> {
        let player = self.player(player_id).await?;
        let position = player.position()?;
        let build = self.rookie_build(&player, position, Some(draft_position), season).await?;
        self.store_projection(
            player_id,
            season,
            scenario_id,
            position,
            build.stats,
            Some(build.games),
            build.source,
        )
        .await
    }

    async fn rookie_build(
        &self,
        player: &PlayerRecord,
        position: Position,
        draft_position: Option<u32>,
        season: i32,
    ) -> Result<RookieBuild> {
        let rookie = &self.config.rookie;
        let projector = RookieProjector::new(rookie, &self.templates, ComparisonModel::global());

        let mut build = match draft_position {
            Some(pick) if rookie.use_draft_templates => projector.draft_based(position, pick),
            Some(pick) => projector.comparison(position, Tier::from_draft_position(pick), None),
            None => {
                projector.comparison(position, Tier::Low, Some(rookie.fallback_playing_time_pct))
            }
        };

        let team = match self.store.team_stat(&player.team, season - 1).await? {
            Some(team) => Some(team),
            None => self.store.team_stat(&player.team, season).await?,
        };
        match team {
            Some(team) => {
                let steps = enhance_with_team_context(
                    &mut build.stats,
                    position,
                    build.games,
                    Some(build.playing_time_pct),
                    &team,
                    &self.config.blend,
                );
                for step in steps {
                    if let BlendStep::Applied { stat, ratio, .. } = step {
                        debug!("{} {} blended with {} by {:.3}", player.name, stat, team.team, ratio);
                    }
                }
            }
            None => debug!("No team context for {}; using model volumes", player.team),
        }

        Ok(build)
    }

    #[allow(clippy::too_many_arguments)]
    async fn store_projection(
        &self,
        player_id: i64,
        season: i32,
        scenario_id: Option<&str>,
        position: Position,
        stats: StatLine,
        games: Option<f64>,
        source: ProjectionSource,
    ) -> Result<Projection> {
        let _guard =
            self.key_locks.lock((player_id, season, scenario_id.map(str::to_string))).await;

        let existing = self.store.find_projection(player_id, season, scenario_id).await?;
        let _projection_guard = match &existing {
            Some(p) => Some(self.projection_locks.lock(p.id).await),
            None => None,
        };

        let mut projection = existing.unwrap_or_else(|| {
            Projection::new(
                player_id,
                season,
                scenario_id.map(str::to_string),
                position,
                source.clone(),
            )
        });
        projection.position = position;
        projection.stats = stats;
        projection.games = games;
        projection.source = source;
        projection.points = score_all(&projection.stats);
        projection.stamp.touch();

        self.store.save_projection(&projection).await?;
        info!(
            "Stored projection {} for player {} season {}: {:.1} half-PPR",
            projection.id,
            player_id,
            season,
            projection.points.half_ppr.unwrap_or(0.0)
        );
        Ok(projection)
    }

    /// Mark a player as a rookie on `team`; only team, status and draft slot change
    pub async fn register_rookie(
        &self,
        player_id: i64,
        team: &str,
        draft_position: Option<u32>,
    ) -> Result<PlayerRecord> {
        let mut player = self.player(player_id).await?;
        player.team = team.to_string();
        player.status = PlayerStatus::Rookie;
        player.draft_position = draft_position;
        self.store.upsert_player(&player).await?;
        info!("Registered {} as a rookie with {}", player.name, team);
        Ok(player)
    }

    /// Apply adjustments to a stored projection in place
    pub async fn update_projection(
        &self,
        projection_id: Uuid,
        adjustments: &Adjustments,
    ) -> Result<(Projection, AdjustmentSummary)> {
        let _guard = self.projection_locks.lock(projection_id).await;

        let mut projection = self
            .store
            .get_projection(projection_id)
            .await?
            .ok_or_else(|| ProjectionError::not_found(format!("projection {projection_id}")))?;

        let summary = apply_adjustments(&mut projection, adjustments)?;
        self.store.save_projection(&projection).await?;

        info!(
            "Adjusted projection {} ({:?}): half-PPR {:.1} -> {:.1}",
            projection_id,
            summary.applied,
            summary.half_ppr_before.unwrap_or(0.0),
            summary.half_ppr_after.unwrap_or(0.0)
        );
        Ok((projection, summary))
    }

    /// Recompute derived fields and points of a stored projection
    pub async fn refresh_projection(&self, projection_id: Uuid) -> Result<Projection> {
        let _guard = self.projection_locks.lock(projection_id).await;
        let mut projection = self
            .store
            .get_projection(projection_id)
            .await?
            .ok_or_else(|| ProjectionError::not_found(format!("projection {projection_id}")))?;
        refresh_derived(&mut projection);
        self.store.save_projection(&projection).await?;
        Ok(projection)
    }

    /// Check a player's stored season against its game records, writing corrections
    pub async fn validate_player_data(
        &self,
        player_id: i64,
        season: i32,
    ) -> Result<Vec<ValidationIssue>> {
        let player = self.player(player_id).await?;
        let stored = self.store.season_stats(player_id, season).await?;
        let games = self.store.game_records(player_id, season).await?;

        let validation =
            PlayerValidator::new(&self.config.validation).check(&player, season, &stored, &games);

        for row in &validation.corrections {
            self.store.upsert_season_stat(row).await?;
        }
        for issue in &validation.issues {
            warn!("{}", issue);
        }
        if !validation.corrections.is_empty() {
            info!(
                "Corrected {} season stats for {} season {}",
                validation.corrections.len(),
                player.name,
                season
            );
        }
        Ok(validation.issues)
    }

    /// Read-only math and fantasy-point checks of a stored projection
    pub async fn validate_projection(&self, projection_id: Uuid) -> Result<Vec<ValidationIssue>> {
        let projection = self
            .store
            .get_projection(projection_id)
            .await?
            .ok_or_else(|| ProjectionError::not_found(format!("projection {projection_id}")))?;
        let issues = check_projection(&projection, &self.config.validation);
        for issue in &issues {
            warn!("{}", issue);
        }
        Ok(issues)
    }

    /// Cross-check a team's aggregate; findings are reported only
    pub async fn validate_team(&self, team: &str, season: i32) -> Result<Vec<ValidationIssue>> {
        let team_stat = self
            .store
            .team_stat(team, season)
            .await?
            .ok_or_else(|| ProjectionError::not_found(format!("team {team} season {season}")))?;
        let receivers = self.store.team_receivers(team, season).await?;
        let issues = validate_team(&team_stat, &receivers, &self.config.validation);
        for issue in &issues {
            warn!("{}", issue);
        }
        Ok(issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_keyed_locks_release_entries() {
        let locks: KeyedLocks<u32> = KeyedLocks::new();
        let first = locks.lock(1).await;
        let second = locks.lock(2).await;
        assert_eq!(locks.len(), 2);

        drop(first);
        assert_eq!(locks.len(), 1);
        drop(second);
        assert!(locks.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_waiter_keeps_entry_alive() {
        let locks = Arc::new(KeyedLocks::<u32>::new());
        let held = locks.lock(7).await;

        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.lock(7).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        drop(held);
        assert!(locks.len() <= 1);
        waiter.await.unwrap();
        assert!(locks.is_empty());
    }
}
