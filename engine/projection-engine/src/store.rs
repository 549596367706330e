//! Storage collaborator contract and the in-memory implementation

use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

use crate::error::{ProjectionError, Result};
use crate::models::{GameRecord, PlayerRecord, ReceiverLine, SeasonStat, TeamStat};
use crate::projection::Projection;
use crate::stats::StatType;

/// Persistence operations the engine delegates to
///
/// A failed write returns an error and the engine aborts the operation that
/// issued it.
#[async_trait]
pub trait StatStore: Send + Sync {
    async fn get_player(&self, player_id: i64) -> Result<Option<PlayerRecord>>;

    async fn upsert_player(&self, player: &PlayerRecord) -> Result<()>;

    /// Game records for one player/season, ordered by week
    async fn game_records(&self, player_id: i64, season: i32) -> Result<Vec<GameRecord>>;

    async fn insert_game_records(&self, records: &[GameRecord]) -> Result<()>;

    async fn season_stats(&self, player_id: i64, season: i32) -> Result<Vec<SeasonStat>>;

    async fn upsert_season_stat(&self, stat: &SeasonStat) -> Result<()>;

    async fn get_projection(&self, id: Uuid) -> Result<Option<Projection>>;

    /// Projection for a (player, season, scenario) key; `None` scenario is the baseline
    async fn find_projection(
        &self,
        player_id: i64,
        season: i32,
        scenario_id: Option<&str>,
    ) -> Result<Option<Projection>>;

    /// Insert or replace by projection id
    async fn save_projection(&self, projection: &Projection) -> Result<()>;

    async fn list_projections(&self, season: i32) -> Result<Vec<Projection>>;

    async fn team_stat(&self, team: &str, season: i32) -> Result<Option<TeamStat>>;

    async fn upsert_team_stat(&self, team: &TeamStat) -> Result<()>;

    /// Season receiving totals of every player on `team`
    async fn team_receivers(&self, team: &str, season: i32) -> Result<Vec<ReceiverLine>>;
}

type ProjectionKey = (i64, i32, Option<String>);

/// In-memory store used for tests and seed-file runs
#[derive(Debug, Default)]
pub struct MemoryStore {
    players: DashMap<i64, PlayerRecord>,
    games: DashMap<(i64, i32), Vec<GameRecord>>,
    season_stats: DashMap<(i64, i32), HashMap<StatType, SeasonStat>>,
    projections: DashMap<Uuid, Projection>,
    projection_keys: DashMap<ProjectionKey, Uuid>,
    teams: DashMap<(String, i32), TeamStat>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn projection_count(&self) -> usize {
        self.projections.len()
    }
}

#[async_trait]
impl StatStore for MemoryStore {
    async fn get_player(&self, player_id: i64) -> Result<Option<PlayerRecord>> {
        Ok(self.players.get(&player_id).map(|p| p.clone()))
    }

    async fn upsert_player(&self, player: &PlayerRecord) -> Result<()> {
        self.players.insert(player.player_id, player.clone());
        Ok(())
    }

    async fn game_records(&self, player_id: i64, season: i32) -> Result<Vec<GameRecord>> {
        let mut records =
            self.games.get(&(player_id, season)).map(|g| g.clone()).unwrap_or_default();
        records.sort_by_key(|g| g.week);
        Ok(records)
    }

    async fn insert_game_records(&self, records: &[GameRecord]) -> Result<()> {
        for record in records {
            self.games
                .entry((record.player_id, record.season))
                .or_default()
                .push(record.clone());
        }
        debug!("Stored {} game records", records.len());
        Ok(())
    }

    async fn season_stats(&self, player_id: i64, season: i32) -> Result<Vec<SeasonStat>> {
        let mut rows: Vec<SeasonStat> = self
            .season_stats
            .get(&(player_id, season))
            .map(|stats| stats.values().cloned().collect())
            .unwrap_or_default();
        rows.sort_by_key(|row| row.stat_type);
        Ok(rows)
    }

    async fn upsert_season_stat(&self, stat: &SeasonStat) -> Result<()> {
        if !stat.value.is_finite() {
            return Err(ProjectionError::store(format!(
                "refusing to store non-finite {} for player {}",
                stat.stat_type, stat.player_id
            )));
        }
        self.season_stats
            .entry((stat.player_id, stat.season))
            .or_default()
            .insert(stat.stat_type, stat.clone());
        Ok(())
    }

    async fn get_projection(&self, id: Uuid) -> Result<Option<Projection>> {
        Ok(self.projections.get(&id).map(|p| p.clone()))
    }

    async fn find_projection(
        &self,
        player_id: i64,
        season: i32,
        scenario_id: Option<&str>,
    ) -> Result<Option<Projection>> {
        let key = (player_id, season, scenario_id.map(str::to_string));
        let id = match self.projection_keys.get(&key) {
            Some(id) => *id,
            None => return Ok(None),
        };
        Ok(self.projections.get(&id).map(|p| p.clone()))
    }

    async fn save_projection(&self, projection: &Projection) -> Result<()> {
        let key = (projection.player_id, projection.season, projection.scenario_id.clone());
        if let Some(existing) = self.projection_keys.get(&key) {
            if *existing != projection.id {
                return Err(ProjectionError::store(format!(
                    "projection {} already exists for player {} season {}",
                    *existing, projection.player_id, projection.season
                )));
            }
        }
        self.projection_keys.insert(key, projection.id);
        self.projections.insert(projection.id, projection.clone());
        Ok(())
    }

    async fn list_projections(&self, season: i32) -> Result<Vec<Projection>> {
        let mut projections: Vec<Projection> = self
            .projections
            .iter()
            .filter(|p| p.season == season)
            .map(|p| p.clone())
            .collect();
        projections.sort_by(|a, b| {
            (a.player_id, &a.scenario_id).cmp(&(b.player_id, &b.scenario_id))
        });
        Ok(projections)
    }

    async fn team_stat(&self, team: &str, season: i32) -> Result<Option<TeamStat>> {
        Ok(self.teams.get(&(team.to_string(), season)).map(|t| t.clone()))
    }

    async fn upsert_team_stat(&self, team: &TeamStat) -> Result<()> {
        self.teams.insert((team.team.clone(), team.season), team.clone());
        Ok(())
    }

    async fn team_receivers(&self, team: &str, season: i32) -> Result<Vec<ReceiverLine>> {
        let roster: Vec<i64> = self
            .players
            .iter()
            .filter(|p| p.team == team)
            .map(|p| p.player_id)
            .collect();

        let mut lines = Vec::new();
        for player_id in roster {
            let stats = match self.season_stats.get(&(player_id, season)) {
                Some(stats) => stats.clone(),
                None => continue,
            };
            let value = |stat: StatType| stats.get(&stat).map(|s| s.value);
            let targets = value(StatType::Targets);
            let receptions = value(StatType::Receptions);
            let rec_yards = value(StatType::RecYards);
            if targets.is_none() && receptions.is_none() && rec_yards.is_none() {
                continue;
            }
            lines.push(ReceiverLine {
                player_id,
                targets: targets.unwrap_or(0.0),
                receptions: receptions.unwrap_or(0.0),
                rec_yards: rec_yards.unwrap_or(0.0),
            });
        }
        lines.sort_by_key(|l| l.player_id);
        Ok(lines)
    }
}
