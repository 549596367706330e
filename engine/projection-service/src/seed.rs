//! JSON seed files for loading players, game logs and season totals into a store

use projection_engine::{GameRecord, PlayerRecord, SeasonStat, StatStore, TeamStat};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::error::Result;

/// Contents of a seed file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeedData {
    pub players: Vec<PlayerRecord>,
    #[serde(default)]
    pub games: Vec<GameRecord>,
    #[serde(default)]
    pub season_stats: Vec<SeasonStat>,
    #[serde(default)]
    pub team_stats: Vec<TeamStat>,
}

impl SeedData {
    pub fn player_ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self.players.iter().map(|p| p.player_id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedSummary {
    pub players: usize,
    pub games: usize,
    pub season_stats: usize,
    pub team_stats: usize,
}

pub fn load_seed(path: &Path) -> Result<SeedData> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Write every seed record into `store`
pub async fn apply_seed(store: &dyn StatStore, seed: &SeedData) -> Result<SeedSummary> {
    for player in &seed.players {
        store.upsert_player(player).await?;
    }
    store.insert_game_records(&seed.games).await?;
    for stat in &seed.season_stats {
        store.upsert_season_stat(stat).await?;
    }
    for team in &seed.team_stats {
        store.upsert_team_stat(team).await?;
    }

    let summary = SeedSummary {
        players: seed.players.len(),
        games: seed.games.len(),
        season_stats: seed.season_stats.len(),
        team_stats: seed.team_stats.len(),
    };
    info!(
        "Seeded {} players, {} games, {} season stats, {} team stats",
        summary.players, summary.games, summary.season_stats, summary.team_stats
    );
    Ok(summary)
}
