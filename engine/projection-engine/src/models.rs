//! Records handed to the engine by the storage collaborator

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::Result;
use crate::stats::{Position, StatType};

/// Roster status of a player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerStatus {
    Rookie,
    Veteran,
    Inactive,
}

/// Player identity as owned by the persistence layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub player_id: i64,
    pub name: String,
    pub team: String,
    /// Raw position string; may hold positions the engine does not project
    pub position: String,
    pub draft_position: Option<u32>,
    pub status: PlayerStatus,
}

impl PlayerRecord {
    /// Parse the stored position into one the engine projects
    pub fn position(&self) -> Result<Position> {
        self.position.parse()
    }

    pub fn is_rookie(&self) -> bool {
        self.status == PlayerStatus::Rookie
    }
}

/// One player's single-game statistical line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameRecord {
    pub player_id: i64,
    pub season: i32,
    pub week: u32,
    pub opponent: Option<String>,
    pub result: Option<String>,
    /// Raw feed abbreviation -> value; numbers may arrive as strings
    #[serde(default)]
    pub stats: HashMap<String, serde_json::Value>,
}

/// Normalized per-game value for one raw column
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Number(f64),
    Absent,
    Invalid(String),
}

impl GameRecord {
    /// Look up and normalize a raw column
    pub fn value(&self, column: &str) -> RawValue {
        match self.stats.get(column) {
            None | Some(serde_json::Value::Null) => RawValue::Absent,
            Some(serde_json::Value::Number(n)) => match n.as_f64() {
                Some(v) if v.is_finite() => RawValue::Number(v),
                _ => RawValue::Invalid(n.to_string()),
            },
            Some(serde_json::Value::String(s)) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return RawValue::Absent;
                }
                match trimmed.parse::<f64>() {
                    Ok(v) if v.is_finite() => RawValue::Number(v),
                    _ => RawValue::Invalid(s.clone()),
                }
            }
            Some(other) => RawValue::Invalid(other.to_string()),
        }
    }
}

/// One (player, season, stat_type) total
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonStat {
    pub player_id: i64,
    pub season: i32,
    pub stat_type: StatType,
    pub value: f64,
}

impl SeasonStat {
    pub fn new(player_id: i64, season: i32, stat_type: StatType, value: f64) -> Self {
        Self { player_id, season, stat_type, value }
    }
}

/// Team-level season aggregate used for rookie context and team checks
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TeamStat {
    pub team: String,
    pub season: i32,
    pub games: f64,
    pub plays: Option<f64>,
    pub pass_attempts: f64,
    pub completions: f64,
    pub pass_yards: f64,
    pub pass_td: f64,
    pub pass_td_rate: Option<f64>,
    pub rush_attempts: f64,
    pub rush_yards: f64,
    pub rush_td: f64,
    pub targets: f64,
    pub receptions: f64,
    pub rec_yards: f64,
}

impl TeamStat {
    /// Per-game average of a team total; `None` when games are unknown
    pub fn per_game(&self, total: f64) -> Option<f64> {
        (self.games > 0.0).then(|| total / self.games)
    }
}

/// Receiving totals of one player on a team, for team-level cross checks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiverLine {
    pub player_id: i64,
    pub targets: f64,
    pub receptions: f64,
    pub rec_yards: f64,
}

/// Audit stamp carried by persisted projections
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stamp {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Stamp {
    pub fn now() -> Self {
        let now = Utc::now();
        Self { created_at: now, updated_at: now }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(stats: serde_json::Value) -> GameRecord {
        GameRecord {
            player_id: 1,
            season: 2024,
            week: 1,
            opponent: Some("KC".to_string()),
            result: None,
            stats: serde_json::from_value(stats).unwrap(),
        }
    }

    #[test]
    fn test_raw_value_normalization() {
        let game = record(json!({
            "att": 34,
            "cmp": "22",
            "pass_yds": " 251.5 ",
            "int": "N/A",
            "rush_td": null,
            "fl": ""
        }));

        assert_eq!(game.value("att"), RawValue::Number(34.0));
        assert_eq!(game.value("cmp"), RawValue::Number(22.0));
        assert_eq!(game.value("pass_yds"), RawValue::Number(251.5));
        assert_eq!(game.value("int"), RawValue::Invalid("N/A".to_string()));
        assert_eq!(game.value("rush_td"), RawValue::Absent);
        assert_eq!(game.value("fl"), RawValue::Absent);
        assert_eq!(game.value("rec"), RawValue::Absent);
    }

    #[test]
    fn test_player_position_parse() {
        let player = PlayerRecord {
            player_id: 7,
            name: "Test Kicker".to_string(),
            team: "BAL".to_string(),
            position: "K".to_string(),
            draft_position: None,
            status: PlayerStatus::Veteran,
        };
        assert!(player.position().is_err());
        assert!(!player.is_rookie());
    }

    #[test]
    fn test_team_per_game() {
        let team = TeamStat { games: 17.0, pass_attempts: 595.0, ..Default::default() };
        assert_eq!(team.per_game(team.pass_attempts), Some(35.0));
        let empty = TeamStat::default();
        assert_eq!(empty.per_game(100.0), None);
    }
}
