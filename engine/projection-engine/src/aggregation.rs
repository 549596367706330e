//! Season aggregation of per-game records
//!
//! Sums each mapped raw column across a player's games. A column missing from
//! a game contributes zero; a value that cannot be read as a number is left
//! out of the sum and reported back so the validator can surface it.

use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::derive::ratio;
use crate::models::{GameRecord, RawValue, SeasonStat};
use crate::stats::{Position, StatType};

/// A per-game value that could not be read as a number
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidValue {
    pub week: u32,
    pub stat: StatType,
    pub column: &'static str,
    pub raw: String,
}

/// Running total for one stat
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StatTotal {
    pub value: f64,
    /// Games that supplied a numeric value for this stat
    pub usable_games: usize,
}

/// Result of aggregating one player's season
#[derive(Debug, Clone, Default)]
pub struct SeasonAggregate {
    pub games: usize,
    pub totals: BTreeMap<StatType, StatTotal>,
    pub invalid: Vec<InvalidValue>,
}

impl SeasonAggregate {
    pub fn total(&self, stat: StatType) -> Option<StatTotal> {
        if stat == StatType::Games {
            return Some(StatTotal { value: self.games as f64, usable_games: self.games });
        }
        self.totals.get(&stat).copied()
    }

    pub fn value(&self, stat: StatType) -> f64 {
        self.total(stat).map(|t| t.value).unwrap_or(0.0)
    }

    /// Whether any game supplied a numeric value for `stat`
    pub fn has_usable(&self, stat: StatType) -> bool {
        self.total(stat).map(|t| t.usable_games > 0).unwrap_or(false)
    }

    /// Per-game average of a stat
    pub fn per_game(&self, stat: StatType) -> Option<f64> {
        ratio(Some(self.value(stat)), Some(self.games as f64))
    }

    /// Season rows: every required stat plus optional stats seen in at least one game
    pub fn to_season_stats(
        &self,
        position: Position,
        player_id: i64,
        season: i32,
    ) -> Vec<SeasonStat> {
        let required = position.required_stats();
        let mut rows: Vec<SeasonStat> = required
            .iter()
            .map(|stat| SeasonStat::new(player_id, season, *stat, self.value(*stat)))
            .collect();

        for (stat, total) in &self.totals {
            if !required.contains(stat) && total.usable_games > 0 {
                rows.push(SeasonStat::new(player_id, season, *stat, total.value));
            }
        }
        rows
    }
}

/// Reduces game records to season totals using the position's column table
#[derive(Debug, Clone, Copy)]
pub struct StatAggregator {
    position: Position,
}

impl StatAggregator {
    pub fn new(position: Position) -> Self {
        Self { position }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    /// Aggregate one player's game records for a season
    pub fn aggregate(&self, games: &[GameRecord]) -> SeasonAggregate {
        let mut aggregate = SeasonAggregate::default();
        let mut weeks = BTreeSet::new();

        for &(_, stat) in self.position.column_map() {
            aggregate.totals.insert(stat, StatTotal::default());
        }

        for game in games {
            if !weeks.insert((game.season, game.week)) {
                debug!(
                    "Duplicate game record for player {} season {} week {}; counting once",
                    game.player_id, game.season, game.week
                );
                continue;
            }

            for &(column, stat) in self.position.column_map() {
                match game.value(column) {
                    RawValue::Number(v) => {
                        let total = aggregate.totals.entry(stat).or_default();
                        total.value += v;
                        total.usable_games += 1;
                    }
                    RawValue::Absent => {}
                    RawValue::Invalid(raw) => aggregate.invalid.push(InvalidValue {
                        week: game.week,
                        stat,
                        column,
                        raw,
                    }),
                }
            }
        }

        aggregate.games = weeks.len();
        aggregate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn game(week: u32, stats: serde_json::Value) -> GameRecord {
        GameRecord {
            player_id: 12,
            season: 2024,
            week,
            opponent: None,
            result: None,
            stats: serde_json::from_value(stats).unwrap(),
        }
    }

    #[test]
    fn test_sums_mapped_columns() {
        let games = vec![
            game(1, json!({"rush_att": 18, "rush_yds": 92, "rush_td": 1, "tgt": 4, "rec": 3, "rec_yds": 21, "rec_td": 0})),
            game(2, json!({"rush_att": "20", "rush_yds": "110", "rush_td": "0", "tgt": 5, "rec": 5, "rec_yds": 40, "rec_td": 1})),
        ];

        let aggregate = StatAggregator::new(Position::RB).aggregate(&games);

        assert_eq!(aggregate.games, 2);
        assert_eq!(aggregate.value(StatType::RushAttempts), 38.0);
        assert_eq!(aggregate.value(StatType::RushYards), 202.0);
        assert_eq!(aggregate.value(StatType::RecTd), 1.0);
        assert_eq!(aggregate.per_game(StatType::RushYards), Some(101.0));
        assert!(aggregate.invalid.is_empty());
    }

    #[test]
    fn test_missing_column_contributes_zero() {
        let games = vec![
            game(1, json!({"tgt": 8, "rec": 6, "rec_yds": 75, "rec_td": 1})),
            game(2, json!({"tgt": 7, "rec": 5})),
        ];

        let aggregate = StatAggregator::new(Position::WR).aggregate(&games);

        assert_eq!(aggregate.value(StatType::RecYards), 75.0);
        assert_eq!(aggregate.total(StatType::RecYards).unwrap().usable_games, 1);
        assert_eq!(aggregate.value(StatType::Targets), 15.0);
    }

    #[test]
    fn test_invalid_values_are_excluded_and_reported() {
        let games = vec![
            game(1, json!({"tgt": 8, "rec": 6, "rec_yds": 75, "rec_td": 1})),
            game(2, json!({"tgt": 7, "rec": 5, "rec_yds": "DNP", "rec_td": 0})),
        ];

        let aggregate = StatAggregator::new(Position::TE).aggregate(&games);

        assert_eq!(aggregate.value(StatType::RecYards), 75.0);
        assert_eq!(aggregate.invalid.len(), 1);
        assert_eq!(aggregate.invalid[0].week, 2);
        assert_eq!(aggregate.invalid[0].stat, StatType::RecYards);
        assert_eq!(aggregate.invalid[0].raw, "DNP");
    }

    #[test]
    fn test_duplicate_weeks_counted_once() {
        let games = vec![
            game(1, json!({"tgt": 8, "rec": 6, "rec_yds": 75, "rec_td": 1})),
            game(1, json!({"tgt": 8, "rec": 6, "rec_yds": 75, "rec_td": 1})),
        ];

        let aggregate = StatAggregator::new(Position::WR).aggregate(&games);
        assert_eq!(aggregate.games, 1);
        assert_eq!(aggregate.value(StatType::Targets), 8.0);
    }

    #[test]
    fn test_season_rows_include_seen_optional_stats() {
        let games = vec![game(1, json!({"tgt": 8, "rec": 6, "rec_yds": 75, "rec_td": 1, "fl": 1}))];
        let aggregate = StatAggregator::new(Position::WR).aggregate(&games);
        let rows = aggregate.to_season_stats(Position::WR, 12, 2024);

        assert_eq!(rows.len(), Position::WR.required_stats().len() + 1);
        assert!(rows.iter().any(|r| r.stat_type == StatType::Fumbles && r.value == 1.0));
        assert!(rows.iter().any(|r| r.stat_type == StatType::Games && r.value == 1.0));
    }
}
