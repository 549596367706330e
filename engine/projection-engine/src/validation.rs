//! Consistency checks for stored season stats and projections
//!
//! Player checks compare stored season totals against the game records and
//! hand back the corrections the engine should write. Projection checks are
//! read-only diagnostics.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

use crate::aggregation::StatAggregator;
use crate::config::ValidationConfig;
use crate::derive::rules_for;
use crate::models::{GameRecord, PlayerRecord, SeasonStat};
use crate::projection::Projection;
use crate::scoring::{score, ScoringFormat};
use crate::stats::StatType;

/// Error category of a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IssueKind {
    InconsistentData,
    MissingData,
    InvalidInput,
}

/// One validation finding; `Display` renders the reported message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum ValidationIssue {
    InvalidPosition {
        player: String,
        position: String,
    },
    GameCount {
        player: String,
        game_logs: usize,
        stored: f64,
    },
    InconsistentTotal {
        player: String,
        stat: StatType,
        stored: f64,
        calculated: f64,
    },
    MissingStat {
        player: String,
        stat: StatType,
        calculated: f64,
    },
    MissingRequired {
        player: String,
        stat: StatType,
    },
    InvalidGameValue {
        player: String,
        stat: StatType,
        week: u32,
        raw: String,
    },
    DerivedField {
        subject: String,
        stat: StatType,
        stored: Option<f64>,
        calculated: Option<f64>,
    },
    FantasyPoints {
        subject: String,
        format: ScoringFormat,
        stored: Option<f64>,
        calculated: f64,
    },
    TeamAggregate {
        team: String,
        field: String,
        stored: f64,
        calculated: f64,
    },
}

impl ValidationIssue {
    pub fn kind(&self) -> IssueKind {
        match self {
            ValidationIssue::InvalidPosition { .. } | ValidationIssue::InvalidGameValue { .. } => {
                IssueKind::InvalidInput
            }
            ValidationIssue::MissingRequired { .. } => IssueKind::MissingData,
            _ => IssueKind::InconsistentData,
        }
    }

    /// Whether the validator wrote a correction for this finding
    pub fn corrected(&self) -> bool {
        matches!(
            self,
            ValidationIssue::GameCount { .. }
                | ValidationIssue::InconsistentTotal { .. }
                | ValidationIssue::MissingStat { .. }
        )
    }
}

struct Maybe(Option<f64>);

impl fmt::Display for Maybe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(v) => write!(f, "{v}"),
            None => f.write_str("unset"),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::InvalidPosition { player, position } => {
                write!(f, "{player} has invalid position: {position}")
            }
            ValidationIssue::GameCount { player, game_logs, stored } => {
                write!(f, "{player} has {game_logs} game logs but games stat is {stored}")
            }
            ValidationIssue::InconsistentTotal { player, stat, stored, calculated } => {
                write!(f, "{player} has inconsistent {stat}: stored={stored}, calculated={calculated}")
            }
            ValidationIssue::MissingStat { player, stat, .. } => {
                write!(f, "{player} is missing {stat} stat")
            }
            ValidationIssue::MissingRequired { player, stat } => {
                write!(f, "{player} is missing required stat: {stat}")
            }
            ValidationIssue::InvalidGameValue { player, stat, week, raw } => {
                write!(f, "{player} has invalid {stat} value in week {week}: {raw}")
            }
            ValidationIssue::DerivedField { subject, stat, stored, calculated } => write!(
                f,
                "{subject} has inconsistent {stat}: stored={}, calculated={}",
                Maybe(*stored),
                Maybe(*calculated)
            ),
            ValidationIssue::FantasyPoints { subject, format, stored, calculated } => write!(
                f,
                "{subject} has inconsistent {format} points: stored={}, calculated={calculated}",
                Maybe(*stored)
            ),
            ValidationIssue::TeamAggregate { team, field, stored, calculated } => {
                write!(f, "{team} has inconsistent team {field}: stored={stored}, calculated={calculated}")
            }
        }
    }
}

/// Findings for one player/season plus the season rows to write back
#[derive(Debug, Clone, Default)]
pub struct PlayerValidation {
    pub issues: Vec<ValidationIssue>,
    pub corrections: Vec<SeasonStat>,
}

impl PlayerValidation {
    fn correct(&mut self, issue: ValidationIssue, row: SeasonStat) {
        self.issues.push(issue);
        self.corrections.push(row);
    }
}

/// Compares stored season totals against game records
pub struct PlayerValidator<'a> {
    config: &'a ValidationConfig,
}

impl<'a> PlayerValidator<'a> {
    pub fn new(config: &'a ValidationConfig) -> Self {
        Self { config }
    }

    /// Run the game-count, season-total and required-stat checks
    pub fn check(
        &self,
        player: &PlayerRecord,
        season: i32,
        stored: &[SeasonStat],
        games: &[GameRecord],
    ) -> PlayerValidation {
        let mut result = PlayerValidation::default();
        let name = player.name.clone();

        let position = match player.position() {
            Ok(position) => position,
            Err(_) => {
                result.issues.push(ValidationIssue::InvalidPosition {
                    player: name,
                    position: player.position.clone(),
                });
                return result;
            }
        };

        if stored.is_empty() && games.is_empty() {
            debug!("Nothing to validate for {} season {}", name, season);
            return result;
        }

        let stored: BTreeMap<StatType, f64> =
            stored.iter().map(|row| (row.stat_type, row.value)).collect();
        let row = |stat, value| SeasonStat::new(player.player_id, season, stat, value);

        let aggregate = StatAggregator::new(position).aggregate(games);

        for invalid in &aggregate.invalid {
            result.issues.push(ValidationIssue::InvalidGameValue {
                player: name.clone(),
                stat: invalid.stat,
                week: invalid.week,
                raw: invalid.raw.clone(),
            });
        }

        if !games.is_empty() {
            let count = aggregate.games;
            match stored.get(&StatType::Games) {
                Some(&m) if (m - count as f64).abs() > f64::EPSILON => result.correct(
                    ValidationIssue::GameCount { player: name.clone(), game_logs: count, stored: m },
                    row(StatType::Games, count as f64),
                ),
                Some(_) => {}
                None => result.correct(
                    ValidationIssue::MissingStat {
                        player: name.clone(),
                        stat: StatType::Games,
                        calculated: count as f64,
                    },
                    row(StatType::Games, count as f64),
                ),
            }

            for (&stat, total) in &aggregate.totals {
                let calculated = total.value;
                match stored.get(&stat) {
                    Some(&value) => {
                        if calculated > 0.0
                            && (value - calculated).abs() / calculated
                                > self.config.season_total_tolerance
                        {
                            result.correct(
                                ValidationIssue::InconsistentTotal {
                                    player: name.clone(),
                                    stat,
                                    stored: value,
                                    calculated,
                                },
                                row(stat, calculated),
                            );
                        }
                    }
                    None if total.usable_games > 0 => result.correct(
                        ValidationIssue::MissingStat { player: name.clone(), stat, calculated },
                        row(stat, calculated),
                    ),
                    None => {}
                }
            }
        }

        for &stat in position.required_stats() {
            if !stored.contains_key(&stat) && !aggregate.has_usable(stat) {
                let already = result.corrections.iter().any(|c| c.stat_type == stat);
                if !already {
                    result.issues.push(ValidationIssue::MissingRequired {
                        player: name.clone(),
                        stat,
                    });
                }
            }
        }

        result
    }
}

/// Label used for projection findings
pub fn projection_subject(projection: &Projection) -> String {
    match &projection.scenario_id {
        Some(scenario) => format!(
            "player {} {} projection ({})",
            projection.player_id, projection.season, scenario
        ),
        None => format!("player {} {} projection", projection.player_id, projection.season),
    }
}

/// Derived-field checks; never mutates the projection
pub fn check_projection_math(
    projection: &Projection,
    config: &ValidationConfig,
) -> Vec<ValidationIssue> {
    let line = &projection.stats;
    let mut issues = Vec::new();

    for rule in rules_for(line) {
        let stored = line.get(rule.rate);
        let calculated = rule.expected(line);
        let drifted = match (stored, calculated) {
            (Some(s), Some(c)) => (s - c).abs() > config.derived_field_tolerance,
            (None, None) => false,
            _ => true,
        };
        if drifted {
            issues.push(ValidationIssue::DerivedField {
                subject: projection_subject(projection),
                stat: rule.rate,
                stored,
                calculated,
            });
        }
    }

    issues
}

/// Fantasy-point checks under every format; never mutates the projection
pub fn check_fantasy_points(
    projection: &Projection,
    config: &ValidationConfig,
) -> Vec<ValidationIssue> {
    ScoringFormat::ALL
        .iter()
        .filter_map(|format| {
            let stored = format.stored(&projection.points);
            let calculated = score(&projection.stats, *format);
            let ok = stored
                .map(|s| (s - calculated).abs() <= config.fantasy_point_tolerance)
                .unwrap_or(false);
            (!ok).then(|| ValidationIssue::FantasyPoints {
                subject: projection_subject(projection),
                format: *format,
                stored,
                calculated,
            })
        })
        .collect()
}

/// All read-only projection diagnostics
pub fn check_projection(projection: &Projection, config: &ValidationConfig) -> Vec<ValidationIssue> {
    let mut issues = check_projection_math(projection, config);
    issues.extend(check_fantasy_points(projection, config));
    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adjustment::refresh_derived;
    use crate::models::PlayerStatus;
    use crate::projection::ProjectionSource;
    use crate::stats::Position;
    use serde_json::json;

    fn player(position: &str) -> PlayerRecord {
        PlayerRecord {
            player_id: 12,
            name: "Sam Passer".to_string(),
            team: "NYJ".to_string(),
            position: position.to_string(),
            draft_position: None,
            status: PlayerStatus::Veteran,
        }
    }

    fn wr_games(count: u32, rec_yds: f64) -> Vec<GameRecord> {
        (1..=count)
            .map(|week| GameRecord {
                player_id: 12,
                season: 2024,
                week,
                opponent: None,
                result: None,
                stats: serde_json::from_value(json!({
                    "tgt": 8, "rec": 5, "rec_yds": rec_yds, "rec_td": 0
                }))
                .unwrap(),
            })
            .collect()
    }

    fn stored(rows: &[(StatType, f64)]) -> Vec<SeasonStat> {
        rows.iter().map(|(s, v)| SeasonStat::new(12, 2024, *s, *v)).collect()
    }

    #[test]
    fn test_issue_messages() {
        let issue = ValidationIssue::GameCount {
            player: "Sam Passer".to_string(),
            game_logs: 15,
            stored: 16.0,
        };
        assert_eq!(issue.to_string(), "Sam Passer has 15 game logs but games stat is 16");
        assert!(issue.corrected());

        let issue = ValidationIssue::InconsistentTotal {
            player: "Sam Passer".to_string(),
            stat: StatType::PassYards,
            stored: 3000.0,
            calculated: 3750.0,
        };
        assert_eq!(
            issue.to_string(),
            "Sam Passer has inconsistent pass_yards: stored=3000, calculated=3750"
        );

        let issue =
            ValidationIssue::MissingRequired { player: "Sam Passer".to_string(), stat: StatType::RushTd };
        assert_eq!(issue.to_string(), "Sam Passer is missing required stat: rush_td");
        assert_eq!(issue.kind(), IssueKind::MissingData);
        assert!(!issue.corrected());
    }

    #[test]
    fn test_invalid_position_short_circuits() {
        let config = ValidationConfig::default();
        let result = PlayerValidator::new(&config).check(&player("K"), 2024, &[], &wr_games(3, 40.0));
        assert_eq!(result.issues.len(), 1);
        assert!(result.issues[0].to_string().contains("invalid position: K"));
        assert!(result.corrections.is_empty());
    }

    #[test]
    fn test_empty_season_has_no_issues() {
        let config = ValidationConfig::default();
        let result = PlayerValidator::new(&config).check(&player("QB"), 2024, &[], &[]);
        assert!(result.issues.is_empty());
    }

    #[test]
    fn test_tolerance_boundary() {
        let config = ValidationConfig::default();
        let games = wr_games(10, 100.0);
        let base = [
            (StatType::Games, 10.0),
            (StatType::Targets, 80.0),
            (StatType::Receptions, 50.0),
            (StatType::RecTd, 0.0),
        ];

        let mut within = stored(&base);
        within.push(SeasonStat::new(12, 2024, StatType::RecYards, 1000.9));
        let result = PlayerValidator::new(&config).check(&player("WR"), 2024, &within, &games);
        assert!(result.issues.is_empty(), "{:?}", result.issues);

        let mut beyond = stored(&base);
        beyond.push(SeasonStat::new(12, 2024, StatType::RecYards, 1011.0));
        let result = PlayerValidator::new(&config).check(&player("WR"), 2024, &beyond, &games);
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.corrections, vec![SeasonStat::new(12, 2024, StatType::RecYards, 1000.0)]);
    }

    #[test]
    fn test_absent_games_stat_is_inserted() {
        let config = ValidationConfig::default();
        let result = PlayerValidator::new(&config).check(
            &player("WR"),
            2024,
            &stored(&[
                (StatType::Targets, 32.0),
                (StatType::Receptions, 20.0),
                (StatType::RecYards, 200.0),
                (StatType::RecTd, 0.0),
            ]),
            &wr_games(4, 50.0),
        );

        let messages: Vec<String> = result.issues.iter().map(|i| i.to_string()).collect();
        assert_eq!(messages, vec!["Sam Passer is missing games stat".to_string()]);
        assert!(result.issues[0].corrected());
        assert_eq!(result.corrections, vec![SeasonStat::new(12, 2024, StatType::Games, 4.0)]);
    }

    #[test]
    fn test_missing_stats_are_inserted_or_reported() {
        let config = ValidationConfig::default();
        let mut games = wr_games(4, 50.0);
        for game in &mut games {
            game.stats.remove("rec_td");
        }
        let result = PlayerValidator::new(&config).check(
            &player("WR"),
            2024,
            &stored(&[(StatType::Games, 4.0), (StatType::Targets, 32.0)]),
            &games,
        );

        let messages: Vec<String> = result.issues.iter().map(|i| i.to_string()).collect();
        assert!(messages.contains(&"Sam Passer is missing receptions stat".to_string()));
        assert!(messages.contains(&"Sam Passer is missing rec_yards stat".to_string()));
        assert!(messages.contains(&"Sam Passer is missing required stat: rec_td".to_string()));
        assert_eq!(result.corrections.len(), 2);
    }

    #[test]
    fn test_invalid_game_value_reported() {
        let config = ValidationConfig::default();
        let mut games = wr_games(2, 30.0);
        games[1].stats.insert("rec".to_string(), json!("DNP"));
        let result = PlayerValidator::new(&config).check(
            &player("WR"),
            2024,
            &stored(&[
                (StatType::Games, 2.0),
                (StatType::Targets, 16.0),
                (StatType::Receptions, 5.0),
                (StatType::RecYards, 60.0),
                (StatType::RecTd, 0.0),
            ]),
            &games,
        );

        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].kind(), IssueKind::InvalidInput);
        assert_eq!(result.issues[0].to_string(), "Sam Passer has invalid receptions value in week 2: DNP");
    }

    #[test]
    fn test_projection_checks_are_read_only() {
        let config = ValidationConfig::default();
        let mut projection =
            Projection::new(12, 2025, None, Position::WR, ProjectionSource::DefaultTemplate);
        projection.stats.set(StatType::Targets, Some(100.0));
        projection.stats.set(StatType::Receptions, Some(60.0));
        projection.stats.set(StatType::RecYards, Some(720.0));
        refresh_derived(&mut projection);
        assert!(check_projection(&projection, &config).is_empty());

        projection.stats.set(StatType::CatchPct, Some(0.7));
        projection.points.half_ppr = Some(1.0);
        let before = projection.clone();
        let issues = check_projection(&projection, &config);

        assert_eq!(issues.len(), 2);
        assert!(issues[0].to_string().contains("inconsistent catch_pct: stored=0.7, calculated=0.6"));
        assert!(issues[1].to_string().contains("half_ppr points"));
        assert_eq!(projection, before);
    }
}
