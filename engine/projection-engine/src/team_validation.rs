//! Team aggregate cross checks
//!
//! Team totals are reported, never corrected: the team row and the receiver
//! rows come from different feeds and neither is authoritative.

use crate::config::ValidationConfig;
use crate::models::{ReceiverLine, TeamStat};
use crate::validation::ValidationIssue;

/// Cross-check a team's aggregate against itself and its receivers
pub fn validate_team(
    team: &TeamStat,
    receivers: &[ReceiverLine],
    config: &ValidationConfig,
) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let mut report = |field: &str, stored: f64, calculated: f64| {
        issues.push(ValidationIssue::TeamAggregate {
            team: team.team.clone(),
            field: field.to_string(),
            stored,
            calculated,
        });
    };

    let attempts = team.pass_attempts + team.rush_attempts;
    if let Some(plays) = team.plays {
        if (plays - attempts).abs() > config.team_plays_slack {
            report("plays", plays, attempts);
        }
    }

    if let (Some(rate), true) = (team.pass_td_rate, team.pass_attempts > 0.0) {
        let expected = team.pass_td / team.pass_attempts;
        if (rate - expected).abs() > config.derived_field_tolerance {
            report("pass_td_rate", rate, expected);
        }
    }

    if (team.targets - team.pass_attempts).abs() > config.team_plays_slack {
        report("targets", team.targets, team.pass_attempts);
    }

    if !receivers.is_empty() {
        let rec_yards: f64 = receivers.iter().map(|r| r.rec_yards).sum();
        let receptions: f64 = receivers.iter().map(|r| r.receptions).sum();

        if relative_gap(team.pass_yards, rec_yards) > config.team_yards_tolerance {
            report("pass_yards", team.pass_yards, rec_yards);
        }
        if (team.completions - receptions).abs() > config.team_plays_slack {
            report("completions", team.completions, receptions);
        }
    }

    issues
}

fn relative_gap(stored: f64, calculated: f64) -> f64 {
    if calculated == 0.0 {
        return if stored == 0.0 { 0.0 } else { f64::INFINITY };
    }
    (stored - calculated).abs() / calculated.abs()
}
