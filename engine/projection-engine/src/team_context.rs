//! Blending rookie volume with team tendencies
//!
//! Each step blends the model-implied season volume for one stat family with
//! the volume the team's per-game tendency implies, then scales the dependent
//! volumes by `adjusted / original` so the rookie's efficiency is unchanged.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::BlendWeights;
use crate::models::TeamStat;
use crate::projection::StatLine;
use crate::stats::{Position, StatType};

/// Why a blend step did not run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    NoGames,
    NoModelVolume,
    NoTeamVolume,
    NoPlayingTime,
}

/// Outcome of one blend step
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BlendStep {
    Applied { stat: StatType, original: f64, adjusted: f64, ratio: f64 },
    Skipped { stat: StatType, reason: SkipReason },
}

impl BlendStep {
    pub fn ratio(&self) -> Option<f64> {
        match self {
            BlendStep::Applied { ratio, .. } => Some(*ratio),
            BlendStep::Skipped { .. } => None,
        }
    }
}

const PASS_DEPENDENTS: [StatType; 4] =
    [StatType::Completions, StatType::PassYards, StatType::PassTd, StatType::Interceptions];
const RUSH_DEPENDENTS: [StatType; 2] = [StatType::RushYards, StatType::RushTd];
const RECEIVING_DEPENDENTS: [StatType; 3] =
    [StatType::Receptions, StatType::RecYards, StatType::RecTd];

/// Blend `line` with the team context; returns one entry per attempted step
pub fn enhance_with_team_context(
    line: &mut StatLine,
    position: Position,
    games: f64,
    playing_time_pct: Option<f64>,
    team: &TeamStat,
    weights: &BlendWeights,
) -> Vec<BlendStep> {
    let mut steps = Vec::new();

    match position {
        Position::QB => {
            let team_pg = team.per_game(team.pass_attempts);
            steps.push(blend(
                line,
                StatType::PassAttempts,
                &PASS_DEPENDENTS,
                games,
                team_pg,
                playing_time_pct,
                weights.qb_model_weight,
            ));
        }
        Position::RB => {
            let team_pg = team.per_game(team.rush_attempts);
            steps.push(blend(
                line,
                StatType::RushAttempts,
                &RUSH_DEPENDENTS,
                games,
                team_pg,
                playing_time_pct,
                weights.rush_model_weight,
            ));
        }
        Position::WR | Position::TE => {}
    }

    if let Some(share) = weights.target_share(position) {
        let team_pg = team.per_game(team.targets).map(|pg| pg * share);
        let step = blend(
            line,
            StatType::Targets,
            &RECEIVING_DEPENDENTS,
            games,
            team_pg,
            Some(1.0),
            weights.receiving_model_weight,
        );
        if let (BlendStep::Applied { adjusted, .. }, Some(team_targets)) =
            (step, team.per_game(team.targets).map(|pg| pg * games))
        {
            if team_targets > 0.0 {
                line.set(StatType::TargetShare, Some(adjusted / team_targets));
            }
        }
        steps.push(step);
    }

    steps
}

fn blend(
    line: &mut StatLine,
    volume: StatType,
    dependents: &[StatType],
    games: f64,
    team_per_game: Option<f64>,
    playing_time_pct: Option<f64>,
    model_weight: f64,
) -> BlendStep {
    let skip = |reason: SkipReason| {
        debug!("Skipping {} team blend: {:?}", volume, reason);
        BlendStep::Skipped { stat: volume, reason }
    };

    if games <= 0.0 {
        return skip(SkipReason::NoGames);
    }
    let original = match line.get(volume) {
        Some(v) if v > 0.0 => v,
        _ => return skip(SkipReason::NoModelVolume),
    };
    let team_per_game = match team_per_game {
        Some(v) if v > 0.0 => v,
        _ => return skip(SkipReason::NoTeamVolume),
    };
    let playing_time_pct = match playing_time_pct {
        Some(p) if p > 0.0 => p,
        _ => return skip(SkipReason::NoPlayingTime),
    };

    let model_per_game = original / games;
    let team_side = team_per_game * playing_time_pct;
    let blended_per_game = model_weight * model_per_game + (1.0 - model_weight) * team_side;
    let adjusted = blended_per_game * games;
    let ratio = adjusted / original;

    line.set(volume, Some(adjusted));
    for stat in dependents {
        line.scale(*stat, ratio);
    }

    BlendStep::Applied { stat: volume, original, adjusted, ratio }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derive::{derive_efficiency, rules_for};

    fn team() -> TeamStat {
        TeamStat {
            team: "CHI".to_string(),
            season: 2024,
            games: 17.0,
            pass_attempts: 595.0,
            rush_attempts: 425.0,
            targets: 595.0,
            ..Default::default()
        }
    }

    fn qb_line() -> StatLine {
        let mut line = StatLine::for_position(Position::QB);
        line.set(StatType::PassAttempts, Some(400.0));
        line.set(StatType::Completions, Some(252.0));
        line.set(StatType::PassYards, Some(2720.0));
        line.set(StatType::PassTd, Some(16.0));
        line.set(StatType::Interceptions, Some(10.0));
        derive_efficiency(&mut line);
        line
    }

    #[test]
    fn test_qb_blend_preserves_efficiency() {
        let mut line = qb_line();
        let before_comp = line.get(StatType::CompPct).unwrap();

        let steps = enhance_with_team_context(
            &mut line,
            Position::QB,
            16.0,
            Some(0.9),
            &team(),
            &BlendWeights::default(),
        );

        // 0.7 * 25 + 0.3 * (35 * 0.9) = 26.95 per game
        let expected = 26.95 * 16.0;
        assert_eq!(steps.len(), 1);
        assert!((line.value_or_zero(StatType::PassAttempts) - expected).abs() < 1e-9);
        assert!((steps[0].ratio().unwrap() - expected / 400.0).abs() < 1e-12);

        let comp = line.value_or_zero(StatType::Completions) / line.value_or_zero(StatType::PassAttempts);
        assert!((comp - before_comp).abs() < 1e-12);
    }

    #[test]
    fn test_receiving_blend_sets_target_share() {
        let mut line = StatLine::for_position(Position::WR);
        line.set(StatType::Targets, Some(85.0));
        line.set(StatType::Receptions, Some(52.0));
        line.set(StatType::RecYards, Some(650.0));
        line.set(StatType::RecTd, Some(4.0));

        let steps = enhance_with_team_context(
            &mut line,
            Position::WR,
            17.0,
            Some(0.85),
            &team(),
            &BlendWeights::default(),
        );

        // team side: 35 targets/g * 0.14 = 4.9; model 5.0; blend 0.6/0.4 = 4.96
        let targets = 4.96 * 17.0;
        assert_eq!(steps.len(), 1);
        assert!((line.value_or_zero(StatType::Targets) - targets).abs() < 1e-9);
        assert!((line.value_or_zero(StatType::TargetShare) - targets / 595.0).abs() < 1e-9);

        derive_efficiency(&mut line);
        assert!(rules_for(&line).all(|r| r.expected(&line) == line.get(r.rate)));
    }

    #[test]
    fn test_rb_rushing_and_receiving_blend() {
        let mut line = StatLine::for_position(Position::RB);
        line.set(StatType::RushAttempts, Some(204.8));
        line.set(StatType::RushYards, Some(860.16));
        line.set(StatType::RushTd, Some(6.0));
        line.set(StatType::Targets, Some(40.0));
        line.set(StatType::Receptions, Some(30.0));
        line.set(StatType::RecYards, Some(240.0));
        line.set(StatType::RecTd, Some(1.0));

        let steps = enhance_with_team_context(
            &mut line,
            Position::RB,
            16.0,
            Some(0.8),
            &team(),
            &BlendWeights::default(),
        );
        assert_eq!(steps.len(), 2);

        // rushing: 0.6 * 12.8 + 0.4 * (25 * 0.8) = 15.68 per game
        let rush_ratio = 250.88 / 204.8;
        assert!((line.value_or_zero(StatType::RushAttempts) - 250.88).abs() < 1e-9);
        assert!((steps[0].ratio().unwrap() - rush_ratio).abs() < 1e-12);
        assert!((line.value_or_zero(StatType::RushYards) - 860.16 * rush_ratio).abs() < 1e-9);
        assert!((line.value_or_zero(StatType::RushTd) - 6.0 * rush_ratio).abs() < 1e-9);

        // receiving: team side 35 * 0.15 * 0.30 = 1.575; 0.6 * 2.5 + 0.4 * 1.575 = 2.13
        let targets = 2.13 * 16.0;
        let rec_ratio = targets / 40.0;
        assert!((line.value_or_zero(StatType::Targets) - targets).abs() < 1e-9);
        assert!((steps[1].ratio().unwrap() - rec_ratio).abs() < 1e-12);
        assert!((line.value_or_zero(StatType::Receptions) - 30.0 * rec_ratio).abs() < 1e-9);
        assert!((line.value_or_zero(StatType::RecYards) - 240.0 * rec_ratio).abs() < 1e-9);
        assert!((line.value_or_zero(StatType::TargetShare) - targets / (35.0 * 16.0)).abs() < 1e-9);
    }

    #[test]
    fn test_te_blends_receiving_only() {
        let mut line = StatLine::for_position(Position::TE);
        line.set(StatType::Targets, Some(34.0));
        line.set(StatType::Receptions, Some(22.0));
        line.set(StatType::RecYards, Some(250.0));
        line.set(StatType::RecTd, Some(2.0));

        let steps = enhance_with_team_context(
            &mut line,
            Position::TE,
            17.0,
            Some(0.7),
            &team(),
            &BlendWeights::default(),
        );

        // team side 35 * 0.15 * 0.50 = 2.625; 0.6 * 2.0 + 0.4 * 2.625 = 2.25 per game
        assert_eq!(steps.len(), 1);
        assert!(matches!(steps[0], BlendStep::Applied { stat: StatType::Targets, .. }));
        let ratio = 38.25 / 34.0;
        assert!((line.value_or_zero(StatType::Targets) - 38.25).abs() < 1e-9);
        assert!((line.value_or_zero(StatType::Receptions) - 22.0 * ratio).abs() < 1e-9);
        assert!((line.value_or_zero(StatType::RecYards) - 250.0 * ratio).abs() < 1e-9);
        assert!((line.value_or_zero(StatType::RecTd) - 2.0 * ratio).abs() < 1e-9);
        assert!((line.value_or_zero(StatType::TargetShare) - 38.25 / 595.0).abs() < 1e-9);
        assert_eq!(line.get(StatType::RushAttempts), None);
    }

    #[test]
    fn test_missing_team_volume_skips() {
        let mut line = qb_line();
        let original = line.clone();
        let empty_team = TeamStat { games: 17.0, ..Default::default() };

        let steps = enhance_with_team_context(
            &mut line,
            Position::QB,
            16.0,
            Some(0.9),
            &empty_team,
            &BlendWeights::default(),
        );

        assert_eq!(
            steps,
            vec![BlendStep::Skipped { stat: StatType::PassAttempts, reason: SkipReason::NoTeamVolume }]
        );
        assert_eq!(line, original);
    }

    #[test]
    fn test_zero_games_skips_every_step() {
        let mut line = StatLine::for_position(Position::RB);
        line.set(StatType::RushAttempts, Some(100.0));
        line.set(StatType::Targets, Some(30.0));

        let steps = enhance_with_team_context(
            &mut line,
            Position::RB,
            0.0,
            Some(0.5),
            &team(),
            &BlendWeights::default(),
        );

        assert_eq!(steps.len(), 2);
        assert!(steps.iter().all(|s| matches!(s, BlendStep::Skipped { reason: SkipReason::NoGames, .. })));
        assert_eq!(line.get(StatType::RushAttempts), Some(100.0));
    }
}
