//! Season projection records and their position-specific stat layouts

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Stamp;
use crate::stats::{Position, StatType};

/// Passing + rushing line for quarterbacks
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QbStats {
    pub pass_attempts: Option<f64>,
    pub completions: Option<f64>,
    pub pass_yards: Option<f64>,
    pub pass_td: Option<f64>,
    pub interceptions: Option<f64>,
    pub rush_attempts: Option<f64>,
    pub rush_yards: Option<f64>,
    pub rush_td: Option<f64>,
    pub fumbles: Option<f64>,

    pub comp_pct: Option<f64>,
    pub yards_per_att: Option<f64>,
    pub pass_td_rate: Option<f64>,
    pub int_rate: Option<f64>,
    pub yards_per_carry: Option<f64>,
}

/// Rushing + receiving line for RB/WR/TE
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillStats {
    pub rush_attempts: Option<f64>,
    pub rush_yards: Option<f64>,
    pub rush_td: Option<f64>,
    pub targets: Option<f64>,
    pub receptions: Option<f64>,
    pub rec_yards: Option<f64>,
    pub rec_td: Option<f64>,
    /// Fraction of team targets, 0.0..=0.5
    pub target_share: Option<f64>,
    pub fumbles: Option<f64>,

    pub yards_per_carry: Option<f64>,
    pub catch_pct: Option<f64>,
    pub yards_per_target: Option<f64>,
    pub yards_per_reception: Option<f64>,
}

/// Stat layout selected by position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "layout", rename_all = "snake_case")]
pub enum StatLine {
    Qb(QbStats),
    Skill(SkillStats),
}

impl StatLine {
    /// Empty line with the layout for `position`
    pub fn for_position(position: Position) -> Self {
        match position {
            Position::QB => StatLine::Qb(QbStats::default()),
            Position::RB | Position::WR | Position::TE => StatLine::Skill(SkillStats::default()),
        }
    }

    /// Field storage for `stat`, or `None` when the layout does not carry it
    pub fn slot(&self, stat: StatType) -> Option<&Option<f64>> {
        use StatType::*;
        match self {
            StatLine::Qb(s) => match stat {
                PassAttempts => Some(&s.pass_attempts),
                Completions => Some(&s.completions),
                PassYards => Some(&s.pass_yards),
                PassTd => Some(&s.pass_td),
                Interceptions => Some(&s.interceptions),
                RushAttempts => Some(&s.rush_attempts),
                RushYards => Some(&s.rush_yards),
                RushTd => Some(&s.rush_td),
                Fumbles => Some(&s.fumbles),
                CompPct => Some(&s.comp_pct),
                YardsPerAtt => Some(&s.yards_per_att),
                PassTdRate => Some(&s.pass_td_rate),
                IntRate => Some(&s.int_rate),
                YardsPerCarry => Some(&s.yards_per_carry),
                _ => None,
            },
            StatLine::Skill(s) => match stat {
                RushAttempts => Some(&s.rush_attempts),
                RushYards => Some(&s.rush_yards),
                RushTd => Some(&s.rush_td),
                Targets => Some(&s.targets),
                Receptions => Some(&s.receptions),
                RecYards => Some(&s.rec_yards),
                RecTd => Some(&s.rec_td),
                TargetShare => Some(&s.target_share),
                Fumbles => Some(&s.fumbles),
                YardsPerCarry => Some(&s.yards_per_carry),
                CatchPct => Some(&s.catch_pct),
                YardsPerTarget => Some(&s.yards_per_target),
                YardsPerReception => Some(&s.yards_per_reception),
                _ => None,
            },
        }
    }

    pub fn slot_mut(&mut self, stat: StatType) -> Option<&mut Option<f64>> {
        use StatType::*;
        match self {
            StatLine::Qb(s) => match stat {
                PassAttempts => Some(&mut s.pass_attempts),
                Completions => Some(&mut s.completions),
                PassYards => Some(&mut s.pass_yards),
                PassTd => Some(&mut s.pass_td),
                Interceptions => Some(&mut s.interceptions),
                RushAttempts => Some(&mut s.rush_attempts),
                RushYards => Some(&mut s.rush_yards),
                RushTd => Some(&mut s.rush_td),
                Fumbles => Some(&mut s.fumbles),
                CompPct => Some(&mut s.comp_pct),
                YardsPerAtt => Some(&mut s.yards_per_att),
                PassTdRate => Some(&mut s.pass_td_rate),
                IntRate => Some(&mut s.int_rate),
                YardsPerCarry => Some(&mut s.yards_per_carry),
                _ => None,
            },
            StatLine::Skill(s) => match stat {
                RushAttempts => Some(&mut s.rush_attempts),
                RushYards => Some(&mut s.rush_yards),
                RushTd => Some(&mut s.rush_td),
                Targets => Some(&mut s.targets),
                Receptions => Some(&mut s.receptions),
                RecYards => Some(&mut s.rec_yards),
                RecTd => Some(&mut s.rec_td),
                TargetShare => Some(&mut s.target_share),
                Fumbles => Some(&mut s.fumbles),
                YardsPerCarry => Some(&mut s.yards_per_carry),
                CatchPct => Some(&mut s.catch_pct),
                YardsPerTarget => Some(&mut s.yards_per_target),
                YardsPerReception => Some(&mut s.yards_per_reception),
                _ => None,
            },
        }
    }

    /// Current value of `stat`; unset and non-applicable fields both read as `None`
    pub fn get(&self, stat: StatType) -> Option<f64> {
        self.slot(stat).copied().flatten()
    }

    /// Current value of `stat` with unset fields read as zero
    pub fn value_or_zero(&self, stat: StatType) -> f64 {
        self.get(stat).unwrap_or(0.0)
    }

    /// Write `value` into `stat`; returns false when the layout lacks the field
    pub fn set(&mut self, stat: StatType, value: Option<f64>) -> bool {
        match self.slot_mut(stat) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Multiply a set field in place; unset and non-applicable fields are left alone
    pub fn scale(&mut self, stat: StatType, factor: f64) -> bool {
        match self.slot_mut(stat) {
            Some(Some(value)) => {
                *value *= factor;
                true
            }
            _ => false,
        }
    }

    pub fn carries(&self, stat: StatType) -> bool {
        self.slot(stat).is_some()
    }
}

/// Fantasy point totals under each supported scoring format
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FantasyPoints {
    pub half_ppr: Option<f64>,
    pub ppr: Option<f64>,
    pub standard: Option<f64>,
}

/// One (player, season, scenario) season projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    pub id: Uuid,
    pub player_id: i64,
    pub season: i32,
    /// `None` is the baseline; named values are what-if variants
    pub scenario_id: Option<String>,
    pub position: Position,
    pub games: Option<f64>,
    pub stats: StatLine,
    pub points: FantasyPoints,
    pub source: ProjectionSource,
    pub stamp: Stamp,
}

/// How the base projection was produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProjectionSource {
    /// Prior-season totals carried forward
    CarryForward { from_season: i32 },
    /// Rookie draft-slot template
    DraftTemplate { draft_pick_min: u32, draft_pick_max: u32 },
    /// Synthesized template with position defaults
    DefaultTemplate,
    /// Comparison model tier
    ComparisonModel { tier: crate::comparison::Tier, playing_time_pct: f64 },
}

impl Projection {
    pub fn new(
        player_id: i64,
        season: i32,
        scenario_id: Option<String>,
        position: Position,
        source: ProjectionSource,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            player_id,
            season,
            scenario_id,
            position,
            games: None,
            stats: StatLine::for_position(position),
            points: FantasyPoints::default(),
            source,
            stamp: Stamp::now(),
        }
    }

    pub fn is_baseline(&self) -> bool {
        self.scenario_id.is_none()
    }

    pub fn half_ppr(&self) -> Option<f64> {
        self.points.half_ppr
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_follows_position() {
        assert!(matches!(StatLine::for_position(Position::QB), StatLine::Qb(_)));
        assert!(matches!(StatLine::for_position(Position::TE), StatLine::Skill(_)));
    }

    #[test]
    fn test_slot_access() {
        let mut line = StatLine::for_position(Position::QB);
        assert!(line.set(StatType::PassAttempts, Some(500.0)));
        assert!(!line.set(StatType::Targets, Some(10.0)));
        assert_eq!(line.get(StatType::PassAttempts), Some(500.0));
        assert_eq!(line.get(StatType::Targets), None);
        assert!(line.carries(StatType::CompPct));
        assert!(!line.carries(StatType::CatchPct));
    }

    #[test]
    fn test_scale_leaves_unset_fields() {
        let mut line = StatLine::for_position(Position::WR);
        line.set(StatType::Targets, Some(100.0));
        assert!(line.scale(StatType::Targets, 1.1));
        assert!(!line.scale(StatType::Receptions, 1.1));
        assert!((line.value_or_zero(StatType::Targets) - 110.0).abs() < 1e-9);
        assert_eq!(line.get(StatType::Receptions), None);
    }

    #[test]
    fn test_new_projection_is_baseline() {
        let projection =
            Projection::new(1, 2025, None, Position::RB, ProjectionSource::DefaultTemplate);
        assert!(projection.is_baseline());
        assert_eq!(projection.half_ppr(), None);
    }
}
