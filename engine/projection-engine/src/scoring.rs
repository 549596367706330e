//! Fantasy scoring formulas

use serde::{Deserialize, Serialize};

use crate::projection::{FantasyPoints, StatLine};
use crate::stats::StatType;

pub const PASS_YARD_POINTS: f64 = 0.04;
pub const PASS_TD_POINTS: f64 = 4.0;
pub const INTERCEPTION_POINTS: f64 = -2.0;
pub const RUSH_YARD_POINTS: f64 = 0.1;
pub const RUSH_TD_POINTS: f64 = 6.0;
pub const REC_YARD_POINTS: f64 = 0.1;
pub const REC_TD_POINTS: f64 = 6.0;
pub const FUMBLE_LOST_POINTS: f64 = -2.0;

/// Scoring systems differing only by the per-reception award
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringFormat {
    Standard,
    HalfPpr,
    Ppr,
}

impl ScoringFormat {
    pub const ALL: [ScoringFormat; 3] =
        [ScoringFormat::HalfPpr, ScoringFormat::Ppr, ScoringFormat::Standard];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScoringFormat::Standard => "standard",
            ScoringFormat::HalfPpr => "half_ppr",
            ScoringFormat::Ppr => "ppr",
        }
    }

    /// Stored total for this format
    pub fn stored(&self, points: &FantasyPoints) -> Option<f64> {
        match self {
            ScoringFormat::Standard => points.standard,
            ScoringFormat::HalfPpr => points.half_ppr,
            ScoringFormat::Ppr => points.ppr,
        }
    }

    pub fn reception_points(&self) -> f64 {
        match self {
            ScoringFormat::Standard => 0.0,
            ScoringFormat::HalfPpr => 0.5,
            ScoringFormat::Ppr => 1.0,
        }
    }
}

impl std::fmt::Display for ScoringFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Points for a stat line; unset fields contribute nothing
pub fn score(line: &StatLine, format: ScoringFormat) -> f64 {
    let v = |stat: StatType| line.value_or_zero(stat);

    PASS_YARD_POINTS * v(StatType::PassYards)
        + PASS_TD_POINTS * v(StatType::PassTd)
        + INTERCEPTION_POINTS * v(StatType::Interceptions)
        + RUSH_YARD_POINTS * v(StatType::RushYards)
        + RUSH_TD_POINTS * v(StatType::RushTd)
        + format.reception_points() * v(StatType::Receptions)
        + REC_YARD_POINTS * v(StatType::RecYards)
        + REC_TD_POINTS * v(StatType::RecTd)
        + FUMBLE_LOST_POINTS * v(StatType::Fumbles)
}

/// Score a line under every format
pub fn score_all(line: &StatLine) -> FantasyPoints {
    FantasyPoints {
        half_ppr: Some(score(line, ScoringFormat::HalfPpr)),
        ppr: Some(score(line, ScoringFormat::Ppr)),
        standard: Some(score(line, ScoringFormat::Standard)),
    }
}
