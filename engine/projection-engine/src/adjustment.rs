//! Analyst adjustments applied to an existing projection
//!
//! Adjustments mutate the projection in place. Every requested key is checked
//! before any field changes, so a rejected map leaves the projection as it was.
//! Keys the engine does not know are ignored to let callers pass optional knobs.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::derive::derive_efficiency;
use crate::error::{ProjectionError, Result};
use crate::projection::{Projection, StatLine};
use crate::scoring::score_all;
use crate::stats::{Position, StatType};

/// Upper bound accepted for an absolute target share
pub const MAX_TARGET_SHARE: f64 = 0.5;

/// Named adjustment factors keyed by the caller's knob name
pub type Adjustments = BTreeMap<String, f64>;

/// Adjustment knobs, in the order they are applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentKey {
    PassVolume,
    RushVolume,
    TargetShare,
    TdRate,
    IntRate,
    ScoringRate,
}

impl AdjustmentKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdjustmentKey::PassVolume => "pass_volume",
            AdjustmentKey::RushVolume => "rush_volume",
            AdjustmentKey::TargetShare => "target_share",
            AdjustmentKey::TdRate => "td_rate",
            AdjustmentKey::IntRate => "int_rate",
            AdjustmentKey::ScoringRate => "scoring_rate",
        }
    }

    /// Whether the value is an absolute setting rather than a multiplier
    pub fn is_absolute(&self) -> bool {
        matches!(self, AdjustmentKey::TargetShare)
    }

    /// Fields scaled by a multiplicative key for a position's layout
    pub fn scaled_fields(&self, position: Position) -> &'static [StatType] {
        use StatType::*;
        match (self, position) {
            (AdjustmentKey::PassVolume, _) => {
                &[PassAttempts, Completions, PassYards, PassTd, Interceptions]
            }
            (AdjustmentKey::RushVolume, _) => &[RushAttempts, RushYards, RushTd],
            (AdjustmentKey::TdRate, Position::QB) => &[PassTd],
            (AdjustmentKey::TdRate, Position::RB) => &[RushTd, RecTd],
            (AdjustmentKey::TdRate, Position::WR | Position::TE) => &[RecTd],
            (AdjustmentKey::IntRate, _) => &[Interceptions],
            (AdjustmentKey::ScoringRate, _) => &[PassTd, RushTd, RecTd],
            (AdjustmentKey::TargetShare, _) => &[],
        }
    }
}

impl fmt::Display for AdjustmentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdjustmentKey {
    type Err = ProjectionError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pass_volume" => Ok(AdjustmentKey::PassVolume),
            "rush_volume" => Ok(AdjustmentKey::RushVolume),
            "target_share" => Ok(AdjustmentKey::TargetShare),
            "td_rate" => Ok(AdjustmentKey::TdRate),
            "int_rate" => Ok(AdjustmentKey::IntRate),
            "scoring_rate" => Ok(AdjustmentKey::ScoringRate),
            other => Err(ProjectionError::invalid_input(format!("unknown adjustment: {other}"))),
        }
    }
}

/// What an adjustment call changed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdjustmentSummary {
    pub applied: Vec<AdjustmentKey>,
    pub ignored: Vec<String>,
    pub half_ppr_before: Option<f64>,
    pub half_ppr_after: Option<f64>,
}

/// Parse and range-check a raw adjustment map
pub fn parse_adjustments(
    adjustments: &Adjustments,
) -> Result<(BTreeMap<AdjustmentKey, f64>, Vec<String>)> {
    let mut parsed = BTreeMap::new();
    let mut ignored = Vec::new();

    for (name, value) in adjustments {
        let key = match name.parse::<AdjustmentKey>() {
            Ok(key) => key,
            Err(_) => {
                debug!("Ignoring unknown adjustment key {}", name);
                ignored.push(name.clone());
                continue;
            }
        };

        if !value.is_finite() || *value < 0.0 {
            return Err(ProjectionError::invalid_input(format!(
                "{key} must be a non-negative number, got {value}"
            )));
        }
        if key.is_absolute() && *value > MAX_TARGET_SHARE {
            return Err(ProjectionError::invalid_input(format!(
                "{key} must be within 0.0..={MAX_TARGET_SHARE}, got {value}"
            )));
        }
        parsed.insert(key, *value);
    }

    Ok((parsed, ignored))
}

/// Apply `adjustments` to `projection` in place, then re-derive efficiency and points
pub fn apply_adjustments(
    projection: &mut Projection,
    adjustments: &Adjustments,
) -> Result<AdjustmentSummary> {
    let (parsed, ignored) = parse_adjustments(adjustments)?;
    let mut summary = AdjustmentSummary {
        ignored,
        half_ppr_before: projection.points.half_ppr,
        ..Default::default()
    };

    for (key, value) in &parsed {
        let changed = match key {
            AdjustmentKey::TargetShare => set_target_share(&mut projection.stats, *value),
            _ => {
                let mut any = false;
                for stat in key.scaled_fields(projection.position) {
                    any |= projection.stats.scale(*stat, *value);
                }
                any
            }
        };

        if changed {
            summary.applied.push(*key);
        } else {
            debug!(
                "Adjustment {} had no applicable fields for projection {}",
                key, projection.id
            );
        }
    }

    refresh_derived(projection);
    summary.half_ppr_after = projection.points.half_ppr;
    Ok(summary)
}

/// Recompute efficiency fields and fantasy points from current volumes
pub fn refresh_derived(projection: &mut Projection) {
    derive_efficiency(&mut projection.stats);
    projection.points = score_all(&projection.stats);
    projection.stamp.touch();
}

/// Set an absolute target share, rescaling receiving volume when a prior share exists
fn set_target_share(line: &mut StatLine, share: f64) -> bool {
    if !line.carries(StatType::TargetShare) {
        return false;
    }

    if let Some(previous) = line.get(StatType::TargetShare).filter(|p| *p > 0.0) {
        let ratio = share / previous;
        for stat in [StatType::Targets, StatType::Receptions, StatType::RecYards, StatType::RecTd] {
            line.scale(stat, ratio);
        }
    } else {
        debug!("No prior target share; setting share without rescaling targets");
    }

    line.set(StatType::TargetShare, Some(share))
}
