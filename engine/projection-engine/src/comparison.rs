//! Rookie comparison model
//!
//! Per-position, per-tier rate templates drawn from historical rookie
//! analogs. The table is built once and shared read-only for the life of the
//! process.

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

use crate::stats::Position;

pub const COMPARISON_MODEL_VERSION: &str = "2024.2";

/// Draft-capital tier of a rookie
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    High,
    Medium,
    Low,
}

impl Tier {
    /// Picks 1-32 are high, 33-100 medium, later picks low
    pub fn from_draft_position(draft_position: u32) -> Self {
        if draft_position <= 32 {
            Tier::High
        } else if draft_position <= 100 {
            Tier::Medium
        } else {
            Tier::Low
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::High => f.write_str("high"),
            Tier::Medium => f.write_str("medium"),
            Tier::Low => f.write_str("low"),
        }
    }
}

/// Rate parameters as supplied by a template or the comparison model.
///
/// Any field may be missing; [`RateParams::resolve`] fills gaps from the
/// position defaults one field at a time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RateParams {
    pub games: Option<f64>,
    pub playing_time_pct: Option<f64>,

    pub pass_attempts_per_game: Option<f64>,
    pub comp_pct: Option<f64>,
    pub yards_per_att: Option<f64>,
    pub pass_td_rate: Option<f64>,
    pub int_rate: Option<f64>,

    pub rush_attempts_per_game: Option<f64>,
    pub yards_per_carry: Option<f64>,
    pub rush_td_rate: Option<f64>,

    pub targets_per_game: Option<f64>,
    pub catch_pct: Option<f64>,
    pub yards_per_reception: Option<f64>,
    /// Receiving touchdowns per target
    pub rec_td_rate: Option<f64>,
}

/// Fully populated rates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolvedRates {
    pub games: f64,
    pub playing_time_pct: f64,
    pub pass_attempts_per_game: f64,
    pub comp_pct: f64,
    pub yards_per_att: f64,
    pub pass_td_rate: f64,
    pub int_rate: f64,
    pub rush_attempts_per_game: f64,
    pub yards_per_carry: f64,
    pub rush_td_rate: f64,
    pub targets_per_game: f64,
    pub catch_pct: f64,
    pub yards_per_reception: f64,
    pub rec_td_rate: f64,
}

pub const QB_DEFAULTS: ResolvedRates = ResolvedRates {
    games: 17.0,
    playing_time_pct: 1.0,
    pass_attempts_per_game: 30.0,
    comp_pct: 0.62,
    yards_per_att: 6.8,
    pass_td_rate: 0.040,
    int_rate: 0.025,
    rush_attempts_per_game: 3.5,
    yards_per_carry: 4.5,
    rush_td_rate: 0.030,
    targets_per_game: 0.0,
    catch_pct: 0.0,
    yards_per_reception: 0.0,
    rec_td_rate: 0.0,
};

pub const RB_DEFAULTS: ResolvedRates = ResolvedRates {
    games: 17.0,
    playing_time_pct: 1.0,
    pass_attempts_per_game: 0.0,
    comp_pct: 0.0,
    yards_per_att: 0.0,
    pass_td_rate: 0.0,
    int_rate: 0.0,
    rush_attempts_per_game: 10.0,
    yards_per_carry: 4.2,
    rush_td_rate: 0.030,
    targets_per_game: 3.0,
    catch_pct: 0.75,
    yards_per_reception: 7.5,
    rec_td_rate: 0.030,
};

pub const WR_DEFAULTS: ResolvedRates = ResolvedRates {
    games: 17.0,
    playing_time_pct: 1.0,
    pass_attempts_per_game: 0.0,
    comp_pct: 0.0,
    yards_per_att: 0.0,
    pass_td_rate: 0.0,
    int_rate: 0.0,
    rush_attempts_per_game: 0.3,
    yards_per_carry: 6.0,
    rush_td_rate: 0.010,
    targets_per_game: 5.5,
    catch_pct: 0.62,
    yards_per_reception: 12.5,
    rec_td_rate: 0.050,
};

pub const TE_DEFAULTS: ResolvedRates = ResolvedRates {
    games: 17.0,
    playing_time_pct: 1.0,
    pass_attempts_per_game: 0.0,
    comp_pct: 0.0,
    yards_per_att: 0.0,
    pass_td_rate: 0.0,
    int_rate: 0.0,
    rush_attempts_per_game: 0.0,
    yards_per_carry: 0.0,
    rush_td_rate: 0.0,
    targets_per_game: 3.5,
    catch_pct: 0.68,
    yards_per_reception: 10.5,
    rec_td_rate: 0.050,
};

impl ResolvedRates {
    pub fn defaults(position: Position) -> &'static ResolvedRates {
        match position {
            Position::QB => &QB_DEFAULTS,
            Position::RB => &RB_DEFAULTS,
            Position::WR => &WR_DEFAULTS,
            Position::TE => &TE_DEFAULTS,
        }
    }
}

impl RateParams {
    /// Fill missing fields from the position defaults
    pub fn resolve(&self, position: Position) -> ResolvedRates {
        let defaults = ResolvedRates::defaults(position);
        let pick = |name: &str, value: Option<f64>, fallback: f64| match value {
            Some(v) if v.is_finite() && v >= 0.0 => v,
            _ => {
                debug!("{} rate {} missing; using default {}", position, name, fallback);
                fallback
            }
        };

        ResolvedRates {
            games: pick("games", self.games, defaults.games),
            playing_time_pct: pick(
                "playing_time_pct",
                self.playing_time_pct,
                defaults.playing_time_pct,
            ),
            pass_attempts_per_game: pick(
                "pass_attempts_per_game",
                self.pass_attempts_per_game,
                defaults.pass_attempts_per_game,
            ),
            comp_pct: pick("comp_pct", self.comp_pct, defaults.comp_pct),
            yards_per_att: pick("yards_per_att", self.yards_per_att, defaults.yards_per_att),
            pass_td_rate: pick("pass_td_rate", self.pass_td_rate, defaults.pass_td_rate),
            int_rate: pick("int_rate", self.int_rate, defaults.int_rate),
            rush_attempts_per_game: pick(
                "rush_attempts_per_game",
                self.rush_attempts_per_game,
                defaults.rush_attempts_per_game,
            ),
            yards_per_carry: pick("yards_per_carry", self.yards_per_carry, defaults.yards_per_carry),
            rush_td_rate: pick("rush_td_rate", self.rush_td_rate, defaults.rush_td_rate),
            targets_per_game: pick(
                "targets_per_game",
                self.targets_per_game,
                defaults.targets_per_game,
            ),
            catch_pct: pick("catch_pct", self.catch_pct, defaults.catch_pct),
            yards_per_reception: pick(
                "yards_per_reception",
                self.yards_per_reception,
                defaults.yards_per_reception,
            ),
            rec_td_rate: pick("rec_td_rate", self.rec_td_rate, defaults.rec_td_rate),
        }
    }

    /// Whether the position's primary volume rate is present
    pub fn has_primary_volume(&self, position: Position) -> bool {
        match position {
            Position::QB => self.pass_attempts_per_game.is_some(),
            Position::RB => self.rush_attempts_per_game.is_some(),
            Position::WR | Position::TE => self.targets_per_game.is_some(),
        }
    }
}

/// Read-only (position, tier) -> rates table
#[derive(Debug, Clone)]
pub struct ComparisonModel {
    version: &'static str,
    entries: HashMap<(Position, Tier), RateParams>,
}

lazy_static! {
    static ref COMPARISON_MODEL: ComparisonModel = ComparisonModel::builtin();
}

impl ComparisonModel {
    /// Process-wide model
    pub fn global() -> &'static ComparisonModel {
        &COMPARISON_MODEL
    }

    pub fn version(&self) -> &'static str {
        self.version
    }

    pub fn rates(&self, position: Position, tier: Tier) -> Option<&RateParams> {
        self.entries.get(&(position, tier))
    }

    fn builtin() -> Self {
        let mut entries = HashMap::new();

        entries.insert(
            (Position::QB, Tier::High),
            RateParams {
                games: Some(14.0),
                playing_time_pct: Some(0.85),
                pass_attempts_per_game: Some(32.0),
                comp_pct: Some(0.63),
                yards_per_att: Some(6.9),
                pass_td_rate: Some(0.041),
                int_rate: Some(0.026),
                rush_attempts_per_game: Some(4.5),
                yards_per_carry: Some(5.0),
                rush_td_rate: Some(0.035),
                ..Default::default()
            },
        );
        entries.insert(
            (Position::QB, Tier::Medium),
            RateParams {
                games: Some(8.0),
                playing_time_pct: Some(0.5),
                pass_attempts_per_game: Some(29.0),
                comp_pct: Some(0.60),
                yards_per_att: Some(6.5),
                pass_td_rate: Some(0.036),
                int_rate: Some(0.029),
                rush_attempts_per_game: Some(3.5),
                yards_per_carry: Some(4.6),
                rush_td_rate: Some(0.030),
                ..Default::default()
            },
        );
        entries.insert(
            (Position::QB, Tier::Low),
            RateParams {
                games: Some(4.0),
                playing_time_pct: Some(0.25),
                pass_attempts_per_game: Some(26.0),
                comp_pct: Some(0.58),
                yards_per_att: Some(6.1),
                pass_td_rate: Some(0.032),
                int_rate: None,
                rush_attempts_per_game: Some(2.5),
                yards_per_carry: Some(4.0),
                rush_td_rate: None,
                ..Default::default()
            },
        );

        entries.insert(
            (Position::RB, Tier::High),
            RateParams {
                games: Some(16.0),
                playing_time_pct: Some(0.8),
                rush_attempts_per_game: Some(15.0),
                yards_per_carry: Some(4.4),
                rush_td_rate: Some(0.035),
                targets_per_game: Some(3.5),
                catch_pct: Some(0.78),
                yards_per_reception: Some(8.0),
                rec_td_rate: Some(0.03),
                ..Default::default()
            },
        );
        entries.insert(
            (Position::RB, Tier::Medium),
            RateParams {
                games: Some(15.0),
                playing_time_pct: Some(0.55),
                rush_attempts_per_game: Some(10.0),
                yards_per_carry: Some(4.2),
                rush_td_rate: Some(0.03),
                targets_per_game: Some(2.5),
                catch_pct: Some(0.75),
                yards_per_reception: Some(7.4),
                rec_td_rate: Some(0.025),
                ..Default::default()
            },
        );
        entries.insert(
            (Position::RB, Tier::Low),
            RateParams {
                games: Some(12.0),
                playing_time_pct: Some(0.3),
                rush_attempts_per_game: Some(6.0),
                yards_per_carry: Some(4.0),
                rush_td_rate: Some(0.025),
                targets_per_game: Some(1.5),
                catch_pct: Some(0.72),
                yards_per_reception: None,
                rec_td_rate: None,
                ..Default::default()
            },
        );

        entries.insert(
            (Position::WR, Tier::High),
            RateParams {
                games: Some(16.0),
                playing_time_pct: Some(0.85),
                rush_attempts_per_game: Some(0.4),
                yards_per_carry: Some(7.0),
                rush_td_rate: Some(0.02),
                targets_per_game: Some(7.0),
                catch_pct: Some(0.63),
                yards_per_reception: Some(13.2),
                rec_td_rate: Some(0.055),
                ..Default::default()
            },
        );
        entries.insert(
            (Position::WR, Tier::Medium),
            RateParams {
                games: Some(15.0),
                playing_time_pct: Some(0.55),
                rush_attempts_per_game: Some(0.2),
                yards_per_carry: Some(6.0),
                rush_td_rate: Some(0.01),
                targets_per_game: Some(5.0),
                catch_pct: Some(0.6),
                yards_per_reception: Some(12.4),
                rec_td_rate: Some(0.045),
                ..Default::default()
            },
        );
        entries.insert(
            (Position::WR, Tier::Low),
            RateParams {
                games: Some(12.0),
                playing_time_pct: Some(0.3),
                targets_per_game: Some(3.0),
                catch_pct: Some(0.58),
                yards_per_reception: Some(11.8),
                rec_td_rate: None,
                ..Default::default()
            },
        );

        entries.insert(
            (Position::TE, Tier::High),
            RateParams {
                games: Some(16.0),
                playing_time_pct: Some(0.75),
                targets_per_game: Some(5.0),
                catch_pct: Some(0.68),
                yards_per_reception: Some(10.8),
                rec_td_rate: Some(0.05),
                ..Default::default()
            },
        );
        entries.insert(
            (Position::TE, Tier::Medium),
            RateParams {
                games: Some(15.0),
                playing_time_pct: Some(0.5),
                targets_per_game: Some(3.2),
                catch_pct: Some(0.66),
                yards_per_reception: Some(10.0),
                rec_td_rate: Some(0.045),
                ..Default::default()
            },
        );
        entries.insert(
            (Position::TE, Tier::Low),
            RateParams {
                games: Some(12.0),
                playing_time_pct: Some(0.3),
                targets_per_game: Some(2.0),
                catch_pct: Some(0.65),
                yards_per_reception: Some(9.5),
                rec_td_rate: None,
                ..Default::default()
            },
        );

        Self { version: COMPARISON_MODEL_VERSION, entries }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(Tier::from_draft_position(1), Tier::High);
        assert_eq!(Tier::from_draft_position(32), Tier::High);
        assert_eq!(Tier::from_draft_position(33), Tier::Medium);
        assert_eq!(Tier::from_draft_position(100), Tier::Medium);
        assert_eq!(Tier::from_draft_position(101), Tier::Low);
    }

    #[test]
    fn test_model_covers_every_position_and_tier() {
        let model = ComparisonModel::global();
        for position in Position::ALL {
            for tier in [Tier::High, Tier::Medium, Tier::Low] {
                let rates = model.rates(position, tier).expect("missing model entry");
                assert!(rates.has_primary_volume(position), "{position} {tier}");
            }
        }
        assert_eq!(model.version(), COMPARISON_MODEL_VERSION);
    }

    #[test]
    fn test_resolve_substitutes_per_field() {
        let params = RateParams {
            pass_attempts_per_game: Some(35.0),
            comp_pct: None,
            yards_per_att: Some(f64::NAN),
            ..Default::default()
        };

        let rates = params.resolve(Position::QB);

        assert_eq!(rates.pass_attempts_per_game, 35.0);
        assert_eq!(rates.comp_pct, QB_DEFAULTS.comp_pct);
        assert_eq!(rates.yards_per_att, QB_DEFAULTS.yards_per_att);
        assert_eq!(rates.games, 17.0);
    }
}
