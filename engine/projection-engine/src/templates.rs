//! Draft-slot rookie templates

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::comparison::RateParams;
use crate::stats::Position;

/// Rates for rookies drafted within `[draft_pick_min, draft_pick_max]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RookieTemplate {
    pub position: Position,
    pub draft_pick_min: u32,
    pub draft_pick_max: u32,
    pub rates: RateParams,
}

impl RookieTemplate {
    pub fn contains(&self, draft_position: u32) -> bool {
        (self.draft_pick_min..=self.draft_pick_max).contains(&draft_position)
    }

    pub fn width(&self) -> u32 {
        self.draft_pick_max.saturating_sub(self.draft_pick_min)
    }

    /// Usable templates carry the position's primary volume rate and a sane range
    pub fn is_usable(&self) -> bool {
        self.draft_pick_min <= self.draft_pick_max && self.rates.has_primary_volume(self.position)
    }
}

/// Outcome of a template lookup
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateMatch<'a> {
    /// Narrowest usable template containing the pick
    Exact(&'a RookieTemplate),
    /// No range matched; the most generic usable template for the position
    Nearest(&'a RookieTemplate),
    /// The position has templates but none usable
    Synthesized(RookieTemplate),
    /// No templates exist for the position
    Absent,
}

/// Collection of templates supplied by the caller or the built-in set
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplateSet {
    templates: Vec<RookieTemplate>,
}

lazy_static! {
    static ref BUILTIN_TEMPLATES: TemplateSet = TemplateSet::builtin();
}

impl TemplateSet {
    pub fn new(templates: Vec<RookieTemplate>) -> Self {
        Self { templates }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Process-wide built-in templates
    pub fn global() -> &'static TemplateSet {
        &BUILTIN_TEMPLATES
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn for_position(&self, position: Position) -> impl Iterator<Item = &RookieTemplate> {
        self.templates.iter().filter(move |t| t.position == position)
    }

    /// Find the template for a rookie drafted at `draft_position`
    pub fn select(&self, position: Position, draft_position: u32) -> TemplateMatch<'_> {
        let candidates: Vec<&RookieTemplate> = self.for_position(position).collect();
        if candidates.is_empty() {
            return TemplateMatch::Absent;
        }

        let usable = candidates.iter().copied().filter(|t| t.is_usable());

        if let Some(exact) =
            usable.clone().filter(|t| t.contains(draft_position)).min_by_key(|t| t.width())
        {
            return TemplateMatch::Exact(exact);
        }

        if let Some(nearest) = usable.max_by_key(|t| t.draft_pick_max) {
            debug!(
                "No {} template covers pick {}; using {}-{}",
                position, draft_position, nearest.draft_pick_min, nearest.draft_pick_max
            );
            return TemplateMatch::Nearest(nearest);
        }

        debug!("{} templates are unusable; synthesizing defaults", position);
        TemplateMatch::Synthesized(Self::synthesized(position))
    }

    /// Template carrying the hardcoded position defaults over every pick
    pub fn synthesized(position: Position) -> RookieTemplate {
        let d = crate::comparison::ResolvedRates::defaults(position);
        RookieTemplate {
            position,
            draft_pick_min: 1,
            draft_pick_max: u32::MAX,
            rates: RateParams {
                games: Some(d.games),
                playing_time_pct: Some(d.playing_time_pct * 0.5),
                pass_attempts_per_game: Some(d.pass_attempts_per_game),
                comp_pct: Some(d.comp_pct),
                yards_per_att: Some(d.yards_per_att),
                pass_td_rate: Some(d.pass_td_rate),
                int_rate: Some(d.int_rate),
                rush_attempts_per_game: Some(d.rush_attempts_per_game),
                yards_per_carry: Some(d.yards_per_carry),
                rush_td_rate: Some(d.rush_td_rate),
                targets_per_game: Some(d.targets_per_game),
                catch_pct: Some(d.catch_pct),
                yards_per_reception: Some(d.yards_per_reception),
                rec_td_rate: Some(d.rec_td_rate),
            },
        }
    }

    fn builtin() -> Self {
        let template = |position, min, max, rates| RookieTemplate {
            position,
            draft_pick_min: min,
            draft_pick_max: max,
            rates,
        };

        Self::new(vec![
            template(
                Position::QB,
                1,
                10,
                RateParams {
                    games: Some(15.0),
                    playing_time_pct: Some(0.9),
                    pass_attempts_per_game: Some(33.0),
                    comp_pct: Some(0.635),
                    yards_per_att: Some(7.0),
                    pass_td_rate: Some(0.042),
                    int_rate: Some(0.025),
                    rush_attempts_per_game: Some(5.0),
                    yards_per_carry: Some(5.2),
                    rush_td_rate: Some(0.04),
                    ..Default::default()
                },
            ),
            template(
                Position::QB,
                1,
                64,
                RateParams {
                    games: Some(11.0),
                    playing_time_pct: Some(0.65),
                    pass_attempts_per_game: Some(30.0),
                    comp_pct: Some(0.615),
                    yards_per_att: Some(6.7),
                    pass_td_rate: Some(0.038),
                    int_rate: Some(0.027),
                    rush_attempts_per_game: Some(4.0),
                    yards_per_carry: Some(4.8),
                    rush_td_rate: Some(0.03),
                    ..Default::default()
                },
            ),
            template(
                Position::QB,
                65,
                262,
                RateParams {
                    games: Some(4.0),
                    playing_time_pct: Some(0.2),
                    pass_attempts_per_game: Some(27.0),
                    comp_pct: Some(0.59),
                    yards_per_att: Some(6.2),
                    pass_td_rate: Some(0.032),
                    int_rate: Some(0.03),
                    rush_attempts_per_game: Some(2.5),
                    yards_per_carry: Some(4.0),
                    rush_td_rate: Some(0.02),
                    ..Default::default()
                },
            ),
            template(
                Position::RB,
                1,
                32,
                RateParams {
                    games: Some(16.0),
                    playing_time_pct: Some(0.8),
                    rush_attempts_per_game: Some(16.0),
                    yards_per_carry: Some(4.5),
                    rush_td_rate: Some(0.037),
                    targets_per_game: Some(3.8),
                    catch_pct: Some(0.78),
                    yards_per_reception: Some(8.2),
                    rec_td_rate: Some(0.03),
                    ..Default::default()
                },
            ),
            template(
                Position::RB,
                33,
                100,
                RateParams {
                    games: Some(15.0),
                    playing_time_pct: Some(0.55),
                    rush_attempts_per_game: Some(11.0),
                    yards_per_carry: Some(4.2),
                    rush_td_rate: Some(0.03),
                    targets_per_game: Some(2.6),
                    catch_pct: Some(0.75),
                    yards_per_reception: Some(7.5),
                    rec_td_rate: Some(0.025),
                    ..Default::default()
                },
            ),
            template(
                Position::RB,
                101,
                262,
                RateParams {
                    games: Some(12.0),
                    playing_time_pct: Some(0.3),
                    rush_attempts_per_game: Some(6.5),
                    yards_per_carry: Some(4.0),
                    rush_td_rate: Some(0.025),
                    targets_per_game: Some(1.6),
                    catch_pct: Some(0.72),
                    yards_per_reception: Some(7.0),
                    rec_td_rate: Some(0.02),
                    ..Default::default()
                },
            ),
            template(
                Position::WR,
                1,
                32,
                RateParams {
                    games: Some(16.0),
                    playing_time_pct: Some(0.85),
                    rush_attempts_per_game: Some(0.4),
                    yards_per_carry: Some(7.5),
                    rush_td_rate: Some(0.02),
                    targets_per_game: Some(7.2),
                    catch_pct: Some(0.64),
                    yards_per_reception: Some(13.4),
                    rec_td_rate: Some(0.055),
                    ..Default::default()
                },
            ),
            template(
                Position::WR,
                33,
                100,
                RateParams {
                    games: Some(15.0),
                    playing_time_pct: Some(0.55),
                    rush_attempts_per_game: Some(0.2),
                    yards_per_carry: Some(6.0),
                    rush_td_rate: Some(0.01),
                    targets_per_game: Some(5.0),
                    catch_pct: Some(0.61),
                    yards_per_reception: Some(12.6),
                    rec_td_rate: Some(0.045),
                    ..Default::default()
                },
            ),
            template(
                Position::WR,
                101,
                262,
                RateParams {
                    games: Some(12.0),
                    playing_time_pct: Some(0.3),
                    targets_per_game: Some(3.0),
                    catch_pct: Some(0.58),
                    yards_per_reception: Some(11.8),
                    rec_td_rate: Some(0.04),
                    ..Default::default()
                },
            ),
            template(
                Position::TE,
                1,
                64,
                RateParams {
                    games: Some(16.0),
                    playing_time_pct: Some(0.7),
                    targets_per_game: Some(4.8),
                    catch_pct: Some(0.68),
                    yards_per_reception: Some(10.6),
                    rec_td_rate: Some(0.05),
                    ..Default::default()
                },
            ),
            template(
                Position::TE,
                65,
                262,
                RateParams {
                    games: Some(14.0),
                    playing_time_pct: Some(0.35),
                    targets_per_game: Some(2.2),
                    catch_pct: Some(0.65),
                    yards_per_reception: Some(9.6),
                    rec_td_rate: Some(0.04),
                    ..Default::default()
                },
            ),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wr(min: u32, max: u32, targets: Option<f64>) -> RookieTemplate {
        RookieTemplate {
            position: Position::WR,
            draft_pick_min: min,
            draft_pick_max: max,
            rates: RateParams { targets_per_game: targets, ..Default::default() },
        }
    }

    #[test]
    fn test_narrowest_range_wins() {
        let set = TemplateSet::global();
        match set.select(Position::QB, 5) {
            TemplateMatch::Exact(t) => assert_eq!((t.draft_pick_min, t.draft_pick_max), (1, 10)),
            other => panic!("Expected exact match, got {:?}", other),
        }
        match set.select(Position::QB, 40) {
            TemplateMatch::Exact(t) => assert_eq!((t.draft_pick_min, t.draft_pick_max), (1, 64)),
            other => panic!("Expected exact match, got {:?}", other),
        }
    }

    #[test]
    fn test_falls_back_to_most_generic() {
        let set = TemplateSet::new(vec![wr(1, 32, Some(7.0)), wr(33, 100, Some(5.0))]);
        match set.select(Position::WR, 200) {
            TemplateMatch::Nearest(t) => assert_eq!(t.draft_pick_max, 100),
            other => panic!("Expected nearest match, got {:?}", other),
        }
    }

    #[test]
    fn test_unusable_templates_synthesize_defaults() {
        let set = TemplateSet::new(vec![wr(1, 32, None)]);
        match set.select(Position::WR, 10) {
            TemplateMatch::Synthesized(t) => {
                assert_eq!(t.position, Position::WR);
                assert!(t.contains(10));
                assert!(t.is_usable());
            }
            other => panic!("Expected synthesized template, got {:?}", other),
        }
    }

    #[test]
    fn test_absent_position() {
        let set = TemplateSet::new(vec![wr(1, 32, Some(7.0))]);
        assert_eq!(set.select(Position::TE, 10), TemplateMatch::Absent);
        assert_eq!(TemplateSet::empty().select(Position::QB, 1), TemplateMatch::Absent);
    }
}
