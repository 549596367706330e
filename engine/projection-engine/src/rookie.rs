//! Rookie projections from draft templates or the comparison model

use tracing::{debug, info};

use crate::comparison::{ComparisonModel, RateParams, ResolvedRates, Tier};
use crate::config::RookieConfig;
use crate::projection::{ProjectionSource, StatLine};
use crate::stats::{Position, StatType};
use crate::templates::{TemplateMatch, TemplateSet};

/// Stat line synthesized for a player without history
#[derive(Debug, Clone, PartialEq)]
pub struct RookieBuild {
    pub stats: StatLine,
    pub games: f64,
    pub playing_time_pct: f64,
    pub source: ProjectionSource,
}

/// Builds rookie stat lines from rate tables
pub struct RookieProjector<'a> {
    config: &'a RookieConfig,
    templates: &'a TemplateSet,
    model: &'a ComparisonModel,
}

impl<'a> RookieProjector<'a> {
    pub fn new(
        config: &'a RookieConfig,
        templates: &'a TemplateSet,
        model: &'a ComparisonModel,
    ) -> Self {
        Self { config, templates, model }
    }

    /// Project a drafted rookie from the template covering their pick
    pub fn draft_based(&self, position: Position, draft_position: u32) -> RookieBuild {
        let (params, source) = match self.templates.select(position, draft_position) {
            TemplateMatch::Exact(t) | TemplateMatch::Nearest(t) => (
                t.rates.clone(),
                ProjectionSource::DraftTemplate {
                    draft_pick_min: t.draft_pick_min,
                    draft_pick_max: t.draft_pick_max,
                },
            ),
            TemplateMatch::Synthesized(t) => (t.rates, ProjectionSource::DefaultTemplate),
            TemplateMatch::Absent => {
                info!(
                    "No {} templates; using comparison model tier low for pick {}",
                    position, draft_position
                );
                return self.comparison(
                    position,
                    Tier::Low,
                    Some(self.config.fallback_playing_time_pct),
                );
            }
        };

        let games = self.games(&params);
        let rates = params.resolve(position);
        let playing_time_pct = rates.playing_time_pct;
        RookieBuild {
            stats: build_line(position, &rates, games, playing_time_pct),
            games,
            playing_time_pct,
            source,
        }
    }

    /// Project a rookie from the comparison model at `tier`
    pub fn comparison(
        &self,
        position: Position,
        tier: Tier,
        playing_time_override: Option<f64>,
    ) -> RookieBuild {
        let params = match self.model.rates(position, tier) {
            Some(params) => params.clone(),
            None => {
                debug!("Comparison model has no {} {} entry; using defaults", position, tier);
                RateParams::default()
            }
        };

        let games = self.games(&params);
        let rates = params.resolve(position);
        let playing_time_pct = playing_time_override.unwrap_or(rates.playing_time_pct);
        RookieBuild {
            stats: build_line(position, &rates, games, playing_time_pct),
            games,
            playing_time_pct,
            source: ProjectionSource::ComparisonModel { tier, playing_time_pct },
        }
    }

    fn games(&self, params: &RateParams) -> f64 {
        params.games.filter(|g| g.is_finite() && *g > 0.0).unwrap_or(self.config.default_games)
    }
}

/// Chain per-game rates into season volumes; efficiency fields come straight from the rates
pub fn build_line(
    position: Position,
    rates: &ResolvedRates,
    games: f64,
    playing_time_pct: f64,
) -> StatLine {
    let mut line = StatLine::for_position(position);
    let share = games * playing_time_pct;

    let rush_attempts = rates.rush_attempts_per_game * share;
    line.set(StatType::RushAttempts, Some(rush_attempts));
    line.set(StatType::RushYards, Some(rush_attempts * rates.yards_per_carry));
    line.set(StatType::RushTd, Some(rush_attempts * rates.rush_td_rate));
    if rush_attempts > 0.0 {
        line.set(StatType::YardsPerCarry, Some(rates.yards_per_carry));
    }

    if position.is_quarterback() {
        let attempts = rates.pass_attempts_per_game * share;
        line.set(StatType::PassAttempts, Some(attempts));
        line.set(StatType::Completions, Some(attempts * rates.comp_pct));
        line.set(StatType::PassYards, Some(attempts * rates.yards_per_att));
        line.set(StatType::PassTd, Some(attempts * rates.pass_td_rate));
        line.set(StatType::Interceptions, Some(attempts * rates.int_rate));
        if attempts > 0.0 {
            line.set(StatType::CompPct, Some(rates.comp_pct));
            line.set(StatType::YardsPerAtt, Some(rates.yards_per_att));
            line.set(StatType::PassTdRate, Some(rates.pass_td_rate));
            line.set(StatType::IntRate, Some(rates.int_rate));
        }
        return line;
    }

    let targets = rates.targets_per_game * share;
    let receptions = targets * rates.catch_pct;
    line.set(StatType::Targets, Some(targets));
    line.set(StatType::Receptions, Some(receptions));
    line.set(StatType::RecYards, Some(receptions * rates.yards_per_reception));
    line.set(StatType::RecTd, Some(targets * rates.rec_td_rate));
    if targets > 0.0 {
        line.set(StatType::CatchPct, Some(rates.catch_pct));
        line.set(StatType::YardsPerTarget, Some(rates.catch_pct * rates.yards_per_reception));
    }
    if receptions > 0.0 {
        line.set(StatType::YardsPerReception, Some(rates.yards_per_reception));
    }
    line
}
