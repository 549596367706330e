use serde::{Deserialize, Serialize};

use crate::stats::Position;

/// Configuration for the projection engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Validation tolerances
    pub validation: ValidationConfig,

    /// Rookie projection parameters
    pub rookie: RookieConfig,

    /// Team-context blend weights for rookie projections
    pub blend: BlendWeights,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Relative tolerance for stored season totals (0.001 = 0.1%)
    pub season_total_tolerance: f64,

    /// Absolute tolerance for derived efficiency fields
    pub derived_field_tolerance: f64,

    /// Absolute tolerance for fantasy point totals
    pub fantasy_point_tolerance: f64,

    /// Allowed gap between team plays and pass + rush attempts
    pub team_plays_slack: f64,

    /// Relative tolerance for team yardage cross checks
    pub team_yards_tolerance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RookieConfig {
    /// Season length used when a template does not specify games
    pub default_games: f64,

    /// Playing-time share applied when falling back to the comparison model
    pub fallback_playing_time_pct: f64,

    /// Use draft-slot templates for drafted rookies instead of the comparison model
    pub use_draft_templates: bool,
}

/// Model/team weights for the rookie team-context blend.
///
/// Target shares are `position group share x player share of the group`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BlendWeights {
    pub qb_model_weight: f64,
    pub rush_model_weight: f64,
    pub receiving_model_weight: f64,
    pub rb_group_target_share: f64,
    pub rb_player_target_share: f64,
    pub wr_group_target_share: f64,
    pub wr_player_target_share: f64,
    pub te_group_target_share: f64,
    pub te_player_target_share: f64,
}

impl BlendWeights {
    /// Fraction of team targets a rookie at `position` is expected to see
    pub fn target_share(&self, position: Position) -> Option<f64> {
        match position {
            Position::QB => None,
            Position::RB => Some(self.rb_group_target_share * self.rb_player_target_share),
            Position::WR => Some(self.wr_group_target_share * self.wr_player_target_share),
            Position::TE => Some(self.te_group_target_share * self.te_player_target_share),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            validation: ValidationConfig::default(),
            rookie: RookieConfig::default(),
            blend: BlendWeights::default(),
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            season_total_tolerance: 0.001,
            derived_field_tolerance: 1e-6,
            fantasy_point_tolerance: 0.01,
            team_plays_slack: 1.0,
            team_yards_tolerance: 0.01,
        }
    }
}

impl Default for RookieConfig {
    fn default() -> Self {
        Self { default_games: 17.0, fallback_playing_time_pct: 0.6, use_draft_templates: true }
    }
}

impl Default for BlendWeights {
    fn default() -> Self {
        Self {
            qb_model_weight: 0.7,
            rush_model_weight: 0.6,
            receiving_model_weight: 0.6,
            rb_group_target_share: 0.15,
            rb_player_target_share: 0.30,
            wr_group_target_share: 0.70,
            wr_player_target_share: 0.20,
            te_group_target_share: 0.15,
            te_player_target_share: 0.50,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Override fields from `PROJECTION_*` environment variables
    pub fn apply_env(&mut self) -> anyhow::Result<()> {
        if let Ok(tolerance) = std::env::var("PROJECTION_SEASON_TOLERANCE") {
            self.validation.season_total_tolerance = tolerance.parse()?;
        }

        if let Ok(games) = std::env::var("PROJECTION_DEFAULT_GAMES") {
            self.rookie.default_games = games.parse()?;
        }

        if let Ok(pct) = std::env::var("PROJECTION_FALLBACK_PLAYING_TIME") {
            self.rookie.fallback_playing_time_pct = pct.parse()?;
        }

        if let Ok(flag) = std::env::var("PROJECTION_USE_DRAFT_TEMPLATES") {
            self.rookie.use_draft_templates = flag.parse()?;
        }

        Ok(())
    }

    /// Reject weights and tolerances outside their meaningful ranges
    pub fn validate(&self) -> anyhow::Result<()> {
        let unit = [
            ("qb_model_weight", self.blend.qb_model_weight),
            ("rush_model_weight", self.blend.rush_model_weight),
            ("receiving_model_weight", self.blend.receiving_model_weight),
            ("fallback_playing_time_pct", self.rookie.fallback_playing_time_pct),
        ];
        for (name, value) in unit {
            if !(0.0..=1.0).contains(&value) {
                anyhow::bail!("{name} must be within 0..=1, got {value}");
            }
        }

        if self.validation.season_total_tolerance < 0.0 {
            anyhow::bail!(
                "season_total_tolerance must be non-negative, got {}",
                self.validation.season_total_tolerance
            );
        }

        if self.rookie.default_games <= 0.0 {
            anyhow::bail!("default_games must be positive, got {}", self.rookie.default_games);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.validation.season_total_tolerance, 0.001);
        assert_eq!(config.rookie.fallback_playing_time_pct, 0.6);
    }

    #[test]
    fn test_target_shares() {
        let blend = BlendWeights::default();
        assert!((blend.target_share(Position::RB).unwrap() - 0.045).abs() < 1e-12);
        assert!((blend.target_share(Position::WR).unwrap() - 0.14).abs() < 1e-12);
        assert!((blend.target_share(Position::TE).unwrap() - 0.075).abs() < 1e-12);
        assert_eq!(blend.target_share(Position::QB), None);
    }

    #[test]
    fn test_out_of_range_weight_rejected() {
        let mut config = EngineConfig::default();
        config.blend.qb_model_weight = 1.5;
        assert!(config.validate().is_err());
    }
}
