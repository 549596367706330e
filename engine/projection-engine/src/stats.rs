//! Positions, canonical stat names and the raw feed column tables

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ProjectionError;

/// Fantasy-relevant offensive positions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Position {
    QB,
    RB,
    WR,
    TE,
}

impl Position {
    pub const ALL: [Position; 4] = [Position::QB, Position::RB, Position::WR, Position::TE];

    pub fn as_str(&self) -> &'static str {
        match self {
            Position::QB => "QB",
            Position::RB => "RB",
            Position::WR => "WR",
            Position::TE => "TE",
        }
    }

    /// Stats every player of this position must have for a season
    pub fn required_stats(&self) -> &'static [StatType] {
        use StatType::*;
        match self {
            Position::QB => &[
                Games,
                Completions,
                PassAttempts,
                PassYards,
                PassTd,
                Interceptions,
                RushAttempts,
                RushYards,
                RushTd,
            ],
            Position::RB => {
                &[Games, RushAttempts, RushYards, RushTd, Targets, Receptions, RecYards, RecTd]
            }
            Position::WR | Position::TE => &[Games, Targets, Receptions, RecYards, RecTd],
        }
    }

    /// Raw feed abbreviation -> canonical stat for this position
    pub fn column_map(&self) -> &'static [(&'static str, StatType)] {
        use StatType::*;
        match self {
            Position::QB => &[
                ("cmp", Completions),
                ("att", PassAttempts),
                ("pass_yds", PassYards),
                ("pass_td", PassTd),
                ("int", Interceptions),
                ("rush_att", RushAttempts),
                ("rush_yds", RushYards),
                ("rush_td", RushTd),
                ("fl", Fumbles),
            ],
            Position::RB => &[
                ("rush_att", RushAttempts),
                ("rush_yds", RushYards),
                ("rush_td", RushTd),
                ("tgt", Targets),
                ("rec", Receptions),
                ("rec_yds", RecYards),
                ("rec_td", RecTd),
                ("fl", Fumbles),
            ],
            Position::WR | Position::TE => &[
                ("tgt", Targets),
                ("rec", Receptions),
                ("rec_yds", RecYards),
                ("rec_td", RecTd),
                ("fl", Fumbles),
            ],
        }
    }

    /// Raw column feeding a canonical stat, if the position tracks it
    pub fn column_for(&self, stat: StatType) -> Option<&'static str> {
        self.column_map().iter().find(|(_, s)| *s == stat).map(|(col, _)| *col)
    }

    pub fn is_quarterback(&self) -> bool {
        matches!(self, Position::QB)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Position {
    type Err = ProjectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "QB" => Ok(Position::QB),
            "RB" => Ok(Position::RB),
            "WR" => Ok(Position::WR),
            "TE" => Ok(Position::TE),
            _ => Err(ProjectionError::invalid_input(format!("unrecognized position: {s}"))),
        }
    }
}

/// Canonical stat names shared by season stats and projection fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatType {
    Games,
    // passing volume
    PassAttempts,
    Completions,
    PassYards,
    PassTd,
    Interceptions,
    // rushing volume
    RushAttempts,
    RushYards,
    RushTd,
    // receiving volume
    Targets,
    Receptions,
    RecYards,
    RecTd,
    TargetShare,
    Fumbles,
    // efficiency
    CompPct,
    YardsPerAtt,
    PassTdRate,
    IntRate,
    YardsPerCarry,
    CatchPct,
    YardsPerTarget,
    YardsPerReception,
}

impl StatType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatType::Games => "games",
            StatType::PassAttempts => "pass_attempts",
            StatType::Completions => "completions",
            StatType::PassYards => "pass_yards",
            StatType::PassTd => "pass_td",
            StatType::Interceptions => "interceptions",
            StatType::RushAttempts => "rush_attempts",
            StatType::RushYards => "rush_yards",
            StatType::RushTd => "rush_td",
            StatType::Targets => "targets",
            StatType::Receptions => "receptions",
            StatType::RecYards => "rec_yards",
            StatType::RecTd => "rec_td",
            StatType::TargetShare => "target_share",
            StatType::Fumbles => "fumbles",
            StatType::CompPct => "comp_pct",
            StatType::YardsPerAtt => "yards_per_att",
            StatType::PassTdRate => "pass_td_rate",
            StatType::IntRate => "int_rate",
            StatType::YardsPerCarry => "yards_per_carry",
            StatType::CatchPct => "catch_pct",
            StatType::YardsPerTarget => "yards_per_target",
            StatType::YardsPerReception => "yards_per_reception",
        }
    }

    /// Touchdown-producing fields
    pub fn is_touchdown(&self) -> bool {
        matches!(self, StatType::PassTd | StatType::RushTd | StatType::RecTd)
    }
}

impl fmt::Display for StatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatType {
    type Err = ProjectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use StatType::*;
        let stat = match s {
            "games" => Games,
            "pass_attempts" => PassAttempts,
            "completions" => Completions,
            "pass_yards" => PassYards,
            "pass_td" => PassTd,
            "interceptions" => Interceptions,
            "rush_attempts" => RushAttempts,
            "rush_yards" => RushYards,
            "rush_td" => RushTd,
            "targets" => Targets,
            "receptions" => Receptions,
            "rec_yards" => RecYards,
            "rec_td" => RecTd,
            "target_share" => TargetShare,
            "fumbles" => Fumbles,
            "comp_pct" => CompPct,
            "yards_per_att" => YardsPerAtt,
            "pass_td_rate" => PassTdRate,
            "int_rate" => IntRate,
            "yards_per_carry" => YardsPerCarry,
            "catch_pct" => CatchPct,
            "yards_per_target" => YardsPerTarget,
            "yards_per_reception" => YardsPerReception,
            other => {
                return Err(ProjectionError::invalid_input(format!("unknown stat type: {other}")))
            }
        };
        Ok(stat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_parsing() {
        assert_eq!("qb".parse::<Position>().unwrap(), Position::QB);
        assert_eq!(" TE ".parse::<Position>().unwrap(), Position::TE);
        assert!("K".parse::<Position>().is_err());
    }

    #[test]
    fn test_required_stats_include_games() {
        for position in Position::ALL {
            assert_eq!(position.required_stats()[0], StatType::Games);
        }
        assert_eq!(Position::QB.required_stats().len(), 9);
    }

    #[test]
    fn test_every_required_stat_has_a_column() {
        for position in Position::ALL {
            for stat in position.required_stats().iter().filter(|s| **s != StatType::Games) {
                assert!(
                    position.column_for(*stat).is_some(),
                    "{position} has no raw column for {stat}"
                );
            }
        }
    }

    #[test]
    fn test_rb_maps_rush_att() {
        assert_eq!(Position::RB.column_for(StatType::RushAttempts), Some("rush_att"));
        assert_eq!(Position::WR.column_for(StatType::PassYards), None);
    }

    #[test]
    fn test_stat_type_name_round_trip() {
        for name in ["games", "pass_yards", "yards_per_reception", "target_share"] {
            assert_eq!(name.parse::<StatType>().unwrap().as_str(), name);
        }
        assert!("punt_yards".parse::<StatType>().is_err());
    }
}
