//! CSV and JSON export of season projections

use projection_engine::{Position, Projection, StatType};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;
use uuid::Uuid;

use crate::error::{Result, ServiceError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ServiceError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            other => Err(ServiceError::config(format!("unsupported export format: {other}"))),
        }
    }
}

/// Which projections make it into an export
#[derive(Debug, Clone, Default)]
pub struct ExportFilter {
    pub position: Option<Position>,
    /// `None` keeps baselines only
    pub scenario_id: Option<String>,
}

impl ExportFilter {
    pub fn matches(&self, projection: &Projection) -> bool {
        if let Some(position) = self.position {
            if projection.position != position {
                return false;
            }
        }
        projection.scenario_id == self.scenario_id
    }

    pub fn apply<'a>(&self, projections: &'a [Projection]) -> Vec<&'a Projection> {
        projections.iter().filter(|p| self.matches(p)).collect()
    }
}

/// Flat export record; field order is the column order
#[derive(Debug, Clone, Serialize)]
pub struct ExportRow {
    pub id: Uuid,
    pub player_id: i64,
    pub season: i32,
    pub scenario_id: Option<String>,
    pub position: &'static str,
    pub games: Option<f64>,
    pub pass_attempts: Option<f64>,
    pub completions: Option<f64>,
    pub pass_yards: Option<f64>,
    pub pass_td: Option<f64>,
    pub interceptions: Option<f64>,
    pub rush_attempts: Option<f64>,
    pub rush_yards: Option<f64>,
    pub rush_td: Option<f64>,
    pub targets: Option<f64>,
    pub receptions: Option<f64>,
    pub rec_yards: Option<f64>,
    pub rec_td: Option<f64>,
    pub fumbles: Option<f64>,
    pub half_ppr: Option<f64>,
    pub ppr: Option<f64>,
    pub standard: Option<f64>,
}

impl From<&Projection> for ExportRow {
    fn from(p: &Projection) -> Self {
        let stat = |s: StatType| p.stats.get(s);
        Self {
            id: p.id,
            player_id: p.player_id,
            season: p.season,
            scenario_id: p.scenario_id.clone(),
            position: p.position.as_str(),
            games: p.games,
            pass_attempts: stat(StatType::PassAttempts),
            completions: stat(StatType::Completions),
            pass_yards: stat(StatType::PassYards),
            pass_td: stat(StatType::PassTd),
            interceptions: stat(StatType::Interceptions),
            rush_attempts: stat(StatType::RushAttempts),
            rush_yards: stat(StatType::RushYards),
            rush_td: stat(StatType::RushTd),
            targets: stat(StatType::Targets),
            receptions: stat(StatType::Receptions),
            rec_yards: stat(StatType::RecYards),
            rec_td: stat(StatType::RecTd),
            fumbles: stat(StatType::Fumbles),
            half_ppr: p.points.half_ppr,
            ppr: p.points.ppr,
            standard: p.points.standard,
        }
    }
}

/// Write `projections` to `dir/projections_{season}.{ext}` and return the path
pub fn export_projections(
    projections: &[&Projection],
    format: ExportFormat,
    dir: &Path,
    season: i32,
) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(format!("projections_{season}.{}", format.extension()));
    let rows: Vec<ExportRow> = projections.iter().map(|p| ExportRow::from(*p)).collect();

    match format {
        ExportFormat::Csv => {
            let mut writer = csv::Writer::from_path(&path)?;
            for row in &rows {
                writer.serialize(row)?;
            }
            writer.flush()?;
        }
        ExportFormat::Json => {
            let writer = BufWriter::new(File::create(&path)?);
            serde_json::to_writer_pretty(writer, &rows)?;
        }
    }

    info!("Exported {} projections to {:?}", rows.len(), path);
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use projection_engine::ProjectionSource;
    use tempfile::tempdir;

    fn projection(player_id: i64, position: Position, scenario: Option<&str>) -> Projection {
        let mut p = Projection::new(
            player_id,
            2024,
            scenario.map(str::to_string),
            position,
            ProjectionSource::CarryForward { from_season: 2023 },
        );
        p.games = Some(17.0);
        p.stats.set(StatType::RushYards, Some(1100.0));
        p.points.half_ppr = Some(201.5);
        p
    }

    #[test]
    fn test_filter_by_position_and_scenario() {
        let all = vec![
            projection(1, Position::RB, None),
            projection(2, Position::WR, None),
            projection(1, Position::RB, Some("bull")),
        ];

        let filter = ExportFilter { position: Some(Position::RB), scenario_id: None };
        let kept = filter.apply(&all);
        assert_eq!(kept.len(), 1);
        assert!(kept[0].is_baseline());

        let filter = ExportFilter { position: None, scenario_id: Some("bull".to_string()) };
        assert_eq!(filter.apply(&all).len(), 1);
    }

    #[test]
    fn test_csv_export_header_and_rows() {
        let dir = tempdir().unwrap();
        let all = vec![projection(1, Position::RB, None), projection(2, Position::WR, None)];
        let refs: Vec<&Projection> = all.iter().collect();

        let path = export_projections(&refs, ExportFormat::Csv, dir.path(), 2024).unwrap();
        assert!(path.ends_with("projections_2024.csv"));

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(&headers[0], "id");
        assert_eq!(&headers[4], "position");
        assert_eq!(headers.len(), 22);

        let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 2);
        assert_eq!(&records[0][4], "RB");
        assert_eq!(&records[0][12], "1100.0");
        // QB-only passing columns stay empty for skill players
        assert_eq!(&records[0][6], "");
    }

    #[test]
    fn test_json_export() {
        let dir = tempdir().unwrap();
        let all = vec![projection(9, Position::TE, None)];
        let refs: Vec<&Projection> = all.iter().collect();

        let path = export_projections(&refs, ExportFormat::Json, dir.path(), 2024).unwrap();
        let raw = std::fs::read_to_string(path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value[0]["player_id"], 9);
        assert_eq!(value[0]["half_ppr"], 201.5);
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert!("xlsx".parse::<ExportFormat>().is_err());
    }
}
