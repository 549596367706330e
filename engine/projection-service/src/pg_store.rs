//! Postgres storage collaborator

use async_trait::async_trait;
use bigdecimal::{BigDecimal, FromPrimitive, ToPrimitive};
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::Row;
use std::collections::HashMap;
use tracing::{debug, info};
use uuid::Uuid;

use projection_engine::models::Stamp;
use projection_engine::{
    FantasyPoints, GameRecord, PlayerRecord, PlayerStatus, Projection, ProjectionError,
    ProjectionSource, ReceiverLine, SeasonStat, StatLine, StatStore, StatType, TeamStat,
};

use crate::config::DatabaseConfig;
use crate::error::Result;

type StoreResult<T> = projection_engine::Result<T>;

fn store_err(e: sqlx::Error) -> ProjectionError {
    ProjectionError::store(e.to_string())
}

fn to_decimal(value: f64) -> StoreResult<BigDecimal> {
    BigDecimal::from_f64(value)
        .ok_or_else(|| ProjectionError::store(format!("cannot store {value} as NUMERIC")))
}

fn from_decimal(value: &BigDecimal) -> StoreResult<f64> {
    value
        .to_f64()
        .ok_or_else(|| ProjectionError::store(format!("NUMERIC {value} out of f64 range")))
}

fn week_column(week: u32) -> StoreResult<i32> {
    i32::try_from(week).map_err(|_| ProjectionError::store(format!("week {week} out of range")))
}

fn status_label(status: PlayerStatus) -> &'static str {
    match status {
        PlayerStatus::Rookie => "rookie",
        PlayerStatus::Veteran => "veteran",
        PlayerStatus::Inactive => "inactive",
    }
}

fn parse_status(label: &str) -> StoreResult<PlayerStatus> {
    match label.to_ascii_lowercase().as_str() {
        "rookie" => Ok(PlayerStatus::Rookie),
        "veteran" | "active" => Ok(PlayerStatus::Veteran),
        "inactive" => Ok(PlayerStatus::Inactive),
        other => Err(ProjectionError::store(format!("unknown player status: {other}"))),
    }
}

/// `StatStore` backed by a Postgres pool
#[derive(Debug, Clone)]
pub struct PgStatStore {
    pool: PgPool,
}

impl PgStatStore {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url)
            .await?;
        info!("Connected to projection database");
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply pending schema migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Database migrations applied");
        Ok(())
    }

    fn player_from_row(row: &PgRow) -> StoreResult<PlayerRecord> {
        let draft_position: Option<i32> = row.try_get("draft_position").map_err(store_err)?;
        let status: String = row.try_get("status").map_err(store_err)?;
        Ok(PlayerRecord {
            player_id: row.try_get("player_id").map_err(store_err)?,
            name: row.try_get("name").map_err(store_err)?,
            team: row.try_get("team").map_err(store_err)?,
            position: row.try_get("position").map_err(store_err)?,
            draft_position: draft_position.and_then(|d| u32::try_from(d).ok()),
            status: parse_status(&status)?,
        })
    }

    fn projection_from_row(row: &PgRow) -> StoreResult<Projection> {
        let position: String = row.try_get("position").map_err(store_err)?;
        let games: Option<BigDecimal> = row.try_get("games").map_err(store_err)?;
        let stats: Json<StatLine> = row.try_get("stats").map_err(store_err)?;
        let points: Json<FantasyPoints> = row.try_get("points").map_err(store_err)?;
        let source: Json<ProjectionSource> = row.try_get("source").map_err(store_err)?;
        let created_at: DateTime<Utc> = row.try_get("created_at").map_err(store_err)?;
        let updated_at: DateTime<Utc> = row.try_get("updated_at").map_err(store_err)?;

        Ok(Projection {
            id: row.try_get("id").map_err(store_err)?,
            player_id: row.try_get("player_id").map_err(store_err)?,
            season: row.try_get("season").map_err(store_err)?,
            scenario_id: row.try_get("scenario_id").map_err(store_err)?,
            position: position.parse()?,
            games: games.as_ref().map(from_decimal).transpose()?,
            stats: stats.0,
            points: points.0,
            source: source.0,
            stamp: Stamp { created_at, updated_at },
        })
    }
}

const PROJECTION_COLUMNS: &str = "id, player_id, season, scenario_id, position, games, stats, \
                                  points, source, created_at, updated_at";

#[async_trait]
impl StatStore for PgStatStore {
    async fn get_player(&self, player_id: i64) -> StoreResult<Option<PlayerRecord>> {
        let row = sqlx::query(
            "SELECT player_id, name, team, position, draft_position, status \
             FROM players WHERE player_id = $1",
        )
        .bind(player_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        row.as_ref().map(Self::player_from_row).transpose()
    }

    async fn upsert_player(&self, player: &PlayerRecord) -> StoreResult<()> {
        let draft_position = player.draft_position.and_then(|d| i32::try_from(d).ok());
        sqlx::query(
            r#"
            INSERT INTO players (player_id, name, team, position, draft_position, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (player_id) DO UPDATE SET
                name = EXCLUDED.name,
                team = EXCLUDED.team,
                position = EXCLUDED.position,
                draft_position = EXCLUDED.draft_position,
                status = EXCLUDED.status
            "#,
        )
        .bind(player.player_id)
        .bind(&player.name)
        .bind(&player.team)
        .bind(&player.position)
        .bind(draft_position)
        .bind(status_label(player.status))
        .execute(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(())
    }

    async fn game_records(&self, player_id: i64, season: i32) -> StoreResult<Vec<GameRecord>> {
        let rows = sqlx::query(
            "SELECT player_id, season, week, opponent, result, stats \
             FROM game_records WHERE player_id = $1 AND season = $2 ORDER BY week",
        )
        .bind(player_id)
        .bind(season)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        rows.iter()
            .map(|row| {
                let week: i32 = row.try_get("week").map_err(store_err)?;
                let stats: Json<HashMap<String, serde_json::Value>> =
                    row.try_get("stats").map_err(store_err)?;
                Ok(GameRecord {
                    player_id: row.try_get("player_id").map_err(store_err)?,
                    season: row.try_get("season").map_err(store_err)?,
                    week: u32::try_from(week)
                        .map_err(|_| ProjectionError::store(format!("negative week {week}")))?,
                    opponent: row.try_get("opponent").map_err(store_err)?,
                    result: row.try_get("result").map_err(store_err)?,
                    stats: stats.0,
                })
            })
            .collect()
    }

    async fn insert_game_records(&self, records: &[GameRecord]) -> StoreResult<()> {
        let mut tx = self.pool.begin().await.map_err(store_err)?;
        for record in records {
            let week = week_column(record.week)?;
            sqlx::query(
                r#"
                INSERT INTO game_records (player_id, season, week, opponent, result, stats)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (player_id, season, week) DO NOTHING
                "#,
            )
            .bind(record.player_id)
            .bind(record.season)
            .bind(week)
            .bind(&record.opponent)
            .bind(&record.result)
            .bind(Json(&record.stats))
            .execute(&mut *tx)
            .await
            .map_err(store_err)?;
        }
        tx.commit().await.map_err(store_err)?;
        debug!("Stored {} game records", records.len());
        Ok(())
    }

    async fn season_stats(&self, player_id: i64, season: i32) -> StoreResult<Vec<SeasonStat>> {
        let rows = sqlx::query(
            "SELECT stat_type, value FROM season_stats \
             WHERE player_id = $1 AND season = $2 ORDER BY stat_type",
        )
        .bind(player_id)
        .bind(season)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        let mut stats = Vec::with_capacity(rows.len());
        for row in &rows {
            let stat_type: String = row.try_get("stat_type").map_err(store_err)?;
            let value: BigDecimal = row.try_get("value").map_err(store_err)?;
            let stat_type = match stat_type.parse::<StatType>() {
                Ok(stat) => stat,
                Err(_) => {
                    debug!("Skipping unrecognized stat {} for player {}", stat_type, player_id);
                    continue;
                }
            };
            stats.push(SeasonStat::new(player_id, season, stat_type, from_decimal(&value)?));
        }
        stats.sort_by_key(|s| s.stat_type);
        Ok(stats)
    }

    async fn upsert_season_stat(&self, stat: &SeasonStat) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO season_stats (player_id, season, stat_type, value, updated_at)
            VALUES ($1, $2, $3, $4, NOW())
            ON CONFLICT (player_id, season, stat_type) DO UPDATE SET
                value = EXCLUDED.value,
                updated_at = NOW()
            "#,
        )
        .bind(stat.player_id)
        .bind(stat.season)
        .bind(stat.stat_type.as_str())
        .bind(to_decimal(stat.value)?)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(())
    }

    async fn get_projection(&self, id: Uuid) -> StoreResult<Option<Projection>> {
        let row = sqlx::query(&format!("SELECT {PROJECTION_COLUMNS} FROM projections WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_err)?;
        row.as_ref().map(Self::projection_from_row).transpose()
    }

    async fn find_projection(
        &self,
        player_id: i64,
        season: i32,
        scenario_id: Option<&str>,
    ) -> StoreResult<Option<Projection>> {
        let row = sqlx::query(&format!(
            "SELECT {PROJECTION_COLUMNS} FROM projections \
             WHERE player_id = $1 AND season = $2 AND scenario_id IS NOT DISTINCT FROM $3"
        ))
        .bind(player_id)
        .bind(season)
        .bind(scenario_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;
        row.as_ref().map(Self::projection_from_row).transpose()
    }

    async fn save_projection(&self, projection: &Projection) -> StoreResult<()> {
        let games = projection.games.map(to_decimal).transpose()?;
        sqlx::query(
            r#"
            INSERT INTO projections
                (id, player_id, season, scenario_id, position, games, stats, points, source,
                 created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (id) DO UPDATE SET
                position = EXCLUDED.position,
                games = EXCLUDED.games,
                stats = EXCLUDED.stats,
                points = EXCLUDED.points,
                source = EXCLUDED.source,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(projection.id)
        .bind(projection.player_id)
        .bind(projection.season)
        .bind(&projection.scenario_id)
        .bind(projection.position.as_str())
        .bind(games)
        .bind(Json(&projection.stats))
        .bind(Json(&projection.points))
        .bind(Json(&projection.source))
        .bind(projection.stamp.created_at)
        .bind(projection.stamp.updated_at)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(())
    }

    async fn list_projections(&self, season: i32) -> StoreResult<Vec<Projection>> {
        let rows = sqlx::query(&format!(
            "SELECT {PROJECTION_COLUMNS} FROM projections WHERE season = $1 \
             ORDER BY player_id, scenario_id NULLS FIRST"
        ))
        .bind(season)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;
        rows.iter().map(Self::projection_from_row).collect()
    }

    async fn team_stat(&self, team: &str, season: i32) -> StoreResult<Option<TeamStat>> {
        let row = sqlx::query("SELECT data FROM team_stats WHERE team = $1 AND season = $2")
            .bind(team)
            .bind(season)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_err)?;
        match row {
            Some(row) => {
                let data: Json<TeamStat> = row.try_get("data").map_err(store_err)?;
                Ok(Some(data.0))
            }
            None => Ok(None),
        }
    }

    async fn upsert_team_stat(&self, team: &TeamStat) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO team_stats (team, season, data)
            VALUES ($1, $2, $3)
            ON CONFLICT (team, season) DO UPDATE SET data = EXCLUDED.data
            "#,
        )
        .bind(&team.team)
        .bind(team.season)
        .bind(Json(team))
        .execute(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(())
    }

    async fn team_receivers(&self, team: &str, season: i32) -> StoreResult<Vec<ReceiverLine>> {
        let rows = sqlx::query(
            r#"
            SELECT p.player_id,
                   MAX(CASE WHEN s.stat_type = 'targets' THEN s.value END) AS targets,
                   MAX(CASE WHEN s.stat_type = 'receptions' THEN s.value END) AS receptions,
                   MAX(CASE WHEN s.stat_type = 'rec_yards' THEN s.value END) AS rec_yards
            FROM players p
            JOIN season_stats s ON s.player_id = p.player_id AND s.season = $2
            WHERE p.team = $1 AND s.stat_type IN ('targets', 'receptions', 'rec_yards')
            GROUP BY p.player_id
            ORDER BY p.player_id
            "#,
        )
        .bind(team)
        .bind(season)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        rows.iter()
            .map(|row| {
                let value = |column: &str| -> StoreResult<f64> {
                    let v: Option<BigDecimal> = row.try_get(column).map_err(store_err)?;
                    Ok(v.as_ref().map(from_decimal).transpose()?.unwrap_or(0.0))
                };
                Ok(ReceiverLine {
                    player_id: row.try_get("player_id").map_err(store_err)?,
                    targets: value("targets")?,
                    receptions: value("receptions")?,
                    rec_yards: value("rec_yards")?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decimal_conversion() {
        let decimal = to_decimal(3750.5).unwrap();
        assert_eq!(from_decimal(&decimal).unwrap(), 3750.5);
        assert!(to_decimal(f64::NAN).is_err());
    }

    #[test]
    fn test_week_column_rejects_overflow() {
        assert_eq!(week_column(18).unwrap(), 18);
        let err = week_column(u32::MAX).unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn test_status_labels() {
        for status in [PlayerStatus::Rookie, PlayerStatus::Veteran, PlayerStatus::Inactive] {
            assert_eq!(parse_status(status_label(status)).unwrap(), status);
        }
        assert_eq!(parse_status("Active").unwrap(), PlayerStatus::Veteran);
        assert!(parse_status("retired").is_err());
    }
}
