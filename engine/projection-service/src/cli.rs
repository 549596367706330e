//! # Command Line Interface
//!
//! Batch aggregation, projection building, adjustment, validation and export
//! over either a JSON seed file (in-memory store) or Postgres.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use projection_engine::{
    Adjustments, MemoryStore, Position, Projection, ProjectionEngine, ProjectionError, StatStore,
};
use std::fmt::Display;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::config::ServiceConfig;
use crate::export::{export_projections, ExportFilter, ExportFormat};
use crate::orchestrator::{BatchRunner, RunSummary};
use crate::pg_store::PgStatStore;
use crate::seed::{apply_seed, load_seed};

/// Season projection service
#[derive(Parser)]
#[command(name = "projection-service")]
#[command(about = "Fantasy football season projections: aggregate, build, adjust, validate, export")]
pub struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// JSON seed file; runs against an in-memory store instead of Postgres
    #[arg(short, long)]
    pub seed: Option<PathBuf>,

    /// Season to operate on
    #[arg(long, default_value = "2024")]
    pub season: i32,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Reduce stored game records to season totals
    Aggregate {
        /// Player ids (defaults to every seeded player)
        #[arg(long, value_delimiter = ',')]
        players: Vec<i64>,
    },
    /// Build base projections
    Build {
        #[arg(long, value_delimiter = ',')]
        players: Vec<i64>,
        /// Scenario id; omitted builds the baseline
        #[arg(long)]
        scenario: Option<String>,
    },
    /// Apply named adjustments to each player's projection
    Adjust {
        #[arg(long, value_delimiter = ',')]
        players: Vec<i64>,
        #[arg(long)]
        scenario: Option<String>,
        /// Adjustment as key=value, e.g. pass_volume=1.1
        #[arg(long = "set", required = true)]
        set: Vec<String>,
    },
    /// Check stored stats against game records and correct drift
    Validate {
        #[arg(long, value_delimiter = ',')]
        players: Vec<i64>,
        /// Also check a team's aggregate
        #[arg(long)]
        team: Option<String>,
        /// Also check stored projections of the season
        #[arg(long)]
        projections: bool,
    },
    /// Write projections to csv or json
    Export {
        #[arg(long, default_value = "csv")]
        format: String,
        #[arg(long)]
        position: Option<String>,
        #[arg(long)]
        scenario: Option<String>,
        /// Output directory (defaults to the configured export dir)
        #[arg(long)]
        dir: Option<PathBuf>,
        /// Build baselines for the players before exporting
        #[arg(long)]
        build: bool,
        #[arg(long, value_delimiter = ',')]
        players: Vec<i64>,
    },
}

/// Parse `key=value` adjustment arguments
pub fn parse_assignments(pairs: &[String]) -> Result<Adjustments> {
    let mut adjustments = Adjustments::new();
    for pair in pairs {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| anyhow!("expected key=value, got {pair}"))?;
        let value: f64 = value
            .trim()
            .parse()
            .with_context(|| format!("adjustment {key} is not a number"))?;
        adjustments.insert(key.trim().to_string(), value);
    }
    Ok(adjustments)
}

/// CLI handler
pub struct CliHandler {
    engine: Arc<ProjectionEngine>,
    runner: BatchRunner,
    config: ServiceConfig,
    season: i32,
    seeded_players: Vec<i64>,
}

impl CliHandler {
    /// Connect to the configured store (or load the seed) and build the engine
    pub async fn new(cli: &Cli, config: ServiceConfig) -> Result<Self> {
        let (store, seeded_players): (Arc<dyn StatStore>, Vec<i64>) = match &cli.seed {
            Some(path) => {
                let seed = load_seed(path)
                    .with_context(|| format!("Failed to load seed file: {:?}", path))?;
                let store = Arc::new(MemoryStore::new());
                apply_seed(store.as_ref(), &seed).await?;
                (store, seed.player_ids())
            }
            None => {
                let store = PgStatStore::connect(&config.database)
                    .await
                    .context("Failed to connect to database")?;
                store.migrate().await?;
                (Arc::new(store), Vec::new())
            }
        };

        let engine = ProjectionEngine::new(store, config.engine.clone());
        Ok(Self {
            engine: Arc::new(engine),
            runner: BatchRunner::from_config(&config.batch),
            config,
            season: cli.season,
            seeded_players,
        })
    }

    /// Handle CLI commands
    pub async fn handle_command(&self, command: Commands) -> Result<()> {
        match command {
            Commands::Aggregate { players } => self.aggregate(&players).await,
            Commands::Build { players, scenario } => self.build(&players, scenario.as_deref()).await,
            Commands::Adjust { players, scenario, set } => {
                let adjustments = parse_assignments(&set)?;
                self.adjust(&players, scenario.as_deref(), &adjustments).await
            }
            Commands::Validate { players, team, projections } => {
                self.validate(&players, team.as_deref(), projections).await
            }
            Commands::Export { format, position, scenario, dir, build, players } => {
                let format: ExportFormat = format.parse()?;
                let position = position.map(|p| p.parse::<Position>()).transpose()?;
                if build {
                    self.build(&players, scenario.as_deref()).await?;
                }
                let filter = ExportFilter { position, scenario_id: scenario };
                self.export(format, &filter, dir).await
            }
        }
    }

    fn players(&self, requested: &[i64]) -> Result<Vec<(i64, i64)>> {
        let ids = if requested.is_empty() { &self.seeded_players[..] } else { requested };
        if ids.is_empty() {
            return Err(anyhow!("no players given; pass --players"));
        }
        Ok(ids.iter().map(|&id| (id, id)).collect())
    }

    async fn aggregate(&self, players: &[i64]) -> Result<()> {
        let engine = self.engine.as_ref();
        let season = self.season;
        let summary = self
            .runner
            .run("aggregate_season", self.players(players)?, move |id| async move {
                let report = engine.aggregate_season(id, season).await?;
                for bad in &report.invalid {
                    println!("player {id}: invalid {} value in week {}: {}", bad.stat, bad.week, bad.raw);
                }
                Ok::<_, ProjectionError>(report.rows_written)
            })
            .await;
        print_summary("Aggregate", &summary);
        Ok(())
    }

    async fn build(&self, players: &[i64], scenario: Option<&str>) -> Result<()> {
        let engine = self.engine.as_ref();
        let season = self.season;
        let summary = self
            .runner
            .run("build_projection", self.players(players)?, move |id| {
                engine.create_base_projection(id, season, scenario)
            })
            .await;
        print_summary("Build", &summary);
        Ok(())
    }

    async fn adjust(
        &self,
        players: &[i64],
        scenario: Option<&str>,
        adjustments: &Adjustments,
    ) -> Result<()> {
        let engine = self.engine.as_ref();
        let season = self.season;
        let summary = self
            .runner
            .run("adjust_projection", self.players(players)?, move |id| async move {
                let projection = existing_or_built(engine, id, season, scenario).await?;
                let (updated, applied) = engine.update_projection(projection.id, adjustments).await?;
                println!(
                    "player {id}: half_ppr {:.2} -> {:.2} ({} applied, {} ignored)",
                    applied.half_ppr_before.unwrap_or(0.0),
                    updated.half_ppr().unwrap_or(0.0),
                    applied.applied.len(),
                    applied.ignored.len()
                );
                Ok::<_, ProjectionError>(())
            })
            .await;
        print_summary("Adjust", &summary);
        Ok(())
    }

    async fn validate(&self, players: &[i64], team: Option<&str>, projections: bool) -> Result<()> {
        let engine = self.engine.as_ref();
        let season = self.season;

        if !players.is_empty() || !self.seeded_players.is_empty() {
            let summary = self
                .runner
                .run("validate_player", self.players(players)?, move |id| async move {
                    let issues = engine.validate_player_data(id, season).await?;
                    for issue in &issues {
                        println!("{issue}");
                    }
                    Ok::<_, ProjectionError>(issues.len())
                })
                .await;
            print_summary("Validate players", &summary);
        }

        if let Some(team) = team {
            let issues = self.engine.validate_team(team, season).await?;
            println!("Team {team}: {} issues", issues.len());
            for issue in &issues {
                println!("{issue}");
            }
        }

        if projections {
            let stored = self.engine.store().list_projections(season).await?;
            let items: Vec<(Uuid, Uuid)> = stored.iter().map(|p| (p.id, p.id)).collect();
            let summary = self
                .runner
                .run("validate_projection", items, move |id| async move {
                    let issues = engine.validate_projection(id).await?;
                    for issue in &issues {
                        println!("{issue}");
                    }
                    Ok::<_, ProjectionError>(issues.len())
                })
                .await;
            print_summary("Validate projections", &summary);
        }

        Ok(())
    }

    async fn export(
        &self,
        format: ExportFormat,
        filter: &ExportFilter,
        dir: Option<PathBuf>,
    ) -> Result<()> {
        let stored = self.engine.store().list_projections(self.season).await?;
        let selected = filter.apply(&stored);
        let dir = dir.unwrap_or_else(|| self.config.export.dir.clone());
        let path = export_projections(&selected, format, &dir, self.season)?;
        info!("Export complete: {:?}", path);
        println!("Wrote {} projections to {}", selected.len(), path.display());
        Ok(())
    }
}

async fn existing_or_built(
    engine: &ProjectionEngine,
    player_id: i64,
    season: i32,
    scenario: Option<&str>,
) -> projection_engine::Result<Projection> {
    match engine.store().find_projection(player_id, season, scenario).await? {
        Some(projection) => Ok(projection),
        None => engine.create_base_projection(player_id, season, scenario).await,
    }
}

fn print_summary<K: Ord + Display>(label: &str, summary: &RunSummary<K>) {
    println!(
        "{label}: {} succeeded, {} failed, {} skipped",
        summary.succeeded(),
        summary.failed(),
        summary.skipped.len()
    );
    for (key, err) in &summary.errors {
        println!("  {key}: {err}");
    }
}
