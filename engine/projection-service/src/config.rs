//! Service configuration management

use anyhow::{Context, Result};
use projection_engine::EngineConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Postgres connection settings
    pub database: DatabaseConfig,

    /// Batch orchestration settings
    pub batch: BatchConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Export settings
    pub export: ExportConfig,

    /// Projection engine configuration
    pub engine: EngineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database URL
    pub url: String,

    /// Connection pool size
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Items processed concurrently per chunk
    pub batch_size: usize,

    /// Pause between chunks in milliseconds
    pub delay_ms: u64,

    /// Consecutive failures that open the circuit breaker
    pub failure_threshold: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (json, pretty, compact)
    pub format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory export files are written to
    pub dir: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgresql://localhost:5432/projections".to_string(),
            max_connections: 5,
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { batch_size: 10, delay_ms: 100, failure_threshold: 5 }
    }
}

impl BatchConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: "pretty".to_string() }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self { dir: PathBuf::from("./exports") }
    }
}

/// Load configuration from an optional TOML file, then environment variables
pub fn load_config(path: Option<&Path>) -> Result<ServiceConfig> {
    let mut config = match path {
        Some(path) => {
            tracing::debug!("Loading configuration from file: {:?}", path);
            load_from_file(path)?
        }
        None => ServiceConfig::default(),
    };

    load_from_env(&mut config)?;
    validate_config(&config)?;

    Ok(config)
}

/// Load configuration from a TOML file
pub fn load_from_file(path: &Path) -> Result<ServiceConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;
    toml::from_str(&raw).with_context(|| format!("Failed to parse config file: {:?}", path))
}

/// Load configuration from environment variables
fn load_from_env(config: &mut ServiceConfig) -> Result<()> {
    if let Ok(url) = std::env::var("DATABASE_URL") {
        config.database.url = url;
    }

    if let Ok(max) = std::env::var("PROJECTION_DB_MAX_CONNECTIONS") {
        config.database.max_connections =
            max.parse().context("PROJECTION_DB_MAX_CONNECTIONS must be an integer")?;
    }

    if let Ok(size) = std::env::var("PROJECTION_BATCH_SIZE") {
        config.batch.batch_size = size.parse().context("PROJECTION_BATCH_SIZE must be an integer")?;
    }

    if let Ok(delay) = std::env::var("PROJECTION_BATCH_DELAY_MS") {
        config.batch.delay_ms = delay.parse().context("PROJECTION_BATCH_DELAY_MS must be an integer")?;
    }

    if let Ok(threshold) = std::env::var("PROJECTION_FAILURE_THRESHOLD") {
        config.batch.failure_threshold =
            threshold.parse().context("PROJECTION_FAILURE_THRESHOLD must be an integer")?;
    }

    if let Ok(level) = std::env::var("PROJECTION_LOG_LEVEL") {
        config.logging.level = level;
    }

    if let Ok(format) = std::env::var("PROJECTION_LOG_FORMAT") {
        config.logging.format = format;
    }

    if let Ok(dir) = std::env::var("PROJECTION_EXPORT_DIR") {
        config.export.dir = PathBuf::from(dir);
    }

    config.engine.apply_env()?;

    Ok(())
}

/// Validate configuration
fn validate_config(config: &ServiceConfig) -> Result<()> {
    match config.logging.level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow::anyhow!("Invalid log level: {}", config.logging.level)),
    }

    match config.logging.format.as_str() {
        "json" | "pretty" | "compact" => {}
        _ => return Err(anyhow::anyhow!("Invalid log format: {}", config.logging.format)),
    }

    if config.batch.batch_size == 0 {
        return Err(anyhow::anyhow!("batch_size must be at least 1"));
    }

    if config.batch.failure_threshold == 0 {
        return Err(anyhow::anyhow!("failure_threshold must be at least 1"));
    }

    if config.database.max_connections == 0 {
        return Err(anyhow::anyhow!("max_connections must be at least 1"));
    }

    config.engine.validate()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config_is_valid() {
        let config = ServiceConfig::default();
        assert!(validate_config(&config).is_ok());
        assert_eq!(config.batch.delay(), Duration::from_millis(100));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[batch]
batch_size = 25

[engine.rookie]
default_games = 16.0
"#
        )
        .unwrap();

        let config = load_from_file(file.path()).unwrap();
        assert_eq!(config.batch.batch_size, 25);
        assert_eq!(config.batch.failure_threshold, 5);
        assert_eq!(config.engine.rookie.default_games, 16.0);
        assert_eq!(config.engine.rookie.fallback_playing_time_pct, 0.6);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = ServiceConfig::default();
        config.logging.format = "xml".to_string();
        assert!(validate_config(&config).is_err());

        let mut config = ServiceConfig::default();
        config.batch.batch_size = 0;
        assert!(validate_config(&config).is_err());

        let mut config = ServiceConfig::default();
        config.engine.blend.rush_model_weight = -0.1;
        assert!(validate_config(&config).is_err());
    }
}
