//! # Projection Engine
//!
//! Season projections for fantasy football players.
//!
//! ## Architecture
//!
//! - **Aggregation**: per-game records reduced to season totals per position
//! - **Builder**: carry-forward baselines for veterans, template and comparison
//!   model projections for rookies, optionally blended with team tendencies
//! - **Adjustments**: named scalar knobs applied in place, preserving rates
//! - **Validation**: stored totals checked against game records and corrected;
//!   projection math and team aggregates checked read-only
//! - **StatStore**: storage collaborator trait with an in-memory implementation
//!
//! ## Usage
//!
//! ```rust
//! use projection_engine::{EngineConfig, MemoryStore, ProjectionEngine};
//! use std::sync::Arc;
//!
//! let engine = ProjectionEngine::new(Arc::new(MemoryStore::new()), EngineConfig::default());
//! assert_eq!(engine.config().rookie.default_games, 17.0);
//! ```

pub mod adjustment;
pub mod aggregation;
pub mod batch;
pub mod comparison;
pub mod config;
pub mod derive;
pub mod engine;
pub mod error;
pub mod models;
pub mod projection;
pub mod rookie;
pub mod scoring;
pub mod stats;
pub mod store;
pub mod team_context;
pub mod team_validation;
pub mod templates;
pub mod validation;

pub use adjustment::{apply_adjustments, AdjustmentKey, AdjustmentSummary, Adjustments};
pub use aggregation::{SeasonAggregate, StatAggregator};
pub use batch::BatchReport;
pub use comparison::{ComparisonModel, Tier};
pub use config::{BlendWeights, EngineConfig, RookieConfig, ValidationConfig};
pub use engine::{AggregationReport, ProjectionEngine};
pub use error::{ProjectionError, Result};
pub use models::{GameRecord, PlayerRecord, PlayerStatus, ReceiverLine, SeasonStat, TeamStat};
pub use projection::{FantasyPoints, Projection, ProjectionSource, StatLine};
pub use scoring::ScoringFormat;
pub use stats::{Position, StatType};
pub use store::{MemoryStore, StatStore};
pub use templates::{RookieTemplate, TemplateSet};
pub use validation::{IssueKind, ValidationIssue};
