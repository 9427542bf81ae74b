//! # bc-protocol
//!
//! Record definitions and data models for batch-control.
//!
//! This crate defines all shared data structures used for:
//! - Chart execution state (sequential function charts)
//! - Recipe definitions and recipe executions
//! - Status notifications for operator consoles
//! - Settings parsed from `.batch-control/config.toml`
//!
//! ## Modules
//!
//! - [`chart_models`]: Chart execution records and status
//! - [`recipe_models`]: Recipe definitions, ingredients and steps
//! - [`execution_models`]: Recipe execution records and status views
//! - [`config_models`]: Settings from config.toml
//! - [`events`]: Notifications emitted on successful state changes
//!
//! ## Design Principles
//!
//! - Minimal dependencies: only serde, chrono and uuid
//! - Records are plain data; the state machines live in `bc-core`
//! - Independent compilation: no dependencies on other batch-control crates

pub mod chart_models;
pub mod config_models;
pub mod events;
pub mod execution_models;
pub mod recipe_models;

// Re-export all public types for convenience
pub use chart_models::*;
pub use config_models::*;
pub use events::*;
pub use execution_models::*;
pub use recipe_models::*;
