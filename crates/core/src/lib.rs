//! # bc-core
//!
//! Chart execution control and recipe management for batch processes.
//!
//! This crate provides:
//! - Lifecycle control for running control charts (start, pause, resume,
//!   stop, reset) with timing and step tracking
//! - Versioned recipe storage and recipe execution tracking
//! - Configuration loading from the `.batch-control/` directory
//!
//! ## Modules
//!
//! - [`charts`]: Chart state machine and controller
//! - [`recipes`]: Recipe store, executions and manager
//! - [`config`]: Configuration loading and management
//! - [`system`]: Both controllers assembled from configuration
//! - [`time`]: Clock abstraction
//! - [`error`]: Operation error types

pub mod charts;
pub mod config;
pub mod error;
pub mod recipes;
pub mod system;
pub mod time;
