//! Configuration loading and management.
//!
//! This module provides functionality to load and parse the settings file
//! and the recipe seed files from the `.batch-control/` directory.

pub mod error;
pub mod loader;
pub mod models;
