//! Chart execution control.
//!
//! This module provides:
//! - The chart state machine (`state`)
//! - The keyed record store (`registry`)
//! - The public control surface (`controller`)

pub mod controller;
pub mod registry;
pub mod state;

pub use controller::ChartController;
pub use registry::ChartRegistry;
