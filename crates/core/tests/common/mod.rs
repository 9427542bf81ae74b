//! Common test utilities shared by the integration tests.
//!
//! This module provides:
//! - Test fixtures (systems on a manual clock, recipe templates, config dirs)
//! - Event assertions

pub mod assertions;
pub mod fixtures;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use fixtures::*;
