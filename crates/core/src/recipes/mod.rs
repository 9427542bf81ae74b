//! Recipe management.
//!
//! This module provides:
//! - Template and key validation (`validation`)
//! - Versioned recipe storage (`store`)
//! - The execution record store (`executions`)
//! - The completion estimate seam (`estimator`)
//! - The public recipe surface (`manager`)

pub mod estimator;
pub mod executions;
pub mod manager;
pub mod store;
pub mod validation;

pub use estimator::{CompletionEstimator, NoEstimate};
pub use executions::ExecutionRegistry;
pub use manager::RecipeManager;
pub use store::RecipeStore;
