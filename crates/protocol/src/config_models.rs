//! Settings models for `.batch-control/config.toml`.
//!
//! This module defines the structure of the settings file that controls
//! defaults shared by the chart controller and the recipe manager.

use serde::Deserialize;
use serde::Serialize;

/// Represents settings from `.batch-control/config.toml`.
///
/// Every field is optional in the file and falls back to its default.
///
/// # Example
///
/// ```toml
/// # .batch-control/config.toml
/// history_limit = 25
/// default_abort_reason = "Operator abort"
/// max_chart_path_len = 128
/// batch_id_prefix = "LOT_"
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ControlSettings {
    /// Number of executions returned by a history query when the caller
    /// does not pass a limit.
    pub history_limit: usize,

    /// Reason recorded when an execution is aborted without one.
    pub default_abort_reason: String,

    /// Longest accepted chart path, in bytes.
    pub max_chart_path_len: usize,

    /// Prefix of generated batch identifiers.
    pub batch_id_prefix: String,
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self {
            history_limit: 50,
            default_abort_reason: "User requested".to_string(),
            max_chart_path_len: 256,
            batch_id_prefix: "BATCH_".to_string(),
        }
    }
}
