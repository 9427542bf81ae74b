//! Test fixtures for building control systems and sample configuration.

use bc_core::system::ControlSystem;
use bc_core::time::ManualClock;
use bc_protocol::{ControlSettings, Event};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::mpsc;

/// A control system with default settings on a manual clock.
#[allow(dead_code)]
pub fn manual_system() -> (ControlSystem, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::default());
    let system = ControlSystem::new(clock.clone(), ControlSettings::default());
    (system, clock)
}

/// Like [`manual_system`], with events sent to the returned receiver.
#[allow(dead_code)]
pub fn manual_system_with_events() -> (
    ControlSystem,
    Arc<ManualClock>,
    mpsc::UnboundedReceiver<Event>,
) {
    let (tx, rx) = mpsc::unbounded_channel();
    let (system, clock) = manual_system();
    (system.with_events(tx), clock, rx)
}

/// A recipe template with two ingredients and three steps.
#[allow(dead_code)]
pub fn batch_template() -> Value {
    json!({
        "ingredients": [
            {"name": "Water", "quantity": 100.0, "unit": "L"},
            {"name": "Sugar", "quantity": 12.5, "unit": "kg"}
        ],
        "steps": [
            {"name": "Charge", "duration_minutes": 10},
            {"name": "Dissolve", "duration_minutes": 25},
            {"name": "Transfer", "duration_minutes": 5}
        ],
        "quality_parameters": {"brix_min": 11.0}
    })
}

/// Create a temporary project directory with `.batch-control` configuration.
///
/// This creates:
/// - `.batch-control/config.toml` with a custom batch prefix and history limit
/// - `.batch-control/recipes/` with two recipe files
///
/// Returns a TempDir that must be kept alive for the test duration.
#[allow(dead_code)]
pub fn create_test_project() -> std::io::Result<TempDir> {
    let temp_dir = tempfile::tempdir()?;
    let bc_dir = temp_dir.path().join(".batch-control");

    std::fs::create_dir_all(bc_dir.join("recipes"))?;

    std::fs::write(
        bc_dir.join("config.toml"),
        "history_limit = 2\nbatch_id_prefix = \"LOT_\"\n",
    )?;

    let syrup = r#"name: Syrup
version: "1.2"
description: Simple syrup
ingredients:
  - name: Water
    quantity: 100.0
    unit: L
  - name: Sugar
    quantity: 100.0
    unit: kg
steps:
  - name: Heat
    duration_minutes: 15
  - name: Dissolve
    duration_minutes: 20
"#;
    std::fs::write(bc_dir.join("recipes/syrup.yaml"), syrup)?;

    let rinse = r#"name: Rinse
ingredients: []
steps: []
"#;
    std::fs::write(bc_dir.join("recipes/rinse.yml"), rinse)?;

    Ok(temp_dir)
}

/// Drain every event currently queued on `rx`.
#[allow(dead_code)]
pub fn drain_events(rx: &mut mpsc::UnboundedReceiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
