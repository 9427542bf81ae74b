//! Integration tests for chart execution control.
//!
//! These tests drive the ChartController through a full ControlSystem:
//! - Start, pause, resume, stop and reset transitions
//! - Pause accounting across several cycles
//! - Concurrent starts on one chart
//! - Event sequences

mod common;

use bc_core::system::ControlSystem;
use bc_core::time::{SystemClock, TimeSource};
use bc_protocol::{ChartStatus, ControlSettings, Event};
use chrono::Duration;
use common::*;
use serde_json::json;
use std::sync::{Arc, Barrier};
use std::thread;

#[test]
fn test_start_then_status_is_running() {
    let (system, clock) = manual_system();

    assert!(system.charts.start("Line1/Fill", None));

    let report = system.charts.status("Line1/Fill").expect("status");
    assert_eq!(report.record.status, ChartStatus::Running);
    assert_eq!(report.record.start_time, clock.now());
    assert_eq!(report.record.current_step, "initial");
    assert!(report.record.step_history.is_empty());
}

#[test]
fn test_double_start_keeps_one_record() {
    let (system, _) = manual_system();

    assert!(system.charts.start("Line1/Fill", None));
    let first = system.charts.status("Line1/Fill").expect("status");

    assert!(!system.charts.start("Line1/Fill", None));
    assert_eq!(system.charts.chart_count(), 1);
    assert_eq!(
        system.charts.status("Line1/Fill").map(|r| r.record.execution_id),
        Some(first.record.execution_id)
    );
}

#[test]
fn test_pause_only_from_running() {
    let (system, _) = manual_system();

    assert!(!system.charts.pause("Line1/Fill", true), "absent chart");

    assert!(system.charts.start("Line1/Fill", None));
    assert!(system.charts.pause("Line1/Fill", true));
    let paused = system.charts.status("Line1/Fill").expect("status");

    assert!(!system.charts.pause("Line1/Fill", false), "already paused");
    let after = system.charts.status("Line1/Fill").expect("status");
    assert_eq!(after.record, paused.record, "rejected pause must not mutate");
}

#[test]
fn test_pause_accumulates_across_cycles() {
    let (system, clock) = manual_system();
    assert!(system.charts.start("Line2/Mix", None));

    assert!(system.charts.pause("Line2/Mix", true));
    clock.advance(Duration::seconds(1));
    assert!(system.charts.resume("Line2/Mix"));

    clock.advance(Duration::seconds(4));

    assert!(system.charts.pause("Line2/Mix", false));
    clock.advance(Duration::seconds(2));
    assert!(system.charts.resume("Line2/Mix"));

    let report = system.charts.status("Line2/Mix").expect("status");
    assert_eq!(report.record.total_pause_duration, std::time::Duration::from_secs(3));
    assert_eq!(report.record.pause_count, 2);
    assert_eq!(report.elapsed_seconds, 7.0);
    assert_eq!(report.active_seconds, 4.0);
}

#[test]
fn test_reset_is_idempotent() {
    let (system, _) = manual_system();
    assert!(system.charts.start("Line1/Fill", None));

    assert!(system.charts.reset("Line1/Fill"));
    assert!(system.charts.reset("Line1/Fill"));
    assert!(system.charts.status("Line1/Fill").is_none());
    assert!(system.charts.current_step("Line1/Fill").is_none());
    assert!(system.charts.step_history("Line1/Fill").is_empty());

    assert!(system.charts.start("Line1/Fill", None), "reset chart starts again");
}

#[test]
fn test_stopped_chart_requires_reset() {
    let (system, _) = manual_system();
    assert!(system.charts.start("Line1/Fill", None));
    assert!(system.charts.stop("Line1/Fill", true));

    assert!(!system.charts.start("Line1/Fill", None));
    assert!(!system.charts.resume("Line1/Fill"));
    assert!(!system.charts.stop("Line1/Fill", true));
    assert!(system.charts.active_charts().is_empty());
    assert_eq!(system.charts.chart_count(), 1);
}

#[test]
fn test_graceful_stop_then_confirm() {
    let (system, clock) = manual_system();
    assert!(system.charts.start("Line3/Drain", None));
    assert!(system.charts.advance_step("Line3/Drain", "Open valve"));

    clock.advance(Duration::seconds(10));
    assert!(system.charts.stop("Line3/Drain", false));
    assert_eq!(
        system.charts.status("Line3/Drain").map(|r| r.record.status),
        Some(ChartStatus::Stopping)
    );
    assert_eq!(system.charts.active_charts(), vec!["Line3/Drain".to_string()]);

    assert!(system.charts.advance_step("Line3/Drain", "Close valve"));
    clock.advance(Duration::seconds(5));
    assert!(system.charts.confirm_stopped("Line3/Drain"));

    let report = system.charts.status("Line3/Drain").expect("status");
    assert_eq!(report.record.status, ChartStatus::Stopped);
    assert_eq!(report.elapsed_seconds, 15.0);
    let steps: Vec<String> = system
        .charts
        .step_history("Line3/Drain")
        .into_iter()
        .map(|entry| entry.step)
        .collect();
    assert_eq!(steps, vec!["initial".to_string(), "Open valve".to_string()]);
    assert_eq!(system.charts.current_step("Line3/Drain").as_deref(), Some("Close valve"));
}

#[test]
fn test_concurrent_start_single_winner() {
    const THREADS: usize = 16;
    let (system, _) = manual_system();
    let barrier = Barrier::new(THREADS);

    let successes = thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                scope.spawn(|| {
                    barrier.wait();
                    system.charts.start("Line9/Race", None)
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|handle| handle.join().expect("start thread panicked"))
            .filter(|started| *started)
            .count()
    });

    assert_eq!(successes, 1);
    assert_eq!(system.charts.chart_count(), 1);
}

#[test]
fn test_concurrent_operations_on_distinct_charts() {
    const CHARTS: usize = 8;
    let (system, _) = manual_system();

    thread::scope(|scope| {
        for i in 0..CHARTS {
            let system = &system;
            scope.spawn(move || {
                let path = format!("Line{i}/Fill");
                assert!(system.charts.start(&path, None));
                assert!(system.charts.pause(&path, true));
                assert!(system.charts.resume(&path));
                assert!(system.charts.stop(&path, true));
            });
        }
    });

    assert_eq!(system.charts.chart_count(), CHARTS);
    assert!(system.charts.active_charts().is_empty());
}

#[test]
fn test_end_to_end_with_wall_clock() {
    let system = ControlSystem::new(Arc::new(SystemClock), ControlSettings::default());
    let path = "Line1/Fill";

    assert!(system.charts.start(path, None));
    thread::sleep(std::time::Duration::from_millis(20));

    assert!(system.charts.pause(path, true));
    assert_eq!(
        system.charts.status(path).map(|r| r.record.status),
        Some(ChartStatus::Paused)
    );
    thread::sleep(std::time::Duration::from_millis(20));

    assert!(system.charts.resume(path));
    assert_eq!(
        system.charts.status(path).map(|r| r.record.status),
        Some(ChartStatus::Running)
    );
    thread::sleep(std::time::Duration::from_millis(10));

    assert!(system.charts.stop(path, false));
    let report = system.charts.status(path).expect("status");
    assert_eq!(report.record.status, ChartStatus::Stopping);

    let record = &report.record;
    let stop_time = record.stop_time.expect("stop time");
    assert!(stop_time > record.start_time);
    let run = (stop_time - record.start_time)
        .to_std()
        .expect("stop after start");
    assert!(record.total_pause_duration <= run);
    assert!(record.total_pause_duration >= std::time::Duration::from_millis(20));

    assert!(system.charts.reset(path));
    assert!(system.charts.status(path).is_none());
}

#[test]
fn test_chart_events_in_order() {
    let (system, _, mut rx) = manual_system_with_events();
    let path = "Line1/Fill";

    assert!(system.charts.start(path, None));
    assert!(system.charts.set_variable(path, "fill_level", json!(80)));
    assert!(system.charts.advance_step(path, "Open valve"));
    assert!(system.charts.pause(path, true));
    assert!(!system.charts.pause(path, true));
    assert!(!system.charts.advance_step(path, "Close valve"), "paused charts hold their step");
    assert!(system.charts.resume(path));
    assert!(system.charts.stop(path, false));
    assert!(system.charts.confirm_stopped(path));
    assert!(system.charts.reset(path));
    assert!(system.charts.reset(path));

    let events = drain_events(&mut rx);
    assert_chart_event_bounds(&events);
    assert_eq!(
        chart_status_sequence(&events),
        vec![
            ChartStatus::Paused,
            ChartStatus::Running,
            ChartStatus::Stopping,
            ChartStatus::Stopped,
        ]
    );
    assert!(has_chart_status(&events, ChartStatus::Stopped));
    assert_eq!(step_change_sequence(&events), vec!["Open valve".to_string()]);
    // start, one step change, four status updates and the reset.
    assert_eq!(events.len(), 7, "set_variable emits no event");
    assert!(matches!(events[1], Event::ChartStepChanged { .. }));
}
