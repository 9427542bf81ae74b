//! Custom assertion helpers for event sequences.

use bc_protocol::{ChartStatus, Event, ExecutionStatus};

/// Whether the events contain a ChartStatusUpdate with `status`.
#[allow(dead_code)]
pub fn has_chart_status(events: &[Event], status: ChartStatus) -> bool {
    events.iter().any(|e| {
        matches!(
            e,
            Event::ChartStatusUpdate { status: s, .. } if *s == status
        )
    })
}

/// Whether the events contain an ExecutionFinished with `status`.
#[allow(dead_code)]
pub fn has_execution_finished(events: &[Event], status: ExecutionStatus) -> bool {
    events.iter().any(|e| {
        matches!(
            e,
            Event::ExecutionFinished { status: s, .. } if *s == status
        )
    })
}

/// Chart statuses in the order they were reported.
#[allow(dead_code)]
pub fn chart_status_sequence(events: &[Event]) -> Vec<ChartStatus> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::ChartStatusUpdate { status, .. } => Some(*status),
            _ => None,
        })
        .collect()
}

/// Steps announced by ChartStepChanged events, in order.
#[allow(dead_code)]
pub fn step_change_sequence(events: &[Event]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::ChartStepChanged { step, .. } => Some(step.clone()),
            _ => None,
        })
        .collect()
}

/// Assert that a chart's events start with ChartStarted and end with
/// ChartReset.
#[allow(dead_code)]
pub fn assert_chart_event_bounds(events: &[Event]) {
    assert!(
        matches!(events.first(), Some(Event::ChartStarted { .. })),
        "First event should be ChartStarted, got: {:?}",
        events.first()
    );
    assert!(
        matches!(events.last(), Some(Event::ChartReset { .. })),
        "Last event should be ChartReset, got: {:?}",
        events.last()
    );
}
