use time::Duration;

use crate::event::{ClassifiedEvent, EventPayload, TestStatus};
use crate::stats::SummaryState;

/// Printed after the line of an event that carries the terminal flag.
pub const LAST_MESSAGE_LINE: &str = "[Last message received]";

/// Human-readable line for one event, if the event kind has one.
pub fn render_event(event: &ClassifiedEvent) -> Option<String> {
    let label = &event.label;
    match &event.payload {
        EventPayload::Started { uuid, command, .. } => {
            Some(format!("▶ Build started: {command} (UUID: {uuid})"))
        }
        EventPayload::Finished { exit_code, .. } => {
            Some(format!("■ Build finished: exit code {exit_code}"))
        }
        EventPayload::Progress => None,
        EventPayload::Configured { .. } => Some(format!("  ◇ Target configured: {label}")),
        EventPayload::Completed { success: true } => {
            Some(format!("  ✓ Target completed: {label}"))
        }
        EventPayload::Completed { success: false } => Some(format!("  ✗ Target failed: {label}")),
        EventPayload::Action { success: true, .. } => None,
        EventPayload::Action {
            success: false,
            label,
            action_type,
        } => Some(format!("  ✗ Action failed: {label} ({action_type})")),
        EventPayload::TestResult { status } => Some(format!(
            "  ⚡ Test result: {label} - {}",
            status.name()
        )),
        EventPayload::TestSummary {
            status: TestStatus::Passed,
        } => Some(format!("  ✓ Test passed: {label}")),
        EventPayload::TestSummary { status } => Some(format!(
            "  ✗ Test failed: {label} ({})",
            status.name()
        )),
        EventPayload::Aborted {
            reason,
            description,
        } => Some(format!("  ⚠ Aborted: {} - {description}", reason.name())),
        EventPayload::Configuration { mnemonic, cpu } => {
            Some(format!("  ⚙ Configuration: {mnemonic} (cpu: {cpu})"))
        }
        EventPayload::BuildToolLogs { .. } => Some("  📋 Build tool logs available".to_string()),
        EventPayload::BuildMetrics { actions_executed } => {
            actions_executed.map(|n| format!("  📊 Metrics: {n} actions"))
        }
        EventPayload::Unknown(_) => None,
    }
}

/// Rounds to the millisecond and keeps the sign, e.g. `2.500s` or `-0.040s`.
pub fn format_signed_duration(duration: Duration) -> String {
    let micros = duration.whole_microseconds();
    let millis = if micros >= 0 {
        (micros + 500) / 1000
    } else {
        (micros - 500) / 1000
    };
    let sign = if millis < 0 { "-" } else { "" };
    let millis = millis.abs();
    format!("{sign}{}.{:03}s", millis / 1000, millis % 1000)
}

/// The closing statistics block, one entry per printed line.
pub fn render_summary(summary: &SummaryState, total_events: u64) -> Vec<String> {
    let mut lines = vec![
        "=== Build Statistics ===".to_string(),
        format!("Total events: {total_events}"),
    ];
    lines.extend(summary.to_string().lines().map(str::to_string));
    lines
}
