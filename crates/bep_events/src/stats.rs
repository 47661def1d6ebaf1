use std::fmt;

use time::{Duration, OffsetDateTime};

use crate::event::{ClassifiedEvent, EventPayload, TestStatus};
use crate::render::format_signed_duration;

/// Running totals for one ingestion run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SummaryState {
    pub build_started: bool,
    pub build_finished: bool,
    pub start_time: Option<OffsetDateTime>,
    pub end_time: Option<OffsetDateTime>,
    pub uuid: Option<String>,
    pub command: Option<String>,
    pub exit_code: i32,
    pub targets_built: u64,
    pub targets_failed: u64,
    pub tests_run: u64,
    pub tests_passed: u64,
    pub tests_failed: u64,
    pub actions_executed: u64,
    pub progress_events: u64,
}

impl SummaryState {
    /// `end_time - start_time` when both were observed. May be negative.
    pub fn duration(&self) -> Option<Duration> {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        }
    }
}

impl fmt::Display for SummaryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(uuid) = self.uuid.as_deref().filter(|s| !s.is_empty()) {
            writeln!(f, "Build UUID: {uuid}")?;
        }
        if let Some(command) = self.command.as_deref().filter(|s| !s.is_empty()) {
            writeln!(f, "Command: {command}")?;
        }
        if let Some(duration) = self.duration() {
            writeln!(f, "Duration: {}", format_signed_duration(duration))?;
        }
        writeln!(f, "Exit code: {}", self.exit_code)?;
        writeln!(f, "Actions executed: {}", self.actions_executed)?;
        writeln!(
            f,
            "Targets built: {} (failed: {})",
            self.targets_built, self.targets_failed
        )?;
        if self.tests_run > 0 {
            writeln!(
                f,
                "Tests: {} passed, {} failed (total: {})",
                self.tests_passed, self.tests_failed, self.tests_run
            )?;
        }
        write!(f, "Progress events: {}", self.progress_events)
    }
}

/// Folds classified events into a [`SummaryState`], one update per event.
#[derive(Debug, Default)]
pub struct StatsAggregator {
    state: SummaryState,
}

impl StatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, event: &ClassifiedEvent) {
        let state = &mut self.state;
        match &event.payload {
            EventPayload::Started {
                uuid,
                command,
                start_time,
            } => {
                state.build_started = true;
                state.uuid = Some(uuid.clone());
                state.command = Some(command.clone());
                state.start_time = *start_time;
            }
            EventPayload::Finished {
                exit_code,
                finish_time,
                ..
            } => {
                state.build_finished = true;
                state.exit_code = *exit_code;
                state.end_time = *finish_time;
            }
            EventPayload::Progress => state.progress_events += 1,
            EventPayload::Completed { success } => {
                state.targets_built += 1;
                if !success {
                    state.targets_failed += 1;
                }
            }
            EventPayload::Action { .. } => state.actions_executed += 1,
            EventPayload::TestSummary { status } => {
                state.tests_run += 1;
                if *status == TestStatus::Passed {
                    state.tests_passed += 1;
                } else {
                    state.tests_failed += 1;
                }
            }
            EventPayload::TestResult { .. }
            | EventPayload::Configured { .. }
            | EventPayload::Aborted { .. }
            | EventPayload::Configuration { .. }
            | EventPayload::BuildToolLogs { .. }
            | EventPayload::BuildMetrics { .. }
            | EventPayload::Unknown(_) => {}
        }
    }

    pub fn snapshot(&self) -> SummaryState {
        self.state.clone()
    }

    pub fn into_snapshot(self) -> SummaryState {
        self.state
    }
}
