use time::OffsetDateTime;

use crate::proto::BuildEventId;

pub use crate::proto::{AbortReason, TestStatus};

/// Closed set of payload kinds the pipeline understands.
///
/// Every consumer matches on this exhaustively, so a new kind has to be
/// handled everywhere before the crate builds again.
#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    Started {
        uuid: String,
        command: String,
        start_time: Option<OffsetDateTime>,
    },
    Finished {
        exit_code: i32,
        exit_name: String,
        finish_time: Option<OffsetDateTime>,
    },
    Progress,
    Configured {
        target_kind: String,
    },
    Completed {
        success: bool,
    },
    Action {
        success: bool,
        label: String,
        action_type: String,
    },
    TestResult {
        status: TestStatus,
    },
    TestSummary {
        status: TestStatus,
    },
    Aborted {
        reason: AbortReason,
        description: String,
    },
    Configuration {
        mnemonic: String,
        cpu: String,
    },
    BuildToolLogs {
        log_count: usize,
    },
    BuildMetrics {
        actions_executed: Option<i64>,
    },
    /// A well-framed event whose payload kind is not modelled; holds the frame body.
    Unknown(Vec<u8>),
}

impl EventPayload {
    pub fn kind_name(&self) -> &'static str {
        match self {
            EventPayload::Started { .. } => "started",
            EventPayload::Finished { .. } => "finished",
            EventPayload::Progress => "progress",
            EventPayload::Configured { .. } => "configured",
            EventPayload::Completed { .. } => "completed",
            EventPayload::Action { .. } => "action",
            EventPayload::TestResult { .. } => "test_result",
            EventPayload::TestSummary { .. } => "test_summary",
            EventPayload::Aborted { .. } => "aborted",
            EventPayload::Configuration { .. } => "configuration",
            EventPayload::BuildToolLogs { .. } => "build_tool_logs",
            EventPayload::BuildMetrics { .. } => "build_metrics",
            EventPayload::Unknown(_) => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedEvent {
    /// Identity key as decoded; tells apart events sharing a label, such as
    /// test attempts or shards.
    pub id: Option<BuildEventId>,
    pub payload: EventPayload,
    /// Target or test label, or [`crate::UNKNOWN_LABEL`].
    pub label: String,
    /// Set when the event is the last one the producer will write.
    pub terminal: bool,
}
