use prost_types::Timestamp;
use time::OffsetDateTime;

use crate::event::{ClassifiedEvent, EventPayload};
use crate::proto::build_event::Payload;
use crate::proto::build_event_id::Id;
use crate::proto::{BuildEvent, BuildEventId};

/// Label reported when an event carries no target or test identity.
pub const UNKNOWN_LABEL: &str = "<unknown>";

/// Maps a decoded event onto the closed payload set. Never fails.
///
/// `raw` is the frame body the event was decoded from; it is kept only for
/// payload kinds that are not modelled.
pub fn classify(event: BuildEvent, raw: &[u8]) -> ClassifiedEvent {
    let label = target_label(event.id.as_ref());
    let payload = match event.payload {
        Some(payload) => classify_payload(payload),
        None => EventPayload::Unknown(raw.to_vec()),
    };

    ClassifiedEvent {
        id: event.id,
        label,
        payload,
        terminal: event.last_message,
    }
}

fn classify_payload(payload: Payload) -> EventPayload {
    match payload {
        Payload::Started(started) => EventPayload::Started {
            start_time: started.start_time.as_ref().and_then(to_datetime),
            uuid: started.uuid,
            command: started.command,
        },
        Payload::Finished(finished) => {
            let exit = finished.exit_code.unwrap_or_default();
            EventPayload::Finished {
                exit_code: exit.code,
                exit_name: exit.name,
                finish_time: finished.finish_time.as_ref().and_then(to_datetime),
            }
        }
        Payload::Progress(_) => EventPayload::Progress,
        Payload::Configured(configured) => EventPayload::Configured {
            target_kind: configured.target_kind,
        },
        Payload::Completed(completed) => EventPayload::Completed {
            success: completed.success,
        },
        Payload::Action(action) => EventPayload::Action {
            success: action.success,
            label: action.label,
            action_type: action.r#type,
        },
        Payload::TestResult(result) => EventPayload::TestResult {
            status: result.status(),
        },
        Payload::TestSummary(summary) => EventPayload::TestSummary {
            status: summary.overall_status(),
        },
        Payload::Aborted(aborted) => EventPayload::Aborted {
            reason: aborted.reason(),
            description: aborted.description,
        },
        Payload::Configuration(config) => EventPayload::Configuration {
            mnemonic: config.mnemonic,
            cpu: config.cpu,
        },
        Payload::BuildToolLogs(logs) => EventPayload::BuildToolLogs {
            log_count: logs.log.len(),
        },
        Payload::BuildMetrics(metrics) => EventPayload::BuildMetrics {
            actions_executed: metrics.action_summary.map(|s| s.actions_executed),
        },
    }
}

fn target_label(id: Option<&BuildEventId>) -> String {
    let label = match id.and_then(|id| id.id.as_ref()) {
        Some(Id::TargetConfigured(id)) => id.label.as_str(),
        Some(Id::TargetCompleted(id)) => id.label.as_str(),
        Some(Id::TestResult(id)) => id.label.as_str(),
        Some(Id::TestSummary(id)) => id.label.as_str(),
        Some(Id::Progress(_)) | None => UNKNOWN_LABEL,
    };
    label.to_string()
}

fn to_datetime(ts: &Timestamp) -> Option<OffsetDateTime> {
    let nanos = i128::from(ts.seconds) * 1_000_000_000 + i128::from(ts.nanos);
    OffsetDateTime::from_unix_timestamp_nanos(nanos).ok()
}
