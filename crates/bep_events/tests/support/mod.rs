#![allow(dead_code)]

use std::collections::VecDeque;

use bep_events::proto::build_event::Payload;
use bep_events::proto::build_event_id::{Id, TargetCompletedId, TestSummaryId};
use bep_events::proto::{
    BuildEvent, BuildEventId, BuildFinished, BuildStarted, ExitCode, Progress, TargetComplete,
    TestSummary,
};
use bep_events::{ByteSource, SourceError, SourceRead, TestStatus};
use prost::Message;
use prost_types::Timestamp;

pub fn started(uuid: &str, command: &str, seconds: Option<i64>) -> BuildEvent {
    BuildEvent {
        payload: Some(Payload::Started(BuildStarted {
            uuid: uuid.to_string(),
            command: command.to_string(),
            start_time: seconds.map(|seconds| Timestamp { seconds, nanos: 0 }),
            ..BuildStarted::default()
        })),
        ..BuildEvent::default()
    }
}

pub fn finished(code: i32, seconds: Option<i64>) -> BuildEvent {
    BuildEvent {
        payload: Some(Payload::Finished(BuildFinished {
            exit_code: Some(ExitCode {
                name: if code == 0 { "SUCCESS" } else { "BUILD_FAILURE" }.to_string(),
                code,
            }),
            finish_time: seconds.map(|seconds| Timestamp { seconds, nanos: 0 }),
            ..BuildFinished::default()
        })),
        ..BuildEvent::default()
    }
}

pub fn progress() -> BuildEvent {
    BuildEvent {
        payload: Some(Payload::Progress(Progress::default())),
        ..BuildEvent::default()
    }
}

pub fn completed(label: &str, success: bool) -> BuildEvent {
    BuildEvent {
        id: Some(BuildEventId {
            id: Some(Id::TargetCompleted(TargetCompletedId {
                label: label.to_string(),
                aspect: String::new(),
            })),
        }),
        payload: Some(Payload::Completed(TargetComplete { success })),
        ..BuildEvent::default()
    }
}

pub fn test_summary(label: &str, status: TestStatus) -> BuildEvent {
    BuildEvent {
        id: Some(BuildEventId {
            id: Some(Id::TestSummary(TestSummaryId {
                label: label.to_string(),
            })),
        }),
        payload: Some(Payload::TestSummary(TestSummary {
            total_run_count: 1,
            overall_status: status as i32,
        })),
        ..BuildEvent::default()
    }
}

pub fn last() -> BuildEvent {
    BuildEvent {
        last_message: true,
        ..BuildEvent::default()
    }
}

pub fn encode_all(events: &[BuildEvent]) -> Vec<u8> {
    let mut out = Vec::new();
    for event in events {
        out.extend(event.encode_length_delimited_to_vec());
    }
    out
}

/// Replays a fixed script of reads, including `WouldBlock` gaps.
pub struct ScriptedSource {
    script: VecDeque<Option<Vec<u8>>>,
}

impl ScriptedSource {
    /// Delivers `bytes` in `chunk`-sized pieces with a `WouldBlock` after each.
    pub fn chunked(bytes: &[u8], chunk: usize) -> Self {
        let mut script = VecDeque::new();
        for piece in bytes.chunks(chunk) {
            script.push_back(Some(piece.to_vec()));
            script.push_back(None);
        }
        Self { script }
    }
}

impl ByteSource for ScriptedSource {
    fn try_read_more(&mut self, buf: &mut Vec<u8>) -> Result<SourceRead, SourceError> {
        match self.script.pop_front() {
            Some(Some(bytes)) => {
                buf.extend_from_slice(&bytes);
                Ok(SourceRead::Bytes(bytes.len()))
            }
            Some(None) => Ok(SourceRead::WouldBlock),
            None => Ok(SourceRead::Closed),
        }
    }
}
