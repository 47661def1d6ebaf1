#![forbid(unsafe_code)]
//! Streaming ingestion of Build Event Protocol binary logs.
//!
//! A build event binary file is a concatenation of frames, each an unsigned
//! LEB128 length followed by that many bytes of a serialized `BuildEvent`.
//! This crate provides:
//! - A frame decoder that tolerates a file that is still being written.
//! - One-shot and tailing byte sources bounded by a single run deadline.
//! - A pure classifier, a summary aggregator, and a line renderer.
//! - A synchronous ingestion driver (and an async one behind the `tokio` feature).

mod cancel;
mod classify;
mod config;
mod decode;
mod error;
mod event;
mod frame;
mod ingest;
pub mod proto;
mod render;
mod source;
mod stats;

pub use cancel::CancelFlag;
pub use classify::{classify, UNKNOWN_LABEL};
pub use config::{IngestConfig, IngestLimits, DEFAULT_DEADLINE, DEFAULT_POLL_INTERVAL};
pub use decode::{MessageDecoder, ProstDecoder};
pub use error::{ConfigError, DecodeError, FrameError, IngestError, SourceError};
pub use event::{AbortReason, ClassifiedEvent, EventPayload, TestStatus};
pub use frame::{encode_varint, Frame, FrameDecoder, FrameOutcome, SourceFinality, MAX_VARINT_LEN};
pub use ingest::{ingest, IngestOutcome, IngestRecord, Ingestor, TerminationReason};
pub use render::{format_signed_duration, render_event, render_summary, LAST_MESSAGE_LINE};
pub use source::{open_file, ByteSource, RunClock, SourceMode, SourceRead, TailingSource};
pub use stats::{StatsAggregator, SummaryState};

#[cfg(feature = "tokio")]
pub use ingest::AsyncIngestor;

#[cfg(feature = "tokio")]
pub use source::{open_file_async, AsyncTailingSource};
