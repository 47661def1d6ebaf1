use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Framing violations. Any of these ends the run.
#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum FrameError {
    #[error("length prefix exceeds {max_len} bytes")]
    Overlong { max_len: usize },
    #[error("length prefix overflows u64")]
    LengthOverflow,
    #[error("stream ended inside a length prefix ({available} bytes available)")]
    TruncatedLength { available: usize },
    #[error("stream ended inside a frame body (declared {declared} bytes, {available} available)")]
    TruncatedBody { declared: u64, available: usize },
    #[error("declared frame length {declared} exceeds limit of {max_frame_bytes} bytes")]
    FrameTooLarge { declared: u64, max_frame_bytes: u64 },
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("I/O error while reading build event stream: {0}")]
    Io(#[from] std::io::Error),
    #[error("timed out after {waited:?} waiting for `{path}` to be created")]
    FileWaitTimeout { path: PathBuf, waited: Duration },
    #[error("cancelled while waiting for `{path}` to be created")]
    Cancelled { path: PathBuf },
}

#[derive(Debug, Error)]
#[error("failed to decode build event: {source}")]
pub struct DecodeError {
    #[from]
    source: prost::DecodeError,
}

#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum ConfigError {
    #[error("poll interval must be greater than zero")]
    ZeroPollInterval,
    #[error("read chunk size must be greater than zero")]
    ZeroReadChunk,
}

/// Fatal outcome of an ingestion run.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("corrupt frame at offset {offset}: {source}")]
    Frame {
        offset: u64,
        #[source]
        source: FrameError,
    },
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("undecodable frame at offset {offset}: {source}")]
    Decode {
        offset: u64,
        #[source]
        source: DecodeError,
    },
}
