use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

use tracing::{debug, info};

use super::{ByteSource, RunClock, SourceMode, SourceRead};
use crate::cancel::CancelFlag;
use crate::config::IngestConfig;
use crate::error::SourceError;

/// Reads a byte stream in one-shot or follow mode.
///
/// In follow mode a zero-length read reports [`SourceRead::WouldBlock`]; the
/// caller decides how long to keep retrying.
pub struct TailingSource<R: Read> {
    reader: R,
    mode: SourceMode,
    chunk_bytes: usize,
    closed: bool,
}

impl<R: Read> TailingSource<R> {
    pub fn new(reader: R, mode: SourceMode, chunk_bytes: usize) -> Self {
        Self {
            reader,
            mode,
            chunk_bytes: chunk_bytes.max(1),
            closed: false,
        }
    }

    pub fn from_config(reader: R, config: &IngestConfig) -> Self {
        Self::new(
            reader,
            SourceMode::from_follow(config.follow),
            config.limits.read_chunk_bytes,
        )
    }

    pub fn mode(&self) -> SourceMode {
        self.mode
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read> ByteSource for TailingSource<R> {
    fn try_read_more(&mut self, buf: &mut Vec<u8>) -> Result<SourceRead, SourceError> {
        if self.closed {
            return Ok(SourceRead::Closed);
        }

        let start = buf.len();
        buf.resize(start + self.chunk_bytes, 0);
        let read = loop {
            match self.reader.read(&mut buf[start..]) {
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                other => break other,
            }
        };

        match read {
            Ok(0) => {
                buf.truncate(start);
                match self.mode {
                    SourceMode::OneShot => {
                        self.closed = true;
                        Ok(SourceRead::Closed)
                    }
                    SourceMode::Follow => Ok(SourceRead::WouldBlock),
                }
            }
            Ok(n) => {
                buf.truncate(start + n);
                Ok(SourceRead::Bytes(n))
            }
            Err(err) if err.kind() == ErrorKind::WouldBlock => {
                buf.truncate(start);
                Ok(SourceRead::WouldBlock)
            }
            Err(err) => {
                buf.truncate(start);
                Err(SourceError::Io(err))
            }
        }
    }
}

/// Opens `path` for ingestion.
///
/// In follow mode a missing file is polled for until it appears, the run
/// deadline passes or `cancel` is raised.
pub fn open_file(
    path: impl AsRef<Path>,
    config: &IngestConfig,
    clock: &RunClock,
    cancel: Option<&CancelFlag>,
) -> Result<TailingSource<File>, SourceError> {
    let path = path.as_ref();
    loop {
        match File::open(path) {
            Ok(file) => {
                debug!(path = %path.display(), follow = config.follow, "opened build event file");
                return Ok(TailingSource::from_config(file, config));
            }
            Err(err) if config.follow && err.kind() == ErrorKind::NotFound => {
                if cancel.is_some_and(CancelFlag::is_cancelled) {
                    return Err(SourceError::Cancelled {
                        path: path.to_path_buf(),
                    });
                }
                if clock.deadline_elapsed() {
                    return Err(SourceError::FileWaitTimeout {
                        path: path.to_path_buf(),
                        waited: clock.elapsed(),
                    });
                }
                info!(path = %path.display(), "waiting for build event file to be created");
                std::thread::sleep(config.poll_interval);
            }
            Err(err) => return Err(SourceError::Io(err)),
        }
    }
}
