use std::io::ErrorKind;
use std::path::Path;

use ::tokio::fs::File;
use ::tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, info};

use super::{RunClock, SourceMode, SourceRead};
use crate::cancel::CancelFlag;
use crate::config::IngestConfig;
use crate::error::SourceError;

/// Async counterpart of [`super::TailingSource`].
pub struct AsyncTailingSource<R: AsyncRead + Unpin> {
    reader: R,
    mode: SourceMode,
    chunk_bytes: usize,
    closed: bool,
}

impl<R: AsyncRead + Unpin> AsyncTailingSource<R> {
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

    pub async fn try_read_more(&mut self, buf: &mut Vec<u8>) -> Result<SourceRead, SourceError> {
        if self.closed {
            return Ok(SourceRead::Closed);
        }

        let start = buf.len();
        buf.resize(start + self.chunk_bytes, 0);
        let read = loop {
            match self.reader.read(&mut buf[start..]).await {
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

/// Async counterpart of [`super::open_file`].
pub async fn open_file_async(
    path: impl AsRef<Path>,
    config: &IngestConfig,
    clock: &RunClock,
    cancel: Option<&CancelFlag>,
) -> Result<AsyncTailingSource<File>, SourceError> {
    let path = path.as_ref();
    loop {
        match File::open(path).await {
            Ok(file) => {
                debug!(path = %path.display(), follow = config.follow, "opened build event file");
                return Ok(AsyncTailingSource::from_config(file, config));
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
                ::tokio::time::sleep(config.poll_interval).await;
            }
            Err(err) => return Err(SourceError::Io(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::{self, Cursor};
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use std::time::Duration;

    use ::tokio::io::ReadBuf;

    use super::*;

    struct NotReady;

    impl AsyncRead for NotReady {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            Poll::Ready(Err(io::Error::from(ErrorKind::WouldBlock)))
        }
    }

    #[::tokio::test]
    async fn one_shot_closes_at_end() {
        let mut source =
            AsyncTailingSource::new(Cursor::new(b"abc".to_vec()), SourceMode::OneShot, 2);
        let mut buf = Vec::new();
        assert_eq!(
            source.try_read_more(&mut buf).await.unwrap(),
            SourceRead::Bytes(2)
        );
        assert_eq!(
            source.try_read_more(&mut buf).await.unwrap(),
            SourceRead::Bytes(1)
        );
        assert_eq!(
            source.try_read_more(&mut buf).await.unwrap(),
            SourceRead::Closed
        );
        assert_eq!(buf, b"abc");
    }

    #[::tokio::test]
    async fn follow_reports_would_block_at_end() {
        let mut source = AsyncTailingSource::new(Cursor::new(Vec::new()), SourceMode::Follow, 4);
        let mut buf = Vec::new();
        assert_eq!(
            source.try_read_more(&mut buf).await.unwrap(),
            SourceRead::WouldBlock
        );
        assert!(buf.is_empty());
    }

    #[::tokio::test]
    async fn would_block_error_is_not_fatal() {
        let mut source = AsyncTailingSource::new(NotReady, SourceMode::OneShot, 4);
        let mut buf = vec![b'x'];
        assert_eq!(
            source.try_read_more(&mut buf).await.unwrap(),
            SourceRead::WouldBlock
        );
        assert_eq!(buf, b"x");
    }

    #[::tokio::test]
    async fn cancel_interrupts_wait_for_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = IngestConfig::follow(Duration::from_millis(5), Duration::from_secs(60));
        let clock = RunClock::start(config.deadline);
        let cancel = CancelFlag::new();
        cancel.cancel();

        let err = open_file_async(dir.path().join("absent.bin"), &config, &clock, Some(&cancel))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, SourceError::Cancelled { .. }));
        assert!(clock.elapsed() < Duration::from_secs(5));
    }
}
