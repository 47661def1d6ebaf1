use std::time::{Duration, Instant};

use crate::error::SourceError;

mod sync;

#[cfg(feature = "tokio")]
mod tokio;

pub use sync::{open_file, TailingSource};

#[cfg(feature = "tokio")]
pub use self::tokio::{open_file_async, AsyncTailingSource};

/// Result of asking a source for more bytes.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum SourceRead {
    /// `n` bytes were appended to the buffer.
    Bytes(usize),
    /// Nothing available right now; the source may still grow.
    WouldBlock,
    /// The source will never produce more bytes.
    Closed,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum SourceMode {
    /// End of data is final.
    OneShot,
    /// End of data means "not written yet".
    Follow,
}

impl SourceMode {
    pub fn from_follow(follow: bool) -> Self {
        if follow {
            SourceMode::Follow
        } else {
            SourceMode::OneShot
        }
    }
}

/// Something the ingestion loop can pull bytes from.
pub trait ByteSource {
    /// Appends whatever is currently available to `buf`.
    fn try_read_more(&mut self, buf: &mut Vec<u8>) -> Result<SourceRead, SourceError>;
}

/// Wall-clock bound for one run, anchored when the run starts.
#[derive(Debug, Clone, Copy)]
pub struct RunClock {
    started: Instant,
    deadline: Duration,
}

impl RunClock {
    pub fn start(deadline: Duration) -> Self {
        Self {
            started: Instant::now(),
            deadline,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    pub fn deadline_elapsed(&self) -> bool {
        self.elapsed() >= self.deadline
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_deadline_is_already_elapsed() {
        assert!(RunClock::start(Duration::ZERO).deadline_elapsed());
        assert!(!RunClock::start(Duration::from_secs(60)).deadline_elapsed());
    }

    #[test]
    fn mode_follows_flag() {
        assert_eq!(SourceMode::from_follow(true), SourceMode::Follow);
        assert_eq!(SourceMode::from_follow(false), SourceMode::OneShot);
    }
}
