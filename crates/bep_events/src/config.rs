use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct IngestLimits {
    /// Largest declared frame length accepted before the stream is treated as corrupt.
    pub max_frame_bytes: u64,
    pub read_chunk_bytes: usize,
}

impl Default for IngestLimits {
    fn default() -> Self {
        Self {
            max_frame_bytes: 64 * 1024 * 1024,
            read_chunk_bytes: 8192,
        }
    }
}

/// Settings for a single ingestion run.
///
/// Built once by the caller and moved into the driver; nothing here is shared
/// between runs.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct IngestConfig {
    /// Keep polling for growth after apparent end of data.
    pub follow: bool,
    pub poll_interval: Duration,
    /// Wall-clock bound for the whole run, measured from run start.
    pub deadline: Duration,
    pub limits: IngestLimits,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            follow: false,
            poll_interval: DEFAULT_POLL_INTERVAL,
            deadline: DEFAULT_DEADLINE,
            limits: IngestLimits::default(),
        }
    }
}

impl IngestConfig {
    pub fn one_shot() -> Self {
        Self::default()
    }

    pub fn follow(poll_interval: Duration, deadline: Duration) -> Self {
        Self {
            follow: true,
            poll_interval,
            deadline,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval.is_zero() {
            return Err(ConfigError::ZeroPollInterval);
        }
        if self.limits.read_chunk_bytes == 0 {
            return Err(ConfigError::ZeroReadChunk);
        }
        Ok(())
    }
}
