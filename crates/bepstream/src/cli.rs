use std::path::{Path, PathBuf};
use std::time::Duration;

use bep_events::IngestConfig;
use clap::{ArgAction, Parser};
use serde::Deserialize;

use crate::error::Error;

const AFTER_HELP: &str = "\
Run bazel with: bazel build --build_event_binary_file=/tmp/bep.bin //...

For streaming mode, start this tool first with -f, then run bazel:
  Terminal 1: bepstream -f /tmp/bep.bin
  Terminal 2: bazel build --build_event_binary_file=/tmp/bep.bin //...";

#[derive(Debug, Parser)]
#[command(name = "bepstream")]
#[command(about = "Summarize a Bazel build event binary file")]
#[command(after_help = AFTER_HELP)]
pub struct Cli {
    /// Follow mode: wait for new data as the file is being written.
    #[arg(short = 'f', long)]
    pub follow: bool,

    /// Poll interval when following (default 100ms).
    #[arg(long = "poll", value_name = "DURATION", value_parser = parse_duration)]
    pub poll: Option<Duration>,

    /// Deadline for follow mode, measured from start (default 5m).
    #[arg(long, value_name = "DURATION", value_parser = parse_duration)]
    pub timeout: Option<Duration>,

    /// TOML file with defaults; flags given on the command line win.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Raise log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Build event binary file to read.
    pub file: PathBuf,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    follow: Option<bool>,
    poll_interval_ms: Option<u64>,
    deadline_ms: Option<u64>,
    max_frame_bytes: Option<u64>,
    read_chunk_bytes: Option<usize>,
}

impl ConfigFile {
    fn load(path: &Path) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn apply(&self, config: &mut IngestConfig) {
        if let Some(follow) = self.follow {
            config.follow = follow;
        }
        if let Some(ms) = self.poll_interval_ms {
            config.poll_interval = Duration::from_millis(ms);
        }
        if let Some(ms) = self.deadline_ms {
            config.deadline = Duration::from_millis(ms);
        }
        if let Some(bytes) = self.max_frame_bytes {
            config.limits.max_frame_bytes = bytes;
        }
        if let Some(bytes) = self.read_chunk_bytes {
            config.limits.read_chunk_bytes = bytes;
        }
    }
}

impl Cli {
    /// Defaults, then the config file, then explicit flags.
    pub fn ingest_config(&self) -> Result<IngestConfig, Error> {
        let mut config = IngestConfig::default();
        if let Some(path) = &self.config {
            ConfigFile::load(path)?.apply(&mut config);
        }
        if self.follow {
            config.follow = true;
        }
        if let Some(poll) = self.poll {
            config.poll_interval = poll;
        }
        if let Some(timeout) = self.timeout {
            config.deadline = timeout;
        }
        Ok(config)
    }
}

/// Parses `250ms`, `10s`, `5m` or `1h`.
fn parse_duration(raw: &str) -> Result<Duration, String> {
    let raw = raw.trim();
    let split = raw
        .find(|ch: char| !ch.is_ascii_digit())
        .ok_or_else(|| format!("missing unit in `{raw}` (use ms, s, m or h)"))?;
    let (digits, unit) = raw.split_at(split);
    let value: u64 = digits
        .parse()
        .map_err(|_| format!("invalid duration `{raw}`"))?;
    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        "m" => Ok(Duration::from_secs(value.saturating_mul(60))),
        "h" => Ok(Duration::from_secs(value.saturating_mul(3600))),
        other => Err(format!("unknown duration unit `{other}` (use ms, s, m or h)")),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn parses_duration_units() {
        assert_eq!(parse_duration("100ms"), Ok(Duration::from_millis(100)));
        assert_eq!(parse_duration("30s"), Ok(Duration::from_secs(30)));
        assert_eq!(parse_duration("5m"), Ok(Duration::from_secs(300)));
        assert_eq!(parse_duration("2h"), Ok(Duration::from_secs(7200)));
        assert!(parse_duration("10").is_err());
        assert!(parse_duration("ms").is_err());
        assert!(parse_duration("3d").is_err());
    }

    #[test]
    fn flags_fill_config() {
        let cli = Cli::try_parse_from([
            "bepstream",
            "-f",
            "--poll",
            "50ms",
            "--timeout",
            "1m",
            "/tmp/bep.bin",
        ])
        .unwrap();
        let config = cli.ingest_config().unwrap();
        assert!(config.follow);
        assert_eq!(config.poll_interval, Duration::from_millis(50));
        assert_eq!(config.deadline, Duration::from_secs(60));
        assert_eq!(cli.file, PathBuf::from("/tmp/bep.bin"));
    }

    #[test]
    fn file_is_required() {
        assert!(Cli::try_parse_from(["bepstream"]).is_err());
    }

    #[test]
    fn flags_override_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "follow = true\npoll_interval_ms = 10\ndeadline_ms = 2000\nmax_frame_bytes = 4096"
        )
        .unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let cli = Cli::try_parse_from(["bepstream", "--config", &path, "--poll", "1s", "x.bin"])
            .unwrap();
        let config = cli.ingest_config().unwrap();
        assert!(config.follow);
        assert_eq!(config.poll_interval, Duration::from_secs(1));
        assert_eq!(config.deadline, Duration::from_millis(2000));
        assert_eq!(config.limits.max_frame_bytes, 4096);
    }

    #[test]
    fn unknown_config_keys_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "folow = true").unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let cli = Cli::try_parse_from(["bepstream", "--config", &path, "x.bin"]).unwrap();
        assert!(matches!(
            cli.ingest_config(),
            Err(Error::ConfigParse { .. })
        ));
    }
}
