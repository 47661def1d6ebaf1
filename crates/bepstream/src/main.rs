mod cli;
mod error;
mod logging;

use std::io::{self, Write};
use std::process::ExitCode;

use bep_events::{
    open_file, render_summary, CancelFlag, Ingestor, ProstDecoder, RunClock, SourceError,
    TerminationReason, LAST_MESSAGE_LINE,
};
use clap::Parser;
use tracing::info;

use crate::cli::Cli;
use crate::error::Error;

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    match run(cli) {
        Ok(TerminationReason::Error) => ExitCode::FAILURE,
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<TerminationReason, Error> {
    let config = cli.ingest_config()?;
    config.validate()?;

    let cancel = CancelFlag::new();
    let handler_flag = cancel.clone();
    ctrlc::set_handler(move || handler_flag.cancel())?;

    let clock = RunClock::start(config.deadline);
    let source = match open_file(&cli.file, &config, &clock, Some(&cancel)) {
        Ok(source) => source,
        Err(SourceError::Cancelled { path }) => {
            info!(path = %path.display(), "interrupted before the file appeared");
            return Ok(TerminationReason::Cancelled);
        }
        Err(err) => return Err(err.into()),
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "=== BEP Stream Summary ===")?;
    writeln!(out)?;

    let mut ingestor = Ingestor::new(source, ProstDecoder::new(), config)
        .with_clock(clock)
        .with_cancel(cancel);
    for record in ingestor.by_ref() {
        if let Some(line) = &record.line {
            writeln!(out, "{line}")?;
        }
        if record.event.terminal {
            writeln!(out, "{LAST_MESSAGE_LINE}")?;
        }
    }
    let outcome = ingestor.finish();

    writeln!(out)?;
    for line in render_summary(&outcome.summary, outcome.total_events) {
        writeln!(out, "{line}")?;
    }
    out.flush()?;

    if let Some(err) = &outcome.error {
        eprintln!("Error: {err}");
    }
    Ok(outcome.reason)
}
