use std::time::Duration;

use tracing::{debug, info, warn};

use crate::cancel::CancelFlag;
use crate::classify::classify;
use crate::config::IngestConfig;
use crate::decode::MessageDecoder;
use crate::error::IngestError;
use crate::event::ClassifiedEvent;
use crate::frame::{Frame, FrameDecoder, FrameOutcome, SourceFinality};
use crate::render::render_event;
use crate::source::{ByteSource, RunClock, SourceRead};
use crate::stats::{StatsAggregator, SummaryState};

/// Why a run stopped.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum TerminationReason {
    /// An event carried the terminal flag.
    ExplicitLast,
    /// Follow mode gave up waiting at the run deadline.
    Timeout,
    /// The source ended cleanly on a frame boundary.
    EndOfStream,
    /// A [`CancelFlag`] was raised while waiting for more data.
    Cancelled,
    /// Corrupt framing, an undecodable body or a read failure.
    Error,
}

impl TerminationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            TerminationReason::ExplicitLast => "explicit_last",
            TerminationReason::Timeout => "timeout",
            TerminationReason::EndOfStream => "end_of_stream",
            TerminationReason::Cancelled => "cancelled",
            TerminationReason::Error => "error",
        }
    }
}

/// One processed event together with its rendered line.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestRecord {
    /// 1-based position of the event in the stream.
    pub sequence: u64,
    /// Byte offset of the event's frame.
    pub offset: u64,
    pub event: ClassifiedEvent,
    pub line: Option<String>,
}

/// Final result of a run, produced exactly once.
#[derive(Debug)]
pub struct IngestOutcome {
    pub summary: SummaryState,
    pub reason: TerminationReason,
    /// Present iff `reason` is [`TerminationReason::Error`].
    pub error: Option<IngestError>,
    pub total_events: u64,
    pub bytes_consumed: u64,
    /// Bytes read but not part of a complete frame when the run ended.
    pub pending_bytes: usize,
}

enum Step {
    Record(IngestRecord),
    NeedBytes,
    Done,
}

/// Everything between the byte source and the caller; shared by the sync and
/// async drivers so the two only differ in how they read and sleep.
struct Pipeline<D> {
    frames: FrameDecoder,
    decoder: D,
    stats: StatsAggregator,
    finality: SourceFinality,
    total_events: u64,
    termination: Option<(TerminationReason, Option<IngestError>)>,
}

impl<D: MessageDecoder> Pipeline<D> {
    fn new(decoder: D, config: &IngestConfig) -> Self {
        Self {
            frames: FrameDecoder::new(config.limits.max_frame_bytes),
            decoder,
            stats: StatsAggregator::new(),
            finality: SourceFinality::Growing,
            total_events: 0,
            termination: None,
        }
    }

    fn terminate(&mut self, reason: TerminationReason, error: Option<IngestError>) {
        if self.termination.is_some() {
            return;
        }
        info!(
            reason = reason.as_str(),
            events = self.total_events,
            bytes = self.frames.cursor(),
            pending = self.frames.pending(),
            "build event stream terminated"
        );
        self.termination = Some((reason, error));
    }

    fn step(&mut self) -> Step {
        if self.termination.is_some() {
            return Step::Done;
        }
        match self.frames.decode_next(self.finality) {
            FrameOutcome::Frame(frame) => self.process(frame),
            FrameOutcome::Incomplete => Step::NeedBytes,
            FrameOutcome::NoMoreFrames => {
                self.terminate(TerminationReason::EndOfStream, None);
                Step::Done
            }
            FrameOutcome::Corrupt(source) => {
                let offset = self.frames.cursor();
                warn!(offset, error = %source, "corrupt build event frame");
                self.terminate(
                    TerminationReason::Error,
                    Some(IngestError::Frame { offset, source }),
                );
                Step::Done
            }
        }
    }

    fn process(&mut self, frame: Frame) -> Step {
        let offset = frame.offset();
        let message = match self.decoder.decode(frame.body()) {
            Ok(message) => message,
            Err(source) => {
                warn!(offset, error = %source, "failed to decode build event");
                self.terminate(
                    TerminationReason::Error,
                    Some(IngestError::Decode { offset, source }),
                );
                return Step::Done;
            }
        };

        let event = classify(message, frame.body());
        self.stats.update(&event);
        self.total_events += 1;
        let line = render_event(&event);
        debug!(
            offset,
            kind = event.payload.kind_name(),
            terminal = event.terminal,
            "processed build event"
        );

        if event.terminal {
            self.terminate(TerminationReason::ExplicitLast, None);
        }

        Step::Record(IngestRecord {
            sequence: self.total_events,
            offset,
            event,
            line,
        })
    }

    fn source_closed(&mut self) {
        self.finality = SourceFinality::Final;
    }

    fn source_failed(&mut self, error: IngestError) {
        warn!(error = %error, "build event source failed");
        self.terminate(TerminationReason::Error, Some(error));
    }

    /// Decides whether to keep waiting for the stream to grow. Returns the
    /// sleep to take, or `None` after recording why the run stops.
    fn drain(
        &mut self,
        clock: &RunClock,
        cancel: Option<&CancelFlag>,
        poll: Duration,
    ) -> Option<Duration> {
        if cancel.is_some_and(CancelFlag::is_cancelled) {
            self.terminate(TerminationReason::Cancelled, None);
            return None;
        }
        if clock.deadline_elapsed() {
            if self.frames.pending() > 0 {
                warn!(
                    pending = self.frames.pending(),
                    offset = self.frames.cursor(),
                    "deadline reached with a partial frame buffered"
                );
            }
            self.terminate(TerminationReason::Timeout, None);
            return None;
        }
        debug!(elapsed = ?clock.elapsed(), "waiting for build event stream to grow");
        Some(poll)
    }

    fn into_outcome(self) -> IngestOutcome {
        let (reason, error) = self
            .termination
            .unwrap_or((TerminationReason::EndOfStream, None));
        IngestOutcome {
            summary: self.stats.into_snapshot(),
            reason,
            error,
            total_events: self.total_events,
            bytes_consumed: self.frames.cursor(),
            pending_bytes: self.frames.pending(),
        }
    }
}

/// Drives a [`ByteSource`] to termination, yielding one record per event.
///
/// The iterator is lazy and fused. Call [`Ingestor::finish`] to get the
/// summary; it drains whatever is left first.
pub struct Ingestor<S: ByteSource, D: MessageDecoder> {
    source: S,
    pipeline: Pipeline<D>,
    poll_interval: Duration,
    clock: RunClock,
    cancel: Option<CancelFlag>,
}

impl<S: ByteSource, D: MessageDecoder> Ingestor<S, D> {
    pub fn new(source: S, decoder: D, config: IngestConfig) -> Self {
        Self {
            source,
            pipeline: Pipeline::new(decoder, &config),
            poll_interval: config.poll_interval,
            clock: RunClock::start(config.deadline),
            cancel: None,
        }
    }

    /// Uses a clock started earlier, e.g. before waiting for the file to exist.
    pub fn with_clock(mut self, clock: RunClock) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Summary so far; does not advance the stream.
    pub fn snapshot(&self) -> SummaryState {
        self.pipeline.stats.snapshot()
    }

    pub fn finish(mut self) -> IngestOutcome {
        for _ in self.by_ref() {}
        self.pipeline.into_outcome()
    }
}

impl<S: ByteSource, D: MessageDecoder> Iterator for Ingestor<S, D> {
    type Item = IngestRecord;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.pipeline.step() {
                Step::Record(record) => return Some(record),
                Step::Done => return None,
                Step::NeedBytes => {}
            }

            match self.source.try_read_more(self.pipeline.frames.buffer_mut()) {
                Ok(SourceRead::Bytes(_)) => {}
                Ok(SourceRead::Closed) => self.pipeline.source_closed(),
                Ok(SourceRead::WouldBlock) => {
                    let wait = self.pipeline.drain(
                        &self.clock,
                        self.cancel.as_ref(),
                        self.poll_interval,
                    )?;
                    std::thread::sleep(wait);
                }
                Err(err) => {
                    self.pipeline.source_failed(err.into());
                    return None;
                }
            }
        }
    }
}

impl<S: ByteSource, D: MessageDecoder> std::iter::FusedIterator for Ingestor<S, D> {}

/// Runs a whole ingestion, handing every record to `on_record`.
pub fn ingest<S, D, F>(
    source: S,
    decoder: D,
    config: IngestConfig,
    mut on_record: F,
) -> IngestOutcome
where
    S: ByteSource,
    D: MessageDecoder,
    F: FnMut(&IngestRecord),
{
    let mut ingestor = Ingestor::new(source, decoder, config);
    for record in ingestor.by_ref() {
        on_record(&record);
    }
    ingestor.finish()
}

#[cfg(feature = "tokio")]
mod tokio_ingest {
    use std::time::Duration;

    use tokio::io::AsyncRead;

    use super::{IngestOutcome, IngestRecord, Pipeline, Step};
    use crate::cancel::CancelFlag;
    use crate::config::IngestConfig;
    use crate::decode::MessageDecoder;
    use crate::source::{AsyncTailingSource, RunClock, SourceRead};
    use crate::stats::SummaryState;

    /// Async counterpart of [`super::Ingestor`]; waits with `tokio::time::sleep`.
    pub struct AsyncIngestor<R: AsyncRead + Unpin, D: MessageDecoder> {
        source: AsyncTailingSource<R>,
        pipeline: Pipeline<D>,
        poll_interval: Duration,
        clock: RunClock,
        cancel: Option<CancelFlag>,
    }

    impl<R: AsyncRead + Unpin, D: MessageDecoder> AsyncIngestor<R, D> {
        pub fn new(source: AsyncTailingSource<R>, decoder: D, config: IngestConfig) -> Self {
            Self {
                source,
                pipeline: Pipeline::new(decoder, &config),
                poll_interval: config.poll_interval,
                clock: RunClock::start(config.deadline),
                cancel: None,
            }
        }

        pub fn with_clock(mut self, clock: RunClock) -> Self {
            self.clock = clock;
            self
        }

        pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
            self.cancel = Some(cancel);
            self
        }

        pub fn snapshot(&self) -> SummaryState {
            self.pipeline.stats.snapshot()
        }

        pub async fn next_record(&mut self) -> Option<IngestRecord> {
            loop {
                match self.pipeline.step() {
                    Step::Record(record) => return Some(record),
                    Step::Done => return None,
                    Step::NeedBytes => {}
                }

                match self
                    .source
                    .try_read_more(self.pipeline.frames.buffer_mut())
                    .await
                {
                    Ok(SourceRead::Bytes(_)) => {}
                    Ok(SourceRead::Closed) => self.pipeline.source_closed(),
                    Ok(SourceRead::WouldBlock) => {
                        let wait = self.pipeline.drain(
                            &self.clock,
                            self.cancel.as_ref(),
                            self.poll_interval,
                        )?;
                        tokio::time::sleep(wait).await;
                    }
                    Err(err) => {
                        self.pipeline.source_failed(err.into());
                        return None;
                    }
                }
            }
        }

        pub async fn finish(mut self) -> IngestOutcome {
            while self.next_record().await.is_some() {}
            self.pipeline.into_outcome()
        }
    }

    #[cfg(test)]
    mod tests {
        use std::io::Cursor;

        use prost::Message;

        use super::*;
        use crate::decode::ProstDecoder;
        use crate::ingest::TerminationReason;
        use crate::proto::{build_event, BuildEvent, Progress};
        use crate::source::SourceMode;

        fn progress(last: bool) -> Vec<u8> {
            BuildEvent {
                id: None,
                last_message: last,
                payload: Some(build_event::Payload::Progress(Progress::default())),
            }
            .encode_length_delimited_to_vec()
        }

        #[tokio::test]
        async fn async_driver_matches_sync_semantics() {
            let mut bytes = progress(false);
            bytes.extend(progress(true));
            bytes.extend(progress(false));

            let source = AsyncTailingSource::new(Cursor::new(bytes), SourceMode::OneShot, 3);
            let mut ingestor =
                AsyncIngestor::new(source, ProstDecoder::new(), IngestConfig::default());
            let mut seen = 0;
            while let Some(record) = ingestor.next_record().await {
                seen += 1;
                assert_eq!(record.sequence, seen);
            }
            let outcome = ingestor.finish().await;
            assert_eq!(seen, 2);
            assert_eq!(outcome.reason, TerminationReason::ExplicitLast);
            assert_eq!(outcome.summary.progress_events, 2);
        }

        #[tokio::test]
        async fn async_follow_times_out() {
            let source =
                AsyncTailingSource::new(Cursor::new(progress(false)), SourceMode::Follow, 64);
            let config =
                IngestConfig::follow(Duration::from_millis(5), Duration::from_millis(40));
            let outcome = AsyncIngestor::new(source, ProstDecoder::new(), config)
                .finish()
                .await;
            assert_eq!(outcome.reason, TerminationReason::Timeout);
            assert_eq!(outcome.total_events, 1);
            assert!(outcome.error.is_none());
        }
    }
}

#[cfg(feature = "tokio")]
pub use tokio_ingest::AsyncIngestor;
