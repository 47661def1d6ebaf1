#![cfg(feature = "tokio")]

mod support;

use std::time::Duration;

use bep_events::{
    open_file_async, AsyncIngestor, CancelFlag, IngestConfig, ProstDecoder, RunClock,
    TerminationReason,
};
use support::{completed, encode_all, last, progress};
use tokio::io::AsyncWriteExt;

#[tokio::test]
async fn async_follow_reads_appended_frames_until_last_message() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bep.bin");
    let bytes = encode_all(&[progress(), completed("//a:b", true), last()]);

    let writer_path = path.clone();
    let writer = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        let mut file = tokio::fs::File::create(writer_path).await.unwrap();
        for piece in bytes.chunks(3) {
            file.write_all(piece).await.unwrap();
            file.flush().await.unwrap();
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    });

    let config = IngestConfig::follow(Duration::from_millis(2), Duration::from_secs(30));
    let clock = RunClock::start(config.deadline);
    let source = open_file_async(&path, &config, &clock, None).await.unwrap();
    let mut ingestor = AsyncIngestor::new(source, ProstDecoder::new(), config).with_clock(clock);

    let mut labels = Vec::new();
    while let Some(record) = ingestor.next_record().await {
        labels.push(record.event.label);
    }
    let outcome = ingestor.finish().await;
    writer.await.unwrap();

    assert_eq!(outcome.reason, TerminationReason::ExplicitLast);
    assert_eq!(outcome.summary.targets_built, 1);
    assert_eq!(outcome.summary.progress_events, 1);
    assert_eq!(labels, vec!["<unknown>", "//a:b", "<unknown>"]);
}

#[tokio::test]
async fn async_cancel_stops_waiting() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bep.bin");
    std::fs::write(&path, encode_all(&[progress()])).unwrap();

    let config = IngestConfig::follow(Duration::from_millis(5), Duration::from_secs(60));
    let clock = RunClock::start(config.deadline);
    let cancel = CancelFlag::new();
    let source = open_file_async(&path, &config, &clock, None).await.unwrap();
    let ingestor = AsyncIngestor::new(source, ProstDecoder::new(), config)
        .with_clock(clock)
        .with_cancel(cancel.clone());

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(30)).await;
        cancel.cancel();
    });
    let outcome = ingestor.finish().await;
    canceller.await.unwrap();

    assert_eq!(outcome.reason, TerminationReason::Cancelled);
    assert_eq!(outcome.total_events, 1);
}
