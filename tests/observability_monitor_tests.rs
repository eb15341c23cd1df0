use hyvestream::observability::{IngestMetrics, SessionReport, TimingCollector};
use hyvestream::core::DecodeError;
use std::time::{Duration, Instant};

#[test]
fn test_report_contains_summary_lines() {
    let collector = TimingCollector::new(100, 5);
    let t0 = Instant::now();
    collector.record(t0);
    collector.record(t0 + Duration::from_secs(1));
    collector.record(t0 + Duration::from_secs(3));

    let ingest = IngestMetrics::new();
    for _ in 0..4 {
        ingest.record_received();
    }
    for _ in 0..3 {
        ingest.record_accepted();
    }
    ingest.record_rejected(&DecodeError::ShapeMismatch {
        expected: 100,
        actual: 3,
    });

    let report = SessionReport::new(collector.finalize(Duration::from_secs(60)), ingest.snapshot());
    let text = report.generate_report();

    assert!(text.contains("Total frames received: 3"));
    assert!(text.contains("Average time per frame: 1.500000 seconds"));
    assert!(text.contains("Frames per second: 0.05 frames/second"));
    assert!(text.contains("4 received, 3 accepted, 0 ignored, 1 rejected"));
    assert!(text.contains("shape mismatch: 1"));
    assert!(text.contains("Interval distribution (5 buckets)"));
    assert!(text.contains('#'));
}

#[test]
fn test_report_without_frames() {
    let report = SessionReport::new(
        TimingCollector::default().finalize(Duration::from_secs(60)),
        IngestMetrics::new().snapshot(),
    );
    let text = report.generate_report();

    assert!(text.contains("Total frames received: 0"));
    assert!(text.contains("Frames per second: 0.00"));
    assert!(text.contains("(no intervals recorded)"));
    assert!(!text.contains("malformed:"));
}
