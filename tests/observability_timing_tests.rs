use hyvestream::observability::TimingCollector;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[test]
fn test_intervals_from_arrivals() {
    let collector = TimingCollector::default();
    let t0 = Instant::now();

    collector.record(t0);
    collector.record(t0 + Duration::from_secs(1));
    collector.record(t0 + Duration::from_secs(3));

    assert_eq!(collector.samples(), vec![1.0, 2.0]);

    let metrics = collector.finalize(Duration::from_secs(60));
    assert_eq!(metrics.total_frames, 3);
    assert_eq!(metrics.interval_count, 2);
    assert!((metrics.average_interval_secs - 1.5).abs() < 1e-9);
    assert!((metrics.frames_per_second - 3.0 / 60.0).abs() < 1e-9);
}

#[test]
fn test_first_frame_produces_no_interval() {
    let collector = TimingCollector::default();
    collector.record(Instant::now());

    assert!(collector.samples().is_empty());
    let metrics = collector.finalize(Duration::from_secs(10));
    assert_eq!(metrics.total_frames, 1);
    assert_eq!(metrics.average_interval_secs, 0.0);
    assert!((metrics.frames_per_second - 0.1).abs() < 1e-9);
}

#[test]
fn test_zero_frames_reports_zero_rates() {
    let collector = TimingCollector::default();
    let metrics = collector.finalize(Duration::from_secs(60));

    assert_eq!(metrics.total_frames, 0);
    assert_eq!(metrics.frames_per_second, 0.0);
    assert_eq!(metrics.average_interval_secs, 0.0);
    assert_eq!(metrics.interval_histogram.total(), 0);
}

#[test]
fn test_zero_window_does_not_divide() {
    let collector = TimingCollector::default();
    let t0 = Instant::now();
    collector.record(t0);
    collector.record(t0 + Duration::from_millis(200));

    let metrics = collector.finalize(Duration::ZERO);
    assert_eq!(metrics.frames_per_second, 0.0);
    assert!((metrics.average_interval_secs - 0.2).abs() < 1e-9);
}

#[test]
fn test_throughput_uses_window_not_intervals() {
    let collector = TimingCollector::default();
    let t0 = Instant::now();
    for i in 0..10 {
        collector.record(t0 + Duration::from_millis(100 * i));
    }

    // 10 frames in under a second, but the window says 60 s.
    let metrics = collector.finalize(Duration::from_secs(60));
    assert!((metrics.frames_per_second - 10.0 / 60.0).abs() < 1e-9);
}

#[test]
fn test_histogram_spans_observed_range() {
    let collector = TimingCollector::new(1000, 4);
    let t0 = Instant::now();
    let mut t = t0;
    collector.record(t);
    for ms in [250, 250, 500, 1000, 1250] {
        t += Duration::from_millis(ms);
        collector.record(t);
    }

    let hist = collector.finalize(Duration::from_secs(1)).interval_histogram;
    assert_eq!(hist.bins(), 4);
    assert_eq!(hist.min(), 0.25);
    assert_eq!(hist.max(), 1.25);
    assert_eq!(hist.counts(), &[2, 1, 0, 2]);
}

#[test]
fn test_sample_ring_is_bounded() {
    let collector = TimingCollector::new(100, 20);
    let t0 = Instant::now();
    for i in 0..1_000u64 {
        collector.record(t0 + Duration::from_millis(i * 10));
    }

    assert_eq!(collector.samples().len(), 100);
    let metrics = collector.finalize(Duration::from_secs(10));
    assert_eq!(metrics.total_frames, 1_000);
    assert_eq!(metrics.interval_count, 999);
    assert_eq!(metrics.interval_histogram.total(), 100);
}

#[test]
fn test_reads_while_recording() {
    let collector = Arc::new(TimingCollector::default());
    let writer = {
        let collector = collector.clone();
        thread::spawn(move || {
            let t0 = Instant::now();
            for i in 0..10_000u64 {
                collector.record(t0 + Duration::from_micros(i));
            }
        })
    };

    for _ in 0..100 {
        let _ = collector.total_frames();
    }
    writer.join().unwrap();
    assert_eq!(collector.total_frames(), 10_000);
}
