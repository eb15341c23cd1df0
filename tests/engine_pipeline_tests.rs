use hyvestream::config::{SessionConfig, SessionMode};
use hyvestream::core::{DecodeError, RawMessage};
use hyvestream::engine::{IngestOutcome, IngestPipeline};
use serde_json::{Map, Value};
use std::time::{Duration, Instant};

fn telemetry(count: usize, offset: i64) -> Vec<u8> {
    let mut map = Map::new();
    for i in 0..count {
        map.insert(format!("s{}", i), Value::from(i as i64 + offset));
    }
    serde_json::to_vec(&Value::Object(map)).unwrap()
}

fn pipeline(mode: SessionMode) -> IngestPipeline {
    IngestPipeline::from_config(&SessionConfig {
        mode,
        ..Default::default()
    })
}

#[test]
fn test_accepted_frame_is_published_and_timed() {
    let pipeline = pipeline(SessionMode::Heatmap);
    let t0 = Instant::now();

    let outcome = pipeline.ingest(&RawMessage::new("HYVE/DATA", telemetry(100, 1), t0));

    match outcome {
        IngestOutcome::Accepted { frame, sequence } => {
            assert_eq!(sequence, 1);
            assert_eq!(frame.row(0).unwrap()[0], 1);
        }
        other => panic!("expected Accepted, got {:?}", other),
    }
    assert_eq!(pipeline.store().snapshot().unwrap().values()[99], 100);
    assert_eq!(pipeline.store().last_arrival(), Some(t0));
    assert_eq!(pipeline.timing().total_frames(), 1);
    assert_eq!(pipeline.metrics().frames_accepted(), 1);
}

#[test]
fn test_shape_mismatch_leaves_store_unchanged() {
    let pipeline = pipeline(SessionMode::Heatmap);
    let t0 = Instant::now();

    pipeline.ingest(&RawMessage::new("HYVE/DATA", telemetry(100, 0), t0));
    let before = pipeline.store().state().unwrap();

    let outcome = pipeline.ingest(&RawMessage::new(
        "HYVE/DATA",
        telemetry(99, 500),
        t0 + Duration::from_secs(1),
    ));

    assert_eq!(
        outcome,
        IngestOutcome::Rejected(DecodeError::ShapeMismatch {
            expected: 100,
            actual: 99
        })
    );
    let after = pipeline.store().state().unwrap();
    assert_eq!(after.sequence, before.sequence);
    assert_eq!(*after.frame, *before.frame);
    assert_eq!(after.arrival, t0);
    assert_eq!(pipeline.timing().total_frames(), 1);
}

#[test]
fn test_bad_message_does_not_affect_the_next() {
    let pipeline = pipeline(SessionMode::Heatmap);
    let t0 = Instant::now();

    assert!(!pipeline
        .ingest(&RawMessage::new("HYVE/DATA", &b"{oops"[..], t0))
        .is_accepted());
    assert!(pipeline
        .ingest(&RawMessage::new("HYVE/DATA", telemetry(100, 7), t0))
        .is_accepted());

    let snapshot = pipeline.metrics().snapshot();
    assert_eq!(snapshot.messages_received, 2);
    assert_eq!(snapshot.malformed_payloads, 1);
    assert_eq!(snapshot.frames_accepted, 1);
    assert_eq!(pipeline.store().snapshot().unwrap().values()[0], 7);
}

#[test]
fn test_command_echo_is_ignored() {
    let pipeline = pipeline(SessionMode::Monitor);

    let outcome = pipeline.ingest(&RawMessage::now("HYVE/REQUEST", &br#"{"REQUEST":"RUN"}"#[..]));

    assert_eq!(outcome, IngestOutcome::Ignored);
    assert!(pipeline.store().snapshot().is_none());
    let snapshot = pipeline.metrics().snapshot();
    assert_eq!(snapshot.messages_ignored, 1);
    assert_eq!(snapshot.rejected(), 0);
}

#[test]
fn test_non_command_payload_on_command_topic_is_decoded() {
    let pipeline = pipeline(SessionMode::Heatmap);

    let outcome = pipeline.ingest(&RawMessage::now("HYVE/REQUEST", telemetry(100, 0)));
    assert!(outcome.is_accepted());

    let outcome = pipeline.ingest(&RawMessage::now("HYVE/REQUEST", &br#"{"REQUEST":"JUMP"}"#[..]));
    assert!(matches!(outcome, IngestOutcome::Rejected(_)));

    let snapshot = pipeline.metrics().snapshot();
    assert_eq!(snapshot.messages_ignored, 0);
    assert_eq!(snapshot.frames_accepted, 1);
}

#[test]
fn test_intervals_follow_accepted_frames_only() {
    let pipeline = pipeline(SessionMode::Timing);
    let t0 = Instant::now();

    pipeline.ingest(&RawMessage::new("HYVE/DATA", telemetry(100, 0), t0));
    pipeline.ingest(&RawMessage::new("HYVE/DATA", telemetry(3, 0), t0 + Duration::from_millis(500)));
    pipeline.ingest(&RawMessage::new("HYVE/DATA", telemetry(100, 0), t0 + Duration::from_secs(1)));

    assert_eq!(pipeline.timing().samples(), vec![1.0]);
}
