use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crate::core::DecodeError;

/// Counters for the ingest path. Updated from the message-arrival task,
/// read from anywhere.
pub struct IngestMetrics {
    messages_received: AtomicU64,
    frames_accepted: AtomicU64,
    messages_ignored: AtomicU64,
    malformed_payloads: AtomicU64,
    invalid_values: AtomicU64,
    shape_mismatches: AtomicU64,
    total_decode_us: AtomicU64,
    decode_samples: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IngestSnapshot {
    pub messages_received: u64,
    pub frames_accepted: u64,
    pub messages_ignored: u64,
    pub malformed_payloads: u64,
    pub invalid_values: u64,
    pub shape_mismatches: u64,
    pub avg_decode_us: u64,
}

impl IngestSnapshot {
    pub fn rejected(&self) -> u64 {
        self.malformed_payloads + self.invalid_values + self.shape_mismatches
    }
}

impl IngestMetrics {
    pub fn new() -> Self {
        Self {
            messages_received: AtomicU64::new(0),
            frames_accepted: AtomicU64::new(0),
            messages_ignored: AtomicU64::new(0),
            malformed_payloads: AtomicU64::new(0),
            invalid_values: AtomicU64::new(0),
            shape_mismatches: AtomicU64::new(0),
            total_decode_us: AtomicU64::new(0),
            decode_samples: AtomicU64::new(0),
        }
    }

    pub fn record_received(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_accepted(&self) {
        self.frames_accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_ignored(&self) {
        self.messages_ignored.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected(&self, error: &DecodeError) {
        let counter = match error {
            DecodeError::MalformedPayload(_) => &self.malformed_payloads,
            DecodeError::InvalidValue { .. } => &self.invalid_values,
            DecodeError::ShapeMismatch { .. } => &self.shape_mismatches,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn start_decode(&self) -> Instant {
        Instant::now()
    }

    pub fn finish_decode(&self, start: Instant) {
        let elapsed_us = start.elapsed().as_micros() as u64;
        self.total_decode_us.fetch_add(elapsed_us, Ordering::Relaxed);
        self.decode_samples.fetch_add(1, Ordering::Relaxed);
    }

    pub fn messages_received(&self) -> u64 {
        self.messages_received.load(Ordering::Relaxed)
    }

    pub fn frames_accepted(&self) -> u64 {
        self.frames_accepted.load(Ordering::Relaxed)
    }

    pub fn avg_decode_us(&self) -> u64 {
        let samples = self.decode_samples.load(Ordering::Relaxed);
        if samples == 0 {
            return 0;
        }
        self.total_decode_us.load(Ordering::Relaxed) / samples
    }

    pub fn snapshot(&self) -> IngestSnapshot {
        IngestSnapshot {
            messages_received: self.messages_received(),
            frames_accepted: self.frames_accepted(),
            messages_ignored: self.messages_ignored.load(Ordering::Relaxed),
            malformed_payloads: self.malformed_payloads.load(Ordering::Relaxed),
            invalid_values: self.invalid_values.load(Ordering::Relaxed),
            shape_mismatches: self.shape_mismatches.load(Ordering::Relaxed),
            avg_decode_us: self.avg_decode_us(),
        }
    }
}

impl Default for IngestMetrics {
    fn default() -> Self {
        Self::new()
    }
}
