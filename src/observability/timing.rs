use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

use super::IntervalHistogram;

pub const DEFAULT_HISTOGRAM_BINS: usize = 20;
pub const DEFAULT_MAX_SAMPLES: usize = 100_000;

/// Summary of one collection session. Built once by
/// [`TimingCollector::finalize`].
#[derive(Debug, Clone, PartialEq)]
pub struct SessionMetrics {
    pub total_frames: u64,
    pub interval_count: u64,
    pub average_interval_secs: f64,
    pub frames_per_second: f64,
    pub window: Duration,
    pub interval_histogram: IntervalHistogram,
}

struct TimingState {
    previous_arrival: Option<Instant>,
    samples: VecDeque<f64>,
    total_frames: u64,
    interval_count: u64,
    interval_sum: f64,
}

/// Inter-arrival statistics for accepted frames.
///
/// Samples live in a ring of `max_samples`; the oldest are evicted once it
/// is full. Frame count, interval count and the mean stay exact for the
/// whole session, the histogram covers the retained samples.
pub struct TimingCollector {
    state: Mutex<TimingState>,
    max_samples: usize,
    bins: usize,
}

impl TimingCollector {
    pub fn new(max_samples: usize, bins: usize) -> Self {
        let max_samples = max_samples.max(1);
        Self {
            state: Mutex::new(TimingState {
                previous_arrival: None,
                samples: VecDeque::with_capacity(max_samples.min(4096)),
                total_frames: 0,
                interval_count: 0,
                interval_sum: 0.0,
            }),
            max_samples,
            bins: bins.max(1),
        }
    }

    /// Record one accepted frame. The first call only sets the reference
    /// arrival; every later call appends an interval.
    pub fn record(&self, arrival: Instant) {
        let mut state = self.state.lock();
        state.total_frames += 1;

        if let Some(previous) = state.previous_arrival {
            let interval = arrival.saturating_duration_since(previous).as_secs_f64();
            if state.samples.len() == self.max_samples {
                state.samples.pop_front();
            }
            state.samples.push_back(interval);
            state.interval_count += 1;
            state.interval_sum += interval;
        }
        state.previous_arrival = Some(arrival);
    }

    pub fn total_frames(&self) -> u64 {
        self.state.lock().total_frames
    }

    /// Retained interval samples, oldest first
    pub fn samples(&self) -> Vec<f64> {
        self.state.lock().samples.iter().copied().collect()
    }

    /// Compute session metrics. Throughput is `total_frames / window`,
    /// where `window` is the caller's collection time, not derived from
    /// the intervals.
    pub fn finalize(&self, window: Duration) -> SessionMetrics {
        let state = self.state.lock();

        let average_interval_secs = if state.interval_count > 0 {
            state.interval_sum / state.interval_count as f64
        } else {
            0.0
        };

        let window_secs = window.as_secs_f64();
        let frames_per_second = if state.total_frames > 0 && window_secs > 0.0 {
            state.total_frames as f64 / window_secs
        } else {
            0.0
        };

        let interval_histogram =
            IntervalHistogram::from_samples(state.samples.iter().copied(), self.bins);

        SessionMetrics {
            total_frames: state.total_frames,
            interval_count: state.interval_count,
            average_interval_secs,
            frames_per_second,
            window,
            interval_histogram,
        }
    }
}

impl Default for TimingCollector {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SAMPLES, DEFAULT_HISTOGRAM_BINS)
    }
}
