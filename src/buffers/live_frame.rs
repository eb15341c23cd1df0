use arc_swap::ArcSwapOption;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::core::SensorFrame;

/// Everything readers see from one publish, swapped in as a unit.
#[derive(Debug, Clone)]
pub struct LiveState {
    pub frame: Arc<SensorFrame>,
    pub arrival: Instant,
    /// 1 for the first published frame, then increasing by one
    pub sequence: u64,
}

/// Latest-value store between the message-arrival task and its readers.
///
/// `publish` replaces the whole [`LiveState`] with one pointer swap, so a
/// reader gets either the previous frame or the new one, never a mix.
/// Neither side takes a lock; readers never wait on the writer or on each
/// other. There is no queue: intermediate frames a slow reader misses are
/// simply gone.
pub struct LiveFrameStore {
    current: ArcSwapOption<LiveState>,
    published: AtomicU64,
}

impl LiveFrameStore {
    pub fn new() -> Self {
        Self {
            current: ArcSwapOption::empty(),
            published: AtomicU64::new(0),
        }
    }

    /// Single-writer: only the message-arrival task calls this.
    pub fn publish(&self, frame: Arc<SensorFrame>, arrival: Instant) -> u64 {
        let sequence = self.published.fetch_add(1, Ordering::AcqRel) + 1;
        self.current.store(Some(Arc::new(LiveState {
            frame,
            arrival,
            sequence,
        })));
        sequence
    }

    pub fn snapshot(&self) -> Option<Arc<SensorFrame>> {
        let current = self.current.load();
        (*current).as_ref().map(|state| state.frame.clone())
    }

    pub fn state(&self) -> Option<Arc<LiveState>> {
        self.current.load_full()
    }

    pub fn last_arrival(&self) -> Option<Instant> {
        let current = self.current.load();
        (*current).as_ref().map(|state| state.arrival)
    }

    pub fn published_count(&self) -> u64 {
        self.published.load(Ordering::Acquire)
    }
}

impl Default for LiveFrameStore {
    fn default() -> Self {
        Self::new()
    }
}
