use log::{debug, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

use super::ShutdownToken;
use crate::buffers::LiveFrameStore;
use crate::sinks::RenderSink;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderStats {
    pub ticks: u64,
    pub rendered: u64,
    pub sink_errors: u64,
}

/// Fixed-rate consumer of the live store.
///
/// Runs at its own cadence regardless of how fast frames arrive; each tick
/// draws whatever frame is current, or nothing before the first one.
pub struct RenderLoop {
    store: Arc<LiveFrameStore>,
    sink: Box<dyn RenderSink>,
    period: Duration,
    stats: RenderStats,
}

impl RenderLoop {
    pub fn new(store: Arc<LiveFrameStore>, sink: Box<dyn RenderSink>, period: Duration) -> Self {
        Self {
            store,
            sink,
            period,
            stats: RenderStats::default(),
        }
    }

    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    /// One tick. Returns true if a frame was handed to the sink.
    pub fn tick(&mut self) -> bool {
        self.stats.ticks += 1;

        let Some(frame) = self.store.snapshot() else {
            return false;
        };

        let (color_min, color_max) = frame.value_range();
        match self.sink.render(&frame, color_min, color_max) {
            Ok(()) => {
                self.stats.rendered += 1;
                true
            }
            Err(e) => {
                self.stats.sink_errors += 1;
                warn!("Render sink failed: {}", e);
                false
            }
        }
    }

    pub async fn run(mut self, mut token: ShutdownToken) -> RenderStats {
        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = interval.tick() => {
                    self.tick();
                }
            }
        }

        debug!(
            "Render loop stopped: {} ticks, {} frames drawn",
            self.stats.ticks, self.stats.rendered
        );
        self.stats
    }
}
