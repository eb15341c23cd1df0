use log::{debug, info, warn};
use std::sync::Arc;

use crate::buffers::LiveFrameStore;
use crate::config::{SessionConfig, SessionMode};
use crate::core::{DecodeError, FrameDecoder, RawMessage, SensorFrame};
use crate::observability::{IngestMetrics, TimingCollector};
use crate::protocol::CommandRequest;

/// Result of handling one inbound message
#[derive(Debug, Clone, PartialEq)]
pub enum IngestOutcome {
    /// Decoded, published to the live store and timed
    Accepted {
        frame: Arc<SensorFrame>,
        sequence: u64,
    },
    /// Dropped; nothing shared was touched
    Rejected(DecodeError),
    /// Not telemetry (a command on the command topic)
    Ignored,
}

impl IngestOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }
}

/// Decode → publish → record, with the state it writes to.
///
/// Owned by the session and shared with the receive loop (the only
/// caller of [`IngestPipeline::ingest`]) and with readers of the store.
pub struct IngestPipeline {
    decoder: FrameDecoder,
    store: Arc<LiveFrameStore>,
    timing: Arc<TimingCollector>,
    metrics: Arc<IngestMetrics>,
    command_topic: String,
    mode: SessionMode,
}

impl IngestPipeline {
    pub fn new(
        decoder: FrameDecoder,
        timing: TimingCollector,
        command_topic: impl Into<String>,
        mode: SessionMode,
    ) -> Self {
        Self {
            decoder,
            store: Arc::new(LiveFrameStore::new()),
            timing: Arc::new(timing),
            metrics: Arc::new(IngestMetrics::new()),
            command_topic: command_topic.into(),
            mode,
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(
            FrameDecoder::new(config.grid.width, config.grid.height),
            TimingCollector::new(config.timing.max_samples, config.timing.histogram_bins),
            config.topics.command.clone(),
            config.mode,
        )
    }

    pub fn store(&self) -> &Arc<LiveFrameStore> {
        &self.store
    }

    pub fn timing(&self) -> &Arc<TimingCollector> {
        &self.timing
    }

    pub fn metrics(&self) -> &Arc<IngestMetrics> {
        &self.metrics
    }

    pub fn decoder(&self) -> &FrameDecoder {
        &self.decoder
    }

    /// A command payload on the command topic; anything else there is
    /// still decoded as telemetry.
    fn command_echo(&self, message: &RawMessage) -> Option<CommandRequest> {
        if message.topic != self.command_topic {
            return None;
        }
        CommandRequest::from_payload(&message.payload)
    }

    /// Handle one delivery. Bounded work, no awaits: this runs on the
    /// message-arrival task and must not hold it up.
    pub fn ingest(&self, message: &RawMessage) -> IngestOutcome {
        self.metrics.record_received();

        if self.mode.logs_raw() {
            info!(
                "Message received on topic {}: {}",
                message.topic,
                message.payload_text()
            );
        }

        if let Some(command) = self.command_echo(message) {
            debug!("Ignoring {} command on {}", command, message.topic);
            self.metrics.record_ignored();
            return IngestOutcome::Ignored;
        }

        let start = self.metrics.start_decode();
        let decoded = self.decoder.decode(&message.payload);
        self.metrics.finish_decode(start);

        match decoded {
            Ok(frame) => {
                let frame = Arc::new(frame);
                let sequence = self.store.publish(frame.clone(), message.arrival);
                self.timing.record(message.arrival);
                self.metrics.record_accepted();

                if self.mode.logs_values() {
                    info!("Calibrating channel: {:?}", frame.values());
                } else {
                    debug!("Frame #{} accepted from {}", sequence, message.topic);
                }
                IngestOutcome::Accepted { frame, sequence }
            }
            Err(e) => {
                self.metrics.record_rejected(&e);
                if self.mode.logs_raw() {
                    debug!("Dropped message on {}: {}", message.topic, e);
                } else {
                    warn!("Dropped message on {}: {}", message.topic, e);
                }
                IngestOutcome::Rejected(e)
            }
        }
    }
}
