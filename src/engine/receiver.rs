use log::{debug, info};
use std::sync::Arc;

use super::IngestPipeline;
use crate::hal::InboundStream;

/// Message-arrival loop: pull each delivery and run it through the pipeline
/// until the stream closes. Returns the number of messages handled.
pub async fn run_receive_loop(
    mut inbound: Box<dyn InboundStream>,
    pipeline: Arc<IngestPipeline>,
) -> u64 {
    let mut handled = 0u64;
    while let Some(message) = inbound.next_message().await {
        let outcome = pipeline.ingest(&message);
        handled += 1;
        debug!("Message {} on {}: accepted={}", handled, message.topic, outcome.is_accepted());
    }
    info!("Inbound stream closed after {} messages", handled);
    handled
}
