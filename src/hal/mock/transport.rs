use crate::core::RawMessage;
use crate::hal::{InboundStream, Transport, TransportError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// In-memory transport for tests and offline runs.
///
/// Messages pushed with [`MockTransport::inject`] come out of the paired
/// [`MockInbound`]; everything published is recorded for inspection.
pub struct MockTransport {
    inbound_tx: Mutex<Option<mpsc::UnboundedSender<RawMessage>>>,
    published: Mutex<Vec<(String, Vec<u8>)>>,
    subscriptions: Mutex<Vec<String>>,
    disconnect_calls: AtomicUsize,
    fail_publish: AtomicBool,
}

pub struct MockInbound {
    rx: mpsc::UnboundedReceiver<RawMessage>,
}

impl MockTransport {
    pub fn new() -> (Arc<Self>, MockInbound) {
        let (tx, rx) = mpsc::unbounded_channel();
        let transport = Arc::new(Self {
            inbound_tx: Mutex::new(Some(tx)),
            published: Mutex::new(Vec::new()),
            subscriptions: Mutex::new(Vec::new()),
            disconnect_calls: AtomicUsize::new(0),
            fail_publish: AtomicBool::new(false),
        });
        (transport, MockInbound { rx })
    }

    /// Deliver a message as if it came from the broker.
    /// Returns false once the transport has been disconnected.
    pub fn inject(&self, message: RawMessage) -> bool {
        match self.inbound_tx.lock().as_ref() {
            Some(tx) => tx.send(message).is_ok(),
            None => false,
        }
    }

    /// Make every subsequent publish fail
    pub fn set_fail_publish(&self, fail: bool) {
        self.fail_publish.store(fail, Ordering::SeqCst);
    }

    pub fn published(&self) -> Vec<(String, Vec<u8>)> {
        self.published.lock().clone()
    }

    /// Payloads published to `topic`, as text
    pub fn published_to(&self, topic: &str) -> Vec<String> {
        self.published
            .lock()
            .iter()
            .filter(|(t, _)| t == topic)
            .map(|(_, p)| String::from_utf8_lossy(p).into_owned())
            .collect()
    }

    pub fn subscriptions(&self) -> Vec<String> {
        self.subscriptions.lock().clone()
    }

    pub fn disconnect_count(&self) -> usize {
        self.disconnect_calls.load(Ordering::SeqCst)
    }

    pub fn is_connected(&self) -> bool {
        self.inbound_tx.lock().is_some()
    }
}

#[async_trait]
impl Transport for MockTransport {
    fn transport_id(&self) -> &str {
        "mock"
    }

    async fn subscribe(&self, topic_pattern: &str) -> Result<(), TransportError> {
        if !self.is_connected() {
            return Err(TransportError::Subscribe {
                topic: topic_pattern.to_string(),
                reason: "not connected".to_string(),
            });
        }
        self.subscriptions.lock().push(topic_pattern.to_string());
        Ok(())
    }

    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), TransportError> {
        if self.fail_publish.load(Ordering::SeqCst) {
            return Err(TransportError::Publish {
                topic: topic.to_string(),
                reason: "simulated failure".to_string(),
            });
        }
        if !self.is_connected() {
            return Err(TransportError::Closed);
        }
        self.published.lock().push((topic.to_string(), payload));
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        self.disconnect_calls.fetch_add(1, Ordering::SeqCst);
        // Dropping the sender ends the inbound stream once drained.
        self.inbound_tx.lock().take();
        Ok(())
    }
}

#[async_trait]
impl InboundStream for MockInbound {
    async fn next_message(&mut self) -> Option<RawMessage> {
        self.rx.recv().await
    }
}
