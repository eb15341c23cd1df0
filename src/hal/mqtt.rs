use async_trait::async_trait;
use log::{debug, info, warn};
use parking_lot::Mutex;
use rumqttc::{AsyncClient, ConnectReturnCode, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::{InboundStream, Transport, TransportError};
use crate::config::BrokerConfig;
use crate::core::RawMessage;

/// Requests buffered between the client handle and the event loop
const REQUEST_CAPACITY: usize = 64;

const RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// MQTT client handle. The paired [`MqttInbound`] owns the event loop and
/// must be polled for any request (including publishes) to reach the broker.
pub struct MqttTransport {
    client: AsyncClient,
    endpoint: String,
    subscriptions: Arc<Mutex<Vec<String>>>,
    closing: Arc<AtomicBool>,
}

pub struct MqttInbound {
    eventloop: EventLoop,
    client: AsyncClient,
    subscriptions: Arc<Mutex<Vec<String>>>,
    closing: Arc<AtomicBool>,
}

impl MqttTransport {
    /// Connect and wait for the broker's CONNACK.
    ///
    /// Failure here is returned to the caller; a session cannot start
    /// without a live connection.
    pub async fn connect(config: &BrokerConfig) -> Result<(Self, MqttInbound), TransportError> {
        let endpoint = format!("{}:{}", config.host, config.port);

        let mut options = MqttOptions::new(config.client_id.clone(), config.host.clone(), config.port);
        options.set_keep_alive(Duration::from_secs(config.keep_alive_secs));

        let (client, mut eventloop) = AsyncClient::new(options, REQUEST_CAPACITY);

        let timeout = Duration::from_secs(config.connect_timeout_secs);
        match tokio::time::timeout(timeout, wait_for_connack(&mut eventloop)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(TransportError::Connect(format!(
                    "no CONNACK from {} within {:?}",
                    endpoint, timeout
                )))
            }
        }
        info!("Connected to broker {}", endpoint);

        let subscriptions = Arc::new(Mutex::new(Vec::new()));
        let closing = Arc::new(AtomicBool::new(false));

        let transport = Self {
            client: client.clone(),
            endpoint,
            subscriptions: subscriptions.clone(),
            closing: closing.clone(),
        };
        let inbound = MqttInbound {
            eventloop,
            client,
            subscriptions,
            closing,
        };
        Ok((transport, inbound))
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

async fn wait_for_connack(eventloop: &mut EventLoop) -> Result<(), TransportError> {
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                if ack.code == ConnectReturnCode::Success {
                    return Ok(());
                }
                return Err(TransportError::Connect(format!("broker refused: {:?}", ack.code)));
            }
            Ok(_) => continue,
            Err(e) => return Err(TransportError::Connect(e.to_string())),
        }
    }
}

#[async_trait]
impl Transport for MqttTransport {
    fn transport_id(&self) -> &str {
        "mqtt"
    }

    async fn subscribe(&self, topic_pattern: &str) -> Result<(), TransportError> {
        self.client
            .subscribe(topic_pattern, QoS::AtMostOnce)
            .await
            .map_err(|e| TransportError::Subscribe {
                topic: topic_pattern.to_string(),
                reason: e.to_string(),
            })?;
        self.subscriptions.lock().push(topic_pattern.to_string());
        info!("Subscribed to {}", topic_pattern);
        Ok(())
    }

    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), TransportError> {
        self.client
            .publish(topic, QoS::AtMostOnce, false, payload)
            .await
            .map_err(|e| TransportError::Publish {
                topic: topic.to_string(),
                reason: e.to_string(),
            })
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        self.closing.store(true, Ordering::Release);
        self.client
            .disconnect()
            .await
            .map_err(|e| TransportError::Disconnect(e.to_string()))
    }
}

#[async_trait]
impl InboundStream for MqttInbound {
    async fn next_message(&mut self) -> Option<RawMessage> {
        loop {
            match self.eventloop.poll().await {
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    return Some(RawMessage::new(
                        publish.topic,
                        publish.payload.to_vec(),
                        Instant::now(),
                    ));
                }
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    // Clean sessions drop subscriptions on reconnect.
                    self.resubscribe();
                }
                Ok(Event::Incoming(Packet::SubAck(ack))) => {
                    debug!("SUBACK pkid={} codes={:?}", ack.pkid, ack.return_codes);
                }
                Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                    debug!("Disconnect sent, closing inbound stream");
                    return None;
                }
                Ok(_) => {}
                Err(e) => {
                    if self.closing.load(Ordering::Acquire) {
                        return None;
                    }
                    warn!("MQTT connection error: {}; retrying in {:?}", e, RECONNECT_DELAY);
                    tokio::time::sleep(RECONNECT_DELAY).await;
                }
            }
        }
    }
}

impl MqttInbound {
    fn resubscribe(&self) {
        let topics = self.subscriptions.lock().clone();
        for topic in topics {
            if let Err(e) = self.client.try_subscribe(topic.as_str(), QoS::AtMostOnce) {
                warn!("Re-subscribe to {} failed: {}", topic, e);
            } else {
                info!("Re-subscribed to {}", topic);
            }
        }
    }
}
