use crate::hal::{Transport, TransportError};
use log::info;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Control requests understood by the sensor array
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CommandRequest {
    /// Run a calibration pass
    Cal,
    /// Start streaming telemetry
    Run,
    /// Stop streaming
    Stop,
}

#[derive(Serialize, Deserialize)]
struct CommandPayload {
    #[serde(rename = "REQUEST")]
    request: CommandRequest,
}

impl CommandRequest {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Cal => "CAL",
            Self::Run => "RUN",
            Self::Stop => "STOP",
        }
    }

    /// Wire form: `{"REQUEST":"<tag>"}`
    pub fn to_payload(&self) -> Vec<u8> {
        // A one-field struct of a unit enum cannot fail to serialize.
        serde_json::to_vec(&CommandPayload { request: *self })
            .unwrap_or_else(|_| format!("{{\"REQUEST\":\"{}\"}}", self.tag()).into_bytes())
    }

    /// Recognise a command payload, e.g. our own publishes echoed back
    pub fn from_payload(payload: &[u8]) -> Option<Self> {
        serde_json::from_slice::<CommandPayload>(payload)
            .ok()
            .map(|p| p.request)
    }
}

impl fmt::Display for CommandRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Sends control requests to the command topic.
#[derive(Clone)]
pub struct CommandEncoder {
    transport: Arc<dyn Transport>,
    topic: String,
}

impl CommandEncoder {
    pub fn new(transport: Arc<dyn Transport>, topic: impl Into<String>) -> Self {
        Self {
            transport,
            topic: topic.into(),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub async fn send(&self, command: CommandRequest) -> Result<(), TransportError> {
        let payload = command.to_payload();
        self.transport.publish(&self.topic, payload).await?;
        info!("Sent command {} to topic {}", command, self.topic);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_format() {
        assert_eq!(CommandRequest::Cal.to_payload(), br#"{"REQUEST":"CAL"}"#.to_vec());
        assert_eq!(CommandRequest::Run.to_payload(), br#"{"REQUEST":"RUN"}"#.to_vec());
        assert_eq!(CommandRequest::Stop.to_payload(), br#"{"REQUEST":"STOP"}"#.to_vec());
    }

    #[test]
    fn test_recognises_echo() {
        assert_eq!(
            CommandRequest::from_payload(br#"{"REQUEST": "STOP"}"#),
            Some(CommandRequest::Stop)
        );
        assert_eq!(CommandRequest::from_payload(br#"{"a": 1}"#), None);
    }
}
