pub mod mock;
pub mod mqtt;
pub mod traits;

pub use mqtt::{MqttInbound, MqttTransport};
pub use traits::{InboundStream, Transport, TransportError};
