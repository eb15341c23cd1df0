pub mod transport;

pub use transport::{MockInbound, MockTransport};
