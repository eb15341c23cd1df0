pub mod decoder;
pub mod frame;

pub use decoder::{DecodeError, FrameDecoder};
pub use frame::{RawMessage, SensorFrame};
