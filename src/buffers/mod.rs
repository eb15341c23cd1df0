pub mod live_frame;

pub use live_frame::{LiveFrameStore, LiveState};
