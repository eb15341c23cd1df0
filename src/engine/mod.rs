pub mod pipeline;
pub mod receiver;
pub mod render;
pub mod session;
pub mod shutdown;
pub mod state;

pub use pipeline::{IngestOutcome, IngestPipeline};
pub use receiver::run_receive_loop;
pub use render::{RenderLoop, RenderStats};
pub use session::Session;
pub use shutdown::{ShutdownCoordinator, ShutdownOutcome, ShutdownToken};
pub use state::{SessionState, ShutdownReason};
