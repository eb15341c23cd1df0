pub mod histogram;
pub mod logging;
pub mod metrics;
pub mod monitor;
pub mod timing;

pub use histogram::IntervalHistogram;
pub use logging::init_logging;
pub use metrics::{IngestMetrics, IngestSnapshot};
pub use monitor::SessionReport;
pub use timing::{SessionMetrics, TimingCollector};
