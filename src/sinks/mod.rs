pub mod heatmap;
pub mod recording;

pub use heatmap::TerminalHeatmap;
pub use recording::{RecordedRender, RecordingSink};

use crate::core::SensorFrame;
use anyhow::Result;

/// Consumer of grid snapshots from the render loop
pub trait RenderSink: Send {
    /// Draw one grid with the given color-scale range
    fn render(&mut self, grid: &SensorFrame, color_min: i64, color_max: i64) -> Result<()>;
}
