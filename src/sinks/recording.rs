use super::RenderSink;
use crate::core::SensorFrame;
use anyhow::Result;
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRender {
    pub rows: Vec<Vec<i64>>,
    pub color_min: i64,
    pub color_max: i64,
}

/// Keeps every render call. Clones share the same record, so one handle
/// can go to the render loop while the test keeps another.
#[derive(Clone, Default)]
pub struct RecordingSink {
    renders: Arc<Mutex<Vec<RecordedRender>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn renders(&self) -> Vec<RecordedRender> {
        self.renders.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.renders.lock().len()
    }
}

impl RenderSink for RecordingSink {
    fn render(&mut self, grid: &SensorFrame, color_min: i64, color_max: i64) -> Result<()> {
        self.renders.lock().push(RecordedRender {
            rows: grid.to_rows(),
            color_min,
            color_max,
        });
        Ok(())
    }
}
