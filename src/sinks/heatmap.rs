use super::RenderSink;
use crate::core::SensorFrame;
use anyhow::Result;
use std::io::{self, Write};

/// Shade ramp from coldest to hottest
const RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

const CLEAR_AND_HOME: &str = "\x1b[2J\x1b[H";

/// Draws the grid as shaded text cells, one redraw per call.
pub struct TerminalHeatmap {
    out: Box<dyn Write + Send>,
    title: String,
    /// Clear the screen before each redraw
    ansi: bool,
    show_values: bool,
}

impl TerminalHeatmap {
    pub fn stdout() -> Self {
        Self::with_writer(Box::new(io::stdout()), true)
    }

    pub fn with_writer(out: Box<dyn Write + Send>, ansi: bool) -> Self {
        Self {
            out,
            title: "Sensor Heatmap".to_string(),
            ansi,
            show_values: false,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Print the raw reading next to each shaded row
    pub fn with_values(mut self, show: bool) -> Self {
        self.show_values = show;
        self
    }
}

/// Map `value` into the shade ramp over `[min, max]`
pub fn shade(value: i64, min: i64, max: i64) -> char {
    if max <= min {
        return RAMP[RAMP.len() / 2];
    }
    let clamped = value.clamp(min, max);
    let span = (max as i128) - (min as i128);
    let offset = (clamped as i128) - (min as i128);
    let idx = (offset * (RAMP.len() as i128 - 1) / span) as usize;
    RAMP[idx]
}

impl RenderSink for TerminalHeatmap {
    fn render(&mut self, grid: &SensorFrame, color_min: i64, color_max: i64) -> Result<()> {
        let mut buf = String::new();
        if self.ansi {
            buf.push_str(CLEAR_AND_HOME);
        }
        buf.push_str(&format!(
            "{}  [{}x{}]  scale {}..{}\n",
            self.title,
            grid.width(),
            grid.height(),
            color_min,
            color_max
        ));

        for (r, row) in grid.rows().enumerate() {
            buf.push_str(&format!("{:>3} |", r));
            for &v in row {
                let c = shade(v, color_min, color_max);
                buf.push(c);
                buf.push(c);
            }
            buf.push('|');
            if self.show_values {
                let values: Vec<String> = row.iter().map(|v| v.to_string()).collect();
                buf.push_str("  ");
                buf.push_str(&values.join(" "));
            }
            buf.push('\n');
        }

        self.out.write_all(buf.as_bytes())?;
        self.out.flush()?;
        Ok(())
    }
}
