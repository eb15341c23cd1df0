use std::time::Instant;

/// One inbound delivery from the transport, before decoding
#[derive(Debug, Clone)]
pub struct RawMessage {
    pub topic: String,
    pub payload: Vec<u8>,
    /// Monotonic receive time, stamped by the transport adapter
    pub arrival: Instant,
}

impl RawMessage {
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>, arrival: Instant) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
            arrival,
        }
    }

    /// Stamp with the current instant
    pub fn now(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self::new(topic, payload, Instant::now())
    }

    /// Lossy UTF-8 view of the payload, for logging
    pub fn payload_text(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }
}

/// A fixed-shape grid of sensor readings decoded from one message.
///
/// Values are stored flat in payload order; the grid view is row-major,
/// so element `i` sits at row `i / width`, column `i % width`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorFrame {
    values: Vec<i64>,
    width: usize,
    height: usize,
}

impl SensorFrame {
    /// Returns `None` unless `values.len() == width * height`.
    pub fn from_values(values: Vec<i64>, width: usize, height: usize) -> Option<Self> {
        if width == 0 || height == 0 || values.len() != width * height {
            return None;
        }
        Some(Self {
            values,
            width,
            height,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[i64] {
        &self.values
    }

    pub fn get(&self, row: usize, col: usize) -> Option<i64> {
        if row >= self.height || col >= self.width {
            return None;
        }
        self.values.get(row * self.width + col).copied()
    }

    pub fn row(&self, row: usize) -> Option<&[i64]> {
        self.rows().nth(row)
    }

    pub fn rows(&self) -> impl Iterator<Item = &[i64]> {
        self.values.chunks(self.width)
    }

    pub fn to_rows(&self) -> Vec<Vec<i64>> {
        self.rows().map(|r| r.to_vec()).collect()
    }

    /// Color-scale range over the grid
    pub fn value_range(&self) -> (i64, i64) {
        let min = self.values.iter().copied().min().unwrap_or(0);
        let max = self.values.iter().copied().max().unwrap_or(0);
        (min, max)
    }
}
