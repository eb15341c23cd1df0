use super::{IngestSnapshot, SessionMetrics};
use std::fmt::Write;

const BAR_WIDTH: usize = 40;

/// End-of-session summary printed to the operator
pub struct SessionReport {
    metrics: SessionMetrics,
    ingest: IngestSnapshot,
}

impl SessionReport {
    pub fn new(metrics: SessionMetrics, ingest: IngestSnapshot) -> Self {
        Self { metrics, ingest }
    }

    pub fn metrics(&self) -> &SessionMetrics {
        &self.metrics
    }

    pub fn ingest(&self) -> &IngestSnapshot {
        &self.ingest
    }

    pub fn generate_report(&self) -> String {
        let m = &self.metrics;
        let i = &self.ingest;
        let mut report = String::from("===== Metrics =====\n");

        let _ = writeln!(report, "Total frames received: {}", m.total_frames);
        let _ = writeln!(
            report,
            "Average time per frame: {:.6} seconds",
            m.average_interval_secs
        );
        let _ = writeln!(
            report,
            "Frames per second: {:.2} frames/second (window {:.1}s)",
            m.frames_per_second,
            m.window.as_secs_f64()
        );

        let _ = writeln!(
            report,
            "\nMessages: {} received, {} accepted, {} ignored, {} rejected",
            i.messages_received,
            i.frames_accepted,
            i.messages_ignored,
            i.rejected()
        );
        if i.rejected() > 0 {
            let _ = writeln!(
                report,
                "  malformed: {}, invalid value: {}, shape mismatch: {}",
                i.malformed_payloads, i.invalid_values, i.shape_mismatches
            );
        }
        let _ = writeln!(report, "Avg decode latency: {}μs", i.avg_decode_us);

        report.push_str(&self.render_histogram());
        report
    }

    fn render_histogram(&self) -> String {
        let hist = &self.metrics.interval_histogram;
        let mut out = format!("\nInterval distribution ({} buckets):\n", hist.bins());

        let peak = hist.counts().iter().copied().max().unwrap_or(0);
        if peak == 0 {
            out.push_str("  (no intervals recorded)\n");
            return out;
        }

        for (idx, &count) in hist.counts().iter().enumerate() {
            let (lo, hi) = hist.bucket_bounds(idx);
            let bar_len = ((count as f64 / peak as f64) * BAR_WIDTH as f64).round() as usize;
            let _ = writeln!(
                out,
                "  [{:>9.6}, {:>9.6}{} {:<width$} {}",
                lo,
                hi,
                if idx + 1 == hist.bins() { "]" } else { ")" },
                "#".repeat(bar_len),
                count,
                width = BAR_WIDTH
            );
        }
        out
    }
}
