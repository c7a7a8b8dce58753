//! Metric names recorded by the UI core

use metrics::counter;

/// Counters for the builder and the mapping panels.
pub struct UiMetrics;

impl UiMetrics {
    pub fn preview_recomputed() {
        counter!("perseus_preview_recomputed_total").increment(1);
    }

    pub fn link_recorded(area: &str) {
        counter!("perseus_row_links_recorded_total", "area" => area.to_string()).increment(1);
    }

    pub fn links_cleared(count: usize) {
        counter!("perseus_row_links_cleared_total").increment(count as u64);
    }
}
