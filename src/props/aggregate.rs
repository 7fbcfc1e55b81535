use super::record::GameRecord;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct AggregateResult {
    /// Percentage in `[0, 100]`.
    pub hit_rate: f64,
    pub average: f64,
    pub hits_count: usize,
    pub sample_size: usize,
}

/// A tie with the line counts as a hit.
pub fn is_hit(value: f64, line: f64) -> bool {
    value >= line
}

pub fn aggregate(window: &[GameRecord], line: f64) -> AggregateResult {
    if window.is_empty() {
        return AggregateResult::default();
    }
    let sample_size = window.len();
    let hits_count = window.iter().filter(|g| is_hit(g.stat_value, line)).count();
    AggregateResult {
        hit_rate: 100.0 * hits_count as f64 / sample_size as f64,
        average: average(window),
        hits_count,
        sample_size,
    }
}

/// Summary for a window with no line to compare against.
pub fn aggregate_without_line(window: &[GameRecord]) -> AggregateResult {
    AggregateResult {
        average: average(window),
        sample_size: window.len(),
        ..AggregateResult::default()
    }
}

pub fn average(window: &[GameRecord]) -> f64 {
    if window.is_empty() {
        return 0.0;
    }
    window.iter().map(|g| g.stat_value).sum::<f64>() / window.len() as f64
}

impl AggregateResult {
    pub fn hits_label(&self) -> String {
        format!("{}/{}", self.hits_count, self.sample_size)
    }
}

impl fmt::Display for AggregateResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:.1}% ({}) avg {:.1}", self.hit_rate, self.hits_label(), self.average)
    }
}
