use super::aggregate::{aggregate, AggregateResult};
use super::record::GameRecord;

/// Slider step for alternate lines.
pub const LINE_STEP: f64 = 0.5;
pub const BOUND_MARGIN: f64 = 2.0;

/// Advisory range for moving the line; `None` disables adjustment.
pub fn bounds(window: &[GameRecord]) -> Option<(f64, f64)> {
    if window.is_empty() {
        return None;
    }
    let (lo, hi) = window.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), g| {
        (lo.min(g.stat_value), hi.max(g.stat_value))
    });
    Some((lo - BOUND_MARGIN, hi + BOUND_MARGIN))
}

/// Holds the posted line and any override of it.
///
/// Nothing derived is stored here: summaries and series are recomputed from
/// the current line every time they are read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineController {
    posted: Option<f64>,
    line: Option<f64>,
}

impl LineController {
    pub fn new(posted: Option<f64>) -> Self {
        LineController { posted, line: posted }
    }

    pub fn line(&self) -> Option<f64> {
        self.line
    }

    pub fn posted(&self) -> Option<f64> {
        self.posted
    }

    /// Bounds are not enforced.
    pub fn set_line(&mut self, value: f64) {
        self.line = Some(value);
    }

    pub fn is_adjusted(&self) -> bool {
        self.line != self.posted
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AltLine {
    pub line: f64,
    pub result: AggregateResult,
}

/// Every slider position inside `bounds(window)` with its hit rate.
pub fn alt_lines(window: &[GameRecord]) -> Vec<AltLine> {
    let (lo, hi) = match bounds(window) {
        Some(b) => b,
        None => return Vec::new(),
    };
    let first = (lo / LINE_STEP).ceil() as i64;
    let last = (hi / LINE_STEP).floor() as i64;
    (first..=last)
        .map(|step| {
            let line = step as f64 * LINE_STEP;
            AltLine { line, result: aggregate(window, line) }
        })
        .collect()
}
