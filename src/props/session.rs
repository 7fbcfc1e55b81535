use super::aggregate::{aggregate, aggregate_without_line, AggregateResult};
use super::chart::{build, ChartSeries};
use super::line::{bounds, LineController};
use super::record::GameRecord;
use super::window::{select, WindowSpec};
use crate::nba::params::StatType;
use anyhow::{bail, Result};
use log::debug;

/// Selection state for one player and statistic.
#[derive(Debug, Clone, PartialEq)]
pub enum ResearchState {
    Unselected,
    PropSelected {
        stat: StatType,
    },
    WindowSelected {
        stat: StatType,
        window: WindowSpec,
    },
    DataLoaded {
        stat: StatType,
        window: WindowSpec,
        records: Vec<GameRecord>,
        line: LineController,
    },
}

/// Everything the presentation layer needs, derived on demand.
#[derive(Debug, Clone, PartialEq)]
pub struct ResearchView {
    pub stat: StatType,
    pub window_spec: WindowSpec,
    pub window: Vec<GameRecord>,
    pub line: Option<f64>,
    pub posted_line: Option<f64>,
    /// The line differs from the posted one.
    pub adjusted: bool,
    pub summary: AggregateResult,
    pub series: ChartSeries,
    pub bounds: Option<(f64, f64)>,
}

#[derive(Debug, Clone)]
pub struct ResearchSession {
    player: Option<String>,
    state: ResearchState,
}

impl Default for ResearchSession {
    fn default() -> Self {
        ResearchSession { player: None, state: ResearchState::Unselected }
    }
}

impl ResearchSession {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn state(&self) -> &ResearchState {
        &self.state
    }

    fn selection(&self) -> (Option<StatType>, Option<WindowSpec>) {
        match &self.state {
            ResearchState::Unselected => (None, None),
            ResearchState::PropSelected { stat } => (Some(*stat), None),
            ResearchState::WindowSelected { stat, window } => (Some(*stat), Some(*window)),
            ResearchState::DataLoaded { stat, window, .. } => (Some(*stat), Some(*window)),
        }
    }

    pub fn select_player(&mut self, name: &str) {
        if self.player.as_deref() == Some(name) {
            return;
        }
        debug!("player selected: {}", name);
        self.player = Some(name.to_string());
        self.state = ResearchState::Unselected;
    }

    /// Picking a different statistic discards the window and any loaded data.
    pub fn select_prop(&mut self, stat: StatType) {
        if self.selection().0 == Some(stat) {
            return;
        }
        self.state = ResearchState::PropSelected { stat };
    }

    pub fn select_window(&mut self, window: WindowSpec) -> Result<()> {
        let (stat, current) = self.selection();
        let stat = match stat {
            Some(s) => s,
            None => bail!("Please select a game and prop category."),
        };
        if current == Some(window) {
            return Ok(());
        }
        self.state = ResearchState::WindowSelected { stat, window };
        Ok(())
    }

    /// Applies fetched games if they belong to the current selection.
    ///
    /// Returns `false` for results of an outdated selection.
    pub fn load(&mut self, stat: StatType, window: WindowSpec, records: Vec<GameRecord>, posted_line: Option<f64>) -> bool {
        if self.selection() != (Some(stat), Some(window)) {
            debug!("dropping stale {} {} results", stat, window);
            return false;
        }
        self.state = ResearchState::DataLoaded {
            stat,
            window,
            records,
            line: LineController::new(posted_line),
        };
        true
    }

    pub fn set_line(&mut self, value: f64) -> Result<()> {
        if !value.is_finite() {
            bail!("line must be a finite number, got {}", value);
        }
        match &mut self.state {
            ResearchState::DataLoaded { line, .. } => {
                line.set_line(value);
                Ok(())
            }
            _ => bail!("no game data loaded to compare a line against"),
        }
    }

    pub fn view(&self) -> Option<ResearchView> {
        let (stat, window_spec, records, controller) = match &self.state {
            ResearchState::DataLoaded { stat, window, records, line } => (*stat, *window, records, line),
            _ => return None,
        };
        let window = select(records, window_spec);
        let line = controller.line();
        let summary = match line {
            Some(l) => aggregate(window, l),
            None => aggregate_without_line(window),
        };
        Some(ResearchView {
            stat,
            window_spec,
            window: window.to_vec(),
            line,
            posted_line: controller.posted(),
            adjusted: controller.is_adjusted(),
            summary,
            series: build(window, line),
            bounds: bounds(window),
        })
    }
}
