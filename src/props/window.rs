use super::record::GameRecord;
use anyhow::{anyhow, bail, Result};
use std::fmt;
use std::str::FromStr;

/// Which part of a player's history is analysed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowSpec {
    RecentCount(usize),
    FullSeason,
}

impl WindowSpec {
    /// Number of games wanted, `None` for the whole season.
    pub fn limit(&self) -> Option<usize> {
        match self {
            WindowSpec::RecentCount(n) => Some(*n),
            WindowSpec::FullSeason => None,
        }
    }
}

/// The active split of a most-recent-first sequence.
///
/// Asking for more games than exist yields everything available.
pub fn select(records: &[GameRecord], spec: WindowSpec) -> &[GameRecord] {
    match spec {
        WindowSpec::FullSeason => records,
        WindowSpec::RecentCount(n) => &records[..n.min(records.len())],
    }
}

impl FromStr for WindowSpec {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("season") || s.eq_ignore_ascii_case("full") {
            return Ok(WindowSpec::FullSeason);
        }
        // The season buttons are labelled with the season year.
        if s.len() == 4 && s.chars().all(|c| c.is_ascii_digit()) {
            return Ok(WindowSpec::FullSeason);
        }
        let count = s
            .strip_prefix('L')
            .or_else(|| s.strip_prefix('l'))
            .ok_or_else(|| anyhow!("invalid window '{}', expected L5, L10, L15, L20 or season", s))?;
        let n: usize = count
            .parse()
            .map_err(|_| anyhow!("invalid game count in window '{}'", s))?;
        if n == 0 {
            bail!("window '{}' must cover at least one game", s);
        }
        Ok(WindowSpec::RecentCount(n))
    }
}

impl fmt::Display for WindowSpec {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            WindowSpec::RecentCount(n) => write!(f, "L{}", n),
            WindowSpec::FullSeason => write!(f, "Season"),
        }
    }
}
