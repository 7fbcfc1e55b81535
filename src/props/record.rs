use crate::nba::params::{StatCategory, StatComponent, StatType};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Datelike};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One completed, played game reduced to the value of the selected prop.
///
/// Sequences of records are always most-recent-first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    pub label: String,
    pub stat_value: f64,
    pub date: String,
}

impl GameRecord {
    pub fn new(label: impl Into<String>, stat_value: f64, date: impl Into<String>) -> Self {
        GameRecord {
            label: label.into(),
            stat_value,
            date: date.into(),
        }
    }

    /// Chart category, e.g. `LAL @ DEN (1/15)`.
    pub fn category(&self) -> String {
        if self.date.is_empty() {
            return self.label.clone();
        }
        format!("{} ({})", self.label, self.date)
    }
}

/// Build a record from a game's statistics payload and its event payload.
///
/// Returns `None` when the statistic cannot be read at all.
pub fn normalize_game(stats: &Value, event: &Value, stat: StatType) -> Option<GameRecord> {
    let stat_value = stat_value(stats, stat)?;
    let label = event["shortName"]
        .as_str()
        .or_else(|| event["name"].as_str())
        .unwrap_or_default();
    let date = event["date"].as_str().map(format_game_date).unwrap_or_default();
    Some(GameRecord::new(label, stat_value, date))
}

/// Single props need their statistic present; composites count a missing part as 0.
pub fn stat_value(stats: &Value, stat: StatType) -> Option<f64> {
    let categories = stats["splits"]["categories"].as_array()?;
    if stat.is_composite() {
        let total = stat
            .components()
            .iter()
            .map(|c| component_value(categories, *c).unwrap_or(0.0))
            .sum();
        Some(total)
    } else {
        component_value(categories, stat.components()[0])
    }
}

fn find_category(categories: &[Value], category: StatCategory) -> Option<&Value> {
    categories
        .iter()
        .find(|c| c["name"].as_str() == Some(category.name()))
        .or_else(|| categories.get(category.position()))
}

fn component_value(categories: &[Value], component: StatComponent) -> Option<f64> {
    let stats = find_category(categories, component.category())?["stats"].as_array()?;
    let entry = stats
        .iter()
        .find(|s| s["shortDisplayName"].as_str() == Some(component.abbreviation()))?;
    entry["value"]
        .as_f64()
        .or_else(|| entry["displayValue"].as_str().and_then(|v| v.trim().parse::<f64>().ok()))
}

/// `2024-01-15T00:30Z` -> `1/15`. Unparseable dates are passed through.
pub fn format_game_date(raw: &str) -> String {
    let date = DateTime::parse_from_rfc3339(raw)
        .map(|d| d.naive_utc().date())
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%MZ").map(|d| d.date()))
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"));
    match date {
        Ok(d) => format!("{}/{}", d.month(), d.day()),
        Err(_) => raw.to_string(),
    }
}
