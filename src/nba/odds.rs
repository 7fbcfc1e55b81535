use crate::nba::params::StatType;
use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::time::{Duration, Instant};

const ODDS_BASE_URL: &str = "https://api.the-odds-api.com/v4/sports/basketball_nba";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OddsEvent {
    pub id: String,
    pub home_team: String,
    pub away_team: String,
}

/// One side of a player prop: `name` is Over/Under, `description` the player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: f64,
    #[serde(default)]
    pub point: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct EventOdds {
    #[serde(default)]
    bookmakers: Vec<Bookmaker>,
}

#[derive(Debug, Deserialize)]
struct Bookmaker {
    key: String,
    #[serde(default)]
    markets: Vec<Market>,
}

#[derive(Debug, Deserialize)]
struct Market {
    key: String,
    #[serde(default)]
    outcomes: Vec<Outcome>,
}

/// Outcomes per market key for one bookmaker and one event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketOdds {
    markets: HashMap<String, Vec<Outcome>>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerLine {
    pub point: Option<f64>,
    pub over_price: Option<f64>,
    pub under_price: Option<f64>,
}

pub struct OddsClient {
    agent: ureq::Agent,
    api_key: String,
    bookmaker: String,
}

impl MarketOdds {
    /// Picks `bookmaker` out of an event odds payload; absent bookmaker means no odds.
    pub fn from_event_odds(json: &Value, bookmaker: &str) -> Result<Self> {
        let event: EventOdds = serde_json::from_value(json.clone()).context("unexpected event odds payload")?;
        let markets = event
            .bookmakers
            .into_iter()
            .find(|b| b.key == bookmaker)
            .map(|b| b.markets.into_iter().map(|m| (m.key, m.outcomes)).collect())
            .unwrap_or_default();
        Ok(MarketOdds { markets })
    }

    pub fn is_empty(&self) -> bool {
        self.markets.is_empty()
    }

    pub fn outcomes(&self, stat: StatType) -> &[Outcome] {
        self.markets.get(stat.market()).map(|o| o.as_slice()).unwrap_or(&[])
    }

    pub fn player_line(&self, stat: StatType, player: &str) -> Option<PlayerLine> {
        let offers: Vec<&Outcome> = self
            .outcomes(stat)
            .iter()
            .filter(|o| o.description.as_deref().map_or(false, |d| same_player(d, player)))
            .collect();
        if offers.is_empty() {
            return None;
        }
        let price_for = |side: &str| offers.iter().find(|o| o.name.eq_ignore_ascii_case(side)).map(|o| o.price);
        Some(PlayerLine {
            point: offers[0].point,
            over_price: price_for("Over"),
            under_price: price_for("Under"),
        })
    }

    pub fn has_line(&self, stat: StatType, player: &str) -> bool {
        self.player_line(stat, player).is_some()
    }
}

fn same_player(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

/// American odds with an explicit sign, `-110` / `+150`.
pub fn format_american(price: f64) -> String {
    format!("{:+}", price.round() as i64)
}

impl OddsClient {
    pub fn new(api_key: &str, bookmaker: &str) -> Self {
        OddsClient {
            agent: ureq::AgentBuilder::new().timeout(Duration::from_secs(10)).build(),
            api_key: api_key.to_string(),
            bookmaker: bookmaker.to_string(),
        }
    }

    pub fn bookmaker(&self) -> &str {
        &self.bookmaker
    }

    fn fetch(&self, path: &str, query: &[(&str, &str)]) -> Result<Value> {
        let url = format!("{}{}", ODDS_BASE_URL, path);
        let fetch_start = Instant::now();
        let mut request = self.agent.get(&url).query("apiKey", &self.api_key);
        for (k, v) in query {
            request = request.query(k, v);
        }
        let json: Value = request
            .call()
            .with_context(|| format!("odds request {} failed", url))?
            .into_json()
            .with_context(|| format!("invalid json from {}", url))?;
        debug!("GET {} took {:?}", url, fetch_start.elapsed());
        Ok(json)
    }

    pub fn events_json(&self) -> Result<Value> {
        self.fetch("/events", &[])
    }

    /// Every prop market for one event, in a single request.
    pub fn event_odds_json(&self, event_id: &str) -> Result<Value> {
        let markets = StatType::all_markets();
        self.fetch(
            &format!("/events/{}/odds", event_id),
            &[
                ("regions", "us"),
                ("markets", markets.as_str()),
                ("dateFormat", "iso"),
                ("oddsFormat", "american"),
                ("bookmakers", self.bookmaker.as_str()),
            ],
        )
    }
}

pub fn parse_events(json: &Value) -> Result<Vec<OddsEvent>> {
    serde_json::from_value(json.clone()).context("unexpected odds events payload")
}
