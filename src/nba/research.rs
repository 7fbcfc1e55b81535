use crate::nba::db::{cached_json, LookupCache};
use crate::nba::endpoints::{
    fetch_game_records, parse_roster, recent_game_entries, EspnClient, EspnEndpoint, EventLogSource, RosterPlayer,
    Scoreboard, TeamRoster,
};
use crate::nba::live_data::{find_upcoming_game, match_odds_event, UpcomingGame};
use crate::nba::odds::{format_american, parse_events, MarketOdds, OddsClient, PlayerLine};
use crate::nba::params::{Season, StatType, TeamID};
use crate::props::chart::format_stat;
use crate::props::line::alt_lines;
use crate::props::{GameRecord, ResearchView, WindowSpec};
use anyhow::Result;
use log::{info, warn};
use tabled::{Table, Tabled};

/// ESPN numbers its NBA franchises 1 through 30.
pub const ALL_TEAM_IDS: std::ops::RangeInclusive<u32> = 1..=30;

pub struct Researcher<'a> {
    espn: EspnClient,
    odds: Option<OddsClient>,
    cache: &'a dyn LookupCache,
    season: Season,
}

#[derive(Tabled)]
struct PlayerRow {
    team: String,
    player: String,
    position: String,
    athlete_id: String,
    line: String,
    over: String,
    under: String,
}

#[derive(Tabled)]
struct SummaryRow {
    split: String,
    line: String,
    hit_rate: String,
    hits: String,
    avg: String,
}

#[derive(Tabled)]
struct AltLineRow {
    alt_line: String,
    hit_rate: String,
    hits: String,
}

impl<'a> Researcher<'a> {
    pub fn new(espn: EspnClient, odds: Option<OddsClient>, cache: &'a dyn LookupCache, season: Season) -> Self {
        Researcher { espn, odds, cache, season }
    }

    /// The next game that has a matching odds event, if any.
    pub fn upcoming_game(&self) -> Result<Option<UpcomingGame>> {
        let scoreboard = Scoreboard.send_request(&self.espn)?;
        let mut game = match find_upcoming_game(&scoreboard) {
            Some(g) => g,
            None => return Ok(None),
        };
        info!("upcoming game: {}", game.name);
        let odds = match &self.odds {
            Some(o) => o,
            None => {
                warn!("no odds api key configured, lines unavailable");
                return Ok(Some(game));
            }
        };
        let events = match cached_json(self.cache, "odds_events", || odds.events_json()).and_then(|j| parse_events(&j)) {
            Ok(events) => events,
            Err(e) => {
                warn!("odds events unavailable: {:#}", e);
                Vec::new()
            }
        };
        match match_odds_event(&game, &events) {
            Some(event) => {
                game.odds_event_id = Some(event.id.clone());
                Ok(Some(game))
            }
            None => Ok(None),
        }
    }

    /// Active players of one team.
    pub fn team_roster(&self, team_id: &str) -> Result<Vec<RosterPlayer>> {
        let key = format!("roster:{}", team_id);
        let cached = cached_json(self.cache, &key, || {
            let roster = TeamRoster { team_id: TeamID::ID(team_id.to_string()) }.send_request(&self.espn)?;
            Ok(serde_json::to_value(parse_roster(team_id, &roster))?)
        })?;
        Ok(serde_json::from_value(cached)?)
    }

    /// Case-insensitive full-name lookup, searching `preferred_teams` before the whole league.
    pub fn find_player(&self, name: &str, preferred_teams: &[String]) -> Result<Option<RosterPlayer>> {
        let league: Vec<String> = ALL_TEAM_IDS.map(|id| id.to_string()).collect();
        let rest = league.iter().filter(|id| !preferred_teams.contains(id));
        for team_id in preferred_teams.iter().chain(rest) {
            let roster = self.team_roster(team_id)?;
            if let Some(player) = find_in_roster(&roster, name) {
                return Ok(Some(player.clone()));
            }
        }
        Ok(None)
    }

    /// Prop markets for an odds event; any failure degrades to no odds.
    pub fn market_odds(&self, event_id: &str) -> MarketOdds {
        let odds = match &self.odds {
            Some(o) => o,
            None => return MarketOdds::default(),
        };
        let key = format!("market_odds:{}:{}", odds.bookmaker(), event_id);
        let fetched = cached_json(self.cache, &key, || {
            let json = odds.event_odds_json(event_id)?;
            Ok(serde_json::to_value(MarketOdds::from_event_odds(&json, odds.bookmaker())?)?)
        })
        .and_then(|v| Ok(serde_json::from_value::<MarketOdds>(v)?));
        match fetched {
            Ok(m) => {
                if m.is_empty() {
                    info!("{} has no player props posted for event {}", odds.bookmaker(), event_id);
                }
                m
            }
            Err(e) => {
                warn!("player odds unavailable: {:#}", e);
                MarketOdds::default()
            }
        }
    }

    /// Most-recent-first records of `stat` for the requested window.
    pub async fn game_log(&self, player: &RosterPlayer, stat: StatType, window: WindowSpec) -> Result<Vec<GameRecord>> {
        let log = EventLogSource::new(&self.espn, self.season, &player.id);
        let entries = recent_game_entries(&log, window)?;
        info!("{} played games found for {}", entries.len(), player.full_name);
        fetch_game_records(&self.espn, entries, stat).await
    }
}

pub fn find_in_roster<'r>(roster: &'r [RosterPlayer], name: &str) -> Option<&'r RosterPlayer> {
    roster
        .iter()
        .find(|p| p.full_name.trim().eq_ignore_ascii_case(name.trim()))
}

/// Players carrying odds for `stat`, or everybody when no prop is chosen.
pub fn players_with_odds<'r>(players: &'r [RosterPlayer], odds: &MarketOdds, stat: Option<StatType>) -> Vec<&'r RosterPlayer> {
    match stat {
        Some(s) => players.iter().filter(|p| odds.has_line(s, &p.full_name)).collect(),
        None => players.iter().collect(),
    }
}

fn line_cells(line: Option<&PlayerLine>) -> (String, String, String) {
    match line {
        Some(l) => (
            l.point.map(format_stat).unwrap_or_else(|| "-".to_string()),
            l.over_price.map(|p| format!("O {}", format_american(p))).unwrap_or_else(|| "-".to_string()),
            l.under_price.map(|p| format!("U {}", format_american(p))).unwrap_or_else(|| "-".to_string()),
        ),
        None => ("-".to_string(), "-".to_string(), "-".to_string()),
    }
}

pub fn render_roster(players: &[&RosterPlayer], odds: &MarketOdds, stat: Option<StatType>) -> String {
    let rows: Vec<PlayerRow> = players
        .iter()
        .map(|p| {
            let line = stat.and_then(|s| odds.player_line(s, &p.full_name));
            let (line, over, under) = line_cells(line.as_ref());
            PlayerRow {
                team: p.team_name.clone(),
                player: p.full_name.clone(),
                position: p.position.clone(),
                athlete_id: p.id.clone(),
                line,
                over,
                under,
            }
        })
        .collect();
    Table::new(rows).to_string()
}

/// Header, chart and summary table for one research view.
pub fn render_research(player: &RosterPlayer, view: &ResearchView, line: Option<&PlayerLine>, ansi: bool) -> String {
    let (posted, over, under) = line_cells(line);
    let mut out = format!(
        "{} ({}, {})  {} {}  {}  {}\n\n",
        player.full_name, player.position, player.team_name, posted, view.stat, over, under
    );
    out.push_str(&view.series.render(40, ansi));
    out.push('\n');
    if let Some((lo, hi)) = view.bounds {
        out.push_str(&format!("alt lines: {} to {}\n", format_stat(lo), format_stat(hi)));
    }
    let summary = SummaryRow {
        split: view.window_spec.to_string(),
        line: match view.line {
            Some(l) if view.adjusted => match view.posted_line {
                Some(p) => format!("{} (adjusted from {})", format_stat(l), format_stat(p)),
                None => format!("{} (adjusted)", format_stat(l)),
            },
            Some(l) => format_stat(l),
            None => "-".to_string(),
        },
        hit_rate: format!("{:.1}%", view.summary.hit_rate),
        hits: view.summary.hits_label(),
        avg: format!("{:.1}", view.summary.average),
    };
    out.push_str(&Table::new(vec![summary]).to_string());
    out.push('\n');
    out
}

pub fn render_alt_lines(view: &ResearchView) -> String {
    let rows: Vec<AltLineRow> = alt_lines(&view.window)
        .into_iter()
        .map(|alt| AltLineRow {
            alt_line: format_stat(alt.line),
            hit_rate: format!("{:.1}%", alt.result.hit_rate),
            hits: alt.result.hits_label(),
        })
        .collect();
    if rows.is_empty() {
        return String::from("no games to build alt lines from\n");
    }
    format!("{}\n", Table::new(rows))
}
