
use crate::nba::params::*;
use crate::props::{normalize_game, GameRecord, WindowSpec};
use serde::{Serialize, Deserialize};
use serde_json::Value;
use std::time::{Duration, Instant};
use anyhow::{anyhow, Context, Result};
use log::{debug, info, warn};

const ESPN_SITE_URL: &str = "https://site.api.espn.com/apis/site/v2/sports/basketball/nba";
const ESPN_CORE_URL: &str = "https://sports.core.api.espn.com/v2/sports/basketball/leagues/nba";
const ESPN_HEADSHOT_URL: &str = "https://a.espncdn.com/i/headshots/nba/players/full";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:72.0) Gecko/20100101 Firefox/72.0";

/// Anything that can turn a URL into JSON.
pub trait JsonSource {
    fn get_json(&self, url: &str) -> Result<Value>;
}

pub trait EspnEndpoint {
    fn url(&self) -> String;
    fn send_request<S: JsonSource + ?Sized>(&self, source: &S) -> Result<Value> {
        source.get_json(&self.url())
    }
}

pub struct Scoreboard;

pub struct TeamRoster {
    pub team_id: TeamID,
}

pub struct AthleteEventLog {
    pub season: Season,
    pub athlete_id: AthleteID,
    pub page: Option<Page>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterPlayer {
    pub id: String,
    pub full_name: String,
    pub position: String,
    pub team_id: String,
    pub team_name: String,
}

#[derive(Clone)]
pub struct EspnClient {
    agent: ureq::Agent,
}

impl EspnEndpoint for Scoreboard {
    fn url(&self) -> String {
        format!("{}/scoreboard", ESPN_SITE_URL)
    }
}

impl EspnEndpoint for TeamRoster {
    fn url(&self) -> String {
        format!("{}/teams/{}/roster", ESPN_SITE_URL, self.team_id)
    }
}

impl EspnEndpoint for AthleteEventLog {
    fn url(&self) -> String {
        let base = format!("{}/seasons/{}/athletes/{}/eventlog?lang=en&region=us", ESPN_CORE_URL, self.season, self.athlete_id);
        match &self.page {
            Some(page) => format!("{}&{}", base, page),
            None => base,
        }
    }
}

impl EspnClient {
    pub fn new() -> Self {
        EspnClient {
            agent: ureq::AgentBuilder::new()
                .timeout(Duration::from_secs(10))
                .user_agent(USER_AGENT)
                .build(),
        }
    }
}

impl Default for EspnClient {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonSource for EspnClient {
    fn get_json(&self, url: &str) -> Result<Value> {
        let fetch_start = Instant::now();
        let response = self.agent.get(url)
            .set("Accept", "application/json, text/plain, */*")
            .set("Accept-Language", "en-US,en;q=0.5")
            .set("Pragma", "no-cache")
            .set("Cache-Control", "no-cache")
            .call()
            .with_context(|| format!("failed to fetch {}", url))?;
        let json: Value = response
            .into_json()
            .with_context(|| format!("invalid json from {}", url))?;
        debug!("GET {} took {:?}", url, fetch_start.elapsed());
        Ok(json)
    }
}

impl RosterPlayer {
    pub fn headshot_url(&self) -> String {
        headshot_url(&self.id)
    }
}

pub fn headshot_url(athlete_id: &str) -> String {
    format!("{}/{}.png", ESPN_HEADSHOT_URL, athlete_id)
}

/// Follow a `{"$ref": "http://..."}` link over https.
pub fn ref_url(link: &Value) -> Option<String> {
    link["$ref"].as_str().map(|u| u.replacen("http:", "https:", 1))
}

/// Active players of a roster payload.
pub fn parse_roster(team_id: &str, roster: &Value) -> Vec<RosterPlayer> {
    let team_name = roster["team"]["displayName"].as_str().unwrap_or_default().to_string();
    let athletes = match roster["athletes"].as_array() {
        Some(a) => a,
        None => return Vec::new(),
    };
    athletes
        .iter()
        .filter(|a| {
            let status = a["status"]["type"].as_str().or_else(|| a["status"]["type"]["name"].as_str());
            status.map_or(false, |s| s.eq_ignore_ascii_case("active"))
        })
        .filter_map(|a| {
            let id = a["id"].as_str()?.to_string();
            Some(RosterPlayer {
                id,
                full_name: a["fullName"].as_str().or_else(|| a["displayName"].as_str())?.to_string(),
                position: a["position"]["abbreviation"].as_str().unwrap_or_default().to_string(),
                team_id: team_id.to_string(),
                team_name: team_name.clone(),
            })
        })
        .collect()
}

/// Paged event log access.
pub trait PageSource {
    fn page_count(&self) -> Result<u32>;
    fn fetch_page(&self, page: u32) -> Result<Vec<Value>>;
}

pub struct EventLogSource<'a, S: JsonSource + ?Sized> {
    source: &'a S,
    season: Season,
    athlete_id: String,
}

impl<'a, S: JsonSource + ?Sized> EventLogSource<'a, S> {
    pub fn new(source: &'a S, season: Season, athlete_id: &str) -> Self {
        EventLogSource { source, season, athlete_id: athlete_id.to_string() }
    }

    fn endpoint(&self, page: Option<u32>) -> AthleteEventLog {
        AthleteEventLog {
            season: self.season,
            athlete_id: AthleteID::ID(self.athlete_id.clone()),
            page: page.map(Page::P),
        }
    }
}

impl<'a, S: JsonSource + ?Sized> PageSource for EventLogSource<'a, S> {
    fn page_count(&self) -> Result<u32> {
        let first = self.endpoint(None).send_request(self.source)?;
        let count = first["events"]["pageCount"].as_u64().unwrap_or(0);
        Ok(count as u32)
    }

    fn fetch_page(&self, page: u32) -> Result<Vec<Value>> {
        let json = self.endpoint(Some(page)).send_request(self.source)?;
        Ok(json["events"]["items"].as_array().cloned().unwrap_or_default())
    }
}

/// Walks event log pages from `start` down to page 1.
///
/// Each page's items are reversed, so the concatenation of everything the
/// iterator yields is most-recent-first. A failed page ends the walk after
/// yielding its error; `next_page` tells where to restart.
pub struct EventLogPages<'a, P: PageSource + ?Sized> {
    source: &'a P,
    next_page: u32,
}

impl<'a, P: PageSource + ?Sized> EventLogPages<'a, P> {
    pub fn new(source: &'a P) -> Result<Self> {
        let count = source.page_count()?;
        Ok(Self::starting_at(source, count))
    }

    pub fn starting_at(source: &'a P, page: u32) -> Self {
        EventLogPages { source, next_page: page }
    }

    pub fn next_page(&self) -> Option<u32> {
        if self.next_page == 0 {
            None
        } else {
            Some(self.next_page)
        }
    }
}

impl<'a, P: PageSource + ?Sized> Iterator for EventLogPages<'a, P> {
    type Item = Result<Vec<Value>>;

    fn next(&mut self) -> Option<Self::Item> {
        let page = self.next_page()?;
        match self.source.fetch_page(page) {
            Ok(mut items) => {
                items.reverse();
                self.next_page = page - 1;
                Some(Ok(items))
            }
            Err(e) => {
                self.next_page = 0;
                Some(Err(e.context(format!("event log page {}", page))))
            }
        }
    }
}

/// Played event log entries, most recent first, up to the window size.
pub fn recent_game_entries<P: PageSource + ?Sized>(source: &P, window: WindowSpec) -> Result<Vec<Value>> {
    let limit = window.limit();
    let mut entries = Vec::new();
    let mut pages_walked = 0;
    'pages: for page in EventLogPages::new(source)? {
        pages_walked += 1;
        for item in page? {
            if !item["played"].as_bool().unwrap_or(false) {
                continue;
            }
            entries.push(item);
            if limit.map_or(false, |n| entries.len() >= n) {
                break 'pages;
            }
        }
    }
    debug!("walked {} event log pages", pages_walked);
    if let Some(n) = limit {
        if entries.len() < n {
            warn!("only {} games found, {} requested", entries.len(), n);
        }
    }
    Ok(entries)
}

/// Resolves one event log entry into a record for `stat`.
pub fn resolve_game<S: JsonSource + ?Sized>(source: &S, entry: &Value, stat: StatType) -> Result<Option<GameRecord>> {
    let stats_url = ref_url(&entry["statistics"]).ok_or_else(|| anyhow!("event log entry without statistics link"))?;
    let event_url = ref_url(&entry["event"]).ok_or_else(|| anyhow!("event log entry without event link"))?;
    let stats = source.get_json(&stats_url)?;
    let event = source.get_json(&event_url)?;
    let record = normalize_game(&stats, &event, stat);
    if record.is_none() {
        warn!("no {} value in {}", stat, stats_url);
    }
    Ok(record)
}

/// Fetches every entry's statistics concurrently and keeps the entries' order.
pub async fn fetch_game_records<S>(source: &S, entries: Vec<Value>, stat: StatType) -> Result<Vec<GameRecord>>
where
    S: JsonSource + Clone + Send + 'static,
{
    let fetch_start = Instant::now();
    let handles: Vec<_> = entries
        .into_iter()
        .map(|entry| {
            let source = source.clone();
            tokio::task::spawn_blocking(move || resolve_game(&source, &entry, stat))
        })
        .collect();
    let mut records = Vec::with_capacity(handles.len());
    for handle in handles {
        if let Some(record) = handle.await?? {
            records.push(record);
        }
    }
    info!("loaded {} {} games in {:?}", records.len(), stat, fetch_start.elapsed());
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::sync::Arc;

    /// Canned responses keyed by URL.
    #[derive(Clone, Default)]
    struct FakeSource {
        responses: Arc<HashMap<String, Value>>,
    }

    impl JsonSource for FakeSource {
        fn get_json(&self, url: &str) -> Result<Value> {
            self.responses.get(url).cloned().ok_or_else(|| anyhow!("404 {}", url))
        }
    }

    struct FakePages {
        pages: Vec<Vec<Value>>,
        fetched: RefCell<Vec<u32>>,
    }

    impl PageSource for FakePages {
        fn page_count(&self) -> Result<u32> {
            Ok(self.pages.len() as u32)
        }

        fn fetch_page(&self, page: u32) -> Result<Vec<Value>> {
            self.fetched.borrow_mut().push(page);
            self.pages
                .get(page as usize - 1)
                .cloned()
                .ok_or_else(|| anyhow!("no page {}", page))
        }
    }

    fn entry(n: u32, played: bool) -> Value {
        json!({
            "played": played,
            "event": {"$ref": format!("http://core/events/{}", n)},
            "statistics": {"$ref": format!("http://core/events/{}/stats", n)}
        })
    }

    fn ids(entries: &[Value]) -> Vec<String> {
        entries.iter().map(|e| e["event"]["$ref"].as_str().unwrap().to_string()).collect()
    }

    // Pages are oldest first: page 1 holds games 1-3, page 2 holds 4-6, page 3 holds 7-8.
    fn season_pages() -> FakePages {
        FakePages {
            pages: vec![
                vec![entry(1, true), entry(2, true), entry(3, true)],
                vec![entry(4, true), entry(5, false), entry(6, true)],
                vec![entry(7, true), entry(8, false)],
            ],
            fetched: RefCell::new(Vec::new()),
        }
    }

    #[test]
    fn test_pages_walk_backward_most_recent_first() {
        let source = season_pages();
        let pages: Vec<Vec<Value>> = EventLogPages::new(&source).unwrap().map(|p| p.unwrap()).collect();
        assert_eq!(pages.len(), 3);
        assert_eq!(ids(&pages[0]), vec!["http://core/events/8", "http://core/events/7"]);
        assert_eq!(*source.fetched.borrow(), vec![3, 2, 1]);
    }

    #[test]
    fn test_pages_restart_from_index() {
        let source = season_pages();
        let mut pages = EventLogPages::starting_at(&source, 2);
        assert_eq!(pages.next_page(), Some(2));
        let first = pages.next().unwrap().unwrap();
        assert_eq!(ids(&first)[0], "http://core/events/6");
        assert_eq!(pages.next_page(), Some(1));
        assert!(pages.next().is_some());
        assert!(pages.next().is_none());
        assert_eq!(pages.next_page(), None);
    }

    #[test]
    fn test_failed_page_ends_walk() {
        let source = season_pages();
        let mut pages = EventLogPages::starting_at(&source, 5);
        assert!(pages.next().unwrap().is_err());
        assert!(pages.next().is_none());
    }

    #[test]
    fn test_recent_entries_skip_unplayed_and_stop_early() {
        let source = season_pages();
        let entries = recent_game_entries(&source, WindowSpec::RecentCount(3)).unwrap();
        assert_eq!(
            ids(&entries),
            vec!["http://core/events/7", "http://core/events/6", "http://core/events/4"]
        );
        assert_eq!(*source.fetched.borrow(), vec![3, 2]);
    }

    #[test]
    fn test_recent_entries_short_history() {
        let source = season_pages();
        let entries = recent_game_entries(&source, WindowSpec::RecentCount(20)).unwrap();
        assert_eq!(entries.len(), 6);
        let season = recent_game_entries(&season_pages(), WindowSpec::FullSeason).unwrap();
        assert_eq!(season.len(), 6);
    }

    #[test]
    fn test_event_log_urls() {
        let log = AthleteEventLog {
            season: Season::S(2024),
            athlete_id: AthleteID::ID("3112335".to_string()),
            page: Some(Page::P(2)),
        };
        assert_eq!(
            log.url(),
            "https://sports.core.api.espn.com/v2/sports/basketball/leagues/nba/seasons/2024/athletes/3112335/eventlog?lang=en&region=us&page=2"
        );
        let roster = TeamRoster { team_id: TeamID::ID("7".to_string()) };
        assert_eq!(roster.url(), "https://site.api.espn.com/apis/site/v2/sports/basketball/nba/teams/7/roster");
    }

    #[test]
    fn test_event_log_source_reads_pages() {
        let base = "https://sports.core.api.espn.com/v2/sports/basketball/leagues/nba/seasons/2024/athletes/42/eventlog?lang=en&region=us";
        let mut responses = HashMap::new();
        responses.insert(base.to_string(), json!({"events": {"pageCount": 2, "pageSize": 25}}));
        responses.insert(format!("{}&page=2", base), json!({"events": {"items": [entry(1, true), entry(2, true)]}}));
        let fake = FakeSource { responses: Arc::new(responses) };
        let log = EventLogSource::new(&fake, Season::S(2024), "42");
        assert_eq!(log.page_count().unwrap(), 2);
        assert_eq!(log.fetch_page(2).unwrap().len(), 2);
        assert!(log.fetch_page(1).is_err());
    }

    #[test]
    fn test_parse_roster_keeps_active_players() {
        let roster = json!({
            "team": {"displayName": "Denver Nuggets"},
            "athletes": [
                {"id": "3112335", "fullName": "Nikola Jokic", "position": {"abbreviation": "C"}, "status": {"type": "active"}},
                {"id": "1", "fullName": "Injured Guy", "position": {"abbreviation": "G"}, "status": {"type": "inactive"}},
                {"id": "3936299", "fullName": "Jamal Murray", "position": {"abbreviation": "PG"}, "status": {"type": "active"}}
            ]
        });
        let players = parse_roster("7", &roster);
        assert_eq!(players.len(), 2);
        assert_eq!(players[0].full_name, "Nikola Jokic");
        assert_eq!(players[0].team_name, "Denver Nuggets");
        assert_eq!(players[1].position, "PG");
        assert_eq!(
            players[0].headshot_url(),
            "https://a.espncdn.com/i/headshots/nba/players/full/3112335.png"
        );
        assert!(parse_roster("7", &json!({})).is_empty());
    }

    #[test]
    fn test_ref_url_upgrades_scheme() {
        assert_eq!(
            ref_url(&json!({"$ref": "http://sports.core.api.espn.com/v2/x?lang=en"})),
            Some("https://sports.core.api.espn.com/v2/x?lang=en".to_string())
        );
        assert_eq!(ref_url(&json!({})), None);
    }

    fn game_source() -> FakeSource {
        let mut responses = HashMap::new();
        for (n, pts) in [(7u32, 31.0), (6, 18.0), (4, 25.0)].iter() {
            responses.insert(
                format!("https://core/events/{}/stats", n),
                json!({"splits": {"categories": [
                    {"name": "defensive", "stats": []},
                    {"name": "general", "stats": []},
                    {"name": "offensive", "stats": [{"shortDisplayName": "PTS", "value": pts}]}
                ]}}),
            );
            responses.insert(
                format!("https://core/events/{}", n),
                json!({"shortName": format!("DEN @ G{}", n), "date": format!("2024-01-{:02}T01:00Z", n)}),
            );
        }
        FakeSource { responses: Arc::new(responses) }
    }

    #[tokio::test]
    async fn test_fetch_game_records_keeps_order() {
        let entries = vec![entry(7, true), entry(6, true), entry(4, true)];
        let records = fetch_game_records(&game_source(), entries, StatType::Points).await.unwrap();
        let values: Vec<f64> = records.iter().map(|r| r.stat_value).collect();
        assert_eq!(values, vec![31.0, 18.0, 25.0]);
        assert_eq!(records[0].category(), "DEN @ G7 (1/7)");
    }

    #[tokio::test]
    async fn test_fetch_game_records_skips_missing_stat() {
        let entries = vec![entry(7, true)];
        let records = fetch_game_records(&game_source(), entries, StatType::Rebounds).await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_game_records_propagates_fetch_errors() {
        let entries = vec![entry(99, true)];
        assert!(fetch_game_records(&game_source(), entries, StatType::Points).await.is_err());
    }
}
