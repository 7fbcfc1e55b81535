
use crate::nba::odds::OddsEvent;
use chrono::DateTime;
use serde_json::Value;
use tabled::{Tabled, Table};

pub const NO_UPCOMING_GAMES: &str = "No currently available games, please check back later!";

#[derive(Debug, Clone, PartialEq)]
pub struct TeamSide {
    pub id: String,
    pub name: String,
    pub abbreviation: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpcomingGame {
    pub id: String,
    pub name: String,
    pub date: String,
    pub home: TeamSide,
    pub away: TeamSide,
    pub odds_event_id: Option<String>,
}

#[derive(Tabled)]
struct MatchupRow {
    side: &'static str,
    team: String,
    abbreviation: String,
    team_id: String,
}

fn extract_team_side(competitor: &Value) -> TeamSide {
    let team = &competitor["team"];
    TeamSide {
        id: team["id"].as_str().unwrap_or_default().to_string(),
        name: team["displayName"].as_str().unwrap_or_default().to_string(),
        abbreviation: team["abbreviation"].as_str().unwrap_or_default().to_string(),
    }
}

/// First scoreboard event that has not been completed.
pub fn find_upcoming_game(scoreboard: &Value) -> Option<UpcomingGame> {
    let event = scoreboard["events"]
        .as_array()?
        .iter()
        .find(|e| e["status"]["type"]["completed"].as_bool() == Some(false))?;
    let competitors = event["competitions"][0]["competitors"].as_array()?;
    let by_side = |side: &str, fallback: usize| {
        competitors
            .iter()
            .find(|c| c["homeAway"].as_str() == Some(side))
            .or_else(|| competitors.get(fallback))
            .map(extract_team_side)
    };
    Some(UpcomingGame {
        id: event["id"].as_str().unwrap_or_default().to_string(),
        name: event["name"].as_str().unwrap_or_default().to_string(),
        date: event["date"].as_str().unwrap_or_default().to_string(),
        home: by_side("home", 0)?,
        away: by_side("away", 1)?,
        odds_event_id: None,
    })
}

/// Odds event for the same home and away teams.
pub fn match_odds_event<'a>(game: &UpcomingGame, events: &'a [OddsEvent]) -> Option<&'a OddsEvent> {
    events
        .iter()
        .find(|e| e.home_team == game.home.name && e.away_team == game.away.name)
}

pub fn format_tipoff(raw: &str) -> String {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(d) => d.format("%a %b %-d %H:%M UTC").to_string(),
        Err(_) => match chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%MZ") {
            Ok(d) => d.format("%a %b %-d %H:%M UTC").to_string(),
            Err(_) => raw.to_string(),
        },
    }
}

impl UpcomingGame {
    pub fn team_ids(&self) -> Vec<String> {
        vec![self.home.id.clone(), self.away.id.clone()]
    }

    pub fn render(&self) -> String {
        let rows = vec![
            MatchupRow {
                side: "Home",
                team: self.home.name.clone(),
                abbreviation: self.home.abbreviation.clone(),
                team_id: self.home.id.clone(),
            },
            MatchupRow {
                side: "Away",
                team: self.away.name.clone(),
                abbreviation: self.away.abbreviation.clone(),
                team_id: self.away.id.clone(),
            },
        ];
        let odds = self.odds_event_id.as_deref().unwrap_or("none");
        format!(
            "{}\n{}\nodds event: {}\n{}\n",
            self.name,
            format_tipoff(&self.date),
            odds,
            Table::new(rows).to_string()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scoreboard() -> Value {
        json!({
            "events": [
                {
                    "id": "401",
                    "name": "Boston Celtics at New York Knicks",
                    "date": "2024-01-14T17:00Z",
                    "status": {"type": {"completed": true}},
                    "competitions": [{"competitors": []}]
                },
                {
                    "id": "402",
                    "name": "Los Angeles Lakers at Denver Nuggets",
                    "date": "2024-01-15T02:00Z",
                    "status": {"type": {"completed": false}},
                    "competitions": [{"competitors": [
                        {"homeAway": "away", "team": {"id": "13", "displayName": "Los Angeles Lakers", "abbreviation": "LAL"}},
                        {"homeAway": "home", "team": {"id": "7", "displayName": "Denver Nuggets", "abbreviation": "DEN"}}
                    ]}]
                }
            ]
        })
    }

    #[test]
    fn test_find_upcoming_game() {
        let game = find_upcoming_game(&scoreboard()).unwrap();
        assert_eq!(game.id, "402");
        assert_eq!(game.home.name, "Denver Nuggets");
        assert_eq!(game.away.abbreviation, "LAL");
        assert_eq!(game.team_ids(), vec!["7".to_string(), "13".to_string()]);
    }

    #[test]
    fn test_no_upcoming_game() {
        assert!(find_upcoming_game(&json!({"events": []})).is_none());
        assert!(find_upcoming_game(&json!({})).is_none());
    }

    #[test]
    fn test_match_odds_event() {
        let game = find_upcoming_game(&scoreboard()).unwrap();
        let events = vec![
            OddsEvent {
                id: "x".to_string(),
                home_team: "Los Angeles Lakers".to_string(),
                away_team: "Denver Nuggets".to_string(),
            },
            OddsEvent {
                id: "y".to_string(),
                home_team: "Denver Nuggets".to_string(),
                away_team: "Los Angeles Lakers".to_string(),
            },
        ];
        assert_eq!(match_odds_event(&game, &events).map(|e| e.id.as_str()), Some("y"));
        assert!(match_odds_event(&game, &events[..1]).is_none());
    }

    #[test]
    fn test_render_game() {
        let mut game = find_upcoming_game(&scoreboard()).unwrap();
        game.odds_event_id = Some("y".to_string());
        let out = game.render();
        assert!(out.starts_with("Los Angeles Lakers at Denver Nuggets\n"));
        assert!(out.contains("Mon Jan 15 02:00 UTC"));
        assert!(out.contains("odds event: y"));
        assert!(out.contains("Denver Nuggets"));
    }
}
