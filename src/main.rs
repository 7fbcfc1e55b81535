mod config;
mod nba;
mod props;

use anyhow::{anyhow, ensure, Result};
use clap::{Parser, Subcommand};
use config::Settings;
use log::info;
use nba::endpoints::{EspnClient, RosterPlayer};
use nba::live_data::{UpcomingGame, NO_UPCOMING_GAMES};
use nba::odds::MarketOdds;
use nba::params::StatType;
use nba::research::{players_with_odds, render_alt_lines, render_research, render_roster, Researcher};
use props::{ResearchSession, WindowSpec};

#[derive(Parser, Debug)]
#[clap(author, version, about = "NBA player prop research", long_about = None)]
struct PropCli {
    #[clap(flatten)]
    settings: Settings,

    #[clap(subcommand)]
    cmd: Commands
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Next game with a sportsbook event
    Games,
    /// Active players of both teams in the next game
    Roster {
        /// only players with a line for this prop
        #[clap(short, long)]
        prop: Option<StatType>,
    },
    /// ESPN athlete id for a player name
    Lookup {
        player_name: String,
    },
    /// Recent games against the betting line
    Research {
        player_name: String,

        #[clap(short, long)]
        prop: StatType,

        /// L5, L10, L15, L20 or season
        #[clap(short, long, default_value = "L10")]
        games: WindowSpec,

        /// override the posted line
        #[clap(short, long)]
        line: Option<f64>,

        /// hit rate at every alternate line
        #[clap(long)]
        alt_lines: bool,

        #[clap(long)]
        no_color: bool,
    },
    /// Open a player's headshot in the browser
    Headshot {
        player_name: String,
    },
    Cache {
        #[clap(subcommand)]
        action: CacheAction,
    },
}

#[derive(Debug, Subcommand)]
enum CacheAction {
    /// Drop every cached entry
    Clear,
    /// Drop expired entries only
    Purge,
}

fn team_ids(game: Option<&UpcomingGame>) -> Vec<String> {
    game.map(|g| g.team_ids()).unwrap_or_default()
}

fn resolve_player(researcher: &Researcher, name: &str, game: Option<&UpcomingGame>) -> Result<RosterPlayer> {
    researcher
        .find_player(name, &team_ids(game))?
        .ok_or_else(|| anyhow!("Player not found: {}", name))
}

async fn run(args: PropCli) -> Result<()> {
    let settings = args.settings;
    let cache = settings.open_cache()?;
    let researcher = Researcher::new(EspnClient::new(), settings.odds_client(), cache.as_ref(), settings.season());

    match args.cmd {
        Commands::Games => {
            match researcher.upcoming_game()? {
                Some(game) => print!("{}", game.render()),
                None => println!("{}", NO_UPCOMING_GAMES),
            }
        }
        Commands::Roster { prop } => {
            let game = match researcher.upcoming_game()? {
                Some(g) => g,
                None => {
                    println!("{}", NO_UPCOMING_GAMES);
                    return Ok(());
                }
            };
            let odds = match &game.odds_event_id {
                Some(id) => researcher.market_odds(id),
                None => MarketOdds::default(),
            };
            for team_id in game.team_ids() {
                let roster = researcher.team_roster(&team_id)?;
                let listed = players_with_odds(&roster, &odds, prop);
                println!("{}", render_roster(&listed, &odds, prop));
            }
        }
        Commands::Lookup { player_name } => {
            match researcher.find_player(&player_name, &[])? {
                Some(p) => println!("{}: {} ({}, {})", p.full_name, p.id, p.position, p.team_name),
                None => println!("No player found for {}", player_name),
            }
        }
        Commands::Headshot { player_name } => {
            let player = resolve_player(&researcher, &player_name, None)?;
            let url = player.headshot_url();
            webbrowser::open(&url)?;
            println!("{}", url);
        }
        Commands::Research { player_name, prop, games, line, alt_lines, no_color } => {
            let game = researcher.upcoming_game()?;
            if game.is_none() {
                println!("{}", NO_UPCOMING_GAMES);
            }
            let player = resolve_player(&researcher, &player_name, game.as_ref())?;

            let mut session = ResearchSession::new();
            session.select_player(&player.full_name);
            session.select_prop(prop);
            session.select_window(games)?;

            let odds = match game.as_ref().and_then(|g| g.odds_event_id.as_deref()) {
                Some(id) => researcher.market_odds(id),
                None => MarketOdds::default(),
            };
            let player_line = odds.player_line(prop, &player.full_name);
            if player_line.is_none() {
                info!("no {} line posted for {}", prop, player.full_name);
            }

            let records = researcher.game_log(&player, prop, games).await?;
            let applied = session.load(prop, games, records, player_line.and_then(|l| l.point));
            ensure!(applied, "loaded games do not match the {} {} selection", prop, games);
            if let Some(l) = line {
                session.set_line(l)?;
            }
            let view = session
                .view()
                .ok_or_else(|| anyhow!("no game data loaded for {}", player.full_name))?;
            print!("{}", render_research(&player, &view, player_line.as_ref(), !no_color));
            if alt_lines {
                print!("{}", render_alt_lines(&view));
            }
        }
        Commands::Cache { action } => {
            let removed = match action {
                CacheAction::Clear => cache.clear()?,
                CacheAction::Purge => cache.evict_expired()?,
            };
            println!("removed {} cache entries", removed);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    pretty_env_logger::init();
    let args = PropCli::parse();
    if let Err(e) = run(args).await {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}
