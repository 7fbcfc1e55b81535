use crate::nba::db::{LookupCache, MemoryCache, SqliteCache};
use crate::nba::odds::OddsClient;
use crate::nba::params::Season;
use anyhow::Result;
use clap::Args;
use log::debug;
use std::time::Duration;

/// Global settings, from flags or the environment.
#[derive(Args, Debug, Clone)]
pub struct Settings {
    /// the-odds-api.com key; without it no lines are shown
    #[clap(long, env = "ODDS_API_KEY", hide_env_values = true, global = true)]
    pub odds_api_key: Option<String>,

    /// sqlite file used as the lookup cache
    #[clap(long, env = "PROPSIREN_DB", default_value = "propsiren.db", global = true)]
    pub db: String,

    /// seconds before cached rosters and odds are refetched
    #[clap(long, env = "PROPSIREN_CACHE_TTL", default_value = "900", global = true)]
    pub cache_ttl: u64,

    /// keep the cache in memory for this run only
    #[clap(long, global = true)]
    pub no_cache: bool,

    /// ESPN season year, e.g. 2024 for 2023-24
    #[clap(long, global = true)]
    pub season: Option<Season>,

    #[clap(long, default_value = "draftkings", global = true)]
    pub bookmaker: String,
}

impl Settings {
    pub fn season(&self) -> Season {
        self.season.unwrap_or_default()
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl)
    }

    pub fn open_cache(&self) -> Result<Box<dyn LookupCache>> {
        if self.no_cache {
            return Ok(Box::new(MemoryCache::new(self.ttl())));
        }
        debug!("using cache {} (ttl {}s)", self.db, self.cache_ttl);
        let cache = SqliteCache::open(&self.db, self.ttl())?;
        cache.evict_expired()?;
        Ok(Box::new(cache))
    }

    pub fn odds_client(&self) -> Option<OddsClient> {
        self.odds_api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .map(|k| OddsClient::new(k.trim(), &self.bookmaker))
    }
}
