use std::time::Duration;

use chrono::{FixedOffset, Offset, Utc};
use serde::Deserialize;

use crate::tracker::poller::PollerSettings;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub telegram_bot_token: String,
    pub telegram_api_url: String,
    pub solana_rpc_url: String,
    pub rpc_timeout_secs: u64,
    pub poll_interval_secs: u64,
    pub signature_limit: usize,
    pub cache_ttl_secs: u64,
    pub cache_capacity: usize,
    pub cache_purge_interval_secs: u64,
    /// Offset applied when rendering timestamps in notifications
    pub display_utc_offset_minutes: i32,
    pub updates_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .set_default("telegram_api_url", "https://api.telegram.org")?
            .set_default("solana_rpc_url", "https://api.mainnet-beta.solana.com")?
            .set_default("rpc_timeout_secs", 30)?
            .set_default("poll_interval_secs", 5)?
            .set_default("signature_limit", 10)?
            .set_default("cache_ttl_secs", 600)?
            .set_default("cache_capacity", 1000)?
            .set_default("cache_purge_interval_secs", 60)?
            .set_default("display_utc_offset_minutes", 0)?
            .set_default("updates_timeout_secs", 30)?
            .add_source(config::Environment::default().try_parsing(true))
            .build()?
            .try_deserialize()
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_secs(self.rpc_timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn cache_purge_interval(&self) -> Duration {
        Duration::from_secs(self.cache_purge_interval_secs.max(1))
    }

    /// Falls back to UTC when the configured offset is out of range
    pub fn display_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.display_utc_offset_minutes.saturating_mul(60))
            .unwrap_or_else(|| Utc.fix())
    }

    pub fn poller_settings(&self) -> PollerSettings {
        PollerSettings {
            interval: Duration::from_secs(self.poll_interval_secs.max(1)),
            signature_limit: self.signature_limit.max(1),
            display_offset: self.display_offset(),
        }
    }
}
