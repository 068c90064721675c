use std::time::Duration;

use solana_sdk::pubkey::Pubkey;
use strategy::sniper::SniperTier;
use strategy::StrategyConfig;

/// A named mempool stream endpoint. The name tags every event it produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSource {
    pub name: String,
    pub url: String,
}

#[derive(Debug, serde::Deserialize, Clone)]
pub struct BotConfig {
    #[serde(alias = "RPC_URL")]
    pub rpc_url: String,
    /// Comma separated `name=wss://...` entries; a bare URL gets a generated name
    #[serde(alias = "STREAM_SOURCES")]
    pub stream_sources: String,
    #[serde(alias = "KEYPAIR_PATH", default)]
    pub keypair_path: String,

    #[serde(alias = "BLOXROUTE_URL", default = "default_bloxroute_url")]
    pub bloxroute_url: String,
    #[serde(alias = "BLOXROUTE_AUTH_HEADER")]
    pub bloxroute_auth_header: Option<String>,
    #[serde(alias = "JITO_URL", default = "default_jito_url")]
    pub jito_url: String,
    #[serde(alias = "RPC_MIRROR", default)]
    pub rpc_mirror: bool,
    #[serde(alias = "METRICS_PORT")]
    pub metrics_port: Option<u16>,

    #[serde(alias = "WORKER_COUNT", default)]
    pub worker_count: usize,
    #[serde(alias = "DEDUP_TTL_SECS", default = "default_dedup_ttl_secs")]
    pub dedup_ttl_secs: u64,
    #[serde(alias = "STALE_WINDOW_SECS", default = "default_stale_window_secs")]
    pub stale_window_secs: u64,
    #[serde(alias = "CHUNK_SPLITTER", default = "default_chunk_splitter")]
    pub chunk_splitter: u32,
    #[serde(alias = "BATCH_INTERVAL_MS", default = "default_batch_interval_ms")]
    pub batch_interval_ms: u64,
    #[serde(alias = "BATCH_MIN_AMOUNT_OUT", default = "default_batch_min_amount_out")]
    pub batch_min_amount_out: u64,
    #[serde(alias = "BUY_DELAY_MS", default = "default_buy_delay_ms")]
    pub buy_delay_ms: u64,
    #[serde(alias = "BUY_AMOUNT_LAMPORTS", default = "default_buy_amount")]
    pub buy_amount_lamports: u64,
    #[serde(alias = "WITHDRAW_RESERVE_THRESHOLD", default = "default_reserve_threshold")]
    pub withdraw_reserve_threshold: u64,
    #[serde(alias = "MACHINE_GUN_MIN_TRIGGER", default = "default_machine_gun_trigger")]
    pub machine_gun_min_trigger: u64,
    #[serde(alias = "SNIPER_MIN_ENTRY", default = "default_sniper_min_entry")]
    pub sniper_min_entry: u64,
    /// JSON array of tiers replacing the built-in schedule
    #[serde(alias = "SNIPER_TIERS")]
    pub sniper_tiers: Option<String>,
    /// Lamports to wrap into the WSOL account at startup, 0 to skip
    #[serde(alias = "WRAP_LAMPORTS", default)]
    pub wrap_lamports: u64,
}

fn default_bloxroute_url() -> String { "https://ny.solana.dex.blxrbdn.com/api/v2/submit".to_string() }
fn default_jito_url() -> String { "https://mainnet.block-engine.jito.wtf".to_string() }
fn default_dedup_ttl_secs() -> u64 { 60 }
fn default_stale_window_secs() -> u64 { 480 } // 8 minutes
fn default_chunk_splitter() -> u32 { 10 }
fn default_batch_interval_ms() -> u64 { 2_000 }
fn default_batch_min_amount_out() -> u64 { 50_000 }
fn default_buy_delay_ms() -> u64 { 1_000 }
fn default_buy_amount() -> u64 { 100_000 }
fn default_reserve_threshold() -> u64 { 1_000_000_000 } // 1 SOL
fn default_machine_gun_trigger() -> u64 { 100_000_000 }
fn default_sniper_min_entry() -> u64 { 10_000_000 }

impl BotConfig {
    /// Load from the process environment and validate.
    pub fn new() -> Result<Self, String> {
        let source = ::config::Config::builder()
            .add_source(::config::Environment::default())
            .build()
            .map_err(|e| format!("Config Build Error: {}", e))?;
        Self::from_source(source)
    }

    pub fn from_source(source: ::config::Config) -> Result<Self, String> {
        let config: BotConfig = source
            .try_deserialize()
            .map_err(|e| format!("Config Deserialize Error: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates configuration values at startup (Fail Fast)
    pub fn validate(&self) -> Result<(), String> {
        if !self.rpc_url.starts_with("http") {
            return Err(format!("Invalid RPC_URL: must start with http/https. Got: {}", self.rpc_url));
        }
        if !self.jito_url.starts_with("http") {
            return Err(format!("Invalid JITO_URL: must start with http/https. Got: {}", self.jito_url));
        }
        if !self.bloxroute_url.starts_with("http") {
            return Err(format!("Invalid BLOXROUTE_URL: must start with http/https. Got: {}", self.bloxroute_url));
        }

        let sources = self.sources()?;
        if let Some(bad) = sources.iter().find(|s| !s.url.starts_with("ws")) {
            return Err(format!("Invalid stream source {}: must start with ws/wss. Got: {}", bad.name, bad.url));
        }

        if self.chunk_splitter == 0 {
            return Err("CHUNK_SPLITTER cannot be 0".into());
        }
        if self.buy_amount_lamports == 0 {
            return Err("BUY_AMOUNT_LAMPORTS cannot be 0".into());
        }
        if self.batch_interval_ms == 0 {
            return Err("BATCH_INTERVAL_MS cannot be 0".into());
        }
        if self.dedup_ttl_secs == 0 {
            return Err("DEDUP_TTL_SECS cannot be 0 (duplicates would never be suppressed)".into());
        }

        let tiers = self.tiers()?;
        if !tiers.iter().any(|t| t.enabled) {
            tracing::warn!("⚠️  No enabled sniper tier. The sniper heuristic will never fire.");
        }
        if self.bloxroute_auth_header.is_none() {
            tracing::warn!("⚠️  BLOXROUTE_AUTH_HEADER not set. bloXroute routes will be skipped.");
        }

        Ok(())
    }

    pub fn sources(&self) -> Result<Vec<StreamSource>, String> {
        let sources: Vec<StreamSource> = self
            .stream_sources
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .enumerate()
            .map(|(i, entry)| match entry.split_once('=') {
                Some((name, url)) => StreamSource {
                    name: name.trim().to_string(),
                    url: url.trim().to_string(),
                },
                None => StreamSource {
                    name: format!("stream-{}", i),
                    url: entry.to_string(),
                },
            })
            .collect();

        if sources.is_empty() {
            return Err("STREAM_SOURCES must name at least one stream".into());
        }
        Ok(sources)
    }

    pub fn tiers(&self) -> Result<Vec<SniperTier>, String> {
        match &self.sniper_tiers {
            Some(json) if !json.trim().is_empty() => {
                serde_json::from_str(json).map_err(|e| format!("Invalid SNIPER_TIERS: {}", e))
            }
            _ => Ok(strategy::sniper::default_tiers()),
        }
    }

    /// Core tuning derived from this configuration.
    pub fn strategy(&self, bot_identity: Pubkey) -> Result<StrategyConfig, String> {
        let defaults = StrategyConfig::default();
        Ok(StrategyConfig {
            bot_identity,
            machine_gun_min_trigger: self.machine_gun_min_trigger,
            sniper_min_entry: self.sniper_min_entry,
            tiers: self.tiers()?,
            chunk_splitter: self.chunk_splitter,
            stale_window: Duration::from_secs(self.stale_window_secs),
            dedup_ttl: Duration::from_secs(self.dedup_ttl_secs),
            worker_count: self.worker_count,
            batch_interval: Duration::from_millis(self.batch_interval_ms),
            batch_min_amount_out: self.batch_min_amount_out,
            buy_delay: Duration::from_millis(self.buy_delay_ms),
            buy_amount_lamports: self.buy_amount_lamports,
            withdraw_reserve_threshold: self.withdraw_reserve_threshold,
            ..defaults
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_config_from_env() {
        env::set_var("RPC_URL", "https://test.rpc");
        env::set_var("STREAM_SOURCES", "triton=wss://a.test,wss://b.test");
        env::set_var("JITO_URL", "https://test.jito");
        env::set_var("CHUNK_SPLITTER", "4");

        let config = BotConfig::new().expect("Failed to load config");

        assert_eq!(config.rpc_url, "https://test.rpc");
        assert_eq!(config.jito_url, "https://test.jito");
        assert_eq!(config.chunk_splitter, 4);
        assert_eq!(config.sources().unwrap().len(), 2);
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
