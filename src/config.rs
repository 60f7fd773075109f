use std::collections::HashMap;
use std::env;

use crate::errors::CustomError;
use crate::models::{network_config::NetworkConfig, prize_pool::PrizePool};
use crate::services::network_config::get_network_config;

pub struct Config {
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub supported_chain_ids: Vec<u64>,
    pub testnet_chain_ids: Vec<u64>,
    pub use_testnets: bool,
    /// Chains shown in the degraded-service warning.
    pub chain_ids_to_block: Vec<u64>,
    pub error_reporting_dsn: Option<String>,
    pub prize_pools: Vec<PrizePool>,
    pub rpc_urls: HashMap<u64, String>,
    pub private_key: Option<String>,
    pub receipt_poll_interval_ms: u64,
    /// Idle sessions and settled transactions older than this are dropped.
    pub session_ttl_secs: u64,
    pub default_language: String,
}

impl Config {
    pub fn from_env() -> Result<Self, CustomError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, CustomError> {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let port = match var("PORT") {
            Some(port) => port
                .trim()
                .parse()
                .map_err(|_| CustomError::ConfigError(format!("Failed to parse PORT: {}", port)))?,
            None => 8080,
        };

        let supported_chain_ids = parse_chain_ids(var("SUPPORTED_CHAIN_IDS").as_deref(), "1,137,43114")?;
        let testnet_chain_ids = parse_chain_ids(var("TESTNET_CHAIN_IDS").as_deref(), "4,80001,43113")?;
        let chain_ids_to_block = parse_chain_ids(var("CHAIN_IDS_TO_BLOCK").as_deref(), "")?;

        let prize_pools: Vec<PrizePool> = match var("PRIZE_POOLS") {
            Some(raw) => serde_json::from_str(&raw)
                .map_err(|e| CustomError::ConfigError(format!("Failed to parse PRIZE_POOLS: {}", e)))?,
            None => Vec::new(),
        };

        let mut rpc_urls = HashMap::new();
        for chain_id in supported_chain_ids.iter().chain(&testnet_chain_ids) {
            if let Some(url) = var(format!("RPC_URL_{}", chain_id).as_str()) {
                rpc_urls.insert(*chain_id, url);
            }
        }

        let receipt_poll_interval_ms = match var("RECEIPT_POLL_INTERVAL_MS") {
            Some(ms) => ms.trim().parse().map_err(|_| {
                CustomError::ConfigError(format!("Failed to parse RECEIPT_POLL_INTERVAL_MS: {}", ms))
            })?,
            None => 4_000,
        };

        let session_ttl_secs = match var("SESSION_TTL_SECS") {
            Some(secs) => secs.trim().parse().map_err(|_| {
                CustomError::ConfigError(format!("Failed to parse SESSION_TTL_SECS: {}", secs))
            })?,
            None => 3_600,
        };

        Ok(Self {
            host: var("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port,
            allowed_origins: var("ALLOWED_ORIGINS")
                .map(|origins| origins.split(',').map(|o| o.trim().to_string()).collect())
                .unwrap_or_else(|| {
                    vec![
                        "http://localhost:3000".to_string(),
                        "http://localhost:5173".to_string(),
                    ]
                }),
            supported_chain_ids,
            testnet_chain_ids,
            use_testnets: var("USE_TESTNETS").is_some_and(|v| v == "true" || v == "1"),
            chain_ids_to_block,
            error_reporting_dsn: var("ERROR_REPORTING_DSN"),
            prize_pools,
            rpc_urls,
            private_key: var("PRIVATE_KEY"),
            receipt_poll_interval_ms,
            session_ttl_secs,
            default_language: var("DEFAULT_LANGUAGE").unwrap_or_else(|| "en".to_string()),
        })
    }

    /// Networks for every chain the app can talk to, with RPC overrides
    /// applied.
    pub fn networks(&self) -> Result<Vec<NetworkConfig>, CustomError> {
        let mut chain_ids: Vec<u64> = self
            .supported_chain_ids
            .iter()
            .chain(&self.testnet_chain_ids)
            .chain(self.prize_pools.iter().map(|pool| &pool.chain_id))
            .copied()
            .collect();
        chain_ids.sort_unstable();
        chain_ids.dedup();

        chain_ids
            .into_iter()
            .map(|chain_id| {
                let mut network = get_network_config(chain_id)?;
                if let Some(url) = self.rpc_urls.get(&chain_id) {
                    network.rpc_url = url.clone();
                }
                Ok(network)
            })
            .collect()
    }
}

fn parse_chain_ids(raw: Option<&str>, default: &str) -> Result<Vec<u64>, CustomError> {
    raw.unwrap_or(default)
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(|id| {
            id.parse()
                .map_err(|_| CustomError::ConfigError(format!("Invalid chain id: {}", id)))
        })
        .collect()
}
