use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub chain_id: u64,
    pub name: String,
    /// Short name used in links to external tools, e.g. `mainnet`.
    pub alias: String,
    pub rpc_url: String,
    pub symbol: String,
    pub block_explorer: String,
    pub is_testnet: bool,
    pub refetch_interval_ms: u64,
}
