use ethers::types::{Address, U256};
use serde::{Deserialize, Serialize};

use super::token::TokenWithUsdBalance;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PoolVersion {
    V4,
    /// A V3 pod wrapping the pool; withdrawals go through the pod and may
    /// carry an early exit fee.
    V3Pod { pod: Address },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrizePool {
    pub chain_id: u64,
    pub address: Address,
    pub ticket_address: Address,
    pub token_address: Address,
    #[serde(default = "default_version")]
    pub version: PoolVersion,
}

fn default_version() -> PoolVersion {
    PoolVersion::V4
}

impl PrizePool {
    pub fn id(&self) -> String {
        format!("{:?}-{}", self.address, self.chain_id)
    }
}

/// Raw minor-unit balances as returned by the chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RawPrizePoolBalances {
    pub ticket: U256,
    pub token: U256,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UsersPrizePoolBalances {
    pub ticket: TokenWithUsdBalance,
    pub token: TokenWithUsdBalance,
}
