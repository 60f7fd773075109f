use serde::Serialize;

/// One entry of the network selector or the degraded-network warning.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NetworkStatus {
    pub chain_id: u64,
    pub name: String,
    pub is_testnet: bool,
    pub degraded: bool,
}
