use serde::Serialize;

/// What the connected wallet reports about itself.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct WalletSession {
    pub address: Option<String>,
    pub chain_id: Option<u64>,
    pub wallet_name: Option<String>,
}

impl WalletSession {
    pub fn is_wallet_connected(&self) -> bool {
        self.address.as_deref().is_some_and(|a| !a.is_empty())
    }

    pub fn is_on_network(&self, chain_id: u64) -> bool {
        self.chain_id == Some(chain_id)
    }
}
