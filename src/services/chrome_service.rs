use log::{info, warn};
use serde::Serialize;

use crate::models::{network_status::NetworkStatus, wallet::WalletSession};

use super::i18n::Locale;
use super::network_config::get_network_config;

/// Anything holding client-visible state that "clear storage" wipes.
pub trait LocalStorage {
    fn clear_storage(&self);
}

#[derive(Clone, Debug, Serialize)]
pub struct NetworkWarning {
    pub is_open: bool,
    pub title: String,
    pub description: String,
    pub chains: Vec<NetworkStatus>,
}

#[derive(Clone, Debug, Serialize)]
pub struct SettingsState {
    pub language: String,
    pub languages: Vec<String>,
    pub use_testnets: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct HeaderState {
    pub wallet: WalletSession,
    pub is_wallet_connected: bool,
    pub is_on_supported_network: bool,
    pub supported_networks: Vec<NetworkStatus>,
    pub network_warning: Option<NetworkWarning>,
    pub settings: SettingsState,
}

#[derive(Clone, Debug, Serialize)]
pub struct ClearStorageOutcome {
    pub cleared: bool,
    pub reload: bool,
    /// Shown when asking for confirmation.
    pub warning: Option<String>,
}

pub struct ChromeService {
    mainnet_chain_ids: Vec<u64>,
    testnet_chain_ids: Vec<u64>,
    chain_ids_to_block: Vec<u64>,
}

impl ChromeService {
    pub fn new(mainnet_chain_ids: Vec<u64>, testnet_chain_ids: Vec<u64>, chain_ids_to_block: Vec<u64>) -> Self {
        Self {
            mainnet_chain_ids,
            testnet_chain_ids,
            chain_ids_to_block,
        }
    }

    pub fn supported_chain_ids(&self, use_testnets: bool) -> &[u64] {
        if use_testnets {
            &self.testnet_chain_ids
        } else {
            &self.mainnet_chain_ids
        }
    }

    fn network_status(&self, chain_id: u64) -> NetworkStatus {
        let config = get_network_config(chain_id).ok();
        NetworkStatus {
            chain_id,
            name: config
                .as_ref()
                .map(|c| c.name.clone())
                .unwrap_or_else(|| format!("Chain {}", chain_id)),
            is_testnet: config.as_ref().is_some_and(|c| c.is_testnet),
            degraded: self.chain_ids_to_block.contains(&chain_id),
        }
    }

    /// Static list of chains flagged as degraded; `None` when there are none.
    pub fn network_warning(&self, dismissed: bool, locale: &Locale<'_>) -> Option<NetworkWarning> {
        if self.chain_ids_to_block.is_empty() {
            return None;
        }
        Some(NetworkWarning {
            is_open: !dismissed,
            title: locale.t("issuesContactingBlockchain"),
            description: locale.t("followingChainsHaveDegradedService"),
            chains: self
                .chain_ids_to_block
                .iter()
                .map(|chain_id| self.network_status(*chain_id))
                .collect(),
        })
    }

    pub fn header_state(
        &self,
        wallet: &WalletSession,
        use_testnets: bool,
        warning_dismissed: bool,
        locale: &Locale<'_>,
    ) -> HeaderState {
        let supported = self.supported_chain_ids(use_testnets);
        HeaderState {
            wallet: wallet.clone(),
            is_wallet_connected: wallet.is_wallet_connected(),
            is_on_supported_network: wallet
                .chain_id
                .is_some_and(|chain_id| supported.contains(&chain_id)),
            supported_networks: supported.iter().map(|id| self.network_status(*id)).collect(),
            network_warning: self.network_warning(warning_dismissed, locale),
            settings: SettingsState {
                language: locale.language().to_string(),
                languages: locale.languages(),
                use_testnets,
            },
        }
    }

    /// Nothing is cleared until the user confirms the warning.
    pub fn clear_storage(&self, confirmed: bool, stores: &[&dyn LocalStorage], locale: &Locale<'_>) -> ClearStorageOutcome {
        if !confirmed {
            return ClearStorageOutcome {
                cleared: false,
                reload: false,
                warning: Some(locale.t("clearingStorageWarning")),
            };
        }

        warn!("clearing {} local stores", stores.len());
        for store in stores {
            store.clear_storage();
        }
        info!("local storage cleared");
        ClearStorageOutcome {
            cleared: true,
            reload: true,
            warning: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct CountingStore(Cell<u32>);

    impl LocalStorage for CountingStore {
        fn clear_storage(&self) {
            self.0.set(self.0.get() + 1);
        }
    }

    use crate::services::i18n::I18n;

    fn i18n() -> I18n {
        I18n::new("en").unwrap()
    }

    #[test]
    fn network_warning_lists_degraded_chains() {
        let chrome = ChromeService::new(vec![1, 137], vec![4], vec![137]);
        let warning = chrome.network_warning(false, &i18n().locale(["en"])).unwrap();
        assert!(warning.is_open);
        assert_eq!(warning.chains.len(), 1);
        assert_eq!(warning.chains[0].name, "Polygon");
        assert!(warning.chains[0].degraded);

        assert!(!chrome.network_warning(true, &i18n().locale(["en"])).unwrap().is_open);
        assert!(ChromeService::new(vec![1], vec![], vec![])
            .network_warning(false, &i18n().locale(["en"]))
            .is_none());
    }

    #[test]
    fn header_restricts_networks_to_supported_set() {
        let chrome = ChromeService::new(vec![1, 137], vec![4, 80001], vec![]);
        let wallet = WalletSession {
            address: Some("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed".into()),
            chain_id: Some(4),
            wallet_name: Some("MetaMask".into()),
        };

        let header = chrome.header_state(&wallet, false, false, &i18n().locale(["en"]));
        assert!(header.is_wallet_connected);
        assert!(!header.is_on_supported_network);
        assert_eq!(header.supported_networks.len(), 2);

        let header = chrome.header_state(&wallet, true, false, &i18n().locale(["en"]));
        assert!(header.is_on_supported_network);
        assert!(header.supported_networks.iter().all(|n| n.is_testnet));
    }

    #[test]
    fn clearing_storage_needs_confirmation() {
        let chrome = ChromeService::new(vec![1], vec![], vec![]);
        let store = CountingStore(Cell::new(0));

        let outcome = chrome.clear_storage(false, &[&store], &i18n().locale(["en"]));
        assert!(!outcome.cleared);
        assert!(outcome.warning.is_some());
        assert_eq!(store.0.get(), 0);

        let outcome = chrome.clear_storage(true, &[&store], &i18n().locale(["en"]));
        assert!(outcome.cleared && outcome.reload);
        assert_eq!(store.0.get(), 1);
    }
}
