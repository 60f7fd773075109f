use std::sync::Arc;

use chrono::Duration;
use log::info;

use crate::config::Config;
use crate::errors::CustomError;
use crate::models::prize_pool::PrizePool;
use crate::services::{
    balance_service::BalanceService,
    chrome_service::{ChromeService, LocalStorage},
    delegation_service::DelegationService,
    error_boundary::ErrorBoundary,
    i18n::I18n,
    prize_pool_client::{PrizePoolClient, PrizePoolTransactor},
    transaction_service::TransactionTracker,
    withdrawal_service::WithdrawalService,
};

/// Everything a request handler can reach, shared through `web::Data`.
pub struct AppState {
    pub config: Config,
    pub i18n: I18n,
    pub tracker: Arc<TransactionTracker>,
    pub balances: Arc<BalanceService>,
    pub withdrawals: WithdrawalService,
    pub delegations: DelegationService,
    pub chrome: ChromeService,
    pub boundary: ErrorBoundary,
}

impl AppState {
    pub fn new(
        config: Config,
        client: Arc<dyn PrizePoolClient>,
        transactor: Arc<dyn PrizePoolTransactor>,
    ) -> Result<Self, CustomError> {
        let tracker = Arc::new(TransactionTracker::new());
        let balances = Arc::new(BalanceService::new(client.clone()));

        Ok(Self {
            i18n: I18n::new(&config.default_language)?,
            boundary: ErrorBoundary::from_dsn(config.error_reporting_dsn.as_deref())?,
            chrome: ChromeService::new(
                config.supported_chain_ids.clone(),
                config.testnet_chain_ids.clone(),
                config.chain_ids_to_block.clone(),
            ),
            withdrawals: WithdrawalService::new(
                client.clone(),
                transactor.clone(),
                balances.clone(),
                tracker.clone(),
            ),
            delegations: DelegationService::new(client, transactor, tracker.clone()),
            tracker,
            balances,
            config,
        })
    }

    pub fn find_pool(&self, pool_id: &str) -> Result<&PrizePool, CustomError> {
        self.config
            .prize_pools
            .iter()
            .find(|pool| pool.id().eq_ignore_ascii_case(pool_id))
            .ok_or_else(|| CustomError::PoolNotFoundError(pool_id.to_string()))
    }

    /// Drops idle sessions, stale cache entries and old settled
    /// transactions. Returns how many sessions went away.
    pub fn expire_sessions(&self) -> usize {
        self.expire_older_than(Duration::seconds(self.config.session_ttl_secs as i64))
    }

    pub fn expire_older_than(&self, max_age: Duration) -> usize {
        let sessions = self.withdrawals.expire(max_age) + self.delegations.expire(max_age);
        let transactions = self.tracker.expire(max_age);
        self.balances.expire(max_age);
        if sessions + transactions > 0 {
            info!(
                "expired {} sessions and {} transactions",
                sessions, transactions
            );
        }
        sessions
    }

    pub fn local_stores(&self) -> [&dyn LocalStorage; 4] {
        [
            self.tracker.as_ref(),
            self.balances.as_ref(),
            &self.withdrawals,
            &self.delegations,
        ]
    }
}

impl LocalStorage for TransactionTracker {
    fn clear_storage(&self) {
        self.clear();
    }
}

impl LocalStorage for BalanceService {
    fn clear_storage(&self) {
        self.clear();
    }
}

impl LocalStorage for WithdrawalService {
    fn clear_storage(&self) {
        self.clear();
    }
}

impl LocalStorage for DelegationService {
    fn clear_storage(&self) {
        self.clear();
    }
}
