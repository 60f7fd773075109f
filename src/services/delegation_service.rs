use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use ethers::{types::Address, utils::to_checksum};
use futures::FutureExt;
use log::{info, warn};
use serde::Serialize;
use uuid::Uuid;

use crate::errors::{AddressValidationError, CustomError};
use crate::models::{
    delegation::{
        is_cancel_visible, resolve_delegate_display, shows_receipt, validate_delegate_address,
        DelegateDisplay, DelegateView, ViewEvent, WriteDisplay,
    },
    fetch_state::FetchState,
    prize_pool::PrizePool,
    transaction::{Transaction, TxId},
    wallet::WalletSession,
};

use super::i18n::Locale;
use super::lock;
use super::network_config::{delegation_tools_url, get_network_config};
use super::prize_pool_client::{PrizePoolClient, PrizePoolTransactor};
use super::transaction_service::{TransactionCallbacks, TransactionRequest, TransactionTracker};
use super::wallet_service::WalletService;

type DelegateKey = (String, Address);
type DelegateCache = Arc<Mutex<HashMap<DelegateKey, CachedDelegate>>>;

#[derive(Clone, Copy)]
struct CachedDelegate {
    delegate: Address,
    fetched_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct DelegatePanel {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub pool: PrizePool,
    pub users_address: Address,
    pub view: DelegateView,
    pub input: String,
    pub input_error: Option<AddressValidationError>,
    pub tx_id: Option<TxId>,
}

impl DelegatePanel {
    fn key(&self) -> DelegateKey {
        (self.pool.id(), self.users_address)
    }

    fn validate_input(&mut self) -> Result<Address, AddressValidationError> {
        let result = validate_delegate_address(&self.input);
        self.input_error = result.as_ref().err().cloned();
        result
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct DelegationPanelView {
    pub id: Uuid,
    pub pool_id: String,
    pub chain_id: u64,
    pub view: DelegateView,
    pub delegate: DelegateDisplay,
    pub delegate_label: Option<String>,
    pub edit_enabled: bool,
    pub tools_url: String,
    pub write: Option<WriteDisplay>,
    pub cancel_visible: bool,
}

pub struct DelegationService {
    client: Arc<dyn PrizePoolClient>,
    transactor: Arc<dyn PrizePoolTransactor>,
    tracker: Arc<TransactionTracker>,
    delegates: DelegateCache,
    panels: Mutex<HashMap<Uuid, DelegatePanel>>,
}

impl DelegationService {
    pub fn new(
        client: Arc<dyn PrizePoolClient>,
        transactor: Arc<dyn PrizePoolTransactor>,
        tracker: Arc<TransactionTracker>,
    ) -> Self {
        Self {
            client,
            transactor,
            tracker,
            delegates: Arc::new(Mutex::new(HashMap::new())),
            panels: Mutex::new(HashMap::new()),
        }
    }

    pub async fn open(
        &self,
        pool: &PrizePool,
        wallet: &WalletSession,
        locale: &Locale<'_>,
    ) -> Result<DelegationPanelView, CustomError> {
        let users_address = WalletService::users_address(wallet)?;
        let now = Utc::now();
        let panel = DelegatePanel {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            pool: pool.clone(),
            users_address,
            view: DelegateView::Read,
            input: String::new(),
            input_error: None,
            tx_id: None,
        };
        let id = panel.id;
        info!("delegation panel {} opened for {:?} in {}", id, users_address, pool.id());
        lock(&self.panels).insert(id, panel);
        self.view(id, wallet, locale).await
    }

    /// Current delegate, looked up on the chain when not cached. A failed
    /// lookup stays `NotFetched`.
    async fn delegate(&self, pool: &PrizePool, user: Address) -> FetchState<Address> {
        let key = (pool.id(), user);
        if let Some(cached) = lock(&self.delegates).get(&key).copied() {
            return FetchState::Fetched(cached.delegate);
        }
        match self.client.get_users_ticket_delegate(pool, user).await {
            Ok(delegate) => {
                lock(&self.delegates).insert(
                    key,
                    CachedDelegate {
                        delegate,
                        fetched_at: Utc::now(),
                    },
                );
                FetchState::Fetched(delegate)
            }
            Err(e) => {
                warn!("delegate lookup for {:?} in {} failed: {}", user, key.0, e);
                FetchState::NotFetched
            }
        }
    }

    fn panel(&self, id: Uuid) -> Result<DelegatePanel, CustomError> {
        lock(&self.panels)
            .get(&id)
            .cloned()
            .ok_or(CustomError::SessionNotFoundError(id))
    }

    fn update<T>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut DelegatePanel, Option<&Transaction>) -> Result<T, CustomError>,
    ) -> Result<T, CustomError> {
        let mut panels = lock(&self.panels);
        let panel = panels
            .get_mut(&id)
            .ok_or(CustomError::SessionNotFoundError(id))?;
        let tx = panel.tx_id.and_then(|tx_id| self.tracker.get(tx_id));
        panel.updated_at = Utc::now();
        f(panel, tx.as_ref())
    }

    pub async fn view(
        &self,
        id: Uuid,
        wallet: &WalletSession,
        locale: &Locale<'_>,
    ) -> Result<DelegationPanelView, CustomError> {
        let panel = self.update(id, |panel, _| Ok(panel.clone()))?;
        let network = get_network_config(panel.pool.chain_id)?;
        let delegate = self.delegate(&panel.pool, panel.users_address).await;
        let display = resolve_delegate_display(&delegate, panel.users_address, &network.block_explorer);
        let delegate_label = match &display {
            DelegateDisplay::SelfDelegate { .. } => Some(locale.t("self")),
            DelegateDisplay::None => Some(locale.t("none")),
            _ => None,
        };

        let tx = panel.tx_id.and_then(|tx_id| self.tracker.get(tx_id));
        let write = (panel.view == DelegateView::Write).then(|| match &tx {
            Some(tx) if shows_receipt(Some(tx)) => WriteDisplay::Receipt { tx: tx.clone() },
            _ => WriteDisplay::Form {
                input: panel.input.clone(),
                error: panel
                    .input_error
                    .as_ref()
                    .map(|e| locale.t(e.message_key())),
                submit_enabled: !panel.input.is_empty()
                    && panel.input_error.is_none()
                    && wallet.is_on_network(panel.pool.chain_id),
            },
        });

        Ok(DelegationPanelView {
            id,
            pool_id: panel.pool.id(),
            chain_id: panel.pool.chain_id,
            view: panel.view,
            delegate: display,
            delegate_label,
            edit_enabled: delegate.is_fetched(),
            tools_url: delegation_tools_url(panel.pool.chain_id)?,
            write,
            cancel_visible: panel.view == DelegateView::Write && is_cancel_visible(tx.as_ref()),
        })
    }

    pub async fn edit(&self, id: Uuid) -> Result<(), CustomError> {
        let panel = self.panel(id)?;
        if !self.delegate(&panel.pool, panel.users_address).await.is_fetched() {
            return Err(CustomError::NotFetchedError("delegate"));
        }
        self.update(id, |panel, _| {
            panel.view = panel.view.next(ViewEvent::Edit);
            Ok(())
        })
    }

    pub fn cancel(&self, id: Uuid) -> Result<(), CustomError> {
        self.update(id, |panel, tx| {
            if panel.view != DelegateView::Write || !is_cancel_visible(tx) {
                return Err(CustomError::InvalidStepError(
                    "delegation can no longer be cancelled".to_string(),
                ));
            }
            panel.view = panel.view.next(ViewEvent::Cancel);
            panel.input.clear();
            panel.input_error = None;
            panel.tx_id = None;
            Ok(())
        })
    }

    /// Updates the address field, validating as the user types.
    pub fn set_input(&self, id: Uuid, value: &str) -> Result<(), CustomError> {
        self.update(id, |panel, _| {
            ensure_write(panel)?;
            panel.input = value.to_string();
            let _ = panel.validate_input();
            Ok(())
        })
    }

    /// Fills the field with the user's own address.
    pub fn reset(&self, id: Uuid) -> Result<(), CustomError> {
        self.update(id, |panel, _| {
            ensure_write(panel)?;
            panel.input = to_checksum(&panel.users_address, None);
            let _ = panel.validate_input();
            Ok(())
        })
    }

    /// Sends the delegation. The transaction is registered as pending before
    /// the wallet is asked to sign, so a second submit is refused.
    pub async fn submit(&self, id: Uuid, wallet: &WalletSession) -> Result<(), CustomError> {
        let queued = self.update(id, |panel, tx| {
            ensure_write(panel)?;
            if tx.is_some_and(|tx| tx.is_pending() || tx.is_success()) {
                return Err(CustomError::InvalidStepError(
                    "a delegation is already pending".to_string(),
                ));
            }
            let delegate = panel.validate_input()?;
            WalletService::ensure_on_network(wallet, panel.pool.chain_id)?;
            if WalletService::users_address(wallet)? != panel.users_address {
                return Err(CustomError::InvalidTransactionError(
                    "connected wallet changed since the panel was opened".to_string(),
                ));
            }
            let queued = self.tracker.begin(self.delegate_request(panel, delegate));
            panel.tx_id = Some(queued.id);
            Ok(queued)
        })?;

        self.tracker.drive(queued).await;
        Ok(())
    }

    fn delegate_request(&self, panel: &DelegatePanel, delegate: Address) -> TransactionRequest {
        let transactor = self.transactor.clone();
        let pool = panel.pool.clone();
        let user = panel.users_address;
        let call_transaction = Box::new(move || {
            async move { transactor.delegate_tickets(&pool, user, delegate).await }.boxed()
        });

        let delegates = self.delegates.clone();
        let key = panel.key();
        TransactionRequest {
            name: "Delegate deposit".to_string(),
            method: "delegate".to_string(),
            chain_id: panel.pool.chain_id,
            call_transaction,
            callbacks: TransactionCallbacks {
                refetch: Some(Box::new(move || {
                    lock(&delegates).remove(&key);
                })),
                ..Default::default()
            },
        }
    }

    pub fn close(&self, id: Uuid) -> Result<(), CustomError> {
        lock(&self.panels)
            .remove(&id)
            .map(|_| ())
            .ok_or(CustomError::SessionNotFoundError(id))
    }

    /// Drops panels idle for `max_age` whose delegation is not pending, and
    /// cached delegates fetched at least `max_age` ago.
    pub fn expire(&self, max_age: Duration) -> usize {
        let now = Utc::now();
        let mut panels = lock(&self.panels);
        let before = panels.len();
        panels.retain(|id, panel| {
            let pending = panel
                .tx_id
                .and_then(|tx_id| self.tracker.get(tx_id))
                .is_some_and(|tx| tx.is_pending());
            let keep = pending || now - panel.updated_at < max_age;
            if !keep {
                info!("delegation panel {} expired", id);
            }
            keep
        });
        let expired = before - panels.len();
        drop(panels);

        lock(&self.delegates).retain(|_, cached| now - cached.fetched_at < max_age);
        expired
    }

    pub fn clear(&self) {
        lock(&self.panels).clear();
        lock(&self.delegates).clear();
    }
}

fn ensure_write(panel: &DelegatePanel) -> Result<(), CustomError> {
    if panel.view == DelegateView::Write {
        Ok(())
    } else {
        Err(CustomError::InvalidStepError(
            "delegate can only be changed in the write view".to_string(),
        ))
    }
}
