use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use chrono::{Duration, Utc};
use ethers::types::H256;
use futures::future::BoxFuture;
use log::{debug, error, info, warn};

use crate::errors::CustomError;
use crate::models::transaction::{Transaction, TransactionStatus, TxId};

use super::prize_pool_client::ReceiptSource;

/// Performs the on-chain call, resolving once the wallet has broadcast it.
pub type CallTransaction = Box<dyn FnOnce() -> BoxFuture<'static, Result<H256, CustomError>> + Send>;

pub type Callback = Box<dyn FnOnce() + Send>;

#[derive(Default)]
pub struct TransactionCallbacks {
    pub on_sent: Option<Callback>,
    pub on_success: Option<Callback>,
    pub on_error: Option<Callback>,
    /// Runs after a successful confirmation, once `on_success` has run.
    pub refetch: Option<Callback>,
}

pub struct TransactionRequest {
    pub name: String,
    pub method: String,
    pub chain_id: u64,
    pub call_transaction: CallTransaction,
    pub callbacks: TransactionCallbacks,
}

/// A transaction registered with the tracker whose call has not run yet.
pub struct QueuedTransaction {
    pub id: TxId,
    call_transaction: CallTransaction,
}

struct TrackedTransaction {
    tx: Transaction,
    callbacks: TransactionCallbacks,
}

/// Sends transactions and tracks their status until a receipt arrives.
pub struct TransactionTracker {
    next_id: AtomicU64,
    transactions: Mutex<HashMap<TxId, TrackedTransaction>>,
}

impl Default for TransactionTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl TransactionTracker {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            transactions: Mutex::new(HashMap::new()),
        }
    }

    /// Registers the transaction as waiting in the wallet without sending it.
    /// Callers record the returned id before awaiting [`Self::drive`], so the
    /// transaction is visible as pending for the whole signing window.
    pub fn begin(&self, request: TransactionRequest) -> QueuedTransaction {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let TransactionRequest {
            name,
            method,
            chain_id,
            call_transaction,
            callbacks,
        } = request;

        let mut tx = Transaction::new(id, name, method, chain_id);
        tx.set_status(TransactionStatus::InWallet);
        info!("tx {} ({}) awaiting wallet on chain {}", id, tx.method, chain_id);
        self.lock().insert(id, TrackedTransaction { tx, callbacks });

        QueuedTransaction {
            id,
            call_transaction,
        }
    }

    /// Hands a queued call to the wallet. Afterwards the transaction is in
    /// flight, or cancelled / errored when the wallet refused or failed; it
    /// is never retried.
    pub async fn drive(&self, queued: QueuedTransaction) -> TxId {
        let QueuedTransaction {
            id,
            call_transaction,
        } = queued;
        let result = call_transaction().await;

        let callback = {
            let mut transactions = self.lock();
            let Some(tracked) = transactions.get_mut(&id) else {
                // cleared while the wallet was open
                return id;
            };
            match result {
                Ok(hash) => {
                    info!("tx {} in flight: {:?}", id, hash);
                    tracked.tx.hash = Some(hash);
                    tracked.tx.set_status(TransactionStatus::InFlight);
                    tracked.callbacks.on_sent.take()
                }
                Err(CustomError::UserRejectedError) => {
                    info!("tx {} cancelled in wallet", id);
                    tracked.tx.set_status(TransactionStatus::Cancelled);
                    None
                }
                Err(e) => {
                    error!("tx {} failed before broadcast: {}", id, e);
                    tracked.tx.error_message = Some(e.to_string());
                    tracked.tx.set_status(TransactionStatus::Error);
                    tracked.callbacks.on_error.take()
                }
            }
        };
        if let Some(callback) = callback {
            callback();
        }

        id
    }

    pub async fn send_transaction(&self, request: TransactionRequest) -> TxId {
        let queued = self.begin(request);
        self.drive(queued).await
    }

    pub fn get(&self, id: TxId) -> Option<Transaction> {
        self.lock().get(&id).map(|tracked| tracked.tx.clone())
    }

    /// Records the mined outcome of an in-flight transaction and runs its
    /// callbacks. Transactions in any other state are left alone.
    pub fn confirm(&self, id: TxId, success: bool) {
        let callbacks = {
            let mut transactions = self.lock();
            let Some(tracked) = transactions.get_mut(&id) else {
                return;
            };
            if !tracked.tx.in_flight() {
                return;
            }
            if success {
                info!("tx {} completed", id);
                tracked.tx.set_status(TransactionStatus::Completed);
                vec![
                    tracked.callbacks.on_success.take(),
                    tracked.callbacks.refetch.take(),
                ]
            } else {
                warn!("tx {} reverted", id);
                tracked.tx.error_message = Some(CustomError::TransactionFailedError.to_string());
                tracked.tx.set_status(TransactionStatus::Error);
                vec![tracked.callbacks.on_error.take()]
            }
        };
        callbacks.into_iter().flatten().for_each(|callback| callback());
    }

    /// Checks every in-flight transaction once. Returns how many settled.
    pub async fn poll(&self, receipts: &dyn ReceiptSource) -> usize {
        let in_flight: Vec<(TxId, u64, H256)> = self
            .lock()
            .values()
            .filter(|tracked| tracked.tx.in_flight())
            .filter_map(|tracked| tracked.tx.hash.map(|hash| (tracked.tx.id, tracked.tx.chain_id, hash)))
            .collect();

        let mut settled = 0;
        for (id, chain_id, hash) in in_flight {
            match receipts.receipt_status(chain_id, hash).await {
                Ok(Some(success)) => {
                    self.confirm(id, success);
                    settled += 1;
                }
                Ok(None) => debug!("tx {} not mined yet", id),
                Err(e) => warn!("receipt lookup for tx {} failed: {}", id, e),
            }
        }
        settled
    }

    /// Forgets settled transactions last updated at least `max_age` ago.
    /// Pending ones are kept whatever their age.
    pub fn expire(&self, max_age: Duration) -> usize {
        let now = Utc::now();
        let mut transactions = self.lock();
        let before = transactions.len();
        transactions.retain(|_, tracked| {
            !tracked.tx.status.is_terminal() || now - tracked.tx.updated_at < max_age
        });
        let expired = before - transactions.len();
        if expired > 0 {
            debug!("expired {} settled transactions", expired);
        }
        expired
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<TxId, TrackedTransaction>> {
        super::lock(&self.transactions)
    }
}
