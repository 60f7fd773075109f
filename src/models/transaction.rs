use chrono::{DateTime, Utc};
use ethers::types::H256;
use serde::{Deserialize, Serialize};

/// Identifier handed out by the transaction tracker. Never zero.
pub type TxId = u64;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransactionStatus {
    NotSent,
    /// Waiting for the user to sign in their wallet.
    InWallet,
    /// Broadcast, not yet confirmed.
    InFlight,
    Completed,
    Error,
    Cancelled,
}

impl TransactionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransactionStatus::Completed | TransactionStatus::Error | TransactionStatus::Cancelled
        )
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TxId,
    pub name: String,
    pub method: String,
    pub chain_id: u64,
    pub hash: Option<H256>,
    pub status: TransactionStatus,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    pub fn new(id: TxId, name: String, method: String, chain_id: u64) -> Self {
        let now = Utc::now();
        Self {
            id,
            name,
            method,
            chain_id,
            hash: None,
            status: TransactionStatus::NotSent,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn set_status(&mut self, status: TransactionStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }

    /// Broadcast to the network, whatever happened afterwards.
    pub fn sent(&self) -> bool {
        self.hash.is_some()
    }

    pub fn in_wallet(&self) -> bool {
        self.status == TransactionStatus::InWallet
    }

    pub fn in_flight(&self) -> bool {
        self.status == TransactionStatus::InFlight
    }

    pub fn is_success(&self) -> bool {
        self.status == TransactionStatus::Completed
    }

    pub fn is_failed(&self) -> bool {
        matches!(
            self.status,
            TransactionStatus::Error | TransactionStatus::Cancelled
        )
    }

    /// True while the transaction is pending on either side of the wallet.
    pub fn is_pending(&self) -> bool {
        self.in_wallet() || self.in_flight()
    }

    /// In flight or completed successfully: worth replacing a form with a
    /// receipt.
    pub fn shows_receipt(&self) -> bool {
        self.in_flight() || self.is_success()
    }
}
