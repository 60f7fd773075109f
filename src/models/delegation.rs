use std::str::FromStr;

use ethers::{types::Address, utils::to_checksum};
use serde::Serialize;

use crate::errors::AddressValidationError;

use super::{fetch_state::FetchState, transaction::Transaction};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DelegateView {
    Read,
    Write,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewEvent {
    Edit,
    Cancel,
}

impl DelegateView {
    pub fn next(self, event: ViewEvent) -> DelegateView {
        match event {
            ViewEvent::Edit => DelegateView::Write,
            ViewEvent::Cancel => DelegateView::Read,
        }
    }
}

/// How the current delegate is shown in the read view.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DelegateDisplay {
    Loading,
    #[serde(rename = "self")]
    SelfDelegate { address: String, explorer_url: String },
    None,
    Address { address: String, explorer_url: String },
}

pub fn resolve_delegate_display(
    delegate: &FetchState<Address>,
    users_address: Address,
    block_explorer: &str,
) -> DelegateDisplay {
    let delegate = match delegate {
        FetchState::Fetched(delegate) => *delegate,
        _ => return DelegateDisplay::Loading,
    };

    if delegate == users_address {
        DelegateDisplay::SelfDelegate {
            address: to_checksum(&delegate, None),
            explorer_url: explorer_address_url(block_explorer, delegate),
        }
    } else if delegate.is_zero() {
        DelegateDisplay::None
    } else {
        DelegateDisplay::Address {
            address: to_checksum(&delegate, None),
            explorer_url: explorer_address_url(block_explorer, delegate),
        }
    }
}

pub fn explorer_address_url(block_explorer: &str, address: Address) -> String {
    format!(
        "{}/address/{}",
        block_explorer.trim_end_matches('/'),
        to_checksum(&address, None)
    )
}

/// Accepts 40 hex digits, optionally `0x` prefixed. Mixed-case input must
/// match its EIP-55 checksum.
pub fn validate_delegate_address(value: &str) -> Result<Address, AddressValidationError> {
    let invalid = || AddressValidationError::InvalidAddress(value.to_string());
    let trimmed = value.trim();
    let hex = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    let address = Address::from_str(hex).map_err(|_| invalid())?;

    let has_lower = hex.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = hex.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper && to_checksum(&address, None)[2..] != *hex {
        return Err(invalid());
    }

    Ok(address)
}

/// What fills the write view below the header.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum WriteDisplay {
    Form {
        input: String,
        error: Option<String>,
        submit_enabled: bool,
    },
    Receipt {
        tx: Transaction,
    },
}

pub fn shows_receipt(tx: Option<&Transaction>) -> bool {
    tx.is_some_and(Transaction::shows_receipt)
}

/// Cancel disappears while the wallet is signing and once a transaction has
/// gone out, unless it then failed.
pub fn is_cancel_visible(tx: Option<&Transaction>) -> bool {
    match tx {
        Some(tx) => !tx.in_wallet() && (!tx.sent() || tx.is_failed()),
        None => true,
    }
}
