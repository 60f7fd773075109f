use std::sync::{Mutex, MutexGuard, PoisonError};

pub mod balance_service;
pub mod blockchain_service;
pub mod chrome_service;
pub mod delegation_service;
pub mod error_boundary;
pub mod i18n;
pub mod network_config;
pub mod prize_pool_client;
pub mod transaction_service;
pub mod wallet_service;
pub mod withdrawal_service;

/// Session state stays usable even if a holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
