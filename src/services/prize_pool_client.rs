use async_trait::async_trait;
use ethers::types::{Address, H256, U256};

use crate::{
    errors::CustomError,
    models::{
        prize_pool::{PrizePool, RawPrizePoolBalances},
        token::PrizePoolTokens,
    },
};

/// Read side of a prize pool.
#[async_trait]
pub trait PrizePoolClient: Send + Sync {
    async fn get_prize_pool_tokens(&self, pool: &PrizePool) -> Result<PrizePoolTokens, CustomError>;

    async fn get_users_prize_pool_balances(
        &self,
        pool: &PrizePool,
        user: Address,
    ) -> Result<RawPrizePoolBalances, CustomError>;

    async fn get_users_ticket_delegate(
        &self,
        pool: &PrizePool,
        user: Address,
    ) -> Result<Address, CustomError>;

    /// Ticket to token exchange rate scaled by 1e18.
    async fn get_price_per_share(&self, pool: &PrizePool) -> Result<U256, CustomError>;

    /// Fee in token minor units for withdrawing `amount` right now.
    async fn get_exit_fee(
        &self,
        pool: &PrizePool,
        user: Address,
        amount: U256,
    ) -> Result<U256, CustomError>;
}

/// Write side of a prize pool. Implementations return once the wallet has
/// signed and broadcast, yielding the transaction hash; a wallet refusal is
/// reported as [`CustomError::UserRejectedError`].
#[async_trait]
pub trait PrizePoolTransactor: Send + Sync {
    async fn withdraw(
        &self,
        pool: &PrizePool,
        user: Address,
        amount: U256,
        max_fee: U256,
    ) -> Result<H256, CustomError>;

    /// Delegates `user`'s tickets to `delegate`.
    async fn delegate_tickets(
        &self,
        pool: &PrizePool,
        user: Address,
        delegate: Address,
    ) -> Result<H256, CustomError>;
}

/// Looks up mined receipts. `Ok(None)` means not mined yet.
#[async_trait]
pub trait ReceiptSource: Send + Sync {
    async fn receipt_status(&self, chain_id: u64, hash: H256) -> Result<Option<bool>, CustomError>;
}
