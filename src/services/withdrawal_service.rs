use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use ethers::types::{Address, U256};
use futures::FutureExt;
use log::{info, warn};
use serde::Serialize;
use uuid::Uuid;

use crate::errors::CustomError;
use crate::models::{
    amount::Amount,
    fetch_state::FetchState,
    prize_pool::{PrizePool, UsersPrizePoolBalances},
    token::{PrizePoolTokens, Token},
    transaction::{Transaction, TxId},
    wallet::WalletSession,
    withdrawal::{
        amount_to_receive, is_confirm_enabled, is_exit_fee_agreed, validate_withdrawal_amount,
        StepEvent, WithdrawalStep,
    },
};

use super::balance_service::BalanceService;
use super::lock;
use super::prize_pool_client::{PrizePoolClient, PrizePoolTransactor};
use super::transaction_service::{TransactionCallbacks, TransactionRequest, TransactionTracker};
use super::wallet_service::WalletService;

const PRICE_PER_SHARE_DECIMALS: u8 = 18;

/// State of one withdrawal modal.
#[derive(Clone, Debug, Serialize)]
pub struct WithdrawalWizard {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    /// Last time the client looked at or changed the wizard.
    pub updated_at: DateTime<Utc>,
    pub pool: PrizePool,
    pub users_address: Address,
    pub ticket: Token,
    pub token: Token,
    pub users_balance: Amount,
    pub price_per_share: Amount,
    pub step: WithdrawalStep,
    pub amount_to_withdraw: Option<Amount>,
    pub amount_to_receive: Option<Amount>,
    pub exit_fee: FetchState<U256>,
    pub exit_fee_approved: bool,
    pub tx_id: Option<TxId>,
}

impl WithdrawalWizard {
    pub fn new(
        pool: PrizePool,
        users_address: Address,
        tokens: PrizePoolTokens,
        balances: &UsersPrizePoolBalances,
        price_per_share: Amount,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            pool,
            users_address,
            users_balance: balances.ticket.balance(),
            ticket: tokens.ticket,
            token: tokens.token,
            price_per_share,
            step: WithdrawalStep::Input,
            amount_to_withdraw: None,
            amount_to_receive: None,
            exit_fee: FetchState::NotFetched,
            exit_fee_approved: false,
            tx_id: None,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// What the user would get for `input`, shown while typing.
    pub fn preview_amount_to_receive(&self, input: &str) -> Option<Amount> {
        let amount = Amount::from_string(input, self.token.decimals).ok()?;
        Some(amount_to_receive(&amount, &self.price_per_share))
    }

    pub fn submit_amount(&mut self, input: &str) -> Result<(), CustomError> {
        if self.step != WithdrawalStep::Input {
            return Err(CustomError::InvalidStepError(format!(
                "amount can only be entered on the input step, not {:?}",
                self.step
            )));
        }

        let units = validate_withdrawal_amount(input, self.token.decimals, &self.users_balance)?;
        let amount = Amount::from_unformatted(units, self.token.decimals);
        self.amount_to_receive = Some(amount_to_receive(&amount, &self.price_per_share));
        self.amount_to_withdraw = Some(amount);
        self.exit_fee = FetchState::NotFetched;
        self.exit_fee_approved = false;
        self.step = self.step.next(StepEvent::AmountAccepted);
        Ok(())
    }

    pub fn back(&mut self, tx: Option<&Transaction>) -> Result<(), CustomError> {
        if self.step != WithdrawalStep::Review {
            return Err(CustomError::InvalidStepError(
                "only the review step can go back".to_string(),
            ));
        }
        if tx.is_some_and(Transaction::is_pending) {
            return Err(CustomError::InvalidStepError(
                "a withdrawal is already pending".to_string(),
            ));
        }
        self.step = self.step.next(StepEvent::Back);
        self.tx_id = None;
        Ok(())
    }

    pub fn set_exit_fee_approved(&mut self, approved: bool) {
        self.exit_fee_approved = approved;
    }

    pub fn is_exit_fee_agreed(&self) -> bool {
        is_exit_fee_agreed(&self.exit_fee, self.exit_fee_approved)
    }

    pub fn is_confirm_enabled(&self, tx: Option<&Transaction>) -> bool {
        self.step == WithdrawalStep::Review
            && is_confirm_enabled(&self.exit_fee, self.exit_fee_approved, tx)
    }

    /// Advances to the receipt once the transaction is worth showing. Failed
    /// or cancelled transactions leave the wizard on review.
    pub fn observe_transaction(&mut self, tx: &Transaction) {
        if self.tx_id == Some(tx.id) && tx.shows_receipt() {
            self.step = self.step.next(StepEvent::TxDisplayable);
        }
    }
}

/// Wizard plus the derived bits a client needs to render it.
#[derive(Clone, Debug, Serialize)]
pub struct WithdrawalView {
    #[serde(flatten)]
    pub wizard: WithdrawalWizard,
    pub exit_fee_agreed: bool,
    pub confirm_enabled: bool,
    pub tx: Option<Transaction>,
}

pub struct WithdrawalService {
    client: Arc<dyn PrizePoolClient>,
    transactor: Arc<dyn PrizePoolTransactor>,
    balances: Arc<BalanceService>,
    tracker: Arc<TransactionTracker>,
    wizards: Mutex<HashMap<Uuid, WithdrawalWizard>>,
}

impl WithdrawalService {
    pub fn new(
        client: Arc<dyn PrizePoolClient>,
        transactor: Arc<dyn PrizePoolTransactor>,
        balances: Arc<BalanceService>,
        tracker: Arc<TransactionTracker>,
    ) -> Self {
        Self {
            client,
            transactor,
            balances,
            tracker,
            wizards: Mutex::new(HashMap::new()),
        }
    }

    pub async fn start(
        &self,
        pool: &PrizePool,
        wallet: &WalletSession,
    ) -> Result<WithdrawalView, CustomError> {
        let user = WalletService::users_address(wallet)?;
        let tokens = self.balances.get_prize_pool_tokens(pool).await?;
        let balances = self
            .balances
            .get_users_prize_pool_balances(&format!("{:?}", user), pool)
            .await?;
        let price_per_share = Amount::from_unformatted(
            self.client.get_price_per_share(pool).await?,
            PRICE_PER_SHARE_DECIMALS,
        );

        let wizard = WithdrawalWizard::new(pool.clone(), user, tokens, &balances, price_per_share);
        info!("withdrawal {} started for {:?} in {}", wizard.id, user, pool.id());
        let id = wizard.id;
        lock(&self.wizards).insert(id, wizard);
        self.view(id)
    }

    pub fn view(&self, id: Uuid) -> Result<WithdrawalView, CustomError> {
        let mut wizards = lock(&self.wizards);
        let wizard = wizards
            .get_mut(&id)
            .ok_or(CustomError::SessionNotFoundError(id))?;

        let tx = wizard.tx_id.and_then(|tx_id| self.tracker.get(tx_id));
        if let Some(tx) = &tx {
            wizard.observe_transaction(tx);
        }
        wizard.touch();

        Ok(WithdrawalView {
            exit_fee_agreed: wizard.is_exit_fee_agreed(),
            confirm_enabled: wizard.is_confirm_enabled(tx.as_ref()),
            wizard: wizard.clone(),
            tx,
        })
    }

    pub fn preview(&self, id: Uuid, input: &str) -> Result<Option<Amount>, CustomError> {
        let wizards = lock(&self.wizards);
        let wizard = wizards.get(&id).ok_or(CustomError::SessionNotFoundError(id))?;
        Ok(wizard.preview_amount_to_receive(input))
    }

    /// Validates the amount, moves to review and fetches the exit fee for it.
    pub async fn submit_amount(&self, id: Uuid, input: &str) -> Result<WithdrawalView, CustomError> {
        let (pool, user, amount) = {
            let mut wizards = lock(&self.wizards);
            let wizard = wizards
                .get_mut(&id)
                .ok_or(CustomError::SessionNotFoundError(id))?;
            wizard.submit_amount(input)?;
            wizard.exit_fee = FetchState::Fetching;
            let amount = wizard
                .amount_to_withdraw
                .as_ref()
                .map(|amount| amount.amount_unformatted)
                .unwrap_or_default();
            (wizard.pool.clone(), wizard.users_address, amount)
        };

        let fee = self.client.get_exit_fee(&pool, user, amount).await;

        {
            let mut wizards = lock(&self.wizards);
            if let Some(wizard) = wizards.get_mut(&id) {
                let same_amount = wizard
                    .amount_to_withdraw
                    .as_ref()
                    .is_some_and(|current| current.amount_unformatted == amount);
                if same_amount {
                    wizard.exit_fee = match fee {
                        Ok(fee) => FetchState::Fetched(fee),
                        Err(e) => {
                            warn!("exit fee lookup for withdrawal {} failed: {}", id, e);
                            FetchState::NotFetched
                        }
                    };
                }
            }
        }

        self.view(id)
    }

    pub fn back(&self, id: Uuid) -> Result<WithdrawalView, CustomError> {
        {
            let mut wizards = lock(&self.wizards);
            let wizard = wizards
                .get_mut(&id)
                .ok_or(CustomError::SessionNotFoundError(id))?;
            let tx = wizard.tx_id.and_then(|tx_id| self.tracker.get(tx_id));
            wizard.back(tx.as_ref())?;
        }
        self.view(id)
    }

    pub fn set_exit_fee_approved(&self, id: Uuid, approved: bool) -> Result<WithdrawalView, CustomError> {
        lock(&self.wizards)
            .get_mut(&id)
            .ok_or(CustomError::SessionNotFoundError(id))?
            .set_exit_fee_approved(approved);
        self.view(id)
    }

    /// Sends the withdrawal. The wizard stays on review until the tracker
    /// reports the transaction in flight.
    pub async fn confirm(&self, id: Uuid, wallet: &WalletSession) -> Result<WithdrawalView, CustomError> {
        let queued = {
            let mut wizards = lock(&self.wizards);
            let wizard = wizards
                .get_mut(&id)
                .ok_or(CustomError::SessionNotFoundError(id))?;
            let tx = wizard.tx_id.and_then(|tx_id| self.tracker.get(tx_id));
            if !wizard.is_confirm_enabled(tx.as_ref()) {
                return Err(match wizard.exit_fee {
                    FetchState::Fetched(_) if wizard.step == WithdrawalStep::Review => {
                        CustomError::InvalidStepError(
                            "exit fee not acknowledged or withdrawal pending".to_string(),
                        )
                    }
                    FetchState::Fetched(_) => {
                        CustomError::InvalidStepError("nothing to confirm yet".to_string())
                    }
                    _ => CustomError::NotFetchedError("exit fee"),
                });
            }
            WalletService::ensure_on_network(wallet, wizard.pool.chain_id)?;
            if WalletService::users_address(wallet)? != wizard.users_address {
                return Err(CustomError::InvalidTransactionError(
                    "connected wallet changed since the withdrawal started".to_string(),
                ));
            }
            let queued = self.tracker.begin(self.withdraw_request(wizard)?);
            wizard.tx_id = Some(queued.id);
            queued
        };

        self.tracker.drive(queued).await;
        self.view(id)
    }

    fn withdraw_request(&self, wizard: &WithdrawalWizard) -> Result<TransactionRequest, CustomError> {
        let amount = wizard
            .amount_to_withdraw
            .clone()
            .ok_or(CustomError::InvalidStepError("no amount entered".to_string()))?;
        let max_fee = wizard.exit_fee.data().copied().unwrap_or_default();

        let transactor = self.transactor.clone();
        let pool = wizard.pool.clone();
        let user = wizard.users_address;
        let units = amount.amount_unformatted;
        let call_transaction = Box::new(move || {
            async move { transactor.withdraw(&pool, user, units, max_fee).await }.boxed()
        });

        let balances = self.balances.clone();
        let pool_id = wizard.pool.id();
        Ok(TransactionRequest {
            name: format!("Withdraw {} {}", amount.amount_pretty, wizard.ticket.symbol),
            method: "withdraw".to_string(),
            chain_id: wizard.pool.chain_id,
            call_transaction,
            callbacks: TransactionCallbacks {
                refetch: Some(Box::new(move || balances.invalidate(&pool_id, user))),
                ..Default::default()
            },
        })
    }

    /// Closes the modal from any step.
    pub fn dismiss(&self, id: Uuid) -> Result<(), CustomError> {
        lock(&self.wizards)
            .remove(&id)
            .map(|_| ())
            .ok_or(CustomError::SessionNotFoundError(id))
    }

    /// Drops wizards the client has not touched for `max_age`, unless their
    /// withdrawal is still pending.
    pub fn expire(&self, max_age: Duration) -> usize {
        let now = Utc::now();
        let mut wizards = lock(&self.wizards);
        let before = wizards.len();
        wizards.retain(|id, wizard| {
            let pending = wizard
                .tx_id
                .and_then(|tx_id| self.tracker.get(tx_id))
                .is_some_and(|tx| tx.is_pending());
            let keep = pending || now - wizard.updated_at < max_age;
            if !keep {
                info!("withdrawal {} expired", id);
            }
            keep
        });
        before - wizards.len()
    }

    pub fn clear(&self) {
        lock(&self.wizards).clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AmountValidationError;
    use crate::models::{prize_pool::PoolVersion, token::TokenWithUsdBalance, transaction::TransactionStatus};
    use ethers::types::H256;

    fn token(symbol: &str) -> Token {
        Token {
            address: Address::repeat_byte(1),
            symbol: symbol.to_string(),
            name: symbol.to_string(),
            decimals: 18,
        }
    }

    fn wizard(balance: &str, price_per_share: &str) -> WithdrawalWizard {
        let tokens = PrizePoolTokens {
            ticket: token("PTaUSDC"),
            token: token("USDC"),
        };
        let raw = Amount::from_string(balance, 18).unwrap().amount_unformatted;
        let balances = UsersPrizePoolBalances {
            ticket: TokenWithUsdBalance::new(&tokens.ticket, raw),
            token: TokenWithUsdBalance::new(&tokens.token, U256::zero()),
        };
        let pool = PrizePool {
            chain_id: 1,
            address: Address::repeat_byte(2),
            ticket_address: Address::repeat_byte(3),
            token_address: Address::repeat_byte(4),
            version: PoolVersion::V4,
        };
        WithdrawalWizard::new(
            pool,
            Address::repeat_byte(5),
            tokens,
            &balances,
            Amount::from_string(price_per_share, 18).unwrap(),
        )
    }

    #[test]
    fn valid_amount_moves_to_review_with_receive_amount() {
        let mut wizard = wizard("20", "1.5");
        wizard.submit_amount("10").unwrap();
        assert_eq!(wizard.step, WithdrawalStep::Review);
        assert_eq!(wizard.amount_to_withdraw.as_ref().unwrap().amount, "10");
        assert_eq!(wizard.amount_to_receive.as_ref().unwrap().amount, "15");
    }

    #[test]
    fn insufficient_funds_keeps_input_step() {
        let mut wizard = wizard("5.0", "1");
        let err = wizard.submit_amount("6").unwrap_err();
        assert!(matches!(
            err,
            CustomError::AmountValidation(AmountValidationError::InsufficientFunds)
        ));
        assert_eq!(wizard.step, WithdrawalStep::Input);
    }

    #[test]
    fn review_goes_back_and_forward() {
        let mut wizard = wizard("5", "1");
        wizard.submit_amount("1").unwrap();
        wizard.back(None).unwrap();
        assert_eq!(wizard.step, WithdrawalStep::Input);
        assert!(wizard.back(None).is_err());
        wizard.submit_amount("2").unwrap();
        assert_eq!(wizard.amount_to_withdraw.unwrap().amount, "2");
    }

    #[test]
    fn exit_fee_requires_acknowledgment() {
        let mut wizard = wizard("5", "1");
        wizard.submit_amount("1").unwrap();
        assert!(!wizard.is_confirm_enabled(None));

        wizard.exit_fee = FetchState::Fetched(U256::from(1000u64));
        assert!(!wizard.is_confirm_enabled(None));
        wizard.set_exit_fee_approved(true);
        assert!(wizard.is_confirm_enabled(None));
    }

    #[test]
    fn failed_transaction_stays_on_review() {
        let mut wizard = wizard("5", "1");
        wizard.submit_amount("1").unwrap();
        wizard.exit_fee = FetchState::Fetched(U256::zero());
        wizard.tx_id = Some(9);

        let mut tx = Transaction::new(9, "Withdraw".into(), "withdraw".into(), 1);
        tx.set_status(TransactionStatus::Cancelled);
        wizard.observe_transaction(&tx);
        assert_eq!(wizard.step, WithdrawalStep::Review);
        assert!(wizard.is_confirm_enabled(Some(&tx)));

        tx.hash = Some(H256::repeat_byte(9));
        tx.set_status(TransactionStatus::InFlight);
        wizard.observe_transaction(&tx);
        assert_eq!(wizard.step, WithdrawalStep::ViewTxReceipt);
    }
}
