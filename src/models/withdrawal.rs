use ethers::types::U256;
use serde::Serialize;

use crate::errors::AmountValidationError;

use super::{
    amount::{mul_div, parse_units, Amount},
    fetch_state::FetchState,
    transaction::Transaction,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum WithdrawalStep {
    Input,
    Review,
    ViewTxReceipt,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepEvent {
    /// The amount form passed validation.
    AmountAccepted,
    /// The user wants to edit the amount again.
    Back,
    /// The withdrawal transaction is in flight or completed successfully.
    TxDisplayable,
}

impl WithdrawalStep {
    /// Events that do not apply to the current step leave it unchanged.
    pub fn next(self, event: StepEvent) -> WithdrawalStep {
        match (self, event) {
            (WithdrawalStep::Input, StepEvent::AmountAccepted) => WithdrawalStep::Review,
            (WithdrawalStep::Review, StepEvent::Back) => WithdrawalStep::Input,
            (WithdrawalStep::Review, StepEvent::TxDisplayable) => WithdrawalStep::ViewTxReceipt,
            (step, _) => step,
        }
    }
}

/// Checks a typed withdrawal amount against the token precision and the
/// user's ticket balance, returning the amount in minor units.
pub fn validate_withdrawal_amount(
    value: &str,
    decimals: u8,
    balance: &Amount,
) -> Result<U256, AmountValidationError> {
    let (negative, units) = parse_units(value, decimals)?;
    if units.is_zero() {
        return Err(AmountValidationError::Zero);
    }
    if negative {
        return Err(AmountValidationError::Negative);
    }
    if units > balance.amount_unformatted {
        return Err(AmountValidationError::InsufficientFunds);
    }
    Ok(units)
}

/// `amount * price_per_share`, expressed in the amount's decimals.
pub fn amount_to_receive(amount: &Amount, price_per_share: &Amount) -> Amount {
    let units = mul_div(
        amount.amount_unformatted,
        price_per_share.amount_unformatted,
        U256::exp10(price_per_share.decimals as usize),
    );
    Amount::from_unformatted(units, amount.decimals)
}

/// A zero fee needs no acknowledgment.
pub fn is_exit_fee_agreed(exit_fee: &FetchState<U256>, approved: bool) -> bool {
    match exit_fee {
        FetchState::Fetched(fee) if fee.is_zero() => true,
        _ => approved,
    }
}

/// Gate for the review step's confirm button.
pub fn is_confirm_enabled(
    exit_fee: &FetchState<U256>,
    approved: bool,
    tx: Option<&Transaction>,
) -> bool {
    exit_fee.is_fetched()
        && is_exit_fee_agreed(exit_fee, approved)
        && !tx.is_some_and(Transaction::is_pending)
}
