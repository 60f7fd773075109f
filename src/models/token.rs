use ethers::types::{Address, U256};
use serde::{Deserialize, Serialize};

use super::amount::{mul_div, Amount};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub address: Address,
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
}

/// The ticket minted on deposit and the underlying deposit token of a pool.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrizePoolTokens {
    pub ticket: Token,
    pub token: Token,
}

/// A token together with a user's balance of it and the USD value of that
/// balance. The USD value assumes the token is a stablecoin pegged 1:1.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenWithUsdBalance {
    #[serde(flatten)]
    pub token: Token,
    pub amount: String,
    pub amount_unformatted: U256,
    pub amount_pretty: String,
    pub has_balance: bool,
    pub balance_usd: Amount,
    pub usd_per_token: u32,
    /// Balance in USD cents.
    pub balance_usd_scaled: U256,
}

impl TokenWithUsdBalance {
    pub fn new(token: &Token, balance_unformatted: U256) -> Self {
        let balance = Amount::from_unformatted(balance_unformatted, token.decimals);
        let balance_usd_scaled = to_scaled_usd(&balance);
        Self {
            token: token.clone(),
            amount: balance.amount.clone(),
            amount_unformatted: balance.amount_unformatted,
            amount_pretty: balance.amount_pretty.clone(),
            has_balance: !balance_unformatted.is_zero(),
            balance_usd: balance,
            usd_per_token: 1,
            balance_usd_scaled,
        }
    }

    pub fn balance(&self) -> Amount {
        Amount::from_unformatted(self.amount_unformatted, self.token.decimals)
    }
}

/// Converts a token amount to whole USD cents at a 1:1 peg, truncating.
pub fn to_scaled_usd(amount: &Amount) -> U256 {
    mul_div(
        amount.amount_unformatted,
        U256::from(100u64),
        U256::exp10(amount.decimals as usize),
    )
}
