#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use ethers::types::{Address, H256, U256};

use prize_savings::{
    config::Config,
    errors::CustomError,
    models::{
        prize_pool::{PoolVersion, PrizePool, RawPrizePoolBalances},
        token::{PrizePoolTokens, Token},
    },
    services::prize_pool_client::{PrizePoolClient, PrizePoolTransactor, ReceiptSource},
    state::AppState,
};

pub const USER: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";
pub const OTHER: &str = "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359";

pub fn user() -> Address {
    USER.parse().unwrap()
}

pub fn other() -> Address {
    OTHER.parse().unwrap()
}

pub fn pool() -> PrizePool {
    PrizePool {
        chain_id: 137,
        address: Address::repeat_byte(0x11),
        ticket_address: Address::repeat_byte(0x22),
        token_address: Address::repeat_byte(0x33),
        version: PoolVersion::V4,
    }
}

pub fn pod_pool() -> PrizePool {
    PrizePool {
        chain_id: 1,
        version: PoolVersion::V3Pod {
            pod: Address::repeat_byte(0x44),
        },
        ..pool()
    }
}

pub fn units(whole: u64) -> U256 {
    U256::from(whole) * U256::exp10(6)
}

/// What the fake wallet does when asked to sign.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WalletBehavior {
    Sign,
    Reject,
    Fail,
}

/// In-memory chain: balances, delegates and receipts are plain maps the test
/// can poke at.
pub struct FakeChain {
    pub ticket_balance: Mutex<U256>,
    pub token_balance: Mutex<U256>,
    pub delegates: Mutex<HashMap<Address, Address>>,
    pub price_per_share: Mutex<U256>,
    pub exit_fee: Mutex<Option<U256>>,
    pub fail_reads: Mutex<bool>,
    pub wallet: Mutex<WalletBehavior>,
    pub receipts: Mutex<HashMap<H256, bool>>,
    pub sent: Mutex<Vec<(String, H256)>>,
    /// Account each signed transaction was sent for.
    pub signed_for: Mutex<Vec<Address>>,
    /// How long the wallet takes to sign.
    pub sign_delay: Mutex<Option<Duration>>,
    pub balance_reads: Mutex<usize>,
}

impl Default for FakeChain {
    fn default() -> Self {
        Self {
            ticket_balance: Mutex::new(units(100)),
            token_balance: Mutex::new(units(5)),
            delegates: Mutex::new(HashMap::new()),
            price_per_share: Mutex::new(U256::exp10(18)),
            exit_fee: Mutex::new(Some(U256::zero())),
            fail_reads: Mutex::new(false),
            wallet: Mutex::new(WalletBehavior::Sign),
            receipts: Mutex::new(HashMap::new()),
            sent: Mutex::new(Vec::new()),
            signed_for: Mutex::new(Vec::new()),
            sign_delay: Mutex::new(None),
            balance_reads: Mutex::new(0),
        }
    }
}

impl FakeChain {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn last_hash(&self) -> H256 {
        self.sent.lock().unwrap().last().unwrap().1
    }

    /// Mines every sent transaction with the given outcome.
    pub fn mine_all(&self, success: bool) {
        let sent = self.sent.lock().unwrap().clone();
        let mut receipts = self.receipts.lock().unwrap();
        for (_, hash) in sent {
            receipts.insert(hash, success);
        }
    }

    fn read_guard(&self) -> Result<(), CustomError> {
        if *self.fail_reads.lock().unwrap() {
            Err(CustomError::NetworkError("rpc unavailable".to_string()))
        } else {
            Ok(())
        }
    }

    async fn sign(&self, method: &str, user: Address) -> Result<H256, CustomError> {
        let delay = *self.sign_delay.lock().unwrap();
        if let Some(delay) = delay {
            actix_web::rt::time::sleep(delay).await;
        }
        let behavior = *self.wallet.lock().unwrap();
        match behavior {
            WalletBehavior::Sign => {
                let mut sent = self.sent.lock().unwrap();
                let hash = H256::from_low_u64_be(sent.len() as u64 + 1);
                sent.push((method.to_string(), hash));
                self.signed_for.lock().unwrap().push(user);
                Ok(hash)
            }
            WalletBehavior::Reject => Err(CustomError::UserRejectedError),
            WalletBehavior::Fail => Err(CustomError::ContractError("execution reverted".to_string())),
        }
    }
}

#[async_trait]
impl PrizePoolClient for FakeChain {
    async fn get_prize_pool_tokens(&self, pool: &PrizePool) -> Result<PrizePoolTokens, CustomError> {
        Ok(PrizePoolTokens {
            ticket: Token {
                address: pool.ticket_address,
                symbol: "PTaUSDC".to_string(),
                name: "PoolTogether aUSDC Ticket".to_string(),
                decimals: 6,
            },
            token: Token {
                address: pool.token_address,
                symbol: "USDC".to_string(),
                name: "USD Coin".to_string(),
                decimals: 6,
            },
        })
    }

    async fn get_users_prize_pool_balances(
        &self,
        _pool: &PrizePool,
        _user: Address,
    ) -> Result<RawPrizePoolBalances, CustomError> {
        *self.balance_reads.lock().unwrap() += 1;
        self.read_guard()?;
        Ok(RawPrizePoolBalances {
            ticket: *self.ticket_balance.lock().unwrap(),
            token: *self.token_balance.lock().unwrap(),
        })
    }

    async fn get_users_ticket_delegate(
        &self,
        _pool: &PrizePool,
        user: Address,
    ) -> Result<Address, CustomError> {
        self.read_guard()?;
        Ok(self
            .delegates
            .lock()
            .unwrap()
            .get(&user)
            .copied()
            .unwrap_or_default())
    }

    async fn get_price_per_share(&self, _pool: &PrizePool) -> Result<U256, CustomError> {
        self.read_guard()?;
        Ok(*self.price_per_share.lock().unwrap())
    }

    async fn get_exit_fee(
        &self,
        _pool: &PrizePool,
        _user: Address,
        _amount: U256,
    ) -> Result<U256, CustomError> {
        self.exit_fee
            .lock()
            .unwrap()
            .ok_or_else(|| CustomError::ContractError("exit fee unavailable".to_string()))
    }
}

#[async_trait]
impl PrizePoolTransactor for FakeChain {
    async fn withdraw(
        &self,
        _pool: &PrizePool,
        user: Address,
        _amount: U256,
        _max_fee: U256,
    ) -> Result<H256, CustomError> {
        self.sign("withdraw", user).await
    }

    async fn delegate_tickets(
        &self,
        _pool: &PrizePool,
        user: Address,
        _delegate: Address,
    ) -> Result<H256, CustomError> {
        self.sign("delegate", user).await
    }
}

#[async_trait]
impl ReceiptSource for FakeChain {
    async fn receipt_status(&self, _chain_id: u64, hash: H256) -> Result<Option<bool>, CustomError> {
        Ok(self.receipts.lock().unwrap().get(&hash).copied())
    }
}

pub fn test_config(vars: &[(&str, &str)]) -> Config {
    let pools = serde_json::to_string(&vec![pool(), pod_pool()]).unwrap();
    let mut vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    vars.entry("PRIZE_POOLS".to_string()).or_insert(pools);
    Config::from_lookup(|key| vars.get(key).cloned()).unwrap()
}

pub fn app_state(chain: &Arc<FakeChain>) -> AppState {
    app_state_with(chain, &[])
}

pub fn app_state_with(chain: &Arc<FakeChain>, vars: &[(&str, &str)]) -> AppState {
    AppState::new(test_config(vars), chain.clone(), chain.clone()).unwrap()
}
