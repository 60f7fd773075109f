use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use ethers::types::Address;
use log::{debug, warn};

use crate::errors::CustomError;
use crate::models::{
    fetch_state::FetchState,
    prize_pool::{PrizePool, UsersPrizePoolBalances},
    token::{PrizePoolTokens, TokenWithUsdBalance},
};

use super::lock;
use super::network_config::refetch_interval_ms;
use super::prize_pool_client::PrizePoolClient;

type BalanceKey = (String, Address);

#[derive(Clone)]
struct CachedBalances {
    balances: UsersPrizePoolBalances,
    fetched_at: DateTime<Utc>,
}

/// Users' ticket and token balances per pool, cached for the chain's refetch
/// interval.
pub struct BalanceService {
    client: Arc<dyn PrizePoolClient>,
    tokens: Mutex<HashMap<String, PrizePoolTokens>>,
    balances: Mutex<HashMap<BalanceKey, CachedBalances>>,
}

impl BalanceService {
    pub fn new(client: Arc<dyn PrizePoolClient>) -> Self {
        Self {
            client,
            tokens: Mutex::new(HashMap::new()),
            balances: Mutex::new(HashMap::new()),
        }
    }

    /// Token metadata never changes, so it is fetched once per pool.
    pub async fn get_prize_pool_tokens(&self, pool: &PrizePool) -> Result<PrizePoolTokens, CustomError> {
        let pool_id = pool.id();
        if let Some(tokens) = lock(&self.tokens).get(&pool_id).cloned() {
            return Ok(tokens);
        }

        let tokens = self.client.get_prize_pool_tokens(pool).await?;
        lock(&self.tokens).insert(pool_id, tokens.clone());
        Ok(tokens)
    }

    pub async fn get_users_prize_pool_balances(
        &self,
        users_address: &str,
        pool: &PrizePool,
    ) -> Result<UsersPrizePoolBalances, CustomError> {
        if users_address.trim().is_empty() {
            return Err(CustomError::WalletNotConnectedError);
        }
        let user = Address::from_str(users_address.trim())
            .map_err(|_| CustomError::InvalidAddressError(users_address.to_string()))?;
        let tokens = self.get_prize_pool_tokens(pool).await?;

        let key = (pool.id(), user);
        let max_age = Duration::milliseconds(refetch_interval_ms(pool.chain_id) as i64);
        if let Some(cached) = lock(&self.balances).get(&key) {
            if Utc::now() - cached.fetched_at < max_age {
                debug!("balances for {:?} in {} served from cache", user, key.0);
                return Ok(cached.balances.clone());
            }
        }

        let raw = match self.client.get_users_prize_pool_balances(pool, user).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("balance fetch for {:?} in {} failed: {}", user, key.0, e);
                lock(&self.balances).remove(&key);
                return Err(e);
            }
        };

        let balances = UsersPrizePoolBalances {
            ticket: TokenWithUsdBalance::new(&tokens.ticket, raw.ticket),
            token: TokenWithUsdBalance::new(&tokens.token, raw.token),
        };
        lock(&self.balances).insert(
            key,
            CachedBalances {
                balances: balances.clone(),
                fetched_at: Utc::now(),
            },
        );
        Ok(balances)
    }

    /// Snapshot of the cache without touching the chain.
    pub fn cached_balances(&self, pool_id: &str, user: Address) -> FetchState<UsersPrizePoolBalances> {
        lock(&self.balances)
            .get(&(pool_id.to_string(), user))
            .map(|cached| cached.balances.clone())
            .into()
    }

    pub fn invalidate(&self, pool_id: &str, user: Address) {
        lock(&self.balances).remove(&(pool_id.to_string(), user));
    }

    /// Drops cached balances fetched at least `max_age` ago.
    pub fn expire(&self, max_age: Duration) -> usize {
        let now = Utc::now();
        let mut balances = lock(&self.balances);
        let before = balances.len();
        balances.retain(|_, cached| now - cached.fetched_at < max_age);
        before - balances.len()
    }

    pub fn clear(&self) {
        lock(&self.tokens).clear();
        lock(&self.balances).clear();
    }
}
