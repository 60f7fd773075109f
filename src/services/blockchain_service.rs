use async_trait::async_trait;
use ethers::{
    contract::abigen,
    middleware::SignerMiddleware,
    providers::{Http, Middleware, Provider},
    signers::{LocalWallet, Signer},
    types::{Address, H256, U256, U64},
};
use log::{info, warn};
use std::{collections::HashMap, fmt::Display, str::FromStr, sync::Arc};

use crate::{
    errors::CustomError,
    models::{
        network_config::NetworkConfig,
        prize_pool::{PoolVersion, PrizePool, RawPrizePoolBalances},
        token::{PrizePoolTokens, Token},
    },
};

use super::prize_pool_client::{PrizePoolClient, PrizePoolTransactor, ReceiptSource};

abigen!(
    Erc20Contract,
    "[
        function balanceOf(address owner) view returns (uint256)
        function decimals() view returns (uint8)
        function symbol() view returns (string)
        function name() view returns (string)
    ]"
);

abigen!(
    TicketContract,
    "[
        function delegateOf(address user) view returns (address)
        function delegate(address to)
    ]"
);

abigen!(
    PrizePoolContract,
    "[
        function withdrawFrom(address from, uint256 amount) returns (uint256)
    ]"
);

abigen!(
    PodContract,
    "[
        function getPricePerShare() view returns (uint256)
        function getEarlyExitFee(uint256 amount) returns (uint256)
        function withdraw(uint256 shareAmount, uint256 maxFee) returns (uint256)
    ]"
);

type SignerClient = SignerMiddleware<Provider<Http>, LocalWallet>;

fn contract_error(e: impl Display) -> CustomError {
    CustomError::ContractError(e.to_string())
}

/// Prize pool reads and writes over JSON-RPC, one provider per chain.
#[derive(Clone, Debug)]
pub struct BlockchainClient {
    providers: HashMap<u64, Arc<Provider<Http>>>,
    wallet: Option<LocalWallet>,
}

impl BlockchainClient {
    pub fn new(networks: &[NetworkConfig], private_key: Option<&str>) -> Result<Self, CustomError> {
        let mut providers = HashMap::new();
        for config in networks {
            let provider = Provider::<Http>::try_from(config.rpc_url.as_str())
                .map_err(|e| CustomError::NetworkError(e.to_string()))?;
            providers.insert(config.chain_id, Arc::new(provider));
        }

        let wallet = private_key
            .map(|key| {
                LocalWallet::from_str(key)
                    .map_err(|e| CustomError::ConfigError(format!("Failed to create wallet: {}", e)))
            })
            .transpose()?;
        if let Some(wallet) = &wallet {
            info!("transactions will be signed by {:?}", wallet.address());
        }

        Ok(Self { providers, wallet })
    }

    /// Logs providers whose endpoint reports a different chain than configured.
    pub async fn verify_chain_ids(&self) {
        for (chain_id, provider) in &self.providers {
            match provider.get_chainid().await {
                Ok(connected) if connected.as_u64() == *chain_id => {}
                Ok(connected) => warn!(
                    "rpc for chain {} is connected to chain {}",
                    chain_id, connected
                ),
                Err(e) => warn!("rpc for chain {} unreachable: {}", chain_id, e),
            }
        }
    }

    fn provider(&self, chain_id: u64) -> Result<Arc<Provider<Http>>, CustomError> {
        self.providers
            .get(&chain_id)
            .cloned()
            .ok_or(CustomError::UnsupportedChainError(chain_id))
    }

    fn signer(&self, chain_id: u64) -> Result<Arc<SignerClient>, CustomError> {
        let wallet = self
            .wallet
            .clone()
            .ok_or(CustomError::WalletNotConnectedError)?;
        let provider = self.provider(chain_id)?;
        Ok(Arc::new(SignerMiddleware::new(
            (*provider).clone(),
            wallet.with_chain_id(chain_id),
        )))
    }

    fn ensure_signer_is(&self, user: Address) -> Result<(), CustomError> {
        match &self.wallet {
            Some(wallet) if wallet.address() == user => Ok(()),
            Some(_) => Err(CustomError::InvalidTransactionError(format!(
                "signer does not control {:?}",
                user
            ))),
            None => Err(CustomError::WalletNotConnectedError),
        }
    }

    async fn read_token(&self, chain_id: u64, address: Address) -> Result<Token, CustomError> {
        let contract = Erc20Contract::new(address, self.provider(chain_id)?);
        let decimals = contract.decimals().call().await.map_err(contract_error)?;
        let symbol = contract.symbol().call().await.map_err(contract_error)?;
        let name = contract.name().call().await.map_err(contract_error)?;
        Ok(Token {
            address,
            symbol,
            name,
            decimals,
        })
    }

    async fn balance_of(
        &self,
        chain_id: u64,
        token: Address,
        owner: Address,
    ) -> Result<U256, CustomError> {
        let contract = Erc20Contract::new(token, self.provider(chain_id)?);
        contract.balance_of(owner).call().await.map_err(contract_error)
    }
}

#[async_trait]
impl PrizePoolClient for BlockchainClient {
    async fn get_prize_pool_tokens(&self, pool: &PrizePool) -> Result<PrizePoolTokens, CustomError> {
        let (ticket, token) = futures::try_join!(
            self.read_token(pool.chain_id, pool.ticket_address),
            self.read_token(pool.chain_id, pool.token_address)
        )?;
        Ok(PrizePoolTokens { ticket, token })
    }

    async fn get_users_prize_pool_balances(
        &self,
        pool: &PrizePool,
        user: Address,
    ) -> Result<RawPrizePoolBalances, CustomError> {
        let (ticket, token) = futures::try_join!(
            self.balance_of(pool.chain_id, pool.ticket_address, user),
            self.balance_of(pool.chain_id, pool.token_address, user)
        )?;
        Ok(RawPrizePoolBalances { ticket, token })
    }

    async fn get_users_ticket_delegate(
        &self,
        pool: &PrizePool,
        user: Address,
    ) -> Result<Address, CustomError> {
        let ticket = TicketContract::new(pool.ticket_address, self.provider(pool.chain_id)?);
        ticket.delegate_of(user).call().await.map_err(contract_error)
    }

    async fn get_price_per_share(&self, pool: &PrizePool) -> Result<U256, CustomError> {
        match &pool.version {
            PoolVersion::V4 => Ok(U256::exp10(18)),
            PoolVersion::V3Pod { pod } => {
                let pod = PodContract::new(*pod, self.provider(pool.chain_id)?);
                pod.get_price_per_share().call().await.map_err(contract_error)
            }
        }
    }

    async fn get_exit_fee(
        &self,
        pool: &PrizePool,
        _user: Address,
        amount: U256,
    ) -> Result<U256, CustomError> {
        match &pool.version {
            PoolVersion::V4 => Ok(U256::zero()),
            PoolVersion::V3Pod { pod } => {
                let pod = PodContract::new(*pod, self.provider(pool.chain_id)?);
                pod.get_early_exit_fee(amount)
                    .call()
                    .await
                    .map_err(contract_error)
            }
        }
    }
}

#[async_trait]
impl PrizePoolTransactor for BlockchainClient {
    async fn withdraw(
        &self,
        pool: &PrizePool,
        user: Address,
        amount: U256,
        max_fee: U256,
    ) -> Result<H256, CustomError> {
        self.ensure_signer_is(user)?;
        let client = self.signer(pool.chain_id)?;

        let hash = match &pool.version {
            PoolVersion::V4 => {
                let contract = PrizePoolContract::new(pool.address, client);
                let call = contract.withdraw_from(user, amount);
                let pending = call.send().await.map_err(contract_error)?;
                pending.tx_hash()
            }
            PoolVersion::V3Pod { pod } => {
                let contract = PodContract::new(*pod, client);
                let call = contract.withdraw(amount, max_fee);
                let pending = call.send().await.map_err(contract_error)?;
                pending.tx_hash()
            }
        };
        info!("withdrawal {:?} sent on chain {}", hash, pool.chain_id);
        Ok(hash)
    }

    async fn delegate_tickets(
        &self,
        pool: &PrizePool,
        user: Address,
        delegate: Address,
    ) -> Result<H256, CustomError> {
        self.ensure_signer_is(user)?;
        let ticket = TicketContract::new(pool.ticket_address, self.signer(pool.chain_id)?);
        let call = ticket.delegate(delegate);
        let pending = call.send().await.map_err(contract_error)?;
        let hash = pending.tx_hash();
        info!("delegation {:?} sent on chain {}", hash, pool.chain_id);
        Ok(hash)
    }
}

#[async_trait]
impl ReceiptSource for BlockchainClient {
    async fn receipt_status(&self, chain_id: u64, hash: H256) -> Result<Option<bool>, CustomError> {
        let receipt = self
            .provider(chain_id)?
            .get_transaction_receipt(hash)
            .await?;
        Ok(receipt.map(|receipt| receipt.status == Some(U64::from(1))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::network_config::get_network_config;

    const SIGNER_KEY: &str = "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

    fn pool() -> PrizePool {
        PrizePool {
            chain_id: 137,
            address: Address::repeat_byte(0x11),
            ticket_address: Address::repeat_byte(0x22),
            token_address: Address::repeat_byte(0x33),
            version: PoolVersion::V4,
        }
    }

    fn client(private_key: Option<&str>) -> BlockchainClient {
        BlockchainClient::new(&[get_network_config(137).unwrap()], private_key).unwrap()
    }

    #[actix_web::test]
    async fn refuses_to_sign_for_another_account() {
        let client = client(Some(SIGNER_KEY));
        let someone_else = Address::repeat_byte(0x99);

        let err = client
            .delegate_tickets(&pool(), someone_else, Address::repeat_byte(0x55))
            .await
            .unwrap_err();
        assert!(matches!(err, CustomError::InvalidTransactionError(_)));

        let err = client
            .withdraw(&pool(), someone_else, U256::one(), U256::zero())
            .await
            .unwrap_err();
        assert!(matches!(err, CustomError::InvalidTransactionError(_)));
    }

    #[actix_web::test]
    async fn writes_need_a_signer() {
        let err = client(None)
            .delegate_tickets(&pool(), Address::repeat_byte(0x99), Address::zero())
            .await
            .unwrap_err();
        assert!(matches!(err, CustomError::WalletNotConnectedError));
    }

    #[test]
    fn unknown_chain_has_no_provider() {
        assert!(matches!(
            client(None).provider(5),
            Err(CustomError::UnsupportedChainError(5))
        ));
    }
}
