use std::str::FromStr;

use actix_web::HttpRequest;
use ethers::types::Address;

use crate::errors::CustomError;
use crate::models::wallet::WalletSession;

pub const WALLET_ADDRESS_HEADER: &str = "x-wallet-address";
pub const WALLET_CHAIN_ID_HEADER: &str = "x-wallet-chain-id";
pub const WALLET_NAME_HEADER: &str = "x-wallet-name";

pub struct WalletService;

impl WalletService {
    /// The browser forwards what its wallet reports on every request.
    pub fn session_from_request(req: &HttpRequest) -> WalletSession {
        let header = |name: &str| {
            req.headers()
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        WalletSession {
            address: header(WALLET_ADDRESS_HEADER),
            chain_id: header(WALLET_CHAIN_ID_HEADER).and_then(|id| id.parse().ok()),
            wallet_name: header(WALLET_NAME_HEADER),
        }
    }

    pub fn users_address(session: &WalletSession) -> Result<Address, CustomError> {
        let address = session
            .address
            .as_deref()
            .filter(|_| session.is_wallet_connected())
            .ok_or(CustomError::WalletNotConnectedError)?;
        Address::from_str(address).map_err(|_| CustomError::InvalidAddressError(address.to_string()))
    }

    /// Transactions may only be sent while the wallet is on the pool's chain.
    pub fn ensure_on_network(session: &WalletSession, chain_id: u64) -> Result<(), CustomError> {
        if session.is_on_network(chain_id) {
            Ok(())
        } else {
            Err(CustomError::WrongNetworkError {
                expected: chain_id,
                actual: session.chain_id,
            })
        }
    }
}
