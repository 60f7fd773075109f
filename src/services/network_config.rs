use crate::{errors::CustomError, models::network_config::NetworkConfig};

/// Get network configuration based on chain ID
pub fn get_network_config(chain_id: u64) -> Result<NetworkConfig, CustomError> {
    match chain_id {
        1 => Ok(NetworkConfig {
            chain_id: 1,
            name: "Ethereum".to_string(),
            alias: "mainnet".to_string(),
            rpc_url: "https://cloudflare-eth.com".to_string(),
            symbol: "ETH".to_string(),
            block_explorer: "https://etherscan.io".to_string(),
            is_testnet: false,
            refetch_interval_ms: 15_000,
        }),
        4 => Ok(NetworkConfig {
            chain_id: 4,
            name: "Rinkeby".to_string(),
            alias: "rinkeby".to_string(),
            rpc_url: "https://rinkeby.infura.io/v3/YOUR-API-KEY".to_string(),
            symbol: "ETH".to_string(),
            block_explorer: "https://rinkeby.etherscan.io".to_string(),
            is_testnet: true,
            refetch_interval_ms: 15_000,
        }),
        137 => Ok(NetworkConfig {
            chain_id: 137,
            name: "Polygon".to_string(),
            alias: "polygon".to_string(),
            rpc_url: "https://polygon-rpc.com".to_string(),
            symbol: "MATIC".to_string(),
            block_explorer: "https://polygonscan.com".to_string(),
            is_testnet: false,
            refetch_interval_ms: 5_000,
        }),
        80001 => Ok(NetworkConfig {
            chain_id: 80001,
            name: "Mumbai".to_string(),
            alias: "mumbai".to_string(),
            rpc_url: "https://rpc-mumbai.maticvigil.com".to_string(),
            symbol: "MATIC".to_string(),
            block_explorer: "https://mumbai.polygonscan.com".to_string(),
            is_testnet: true,
            refetch_interval_ms: 5_000,
        }),
        43114 => Ok(NetworkConfig {
            chain_id: 43114,
            name: "Avalanche".to_string(),
            alias: "avalanche".to_string(),
            rpc_url: "https://api.avax.network/ext/bc/C/rpc".to_string(),
            symbol: "AVAX".to_string(),
            block_explorer: "https://snowtrace.io".to_string(),
            is_testnet: false,
            refetch_interval_ms: 5_000,
        }),
        43113 => Ok(NetworkConfig {
            chain_id: 43113,
            name: "Fuji".to_string(),
            alias: "fuji".to_string(),
            rpc_url: "https://api.avax-test.network/ext/bc/C/rpc".to_string(),
            symbol: "AVAX".to_string(),
            block_explorer: "https://testnet.snowtrace.io".to_string(),
            is_testnet: true,
            refetch_interval_ms: 5_000,
        }),
        _ => Err(CustomError::UnsupportedChainError(chain_id)),
    }
}

/// How long cached chain reads stay fresh on this chain.
pub fn refetch_interval_ms(chain_id: u64) -> u64 {
    get_network_config(chain_id)
        .map(|config| config.refetch_interval_ms)
        .unwrap_or(10_000)
}

/// Link to the external delegation tool preselected on this chain.
pub fn delegation_tools_url(chain_id: u64) -> Result<String, CustomError> {
    let config = get_network_config(chain_id)?;
    Ok(format!(
        "https://tools.pooltogether.com/delegate/?delegation_chain={}",
        config.alias
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_chains_are_unsupported() {
        assert!(matches!(
            get_network_config(999),
            Err(CustomError::UnsupportedChainError(999))
        ));
        assert_eq!(refetch_interval_ms(999), 10_000);
    }

    #[test]
    fn builds_delegation_tools_link() {
        assert_eq!(
            delegation_tools_url(137).unwrap(),
            "https://tools.pooltogether.com/delegate/?delegation_chain=polygon"
        );
    }
}
