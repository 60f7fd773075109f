pub mod amount;
pub mod api_response;
pub mod delegation;
pub mod fetch_state;
pub mod network_config;
pub mod network_status;
pub mod prize_pool;
pub mod token;
pub mod transaction;
pub mod wallet;
pub mod withdrawal;
