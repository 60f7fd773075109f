use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use ethers::providers::ProviderError;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{api_response::ApiResponse, transaction::TxId};

#[derive(Error, Debug)]
pub enum CustomError {
    #[error("Invalid transaction: {0}")]
    InvalidTransactionError(String),

    #[error("Internal server error")]
    InternalServerError,

    #[error("Provider error: {0}")]
    ProviderError(#[from] ProviderError),

    #[error("Invalid address: {0}")]
    InvalidAddressError(String),

    #[error(transparent)]
    AmountValidation(#[from] AmountValidationError),

    #[error(transparent)]
    AddressValidation(#[from] AddressValidationError),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Unsupported chain: {0}")]
    UnsupportedChainError(u64),

    #[error("Wallet is on chain {actual:?}, expected chain {expected}")]
    WrongNetworkError { expected: u64, actual: Option<u64> },

    #[error("Wallet not connected")]
    WalletNotConnectedError,

    #[error("Contract error: {0}")]
    ContractError(String),

    #[error("Prize pool not found: {0}")]
    PoolNotFoundError(String),

    #[error("Session not found: {0}")]
    SessionNotFoundError(Uuid),

    #[error("Transaction not found: {0}")]
    TransactionNotFoundError(TxId),

    #[error("Not fetched yet: {0}")]
    NotFetchedError(&'static str),

    #[error("Invalid step: {0}")]
    InvalidStepError(String),

    #[error("Transaction rejected in wallet")]
    UserRejectedError,

    #[error("Transaction failed")]
    TransactionFailedError,

    #[error("Stale client bundle, reload required")]
    ReloadRequiredError,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid input: {0}")]
    ValidationError(String),

    /// A form validation failure with its message already localized.
    #[error("{message}")]
    FormError { field: &'static str, message: String },
}

/// Reasons a withdrawal amount is refused, in the order they are checked.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AmountValidationError {
    #[error("Amount is required")]
    Required,
    #[error("Amount is not a number")]
    NotANumber,
    #[error("Amount has more than {max} decimal places")]
    TooPrecise { max: u8 },
    #[error("Amount must be greater than zero")]
    Zero,
    #[error("Amount must not be negative")]
    Negative,
    #[error("Insufficient funds")]
    InsufficientFunds,
}

impl AmountValidationError {
    pub fn message_key(&self) -> &'static str {
        match self {
            AmountValidationError::Required => "ticketQuantityRequired",
            AmountValidationError::NotANumber => "invalidAmount",
            AmountValidationError::TooPrecise { .. } => "tooManyDecimals",
            AmountValidationError::Zero => "amountMustBeGreaterThanZero",
            AmountValidationError::Negative => "amountMustNotBeNegative",
            AmountValidationError::InsufficientFunds => "insufficientFunds",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum AddressValidationError {
    #[error("Please enter a valid address")]
    InvalidAddress(String),
}

impl AddressValidationError {
    pub fn message_key(&self) -> &'static str {
        "pleaseEnterAValidAddress"
    }
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    code: u16,
    message: String,
}

impl ResponseError for CustomError {
    fn status_code(&self) -> StatusCode {
        match self {
            CustomError::InvalidTransactionError(_)
            | CustomError::InvalidAddressError(_)
            | CustomError::UnsupportedChainError(_)
            | CustomError::WrongNetworkError { .. }
            | CustomError::ValidationError(_) => StatusCode::BAD_REQUEST,
            CustomError::AmountValidation(_)
            | CustomError::AddressValidation(_)
            | CustomError::FormError { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            CustomError::WalletNotConnectedError => StatusCode::UNAUTHORIZED,
            CustomError::PoolNotFoundError(_)
            | CustomError::SessionNotFoundError(_)
            | CustomError::TransactionNotFoundError(_) => StatusCode::NOT_FOUND,
            CustomError::NotFetchedError(_)
            | CustomError::InvalidStepError(_)
            | CustomError::UserRejectedError => StatusCode::CONFLICT,
            CustomError::ReloadRequiredError => StatusCode::SERVICE_UNAVAILABLE,
            CustomError::InternalServerError
            | CustomError::ProviderError(_)
            | CustomError::NetworkError(_)
            | CustomError::ContractError(_)
            | CustomError::TransactionFailedError
            | CustomError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let api_error = ApiError {
            code: status.as_u16(),
            message: self.to_string(),
        };

        HttpResponse::build(status).json(ApiResponse {
            status: "FAILURE".to_string(),
            code: api_error.code,
            result: None::<()>,
            error: Some(api_error),
        })
    }
}
