// ============================================================================
// STELLAR-PAYMENTS - Error Types
// ============================================================================

use crate::horizon::ResultCodes;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PaymentError {
    // ==================== Key Errors ====================
    #[error("Invalid Stellar address: {0}")]
    InvalidStellarAddress(String),

    #[error("Invalid secret key")]
    InvalidSecretKey,

    #[error("Signing failed: {0}")]
    SigningError(String),

    // ==================== Account Errors ====================
    /// Remote account load failed. Network failures and missing accounts
    /// both land here at the service level.
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    // ==================== Funding Errors ====================
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Funding failed: {0}")]
    FundingFailed(String),

    // ==================== Transaction Errors ====================
    #[error("Transaction submission failed: {reason}")]
    SubmissionFailed {
        reason: String,
        result_codes: Option<ResultCodes>,
    },

    #[error("Transaction timeout")]
    TransactionTimeout,

    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),

    // ==================== Asset / Amount Errors ====================
    #[error("Invalid asset: {0}")]
    InvalidAsset(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    // ==================== Network Errors ====================
    #[error("Horizon API error: {0}")]
    Horizon(String),

    #[error("Network request failed: {0}")]
    Network(String),

    #[error("Rate limited - try again later")]
    RateLimited,

    // ==================== Local Errors ====================
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl PaymentError {
    /// Structured rejection codes attached by Horizon, if any
    pub fn result_codes(&self) -> Option<&ResultCodes> {
        match self {
            PaymentError::SubmissionFailed { result_codes, .. } => result_codes.as_ref(),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for PaymentError {
    fn from(err: reqwest::Error) -> Self {
        PaymentError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for PaymentError {
    fn from(err: serde_json::Error) -> Self {
        PaymentError::Serialization(err.to_string())
    }
}

impl From<stellar_xdr::curr::Error> for PaymentError {
    fn from(err: stellar_xdr::curr::Error) -> Self {
        PaymentError::InvalidTransaction(format!("XDR encoding error: {}", err))
    }
}

impl From<rusqlite::Error> for PaymentError {
    fn from(err: rusqlite::Error) -> Self {
        PaymentError::Storage(err.to_string())
    }
}
