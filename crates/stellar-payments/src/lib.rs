// ============================================================================
// STELLAR-PAYMENTS - Stellar Horizon Integration
// ============================================================================
// Builds, signs and submits Stellar transactions through Horizon and keeps a
// small local account session.
//
// Features:
// - Query account balances (XLM and credit assets)
// - Fund testnet accounts through Friendbot
// - Send payments, opening the receiver's trustline when needed
// - Issue assets to a distribution account
// - Create, claim and list claimable balances
// - Persist named key pairs and the selected account
// ============================================================================

pub mod amount;
pub mod asset;
pub mod config;
pub mod error;
pub mod horizon;
pub mod keypair;
pub mod ledger;
pub mod sequence;
pub mod service;
pub mod session;
pub mod storage;
pub mod transaction;

pub use amount::Amount;
pub use asset::{Asset, NATIVE_CODE};
pub use config::{Network, StellarConfig};
pub use error::PaymentError;
pub use horizon::{
    AccountBalance, AccountInfo, Balance, ClaimableBalance, HorizonClient, ResultCodes,
    TransactionResponse,
};
pub use keypair::{is_valid_account_id, KeyPair, StoredAccount};
pub use ledger::Ledger;
pub use service::{AssetIssuance, ClaimableBalanceCreated, PaymentRequest, TransactionService};
pub use session::AccountSession;
pub use storage::{KeyValueStore, MemoryStore, SqliteStore};
pub use transaction::{
    Claimant, ClaimPredicate, Memo, Operation, OperationBody, Transaction, TransactionBuilder,
};

/// Re-export for convenience
pub type Result<T> = std::result::Result<T, PaymentError>;
