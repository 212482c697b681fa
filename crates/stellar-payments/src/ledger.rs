// ============================================================================
// STELLAR-PAYMENTS - Ledger Seam
// ============================================================================
// The remote ledger as seen by the transaction service. `HorizonClient` is
// the production implementation; tests plug in an in-memory ledger.
// ============================================================================

use crate::horizon::{AccountInfo, ClaimableBalance, TransactionResponse};
use crate::transaction::Transaction;
use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait Ledger: Send + Sync {
    /// Current snapshot of an account (sequence number and balances)
    async fn load_account(&self, address: &str) -> Result<AccountInfo>;

    /// Base fee charged per operation in the last closed ledger, in stroops
    async fn fetch_base_fee(&self) -> Result<u32>;

    /// Submit a signed transaction and wait for it to be applied
    async fn submit_transaction(&self, tx: &Transaction) -> Result<TransactionResponse>;

    /// Create and fund an account through the network's faucet
    async fn fund_account(&self, address: &str) -> Result<()>;

    /// Claimable balances `claimant` may claim
    async fn claimable_balances(&self, claimant: &str) -> Result<Vec<ClaimableBalance>>;
}
