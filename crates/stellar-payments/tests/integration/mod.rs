//! Integration Tests Module
//!
//! End-to-end flows through `TransactionService` against an in-memory
//! ledger, plus `HorizonClient` against a local HTTP server.
//!
//! Test categories:
//! - `payment_flow`: Payments, conditional trustlines, fees, sequencing
//! - `issuance_flow`: Two-step asset issuance and partial failure
//! - `claimable_flow`: Claimable balance create / claim / list
//! - `funding_flow`: Friendbot funding and balance queries
//! - `session_flow`: Named accounts persisted in SQLite
//! - `horizon_http`: Horizon wire format and status handling

mod mock_horizon;

mod claimable_flow;
mod horizon_http;

use fake_ledger::FakeLedger;
use stellar_payments::{KeyPair, StellarConfig, TransactionService};

/// Testnet service over a fresh in-memory ledger
pub fn testnet_service() -> TransactionService<FakeLedger> {
    TransactionService::new(StellarConfig::testnet(), FakeLedger::new())
}

/// Random key pair whose account exists with the starting XLM balance
pub fn funded(service: &TransactionService<FakeLedger>) -> KeyPair {
    let keypair = KeyPair::random();
    service.ledger().create_account(&keypair.public_key());
    keypair
}
