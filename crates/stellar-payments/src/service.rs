// ============================================================================
// STELLAR-PAYMENTS - Transaction Service
// ============================================================================
// High-level operations on top of a `Ledger`:
// - Account balances and testnet funding
// - Payments with an on-demand receiver trustline
// - Two-step asset issuance (trustline, then issuer payment)
// - Claimable balance create / claim / list
//
// Every submission loads a fresh source snapshot, so sequence numbers come
// from the ledger. Submissions sharing a source account are serialized.
// ============================================================================

use crate::amount::Amount;
use crate::asset::Asset;
use crate::config::StellarConfig;
use crate::error::PaymentError;
use crate::horizon::{AccountBalance, AccountInfo, ClaimableBalance, TransactionResponse};
use crate::keypair::KeyPair;
use crate::ledger::Ledger;
use crate::sequence::SourceLocks;
use crate::transaction::{Claimant, Operation, Transaction, TransactionBuilder};
use crate::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

// ============================================================================
// REQUEST / RESULT TYPES
// ============================================================================

/// Payment from sender to receiver in XLM or a credit asset
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub sender_public: String,
    pub sender_secret: String,
    pub receiver_public: String,

    /// Needed only when the receiver has to open a trustline first
    #[serde(default)]
    pub receiver_secret: Option<String>,

    pub amount: Amount,

    /// "XLM" for the native asset
    pub asset_code: String,

    /// Issuer of a credit asset; defaults to the receiver
    #[serde(default)]
    pub asset_issuer: Option<String>,

    #[serde(default)]
    pub memo: Option<String>,
}

/// Result of a two-step asset issuance
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetIssuance {
    pub asset: Asset,
    pub trustline: TransactionResponse,
    pub payment: TransactionResponse,
}

/// Result of creating a claimable balance
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimableBalanceCreated {
    /// Id to pass to `claim_claimable_balance`
    pub balance_id: String,
    pub response: TransactionResponse,
}

// ============================================================================
// TRANSACTION SERVICE
// ============================================================================

pub struct TransactionService<L: Ledger> {
    config: StellarConfig,
    ledger: L,
    locks: SourceLocks,
}

impl<L: Ledger> TransactionService<L> {
    pub fn new(config: StellarConfig, ledger: L) -> Self {
        Self {
            config,
            ledger,
            locks: SourceLocks::new(),
        }
    }

    pub fn config(&self) -> &StellarConfig {
        &self.config
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    // ==================== Accounts ====================

    /// Balances of `address` as (asset code, amount); native shows as "XLM"
    pub async fn account_balances(&self, address: &str) -> Result<Vec<AccountBalance>> {
        let account = self.load_account(address).await?;
        Ok(account.simplified_balances())
    }

    /// Fresh random key pair. Nothing is created on the ledger.
    pub fn create_keypair(&self) -> KeyPair {
        KeyPair::random()
    }

    /// Fund `address` through Friendbot. Testnet only.
    pub async fn fund_account(&self, address: &str) -> Result<()> {
        if !self.config.is_testnet() {
            return Err(PaymentError::UnsupportedOperation(format!(
                "Funding is only available on testnet, not {}",
                self.config.network
            )));
        }

        match self.ledger.fund_account(address).await {
            Ok(()) => {
                info!("Account funded: {}", address);
                Ok(())
            }
            Err(e) => {
                warn!("Funding failed for {}: {}", address, e);
                Err(match e {
                    PaymentError::FundingFailed(_) => e,
                    other => PaymentError::FundingFailed(other.to_string()),
                })
            }
        }
    }

    // ==================== Payments ====================

    /// Send a payment, opening the receiver's trustline in the same
    /// transaction when the receiver does not yet hold the asset.
    pub async fn payment(&self, request: &PaymentRequest) -> Result<TransactionResponse> {
        let sender = signer_for(&request.sender_secret, &request.sender_public)?;
        require_positive(request.amount)?;

        let _guard = self.locks.acquire(&request.sender_public).await;

        let tx = self.build_payment(request, &sender).await?;
        let response = self.submit(&tx, "Payment").await?;

        info!(
            "Payment sent: {} {} -> {}",
            request.amount, request.asset_code, request.receiver_public
        );
        Ok(response)
    }

    async fn build_payment(&self, request: &PaymentRequest, sender: &KeyPair) -> Result<Transaction> {
        let source = self.load_account(&request.sender_public).await?;

        let issuer = request
            .asset_issuer
            .as_deref()
            .unwrap_or(&request.receiver_public);
        let asset = Asset::resolve(&request.asset_code, issuer)?;

        // Any non-native asset gets a trustline check, including the default
        // case where the receiver is its own issuer.
        let needs_trustline = if asset.is_native() {
            false
        } else {
            let receiver = self.load_account(&request.receiver_public).await?;
            !receiver.has_trustline(&asset)
        };

        let mut builder = self.builder_for(&source).await?;

        let receiver_signer = if needs_trustline {
            let secret = request.receiver_secret.as_deref().ok_or_else(|| {
                PaymentError::InvalidTransaction(format!(
                    "{} has no trustline for {} and no receiver secret was given",
                    request.receiver_public, asset
                ))
            })?;
            let receiver = signer_for(secret, &request.receiver_public)?;

            debug!("Adding trustline for {} on {}", asset, request.receiver_public);
            builder = builder.add_operation(
                Operation::change_trust(asset.clone(), self.trust_limit(request.amount)?)
                    .with_source(&request.receiver_public),
            );
            Some(receiver)
        } else {
            None
        };

        builder = builder.add_operation(Operation::payment(
            &request.receiver_public,
            asset,
            request.amount,
        ));

        if let Some(memo) = &request.memo {
            builder = builder.memo_text(memo);
        }

        let mut tx = builder.build()?;
        tx.sign(sender)?;
        if let Some(receiver) = &receiver_signer {
            tx.sign(receiver)?;
        }

        Ok(tx)
    }

    // ==================== Asset Issuance ====================

    /// Issue `amount` of `code` from the issuer to the distributor.
    ///
    /// Runs two transactions: the distributor's trustline, then the issuer's
    /// payment. They are not atomic. If the payment fails the trustline stays.
    pub async fn create_asset(
        &self,
        issuer_secret: &str,
        distributor_secret: &str,
        code: &str,
        amount: Amount,
    ) -> Result<AssetIssuance> {
        let issuer = KeyPair::from_secret(issuer_secret)?;
        let distributor = KeyPair::from_secret(distributor_secret)?;
        require_positive(amount)?;

        let asset = Asset::credit(code, &issuer.public_key())?;
        let distributor_address = distributor.public_key();
        let issuer_address = issuer.public_key();

        // Step 1: distributor trusts the asset
        let trustline = {
            let _guard = self.locks.acquire(&distributor_address).await;
            let source = self.load_account(&distributor_address).await?;

            let mut tx = self
                .builder_for(&source)
                .await?
                .add_operation(
                    Operation::change_trust(asset.clone(), self.trust_limit(amount)?)
                        .with_source(&distributor_address),
                )
                .build()?;
            tx.sign(&distributor)?;

            self.submit(&tx, "Issuance trustline").await?
        };

        info!("Trustline established: {} trusts {}", distributor_address, asset);

        // Step 2: issuer pays the distributor
        let payment = {
            let _guard = self.locks.acquire(&issuer_address).await;
            let result = async {
                let source = self.load_account(&issuer_address).await?;
                let mut tx = self
                    .builder_for(&source)
                    .await?
                    .add_operation(Operation::payment(&distributor_address, asset.clone(), amount))
                    .build()?;
                tx.sign(&issuer)?;
                self.submit(&tx, "Issuance payment").await
            }
            .await;

            match result {
                Ok(response) => response,
                Err(e) => {
                    warn!(
                        "Partial issuance: trustline {} for {} persists, payment failed: {}",
                        trustline.hash, asset, e
                    );
                    return Err(e);
                }
            }
        };

        info!("Asset issued: {} {} -> {}", amount, asset, distributor_address);

        Ok(AssetIssuance {
            asset,
            trustline,
            payment,
        })
    }

    // ==================== Claimable Balances ====================

    /// Escrow `amount` claimable by either the sender or `destination`.
    /// Credit assets are issued by the sender.
    pub async fn create_claimable_balance(
        &self,
        asset_code: &str,
        amount: Amount,
        sender_secret: &str,
        destination: &str,
    ) -> Result<ClaimableBalanceCreated> {
        let sender = KeyPair::from_secret(sender_secret)?;
        let sender_address = sender.public_key();
        require_positive(amount)?;

        let asset = Asset::resolve(asset_code, &sender_address)?;

        let _guard = self.locks.acquire(&sender_address).await;
        let source = self.load_account(&sender_address).await?;

        let mut tx = self
            .builder_for(&source)
            .await?
            .add_operation(Operation::create_claimable_balance(
                asset.clone(),
                amount,
                vec![
                    Claimant::unconditional(&sender_address),
                    Claimant::unconditional(destination),
                ],
            ))
            .build()?;
        tx.sign(&sender)?;

        let balance_id = tx.claimable_balance_id(0)?;
        let response = self.submit(&tx, "Claimable balance").await?;

        info!(
            "Claimable balance created: {} {} for {} ({})",
            amount, asset, destination, balance_id
        );

        Ok(ClaimableBalanceCreated {
            balance_id,
            response,
        })
    }

    /// Claim a claimable balance for the key pair behind `claimant_secret`
    pub async fn claim_claimable_balance(
        &self,
        claimant_secret: &str,
        balance_id: &str,
    ) -> Result<TransactionResponse> {
        let claimant = KeyPair::from_secret(claimant_secret)?;
        let claimant_address = claimant.public_key();

        let _guard = self.locks.acquire(&claimant_address).await;
        let source = self.load_account(&claimant_address).await?;

        let mut tx = self
            .builder_for(&source)
            .await?
            .add_operation(
                Operation::claim_claimable_balance(balance_id).with_source(&claimant_address),
            )
            .build()?;
        tx.sign(&claimant)?;

        let response = self.submit(&tx, "Claim").await?;
        info!("Claimable balance claimed: {} by {}", balance_id, claimant_address);
        Ok(response)
    }

    /// Claimable balances `claimant` may claim
    pub async fn claimable_balances(&self, claimant: &str) -> Result<Vec<ClaimableBalance>> {
        self.ledger.claimable_balances(claimant).await
    }

    // ==================== Internals ====================

    /// Any load failure is reported as `AccountNotFound`; the cause is logged.
    async fn load_account(&self, address: &str) -> Result<AccountInfo> {
        match self.ledger.load_account(address).await {
            Ok(account) => Ok(account),
            Err(PaymentError::AccountNotFound(a)) => Err(PaymentError::AccountNotFound(a)),
            Err(e) => {
                warn!("Loading account {} failed: {}", address, e);
                Err(PaymentError::AccountNotFound(address.to_string()))
            }
        }
    }

    /// Builder with the per-operation fee for the next ledger
    async fn builder_for(&self, source: &AccountInfo) -> Result<TransactionBuilder> {
        let network_fee = self.ledger.fetch_base_fee().await?;
        let fee = network_fee.max(self.config.base_fee);
        debug!("Using base fee {} (network {})", fee, network_fee);

        TransactionBuilder::new(&self.config, source, fee)
    }

    fn trust_limit(&self, amount: Amount) -> Result<Amount> {
        amount.checked_mul(self.config.trust_limit_multiplier)
    }

    /// Submit and log; the error is returned unchanged
    async fn submit(&self, tx: &Transaction, action: &str) -> Result<TransactionResponse> {
        match self.ledger.submit_transaction(tx).await {
            Ok(response) => {
                info!("{} submitted: {}", action, response.hash);
                Ok(response)
            }
            Err(e) => {
                match e.result_codes() {
                    Some(codes) => error!("{} rejected: {}", action, codes),
                    None => error!("{} failed: {}", action, e),
                }
                Err(e)
            }
        }
    }
}

/// Parse `secret` and check it belongs to `address`
fn signer_for(secret: &str, address: &str) -> Result<KeyPair> {
    let keypair = KeyPair::from_secret(secret)?;
    if keypair.public_key() != address {
        return Err(PaymentError::InvalidSecretKey);
    }
    Ok(keypair)
}

fn require_positive(amount: Amount) -> Result<()> {
    if amount.is_zero() {
        return Err(PaymentError::InvalidAmount("amount must be positive".to_string()));
    }
    Ok(())
}
