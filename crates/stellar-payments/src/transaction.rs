// ============================================================================
// STELLAR-PAYMENTS - Transaction Builder
// ============================================================================
// Build and sign Stellar transactions for payments, trustlines and
// claimable balances.
//
// Stellar transactions consist of:
// - Source account
// - Sequence number (account sequence + 1)
// - Fee (base fee × operation count)
// - Time bounds
// - Memo (optional)
// - Operations, each with an optional source account override
// - Signatures (one per required signer)
// ============================================================================

use crate::amount::Amount;
use crate::asset::Asset;
use crate::config::StellarConfig;
use crate::error::PaymentError;
use crate::horizon::AccountInfo;
use crate::keypair::{verify_signature, xdr_account_id, xdr_muxed_account, KeyPair};
use crate::Result;
use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use stellar_xdr::curr::{
    BytesM, ChangeTrustOp, ClaimClaimableBalanceOp, ClaimPredicate as XdrPredicate,
    ClaimableBalanceId, Claimant as XdrClaimant, ClaimantV0, CreateClaimableBalanceOp,
    DecoratedSignature, Hash, HashIdPreimage, HashIdPreimageOperationId, Limits, Memo as XdrMemo,
    Operation as XdrOperation, OperationBody as XdrOperationBody, PaymentOp, Preconditions,
    ReadXdr, SequenceNumber, Signature, SignatureHint, StringM, TimeBounds as XdrTimeBounds,
    TimePoint, Transaction as XdrTransaction, TransactionEnvelope, TransactionExt,
    TransactionSignaturePayload, TransactionSignaturePayloadTaggedTransaction,
    TransactionV1Envelope, WriteXdr,
};

const MAX_OPERATIONS: usize = 100;
const MAX_SIGNATURES: usize = 20;
const MAX_MEMO_TEXT: usize = 28;

// ============================================================================
// TRANSACTION TYPES
// ============================================================================

/// Operation with an optional source account override
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    pub source_account: Option<String>,
    pub body: OperationBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationBody {
    /// Payment of native XLM or any credit asset
    Payment {
        destination: String,
        asset: Asset,
        amount: Amount,
    },

    /// Create or modify a trustline
    ChangeTrust { asset: Asset, limit: Amount },

    /// Escrow an amount for a set of claimants
    CreateClaimableBalance {
        asset: Asset,
        amount: Amount,
        claimants: Vec<Claimant>,
    },

    /// Claim a claimable balance
    ClaimClaimableBalance { balance_id: String },
}

impl Operation {
    pub fn payment(destination: &str, asset: Asset, amount: Amount) -> Self {
        Self::new(OperationBody::Payment {
            destination: destination.to_string(),
            asset,
            amount,
        })
    }

    pub fn change_trust(asset: Asset, limit: Amount) -> Self {
        Self::new(OperationBody::ChangeTrust { asset, limit })
    }

    pub fn create_claimable_balance(asset: Asset, amount: Amount, claimants: Vec<Claimant>) -> Self {
        Self::new(OperationBody::CreateClaimableBalance {
            asset,
            amount,
            claimants,
        })
    }

    pub fn claim_claimable_balance(balance_id: &str) -> Self {
        Self::new(OperationBody::ClaimClaimableBalance {
            balance_id: balance_id.to_string(),
        })
    }

    /// Run this operation on behalf of another account
    pub fn with_source(mut self, source: &str) -> Self {
        self.source_account = Some(source.to_string());
        self
    }

    fn new(body: OperationBody) -> Self {
        Self {
            source_account: None,
            body,
        }
    }

    fn to_xdr(&self) -> Result<XdrOperation> {
        let source_account = match &self.source_account {
            Some(source) => Some(xdr_muxed_account(source)?),
            None => None,
        };

        let body = match &self.body {
            OperationBody::Payment {
                destination,
                asset,
                amount,
            } => XdrOperationBody::Payment(PaymentOp {
                destination: xdr_muxed_account(destination)?,
                asset: asset.to_xdr()?,
                amount: amount.stroops(),
            }),

            OperationBody::ChangeTrust { asset, limit } => XdrOperationBody::ChangeTrust(ChangeTrustOp {
                line: asset.to_trust_line()?,
                limit: limit.stroops(),
            }),

            OperationBody::CreateClaimableBalance {
                asset,
                amount,
                claimants,
            } => {
                let claimants = claimants
                    .iter()
                    .map(Claimant::to_xdr)
                    .collect::<Result<Vec<_>>>()?;
                XdrOperationBody::CreateClaimableBalance(CreateClaimableBalanceOp {
                    asset: asset.to_xdr()?,
                    amount: amount.stroops(),
                    claimants: claimants.try_into()?,
                })
            }

            OperationBody::ClaimClaimableBalance { balance_id } => {
                XdrOperationBody::ClaimClaimableBalance(ClaimClaimableBalanceOp {
                    balance_id: parse_balance_id(balance_id)?,
                })
            }
        };

        Ok(XdrOperation { source_account, body })
    }

    pub fn is_change_trust(&self) -> bool {
        matches!(self.body, OperationBody::ChangeTrust { .. })
    }

    pub fn is_payment(&self) -> bool {
        matches!(self.body, OperationBody::Payment { .. })
    }
}

/// Claimant of a claimable balance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claimant {
    pub destination: String,
    pub predicate: ClaimPredicate,
}

impl Claimant {
    pub fn unconditional(destination: &str) -> Self {
        Self {
            destination: destination.to_string(),
            predicate: ClaimPredicate::Unconditional,
        }
    }

    fn to_xdr(&self) -> Result<XdrClaimant> {
        Ok(XdrClaimant::ClaimantTypeV0(ClaimantV0 {
            destination: xdr_account_id(&self.destination)?,
            predicate: self.predicate.to_xdr()?,
        }))
    }
}

/// Claim predicate (conditions for claiming)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClaimPredicate {
    Unconditional,
    And(Box<ClaimPredicate>, Box<ClaimPredicate>),
    Or(Box<ClaimPredicate>, Box<ClaimPredicate>),
    Not(Box<ClaimPredicate>),
    BeforeAbsoluteTime(i64),
    BeforeRelativeTime(i64),
}

impl ClaimPredicate {
    fn to_xdr(&self) -> Result<XdrPredicate> {
        Ok(match self {
            ClaimPredicate::Unconditional => XdrPredicate::Unconditional,
            ClaimPredicate::And(left, right) => {
                XdrPredicate::And(vec![left.to_xdr()?, right.to_xdr()?].try_into()?)
            }
            ClaimPredicate::Or(left, right) => {
                XdrPredicate::Or(vec![left.to_xdr()?, right.to_xdr()?].try_into()?)
            }
            ClaimPredicate::Not(inner) => XdrPredicate::Not(Some(Box::new(inner.to_xdr()?))),
            ClaimPredicate::BeforeAbsoluteTime(timestamp) => XdrPredicate::BeforeAbsoluteTime(*timestamp),
            ClaimPredicate::BeforeRelativeTime(seconds) => XdrPredicate::BeforeRelativeTime(*seconds),
        })
    }
}

/// Transaction memo
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Memo {
    #[default]
    None,
    Text(String),
    Id(u64),
    Hash([u8; 32]),
    Return([u8; 32]),
}

impl Memo {
    fn to_xdr(&self) -> Result<XdrMemo> {
        Ok(match self {
            Memo::None => XdrMemo::None,
            Memo::Text(text) => XdrMemo::Text(StringM::try_from(text.as_str())?),
            Memo::Id(id) => XdrMemo::Id(*id),
            Memo::Hash(hash) => XdrMemo::Hash(Hash(*hash)),
            Memo::Return(hash) => XdrMemo::Return(Hash(*hash)),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeBounds {
    pub min_time: u64,
    pub max_time: u64,
}

// ============================================================================
// TRANSACTION BUILDER
// ============================================================================

/// Builder for Stellar transactions
pub struct TransactionBuilder {
    network_passphrase: String,
    source_account: String,
    sequence: i64,
    base_fee: u32,
    operations: Vec<Operation>,
    memo: Memo,
    timeout_seconds: u64,
    time_bounds: Option<TimeBounds>,
}

impl TransactionBuilder {
    /// Start a transaction from a freshly loaded account snapshot
    pub fn new(config: &StellarConfig, source_account: &AccountInfo, base_fee: u32) -> Result<Self> {
        let sequence = source_account.sequence_number()?;
        Ok(Self::from_sequence(config, &source_account.id, sequence, base_fee))
    }

    /// Start a transaction from an address and its current sequence number
    pub fn from_sequence(
        config: &StellarConfig,
        source_account: &str,
        sequence: i64,
        base_fee: u32,
    ) -> Self {
        Self {
            network_passphrase: config.network_passphrase.clone(),
            source_account: source_account.to_string(),
            sequence,
            base_fee,
            operations: Vec::new(),
            memo: Memo::None,
            timeout_seconds: config.tx_timeout_seconds,
            time_bounds: None,
        }
    }

    pub fn memo(mut self, memo: Memo) -> Self {
        self.memo = memo;
        self
    }

    pub fn memo_text(self, text: &str) -> Self {
        self.memo(Memo::Text(text.to_string()))
    }

    /// Validity window in seconds from build time
    pub fn timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// Explicit time bounds, overriding the timeout
    pub fn time_bounds(mut self, min_time: u64, max_time: u64) -> Self {
        self.time_bounds = Some(TimeBounds { min_time, max_time });
        self
    }

    pub fn add_operation(mut self, op: Operation) -> Self {
        self.operations.push(op);
        self
    }

    pub fn operation_count(&self) -> usize {
        self.operations.len()
    }

    pub fn build(self) -> Result<Transaction> {
        if self.operations.is_empty() {
            return Err(PaymentError::InvalidTransaction(
                "Transaction must have at least one operation".to_string(),
            ));
        }
        if self.operations.len() > MAX_OPERATIONS {
            return Err(PaymentError::InvalidTransaction(format!(
                "Transaction has {} operations, maximum is {}",
                self.operations.len(),
                MAX_OPERATIONS
            )));
        }
        if let Memo::Text(text) = &self.memo {
            if text.len() > MAX_MEMO_TEXT {
                return Err(PaymentError::InvalidTransaction(format!(
                    "Memo text exceeds {} bytes",
                    MAX_MEMO_TEXT
                )));
            }
        }
        for op in &self.operations {
            if let OperationBody::ChangeTrust { asset: Asset::Native, .. } = op.body {
                return Err(PaymentError::InvalidTransaction(
                    "Cannot change trust on the native asset".to_string(),
                ));
            }
        }

        let fee = self
            .base_fee
            .checked_mul(self.operations.len() as u32)
            .ok_or_else(|| PaymentError::InvalidTransaction("Fee overflow".to_string()))?;

        let sequence = self
            .sequence
            .checked_add(1)
            .ok_or_else(|| PaymentError::InvalidTransaction("Sequence overflow".to_string()))?;

        let time_bounds = match self.time_bounds {
            Some(bounds) => bounds,
            None => {
                let now = chrono::Utc::now().timestamp().max(0) as u64;
                TimeBounds {
                    min_time: 0,
                    max_time: now.saturating_add(self.timeout_seconds),
                }
            }
        };

        let tx = Transaction {
            network_passphrase: self.network_passphrase,
            source_account: self.source_account,
            fee,
            sequence,
            time_bounds,
            memo: self.memo,
            operations: self.operations,
            signatures: Vec::new(),
        };

        // Surface malformed addresses and balance ids at build time
        tx.to_xdr_transaction()?;
        Ok(tx)
    }
}

// ============================================================================
// TRANSACTION
// ============================================================================

/// A built transaction, signed by zero or more key pairs
#[derive(Debug, Clone)]
pub struct Transaction {
    network_passphrase: String,
    source_account: String,
    fee: u32,
    sequence: i64,
    time_bounds: TimeBounds,
    memo: Memo,
    operations: Vec<Operation>,
    signatures: Vec<DecoratedSignature>,
}

impl Transaction {
    pub fn source_account(&self) -> &str {
        &self.source_account
    }

    pub fn fee(&self) -> u32 {
        self.fee
    }

    pub fn sequence(&self) -> i64 {
        self.sequence
    }

    pub fn time_bounds(&self) -> TimeBounds {
        self.time_bounds
    }

    pub fn memo(&self) -> &Memo {
        &self.memo
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn signatures(&self) -> &[DecoratedSignature] {
        &self.signatures
    }

    /// Network-bound transaction hash; this is what gets signed
    pub fn hash(&self) -> Result<[u8; 32]> {
        let network_id = Hash(Sha256::digest(self.network_passphrase.as_bytes()).into());

        let payload = TransactionSignaturePayload {
            network_id,
            tagged_transaction: TransactionSignaturePayloadTaggedTransaction::Tx(
                self.to_xdr_transaction()?,
            ),
        };
        let payload_bytes = payload.to_xdr(Limits::none())?;

        Ok(Sha256::digest(&payload_bytes).into())
    }

    pub fn hash_hex(&self) -> Result<String> {
        Ok(hex::encode(self.hash()?))
    }

    /// Add a signature from `keypair`
    pub fn sign(&mut self, keypair: &KeyPair) -> Result<()> {
        if self.signatures.len() >= MAX_SIGNATURES {
            return Err(PaymentError::SigningError(format!(
                "Transaction already carries {} signatures",
                MAX_SIGNATURES
            )));
        }
        let hash = self.hash()?;
        let signature: BytesM<64> = keypair
            .sign(&hash)
            .try_into()
            .map_err(|_| PaymentError::SigningError("Signature length mismatch".to_string()))?;

        self.signatures.push(DecoratedSignature {
            hint: SignatureHint(keypair.signature_hint()),
            signature: Signature(signature),
        });
        Ok(())
    }

    /// Whether any attached signature verifies against `address`
    pub fn is_signed_by(&self, address: &str) -> bool {
        let Ok(hash) = self.hash() else {
            return false;
        };
        self.signatures
            .iter()
            .any(|sig| verify_signature(address, &hash, sig.signature.0.as_vec()))
    }

    /// Base64 TransactionEnvelope (ENVELOPE_TYPE_TX) ready for Horizon
    pub fn to_envelope_xdr(&self) -> Result<String> {
        let envelope = TransactionEnvelope::Tx(TransactionV1Envelope {
            tx: self.to_xdr_transaction()?,
            signatures: self.signatures.clone().try_into()?,
        });
        let envelope_bytes = envelope.to_xdr(Limits::none())?;

        Ok(general_purpose::STANDARD.encode(envelope_bytes))
    }

    /// Id of the claimable balance created by the operation at `op_index`,
    /// derived from the OperationID preimage of (source, sequence, index).
    pub fn claimable_balance_id(&self, op_index: u32) -> Result<String> {
        match self.operations.get(op_index as usize) {
            Some(Operation {
                body: OperationBody::CreateClaimableBalance { .. },
                ..
            }) => {}
            _ => {
                return Err(PaymentError::InvalidTransaction(format!(
                    "Operation {} does not create a claimable balance",
                    op_index
                )))
            }
        }

        let preimage = HashIdPreimage::OpId(HashIdPreimageOperationId {
            source_account: xdr_account_id(&self.source_account)?,
            seq_num: SequenceNumber(self.sequence),
            op_num: op_index,
        });
        let hash = Sha256::digest(preimage.to_xdr(Limits::none())?);

        // Horizon renders ids as the hex of the whole union, type included
        let balance_id = ClaimableBalanceId::ClaimableBalanceIdTypeV0(Hash(hash.into()));
        Ok(hex::encode(balance_id.to_xdr(Limits::none())?))
    }

    fn to_xdr_transaction(&self) -> Result<XdrTransaction> {
        let operations = self
            .operations
            .iter()
            .map(Operation::to_xdr)
            .collect::<Result<Vec<_>>>()?;

        Ok(XdrTransaction {
            source_account: xdr_muxed_account(&self.source_account)?,
            fee: self.fee,
            seq_num: SequenceNumber(self.sequence),
            cond: Preconditions::Time(XdrTimeBounds {
                min_time: TimePoint(self.time_bounds.min_time),
                max_time: TimePoint(self.time_bounds.max_time),
            }),
            memo: self.memo.to_xdr()?,
            operations: operations.try_into()?,
            ext: TransactionExt::V0,
        })
    }
}

/// Accepts Horizon's 72-hex form ("00000000" + hash) or the bare 64-hex hash
pub fn parse_balance_id(balance_id: &str) -> Result<ClaimableBalanceId> {
    let invalid = || PaymentError::InvalidTransaction(format!("Invalid balance ID: {}", balance_id));

    let bytes = match balance_id.len() {
        72 => hex::decode(balance_id),
        64 => hex::decode(format!("00000000{}", balance_id)),
        _ => return Err(invalid()),
    }
    .map_err(|_| invalid())?;

    ClaimableBalanceId::from_xdr(bytes, Limits::none()).map_err(|_| invalid())
}
