// ============================================================================
// STELLAR-PAYMENTS - Horizon API Client
// ============================================================================
// HTTP client for Stellar's Horizon API.
// Handles account queries, fee stats, claimable balances, transaction
// submission and testnet Friendbot funding.
// ============================================================================

use crate::asset::{Asset, NATIVE_CODE};
use crate::config::StellarConfig;
use crate::error::PaymentError;
use crate::ledger::Ledger;
use crate::transaction::Transaction;
use crate::Result;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

// ============================================================================
// DATA TYPES
// ============================================================================

/// Account balance entry as returned by Horizon
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Balance {
    /// "native", "credit_alphanum4", "credit_alphanum12" or "liquidity_pool_shares"
    pub asset_type: String,

    #[serde(default)]
    pub asset_code: Option<String>,

    #[serde(default)]
    pub asset_issuer: Option<String>,

    #[serde(default)]
    pub liquidity_pool_id: Option<String>,

    /// Balance amount as string (Stellar uses string for precision)
    pub balance: String,

    /// Trustline limit (for non-native assets)
    #[serde(default)]
    pub limit: Option<String>,

    #[serde(default)]
    pub buying_liabilities: Option<String>,

    #[serde(default)]
    pub selling_liabilities: Option<String>,
}

impl Balance {
    pub fn is_native(&self) -> bool {
        self.asset_type == "native"
    }

    /// Code for simplified views; "XLM" for native
    pub fn display_code(&self) -> &str {
        if self.is_native() {
            NATIVE_CODE
        } else {
            self.asset_code.as_deref().unwrap_or(&self.asset_type)
        }
    }
}

/// Stellar account information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountInfo {
    /// Account public key (G... address)
    pub id: String,

    /// Current sequence number
    pub sequence: String,

    pub balances: Vec<Balance>,

    /// Number of subentries (affects minimum balance)
    #[serde(default)]
    pub subentry_count: u32,

    #[serde(default)]
    pub thresholds: AccountThresholds,

    #[serde(default)]
    pub flags: AccountFlags,

    #[serde(default)]
    pub home_domain: Option<String>,
}

impl AccountInfo {
    /// Parsed sequence number
    pub fn sequence_number(&self) -> Result<i64> {
        self.sequence.parse().map_err(|_| {
            PaymentError::Horizon(format!(
                "Invalid sequence number for {}: {}",
                self.id, self.sequence
            ))
        })
    }

    /// Whether any balance entry is structurally equal to `asset`
    pub fn has_trustline(&self, asset: &Asset) -> bool {
        self.balances
            .iter()
            .any(|b| Asset::from_balance(b).as_ref() == Some(asset))
    }

    /// Balance string for `asset`, if held
    pub fn balance_of(&self, asset: &Asset) -> Option<&str> {
        self.balances
            .iter()
            .find(|b| Asset::from_balance(b).as_ref() == Some(asset))
            .map(|b| b.balance.as_str())
    }

    /// Simplified (asset code, amount) view
    pub fn simplified_balances(&self) -> Vec<AccountBalance> {
        self.balances
            .iter()
            .map(|b| AccountBalance {
                asset_code: b.display_code().to_string(),
                amount: b.balance.clone(),
            })
            .collect()
    }
}

/// Simplified balance line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountBalance {
    pub asset_code: String,
    pub amount: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountThresholds {
    pub low_threshold: u8,
    pub med_threshold: u8,
    pub high_threshold: u8,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountFlags {
    pub auth_required: bool,
    pub auth_revocable: bool,
    pub auth_immutable: bool,
    #[serde(default)]
    pub auth_clawback_enabled: bool,
}

/// Claimable balance information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimableBalance {
    /// Balance ID (used to claim)
    pub id: String,

    /// "native" or "CODE:ISSUER"
    pub asset: String,

    pub amount: String,

    #[serde(default)]
    pub sponsor: Option<String>,

    #[serde(default)]
    pub last_modified_ledger: u64,

    pub claimants: Vec<HorizonClaimant>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HorizonClaimant {
    pub destination: String,
    pub predicate: serde_json::Value,
}

/// Transaction submission result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionResponse {
    pub hash: String,
    #[serde(default)]
    pub ledger: u64,
    #[serde(default)]
    pub envelope_xdr: String,
    #[serde(default)]
    pub result_xdr: String,
    #[serde(default)]
    pub result_meta_xdr: String,
    #[serde(default)]
    pub fee_charged: Option<String>,
    #[serde(default = "default_successful")]
    pub successful: bool,
}

fn default_successful() -> bool {
    true
}

/// Horizon error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HorizonErrorResponse {
    #[serde(rename = "type")]
    pub error_type: Option<String>,
    pub title: Option<String>,
    pub status: Option<u16>,
    pub detail: Option<String>,
    pub extras: Option<HorizonErrorExtras>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HorizonErrorExtras {
    pub envelope_xdr: Option<String>,
    pub result_codes: Option<ResultCodes>,
    pub result_xdr: Option<String>,
}

/// Structured rejection codes, e.g. `tx_failed` / `[op_no_trust]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultCodes {
    pub transaction: Option<String>,
    pub operations: Option<Vec<String>>,
}

impl std::fmt::Display for ResultCodes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "tx: {}, ops: [{}]",
            self.transaction.as_deref().unwrap_or("-"),
            self.operations.as_deref().unwrap_or_default().join(", ")
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeStats {
    pub last_ledger: String,
    pub last_ledger_base_fee: String,
    #[serde(default)]
    pub ledger_capacity_usage: Option<String>,
}

impl FeeStats {
    pub fn base_fee(&self) -> Result<u32> {
        self.last_ledger_base_fee.parse().map_err(|_| {
            PaymentError::Horizon(format!("Invalid base fee: {}", self.last_ledger_base_fee))
        })
    }
}

// ============================================================================
// HORIZON CLIENT
// ============================================================================

/// Client for Stellar Horizon API
pub struct HorizonClient {
    config: StellarConfig,
    http: Client,
}

impl HorizonClient {
    pub fn new(config: StellarConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| PaymentError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, http })
    }

    pub fn config(&self) -> &StellarConfig {
        &self.config
    }

    // ==================== Account Operations ====================

    /// Check if account exists
    pub async fn account_exists(&self, address: &str) -> Result<bool> {
        let url = format!("{}/accounts/{}", self.config.horizon_base(), address);

        let response = self.http.get(&url).send().await?;

        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            StatusCode::TOO_MANY_REQUESTS => Err(PaymentError::RateLimited),
            status => Err(horizon_error(status, response).await),
        }
    }

    /// Load account information
    pub async fn load_account(&self, address: &str) -> Result<AccountInfo> {
        let url = format!("{}/accounts/{}", self.config.horizon_base(), address);

        debug!("Loading account: {}", address);

        let response = self.http.get(&url).send().await?;

        match response.status() {
            StatusCode::OK => Ok(response.json().await?),
            StatusCode::NOT_FOUND => Err(PaymentError::AccountNotFound(address.to_string())),
            StatusCode::TOO_MANY_REQUESTS => Err(PaymentError::RateLimited),
            status => Err(horizon_error(status, response).await),
        }
    }

    // ==================== Claimable Balances ====================

    /// Get claimable balances an account can claim
    pub async fn get_claimable_balances(&self, claimant: &str) -> Result<Vec<ClaimableBalance>> {
        let url = format!("{}/claimable_balances", self.config.horizon_base());

        debug!("Fetching claimable balances for: {}", claimant);

        let response = self
            .http
            .get(&url)
            .query(&[("claimant", claimant)])
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {
                let data: serde_json::Value = response.json().await?;
                let records = data["_embedded"]["records"]
                    .as_array()
                    .cloned()
                    .unwrap_or_default();

                Ok(records
                    .into_iter()
                    .filter_map(|r| serde_json::from_value(r).ok())
                    .collect())
            }
            StatusCode::TOO_MANY_REQUESTS => Err(PaymentError::RateLimited),
            status => Err(horizon_error(status, response).await),
        }
    }

    // ==================== Transaction Submission ====================

    /// Submit a signed transaction
    pub async fn submit_transaction(&self, tx: &Transaction) -> Result<TransactionResponse> {
        let url = format!("{}/transactions", self.config.horizon_base());
        let envelope_xdr = tx.to_envelope_xdr()?;

        debug!("Submitting transaction with {} operation(s)", tx.operations().len());

        let response = self
            .http
            .post(&url)
            .form(&[("tx", envelope_xdr.as_str())])
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {
                let tx_response: TransactionResponse = response.json().await?;
                debug!("Transaction successful: {}", tx_response.hash);
                Ok(tx_response)
            }
            StatusCode::TOO_MANY_REQUESTS => Err(PaymentError::RateLimited),
            StatusCode::GATEWAY_TIMEOUT => Err(PaymentError::TransactionTimeout),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(submission_error(status, &body))
            }
        }
    }

    // ==================== Testnet Only ====================

    /// Fund account using Friendbot (testnet only)
    pub async fn friendbot_fund(&self, address: &str) -> Result<()> {
        if !self.config.is_testnet() {
            return Err(PaymentError::UnsupportedOperation(format!(
                "Friendbot is only available on testnet, not {}",
                self.config.network
            )));
        }

        let friendbot_url = self
            .config
            .friendbot_url
            .as_deref()
            .ok_or_else(|| PaymentError::Config("Friendbot URL not configured".to_string()))?;

        debug!("Requesting Friendbot funding for: {}", address);

        let response = self
            .http
            .get(friendbot_url)
            .query(&[("addr", address)])
            .send()
            .await
            .map_err(|e| PaymentError::FundingFailed(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            debug!("Friendbot funded account: {}", address);
            return Ok(());
        }

        let error_text = response.text().await.unwrap_or_default();
        Err(PaymentError::FundingFailed(format!(
            "Friendbot HTTP {}: {}",
            status.as_u16(),
            error_text
        )))
    }

    // ==================== Fee Estimation ====================

    pub async fn get_fee_stats(&self) -> Result<FeeStats> {
        let url = format!("{}/fee_stats", self.config.horizon_base());

        let response = self.http.get(&url).send().await?;

        match response.status() {
            StatusCode::OK => Ok(response.json().await?),
            StatusCode::TOO_MANY_REQUESTS => Err(PaymentError::RateLimited),
            status => Err(horizon_error(status, response).await),
        }
    }
}

async fn horizon_error(status: StatusCode, response: reqwest::Response) -> PaymentError {
    let error_text = response.text().await.unwrap_or_default();
    PaymentError::Horizon(format!("HTTP {}: {}", status.as_u16(), error_text))
}

/// Map a rejected submission body to `SubmissionFailed`, keeping result codes
fn submission_error(status: StatusCode, body: &str) -> PaymentError {
    let parsed: Option<HorizonErrorResponse> = serde_json::from_str(body).ok();

    let result_codes = parsed
        .as_ref()
        .and_then(|e| e.extras.as_ref())
        .and_then(|extras| extras.result_codes.clone());

    let reason = match (&result_codes, &parsed) {
        (Some(codes), _) => codes.to_string(),
        (None, Some(err)) => err
            .detail
            .clone()
            .or_else(|| err.title.clone())
            .unwrap_or_else(|| format!("HTTP {}", status.as_u16())),
        (None, None) => format!("HTTP {}: {}", status.as_u16(), body),
    };

    warn!("Transaction rejected: {}", reason);
    PaymentError::SubmissionFailed {
        reason,
        result_codes,
    }
}

#[async_trait]
impl Ledger for HorizonClient {
    async fn load_account(&self, address: &str) -> Result<AccountInfo> {
        HorizonClient::load_account(self, address).await
    }

    async fn fetch_base_fee(&self) -> Result<u32> {
        self.get_fee_stats().await?.base_fee()
    }

    async fn submit_transaction(&self, tx: &Transaction) -> Result<TransactionResponse> {
        HorizonClient::submit_transaction(self, tx).await
    }

    async fn fund_account(&self, address: &str) -> Result<()> {
        self.friendbot_fund(address).await
    }

    async fn claimable_balances(&self, claimant: &str) -> Result<Vec<ClaimableBalance>> {
        self.get_claimable_balances(claimant).await
    }
}
