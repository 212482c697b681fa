// ============================================================================
// STELLAR-PAYMENTS - Configuration
// ============================================================================
// Network configuration for Stellar public network, testnet, futurenet and
// custom (local) networks.
// Loadable from presets, environment variables or a JSON file.

use crate::error::PaymentError;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Environment variable holding the network name
pub const ENV_NETWORK: &str = "STELLAR_NETWORK";
/// Environment variable holding the Horizon URL
pub const ENV_HORIZON_URL: &str = "HORIZON_URL";
/// Environment variable holding the Friendbot URL
pub const ENV_FRIENDBOT_URL: &str = "STELLAR_FRIENDBOT_URL";
/// Environment variable holding the network passphrase
pub const ENV_NETWORK_PASSPHRASE: &str = "HORIZON_NETWORK_PASSPHRASE";

/// Network selection. Names other than the known presets are kept verbatim
/// (e.g. "standalone" for a local quickstart node).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Network {
    Public,
    Testnet,
    Futurenet,
    Custom(String),
}

impl Network {
    pub fn as_str(&self) -> &str {
        match self {
            Network::Public => "public",
            Network::Testnet => "testnet",
            Network::Futurenet => "futurenet",
            Network::Custom(name) => name,
        }
    }
}

/// Names are matched exactly; "TESTNET" is a custom network, not testnet
impl FromStr for Network {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "" => Err(PaymentError::Config("Network name is empty".to_string())),
            "public" | "mainnet" | "pubnet" => Ok(Network::Public),
            "testnet" => Ok(Network::Testnet),
            "futurenet" => Ok(Network::Futurenet),
            other => Ok(Network::Custom(other.to_string())),
        }
    }
}

impl TryFrom<String> for Network {
    type Error = PaymentError;

    fn try_from(name: String) -> Result<Self> {
        name.parse()
    }
}

impl From<Network> for String {
    fn from(network: Network) -> Self {
        network.as_str().to_string()
    }
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stellar network configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StellarConfig {
    /// Network the client talks to
    pub network: Network,

    /// Horizon API URL
    pub horizon_url: String,

    /// Friendbot faucet URL (only used on testnet)
    #[serde(default)]
    pub friendbot_url: Option<String>,

    /// Network passphrase for transaction signing
    pub network_passphrase: String,

    /// Lower bound for the per-operation fee in stroops.
    /// The fee actually used is the larger of this and the last ledger base fee.
    #[serde(default = "default_base_fee")]
    pub base_fee: u32,

    /// Transaction validity window in seconds
    #[serde(default = "default_tx_timeout")]
    pub tx_timeout_seconds: u64,

    /// Trustline limit = amount × this multiplier
    #[serde(default = "default_trust_limit_multiplier")]
    pub trust_limit_multiplier: i64,

    /// HTTP request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

fn default_base_fee() -> u32 {
    100 // 0.00001 XLM
}

fn default_tx_timeout() -> u64 {
    180
}

fn default_trust_limit_multiplier() -> i64 {
    100
}

fn default_request_timeout() -> u64 {
    30
}

impl StellarConfig {
    /// Create public network configuration
    pub fn public() -> Self {
        Self {
            network: Network::Public,
            horizon_url: "https://horizon.stellar.org".to_string(),
            friendbot_url: None,
            network_passphrase: "Public Global Stellar Network ; September 2015".to_string(),
            base_fee: default_base_fee(),
            tx_timeout_seconds: default_tx_timeout(),
            trust_limit_multiplier: default_trust_limit_multiplier(),
            request_timeout_seconds: default_request_timeout(),
        }
    }

    /// Create testnet configuration
    pub fn testnet() -> Self {
        Self {
            network: Network::Testnet,
            horizon_url: "https://horizon-testnet.stellar.org".to_string(),
            friendbot_url: Some("https://friendbot.stellar.org".to_string()),
            network_passphrase: "Test SDF Network ; September 2015".to_string(),
            ..Self::public()
        }
    }

    /// Create futurenet configuration
    pub fn futurenet() -> Self {
        Self {
            network: Network::Futurenet,
            horizon_url: "https://horizon-futurenet.stellar.org".to_string(),
            friendbot_url: None,
            network_passphrase: "Test SDF Future Network ; October 2022".to_string(),
            ..Self::public()
        }
    }

    /// Local network, defaulting to a quickstart node on port 8000
    pub fn custom(name: &str) -> Self {
        Self {
            network: Network::Custom(name.to_string()),
            horizon_url: "http://localhost:8000".to_string(),
            friendbot_url: None,
            network_passphrase: "Standalone Network ; February 2017".to_string(),
            ..Self::public()
        }
    }

    /// Preset for a network
    pub fn for_network(network: Network) -> Self {
        match network {
            Network::Public => Self::public(),
            Network::Testnet => Self::testnet(),
            Network::Futurenet => Self::futurenet(),
            Network::Custom(name) => Self::custom(&name),
        }
    }

    /// Build configuration from environment variables.
    ///
    /// `STELLAR_NETWORK` picks the preset (default: testnet); `HORIZON_URL`,
    /// `STELLAR_FRIENDBOT_URL` and `HORIZON_NETWORK_PASSPHRASE` override it.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let network = match lookup(ENV_NETWORK) {
            Some(name) => name.parse()?,
            None => Network::Testnet,
        };

        let mut config = Self::for_network(network);

        if let Some(url) = lookup(ENV_HORIZON_URL) {
            config.horizon_url = url;
        }
        if let Some(url) = lookup(ENV_FRIENDBOT_URL) {
            config.friendbot_url = Some(url);
        }
        if let Some(passphrase) = lookup(ENV_NETWORK_PASSPHRASE) {
            config.network_passphrase = passphrase;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| PaymentError::Config(format!("{}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that cannot reach a network
    pub fn validate(&self) -> Result<()> {
        if !self.horizon_url.starts_with("http://") && !self.horizon_url.starts_with("https://") {
            return Err(PaymentError::Config(format!(
                "Horizon URL must be http(s): {}",
                self.horizon_url
            )));
        }
        if self.network_passphrase.is_empty() {
            return Err(PaymentError::Config("Network passphrase is empty".to_string()));
        }
        if self.tx_timeout_seconds == 0 {
            return Err(PaymentError::Config(
                "Transaction timeout must be positive".to_string(),
            ));
        }
        if self.trust_limit_multiplier <= 0 {
            return Err(PaymentError::Config(
                "Trust limit multiplier must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Check if this is testnet. Friendbot funding is limited to it.
    pub fn is_testnet(&self) -> bool {
        self.network == Network::Testnet
    }

    /// Horizon URL without a trailing slash
    pub fn horizon_base(&self) -> &str {
        self.horizon_url.trim_end_matches('/')
    }

    /// Get Stellar Expert explorer URL for an address
    pub fn explorer_account_url(&self, address: &str) -> String {
        format!("https://stellar.expert/explorer/{}/account/{}", self.explorer_segment(), address)
    }

    /// Get Stellar Expert explorer URL for a transaction
    pub fn explorer_tx_url(&self, hash: &str) -> String {
        format!("https://stellar.expert/explorer/{}/tx/{}", self.explorer_segment(), hash)
    }

    fn explorer_segment(&self) -> &str {
        self.network.as_str()
    }
}

impl Default for StellarConfig {
    fn default() -> Self {
        Self::testnet()
    }
}
