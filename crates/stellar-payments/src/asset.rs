// ============================================================================
// STELLAR-PAYMENTS - Assets
// ============================================================================

use crate::error::PaymentError;
use crate::horizon::Balance;
use crate::keypair::{is_valid_account_id, xdr_account_id};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use stellar_xdr::curr::{
    AlphaNum12, AlphaNum4, Asset as XdrAsset, AssetCode12, AssetCode4, ChangeTrustAsset,
};

/// Code used for the network's native asset in simplified views
pub const NATIVE_CODE: &str = "XLM";

/// Stellar asset. Equality is structural on (code, issuer); the native
/// asset never equals a credit asset, whatever its code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Asset {
    Native,
    Credit { code: String, issuer: String },
}

impl Asset {
    pub fn native() -> Self {
        Asset::Native
    }

    /// Create a credit asset, validating code and issuer
    pub fn credit(code: &str, issuer: &str) -> Result<Self> {
        if code.is_empty() || code.len() > 12 || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(PaymentError::InvalidAsset(format!(
                "asset code must be 1-12 alphanumeric characters: {:?}",
                code
            )));
        }
        if !is_valid_account_id(issuer) {
            return Err(PaymentError::InvalidAsset(format!("invalid issuer: {}", issuer)));
        }
        Ok(Asset::Credit {
            code: code.to_string(),
            issuer: issuer.to_string(),
        })
    }

    /// Native when `code` is the native sentinel, otherwise (code, issuer)
    pub fn resolve(code: &str, issuer: &str) -> Result<Self> {
        if code == NATIVE_CODE {
            Ok(Asset::Native)
        } else {
            Asset::credit(code, issuer)
        }
    }

    /// Asset held by a Horizon balance entry. Liquidity pool shares have no
    /// asset representation and yield `None`.
    pub fn from_balance(balance: &Balance) -> Option<Self> {
        if balance.is_native() {
            return Some(Asset::Native);
        }
        match (&balance.asset_code, &balance.asset_issuer) {
            (Some(code), Some(issuer)) => Some(Asset::Credit {
                code: code.clone(),
                issuer: issuer.clone(),
            }),
            _ => None,
        }
    }

    pub fn is_native(&self) -> bool {
        matches!(self, Asset::Native)
    }

    /// Display code; "XLM" for native
    pub fn code(&self) -> &str {
        match self {
            Asset::Native => NATIVE_CODE,
            Asset::Credit { code, .. } => code,
        }
    }

    pub fn issuer(&self) -> Option<&str> {
        match self {
            Asset::Native => None,
            Asset::Credit { issuer, .. } => Some(issuer),
        }
    }

    /// Canonical Horizon form: "native" or "CODE:ISSUER"
    pub fn canonical(&self) -> String {
        match self {
            Asset::Native => "native".to_string(),
            Asset::Credit { code, issuer } => format!("{}:{}", code, issuer),
        }
    }

    /// Wire form; codes of up to 4 bytes use the AlphaNum4 arm, zero padded
    pub(crate) fn to_xdr(&self) -> Result<XdrAsset> {
        let (code, issuer) = match self {
            Asset::Native => return Ok(XdrAsset::Native),
            Asset::Credit { code, issuer } => (code.as_bytes(), xdr_account_id(issuer)?),
        };

        match code.len() {
            1..=4 => {
                let mut asset_code = [0u8; 4];
                asset_code[..code.len()].copy_from_slice(code);
                Ok(XdrAsset::CreditAlphanum4(AlphaNum4 {
                    asset_code: AssetCode4(asset_code),
                    issuer,
                }))
            }
            5..=12 => {
                let mut asset_code = [0u8; 12];
                asset_code[..code.len()].copy_from_slice(code);
                Ok(XdrAsset::CreditAlphanum12(AlphaNum12 {
                    asset_code: AssetCode12(asset_code),
                    issuer,
                }))
            }
            _ => Err(PaymentError::InvalidAsset(format!(
                "asset code length out of range: {:?}",
                self.code()
            ))),
        }
    }

    /// Trustline form of the same asset
    pub(crate) fn to_trust_line(&self) -> Result<ChangeTrustAsset> {
        Ok(match self.to_xdr()? {
            XdrAsset::Native => ChangeTrustAsset::Native,
            XdrAsset::CreditAlphanum4(asset) => ChangeTrustAsset::CreditAlphanum4(asset),
            XdrAsset::CreditAlphanum12(asset) => ChangeTrustAsset::CreditAlphanum12(asset),
        })
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}
