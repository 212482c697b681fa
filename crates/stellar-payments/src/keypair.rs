// ============================================================================
// STELLAR-PAYMENTS - Key Pairs
// ============================================================================
// Ed25519 key pairs in Stellar's strkey representation: "G..." account ids
// and "S..." secret seeds.
// ============================================================================

use crate::error::PaymentError;
use crate::Result;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use stellar_strkey::ed25519::{PrivateKey, PublicKey};
use stellar_xdr::curr::{AccountId, MuxedAccount, PublicKey as XdrPublicKey, Uint256};

/// Signing key pair for a Stellar account
#[derive(Clone)]
pub struct KeyPair {
    signing: SigningKey,
}

impl KeyPair {
    /// Generate a new random key pair
    pub fn random() -> Self {
        Self {
            signing: SigningKey::generate(&mut OsRng),
        }
    }

    /// Load a key pair from an "S..." secret
    pub fn from_secret(secret: &str) -> Result<Self> {
        let seed = PrivateKey::from_string(secret).map_err(|_| PaymentError::InvalidSecretKey)?;
        Ok(Self::from_seed(&seed.0))
    }

    /// Load a key pair from raw seed bytes
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing: SigningKey::from_bytes(seed),
        }
    }

    /// "G..." account id
    pub fn public_key(&self) -> String {
        PublicKey(self.public_key_bytes()).to_string()
    }

    /// "S..." secret seed
    pub fn secret(&self) -> String {
        PrivateKey(self.signing.to_bytes()).to_string()
    }

    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.signing.verifying_key().to_bytes()
    }

    /// Last four bytes of the public key, used as the signature hint
    pub fn signature_hint(&self) -> [u8; 4] {
        hint_for(&self.public_key_bytes())
    }

    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing.sign(message).to_bytes()
    }

    /// Plain, serializable copy of both keys
    pub fn to_stored(&self) -> StoredAccount {
        StoredAccount {
            public_key: self.public_key(),
            secret_key: self.secret(),
        }
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key())
            .finish_non_exhaustive()
    }
}

/// Key pair as persisted in the local store. The secret is kept in plaintext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredAccount {
    pub public_key: String,
    pub secret_key: String,
}

impl StoredAccount {
    pub fn keypair(&self) -> Result<KeyPair> {
        KeyPair::from_secret(&self.secret_key)
    }
}

fn hint_for(public_key: &[u8; 32]) -> [u8; 4] {
    let mut hint = [0u8; 4];
    hint.copy_from_slice(&public_key[28..32]);
    hint
}

/// Decode a "G..." account id into raw public key bytes
pub fn decode_account_id(address: &str) -> Result<[u8; 32]> {
    PublicKey::from_string(address)
        .map(|key| key.0)
        .map_err(|_| PaymentError::InvalidStellarAddress(address.to_string()))
}

/// Syntactic and checksum validation of an account id
pub fn is_valid_account_id(address: &str) -> bool {
    PublicKey::from_string(address).is_ok()
}

pub(crate) fn xdr_account_id(address: &str) -> Result<AccountId> {
    let key = decode_account_id(address)?;
    Ok(AccountId(XdrPublicKey::PublicKeyTypeEd25519(Uint256(key))))
}

/// Plain ed25519 arm only; muxed "M..." addresses are not produced
pub(crate) fn xdr_muxed_account(address: &str) -> Result<MuxedAccount> {
    Ok(MuxedAccount::Ed25519(Uint256(decode_account_id(address)?)))
}

/// Verify an ed25519 signature made by `address` over `message`
pub fn verify_signature(address: &str, message: &[u8], signature: &[u8]) -> bool {
    let Ok(key_bytes) = decode_account_id(address) else {
        return false;
    };
    let Ok(key) = VerifyingKey::from_bytes(&key_bytes) else {
        return false;
    };
    let Ok(sig_bytes) = <[u8; 64]>::try_from(signature) else {
        return false;
    };
    key.verify(message, &Signature::from_bytes(&sig_bytes)).is_ok()
}
