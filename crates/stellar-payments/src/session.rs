// ============================================================================
// STELLAR-PAYMENTS - Account Session
// ============================================================================
// Named accounts and the currently selected one, persisted in a
// `KeyValueStore`. The last transaction hash is kept in memory only.
//
// Storage layout:
//   currentAccount   -> account name
//   account:{name}   -> StoredAccount as JSON
// ============================================================================

use crate::error::PaymentError;
use crate::keypair::StoredAccount;
use crate::storage::KeyValueStore;
use crate::Result;
use tracing::debug;

pub const CURRENT_ACCOUNT_KEY: &str = "currentAccount";
const ACCOUNT_PREFIX: &str = "account:";

fn account_key(name: &str) -> String {
    format!("{}{}", ACCOUNT_PREFIX, name)
}

pub struct AccountSession<S: KeyValueStore> {
    store: S,
    current_account: Option<String>,
    hash_id: Option<String>,
}

impl<S: KeyValueStore> AccountSession<S> {
    /// Open a session, restoring the selected account from the store
    pub fn open(store: S) -> Result<Self> {
        let current_account = store.get(CURRENT_ACCOUNT_KEY)?;
        debug!("Session opened, current account: {:?}", current_account);

        Ok(Self {
            store,
            current_account,
            hash_id: None,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn current_account(&self) -> Option<&str> {
        self.current_account.as_deref()
    }

    /// Select `name` in memory and in the store
    pub fn set_current_account(&mut self, name: &str) -> Result<()> {
        self.store.set(CURRENT_ACCOUNT_KEY, name)?;
        self.current_account = Some(name.to_string());
        Ok(())
    }

    pub fn get_account(&self, name: &str) -> Result<Option<StoredAccount>> {
        match self.store.get(&account_key(name))? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Stored key pair of the selected account; `None` when nothing is selected
    pub fn current_account_data(&self) -> Result<Option<StoredAccount>> {
        match &self.current_account {
            Some(name) => self.get_account(name),
            None => Ok(None),
        }
    }

    /// Store `account` under `name`, replacing any previous entry
    pub fn save_account(&self, name: &str, account: &StoredAccount) -> Result<()> {
        if name.is_empty() {
            return Err(PaymentError::Storage("account name must not be empty".to_string()));
        }
        self.store.set(&account_key(name), &serde_json::to_string(account)?)
    }

    /// Names of all stored accounts, sorted
    pub fn account_names(&self) -> Result<Vec<String>> {
        Ok(self
            .store
            .keys_with_prefix(ACCOUNT_PREFIX)?
            .into_iter()
            .map(|key| key[ACCOUNT_PREFIX.len()..].to_string())
            .collect())
    }

    /// Hash of the last submitted transaction
    pub fn hash_id(&self) -> Option<&str> {
        self.hash_id.as_deref()
    }

    pub fn set_hash_id(&mut self, hash: &str) {
        self.hash_id = Some(hash.to_string());
    }
}
