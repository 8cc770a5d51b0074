//! Credential store: account registration and verification.
//!
//! Accounts are held in a concurrent map keyed by username. When a file path
//! is configured the store loads from and rewrites a TOML file of
//! `[[accounts]]` tables, so registrations survive a restart; without a path
//! it is purely in-memory.

use std::path::PathBuf;
use std::sync::Mutex;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::error::{AccountError, AuthError};
use crate::password;

/// A registered account. The plaintext password is never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub username: String,
    pub password_hash: String,
    pub email: String,
}

/// On-disk representation of the store.
#[derive(Debug, Default, Serialize, Deserialize)]
struct AccountsFile {
    #[serde(default)]
    accounts: Vec<Account>,
}

pub struct AccountStore {
    accounts: DashMap<String, Account>,
    path: Option<PathBuf>,
    // Serializes file rewrites so two concurrent registrations can't
    // interleave partial writes.
    write_lock: Mutex<()>,
}

impl AccountStore {
    /// Creates an empty store with no file backing.
    pub fn in_memory() -> Self {
        Self {
            accounts: DashMap::new(),
            path: None,
            write_lock: Mutex::new(()),
        }
    }

    /// Opens a file-backed store, loading any existing accounts.
    /// A missing file is not an error; it is created on first registration.
    pub fn open(path: PathBuf) -> Result<Self, AccountError> {
        let accounts = DashMap::new();

        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            let file: AccountsFile =
                toml::from_str(&contents).map_err(|e| AccountError::Parse(e.to_string()))?;
            for account in file.accounts {
                accounts.insert(account.username.clone(), account);
            }
            tracing::info!("Loaded {} account(s) from {}", accounts.len(), path.display());
        }

        Ok(Self {
            accounts,
            path: Some(path),
            write_lock: Mutex::new(()),
        })
    }

    /// Registers a new account.
    ///
    /// Hashing runs on the calling thread; callers on an async runtime should
    /// wrap this in a blocking task.
    pub fn register(
        &self,
        username: &str,
        password: &str,
        email: &str,
    ) -> Result<(), AccountError> {
        if username.is_empty() || password.is_empty() || email.is_empty() {
            return Err(AccountError::InvalidInput);
        }

        let password_hash = password::hash_password(password)?;

        match self.accounts.entry(username.to_string()) {
            Entry::Occupied(_) => return Err(AccountError::DuplicateUsername),
            Entry::Vacant(entry) => {
                entry.insert(Account {
                    username: username.to_string(),
                    password_hash,
                    email: email.to_string(),
                });
            }
        }

        // Roll back on a failed write so the username stays free for a retry.
        if let Err(e) = self.persist() {
            self.accounts.remove(username);
            return Err(e);
        }

        tracing::info!("Account registered: {username}");
        Ok(())
    }

    /// Verifies a credential claim, returning the account on success.
    pub fn verify(&self, username: &str, password: &str) -> Result<Account, AuthError> {
        let account = self
            .accounts
            .get(username)
            .ok_or(AuthError::UnknownAccount)?
            .value()
            .clone();

        if !password::verify_password(&account.password_hash, password)? {
            return Err(AuthError::BadPassword);
        }

        Ok(account)
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    fn persist(&self) -> Result<(), AccountError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let _guard = self.write_lock.lock().expect("accounts write lock poisoned");

        let mut accounts: Vec<Account> =
            self.accounts.iter().map(|entry| entry.value().clone()).collect();
        accounts.sort_by(|a, b| a.username.cmp(&b.username));

        let contents = toml::to_string_pretty(&AccountsFile { accounts })
            .map_err(|e| AccountError::Parse(e.to_string()))?;
        std::fs::write(path, contents)?;

        Ok(())
    }
}
