pub mod handle;
pub mod session;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use sha256::digest;
use tokio::sync::Mutex;

pub use messbuddy_shared::account::*;

use crate::store;

/// The static instance of the credential cell.
pub static CREDENTIALS: Lazy<CredentialStore> = Lazy::new(CredentialStore::new);

/// The static instance of mess accounts.
pub static INSTANCE: Lazy<AccountManager> = Lazy::new(AccountManager::new);

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("name must contain letters and spaces only")]
    InvalidName,
    #[error("invalid email address")]
    InvalidEmail,
    #[error("password must be at least 6 characters")]
    WeakPassword,
    #[error("division must be a single letter A to G")]
    InvalidDivision,
    #[error("roll must be between 1 and 100")]
    InvalidRoll,
    #[error("prn must be a 14-digit number")]
    InvalidPrn,
    #[error("batch must be a year between 2000 and 2100")]
    InvalidBatch,
    #[error("an account with this email already exists")]
    AlreadyRegistered,
    #[error("no account is registered")]
    NoAccount,
    #[error("email or username or password incorrect")]
    CredentialsIncorrect,
    #[error("current password is incorrect")]
    PasswordIncorrect,
    #[error("email does not match the registered account")]
    EmailMismatch,
    #[error("permission denied")]
    PermissionDenied,
}

impl crate::AsResCode for Error {
    fn response_code(&self) -> hyper::StatusCode {
        match self {
            Error::AlreadyRegistered => hyper::StatusCode::CONFLICT,
            Error::NoAccount => hyper::StatusCode::NOT_FOUND,
            Error::CredentialsIncorrect | Error::PasswordIncorrect => {
                hyper::StatusCode::UNAUTHORIZED
            }
            Error::EmailMismatch | Error::PermissionDenied => hyper::StatusCode::FORBIDDEN,
            _ => hyper::StatusCode::BAD_REQUEST,
        }
    }
}

/// The single-record cell behind the locally-registered student.
///
/// Invariant: at most one record exists at a time; `save` replaces any
/// prior one. Writes are last-write-wins.
pub struct CredentialStore {
    record: RwLock<Option<Credentials>>,
    persist_lock: Mutex<()>,
}

impl CredentialStore {
    const KEY: &'static str = "credentials";

    /// Load the credential cell from its entry.
    fn new() -> Self {
        #[cfg(not(test))]
        {
            let record = match store::read_entry::<Credentials>(Self::KEY) {
                Ok(record) => Some(record),
                Err(store::Error::NotFound) => None,
                Err(err) => {
                    // absent and unreadable collapse to "no record" for
                    // callers, the distinction only reaches the log
                    tracing::warn!("credentials entry unreadable, treating as absent: {err}");
                    None
                }
            };
            return Self {
                record: RwLock::new(record),
                persist_lock: Mutex::new(()),
            };
        }

        #[cfg(test)]
        Self {
            record: RwLock::new(None),
            persist_lock: Mutex::new(()),
        }
    }

    /// Get the saved record, or `None` when nothing usable is stored.
    pub fn get(&self) -> Option<Credentials> {
        self.record.read().clone()
    }

    /// Replace the record and persist it.
    pub async fn save(&self, record: Credentials) -> Result<(), store::Error> {
        *self.record.write() = Some(record);
        self.persist().await
    }

    /// Replace only the password field, starting from an empty record
    /// when none is saved, and persist the whole record.
    pub async fn update_password(&self, new_password: String) -> Result<(), store::Error> {
        {
            let mut w = self.record.write();
            let mut record = w.take().unwrap_or_default();
            record.password = new_password;
            *w = Some(record);
        }
        self.persist().await
    }

    /// Remove the record and its entry.
    pub async fn clear(&self) -> Result<(), store::Error> {
        *self.record.write() = None;
        self.persist().await
    }

    async fn persist(&self) -> Result<(), store::Error> {
        let _guard = self.persist_lock.lock().await;

        #[cfg(not(test))]
        {
            // snapshot inside the guard so the last writer wins on disk
            // as well as in memory
            let snapshot = self.record.read().clone();
            return match snapshot {
                Some(record) => store::write_entry(Self::KEY, &record).await,
                None => store::remove_entry(Self::KEY).await,
            };
        }

        #[cfg(test)]
        Ok(())
    }

    #[cfg(test)]
    pub fn reset(&self) {
        *self.record.write() = None;
    }
}

/// A simple manager for the role-tagged mess login records.
pub struct AccountManager {
    accounts: RwLock<Vec<MessAccount>>,
    persist_lock: Mutex<()>,
}

impl AccountManager {
    const KEY: &'static str = "accounts";

    /// Read and create an account manager from the accounts entry.
    fn new() -> Self {
        #[cfg(not(test))]
        {
            let accounts = match store::read_entry::<Vec<MessAccount>>(Self::KEY) {
                Ok(accounts) => accounts,
                Err(store::Error::NotFound) => Vec::new(),
                Err(err) => {
                    tracing::warn!("accounts entry unreadable, treating as empty: {err}");
                    Vec::new()
                }
            };
            return Self {
                accounts: RwLock::new(accounts),
                persist_lock: Mutex::new(()),
            };
        }

        #[cfg(test)]
        Self {
            accounts: RwLock::new(Vec::new()),
            persist_lock: Mutex::new(()),
        }
    }

    /// Get a clone of the stored collection.
    pub fn get(&self) -> Vec<MessAccount> {
        self.accounts.read().clone()
    }

    /// Replace the entire collection and persist it.
    pub async fn save(&self, accounts: Vec<MessAccount>) -> Result<(), store::Error> {
        *self.accounts.write() = accounts;
        self.persist().await
    }

    /// Look up an account by username, case-insensitively.
    pub fn find(&self, username: &str) -> Option<MessAccount> {
        let username = username.to_lowercase();
        self.accounts
            .read()
            .iter()
            .find(|a| a.username.to_lowercase() == username)
            .cloned()
    }

    /// Overwrite the collection with the fixed sample set and return it.
    pub async fn seed_sample(&self) -> Result<Vec<MessAccount>, store::Error> {
        let samples = sample_accounts();
        self.save(samples.clone()).await?;
        Ok(samples)
    }

    /// Seed the collection if it is empty, returning what is stored
    /// afterwards. Safe to call on every startup: a non-empty
    /// collection is returned unchanged without touching the entry.
    pub async fn ensure_seeded(&self) -> Result<Vec<MessAccount>, store::Error> {
        let existing = self.get();
        if existing.is_empty() {
            self.seed_sample().await
        } else {
            Ok(existing)
        }
    }

    async fn persist(&self) -> Result<(), store::Error> {
        let _guard = self.persist_lock.lock().await;

        #[cfg(not(test))]
        {
            let snapshot = self.get();
            return store::write_entry(Self::KEY, &snapshot).await;
        }

        #[cfg(test)]
        Ok(())
    }

    #[cfg(test)]
    pub fn reset(&self) {
        self.accounts.write().clear();
    }
}

/// The fixed sample set of mess login records.
fn sample_accounts() -> Vec<MessAccount> {
    ["Mess_A", "Mess_B", "Mess_C", "Mess_D"]
        .into_iter()
        .map(|username| MessAccount {
            username: username.to_string(),
            password: digest("SIMS2025"),
            role: Role::Mess,
        })
        .collect()
}
