use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use once_cell::sync::Lazy;
use rand::Rng;
use sha256::digest;

/// The static instance of sessions.
pub static INSTANCE: Lazy<SessionManager> = Lazy::new(SessionManager::new);

/// Which kind of account a session belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    /// The locally-registered student, by email.
    Student(String),
    /// A mess account, by username.
    Mess(String),
}

struct Session {
    identity: Identity,
    expire_time: DateTime<Utc>,
}

/// Process-local session registry. Sessions are not persisted; a
/// restart logs everyone out.
pub struct SessionManager {
    sessions: DashMap<String, Session>,
}

impl SessionManager {
    /// Sessions expire this many days after their last use.
    const EXPIRE_DAYS: i64 = 7;

    fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    /// Open a session and return its token.
    pub fn new_session(&self, identity: Identity) -> String {
        let token = digest(format!(
            "{:x}{:x}",
            rand::thread_rng().gen::<u128>(),
            Utc::now().timestamp_nanos_opt().unwrap_or_default()
        ));
        self.sessions.insert(
            token.clone(),
            Session {
                identity,
                expire_time: Utc::now() + Duration::days(Self::EXPIRE_DAYS),
            },
        );
        token
    }

    /// Resolve a token to its identity, refreshing the expiry.
    pub fn resolve(&self, token: &str) -> Option<Identity> {
        {
            let mut session = self.sessions.get_mut(token)?;
            if Utc::now() <= session.expire_time {
                session.expire_time = Utc::now() + Duration::days(Self::EXPIRE_DAYS);
                return Some(session.identity.clone());
            }
        }
        self.sessions.remove(token);
        None
    }

    /// Close the session behind the target token.
    pub fn remove(&self, token: &str) -> bool {
        self.sessions.remove(token).is_some()
    }

    /// Drop every session of the target identity. Used when the account
    /// behind it is removed or its password resets.
    pub fn remove_identity(&self, identity: &Identity) {
        self.sessions.retain(|_, s| &s.identity != identity);
    }

    #[cfg(test)]
    pub fn reset(&self) {
        self.sessions.clear()
    }
}
