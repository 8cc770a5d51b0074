use std::time::{Duration, Instant};

use dashmap::DashMap;
use parley_core::token;

#[derive(Debug, Clone)]
pub struct LoginSession {
    pub username: String,
    pub created_at: Instant,
}

/// Server-side login sessions bridging `/login` and `/ticket`, addressed by
/// the opaque id carried in the session cookie.
pub struct SessionStore {
    sessions: DashMap<String, LoginSession>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl_seconds: u64) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl: Duration::from_secs(ttl_seconds),
        }
    }

    /// Creates a session for an authenticated user and returns its id.
    pub fn create(&self, username: String) -> String {
        let session_id = token::generate();
        self.sessions.insert(
            session_id.clone(),
            LoginSession {
                username,
                created_at: Instant::now(),
            },
        );
        tracing::debug!("Session created (store size: {})", self.sessions.len());
        session_id
    }

    /// Looks up a session, expiring it lazily.
    pub fn get(&self, session_id: &str) -> Option<LoginSession> {
        let entry = self.sessions.get(session_id)?;
        if entry.created_at.elapsed() > self.ttl {
            drop(entry);
            self.sessions.remove(session_id);
            tracing::debug!("Session expired");
            return None;
        }
        Some(entry.clone())
    }

    pub fn remove(&self, session_id: &str) {
        self.sessions.remove(session_id);
    }

    pub fn cleanup_expired(&self) {
        let ttl = self.ttl;
        self.sessions
            .retain(|_, session| session.created_at.elapsed() <= ttl);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_then_get_returns_username() {
        let store = SessionStore::new(600);
        let id = store.create("alice".to_string());
        assert_eq!(store.get(&id).unwrap().username, "alice");
    }

    #[test]
    fn expired_session_is_rejected_and_purged() {
        let store = SessionStore::new(0);
        let id = store.create("alice".to_string());
        std::thread::sleep(Duration::from_millis(5));
        assert!(store.get(&id).is_none());
        // Lazy expiry removed the entry.
        assert!(store.get(&id).is_none());
    }

    #[test]
    fn removed_session_is_gone() {
        let store = SessionStore::new(600);
        let id = store.create("alice".to_string());
        store.remove(&id);
        assert!(store.get(&id).is_none());
    }

    #[test]
    fn cleanup_drops_only_expired_sessions() {
        let fresh = SessionStore::new(600);
        let id = fresh.create("alice".to_string());
        fresh.cleanup_expired();
        assert!(fresh.get(&id).is_some());

        let stale = SessionStore::new(0);
        stale.create("bob".to_string());
        std::thread::sleep(Duration::from_millis(5));
        stale.cleanup_expired();
        assert!(stale.sessions.is_empty());
    }
}
