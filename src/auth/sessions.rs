//! Bearer sessions for restaurant admins.
//!
//! Tokens are opaque random strings bound to one restaurant. Sessions live in memory only:
//! a restart logs every admin out.

use crate::model::Slug;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub restaurant: Slug,
    pub expires_at: DateTime<Utc>,
}

/// Concurrent token → session map, shared by every request handler.
#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions: Arc<DashMap<String, Session>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            ttl,
        }
    }

    /// Opens a session for `restaurant` and returns its token.
    pub fn issue(&self, restaurant: Slug) -> (String, Session) {
        let token = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
        let session = Session {
            restaurant,
            expires_at: Utc::now() + self.ttl,
        };
        self.sessions.insert(token.clone(), session.clone());
        debug!(restaurant = %session.restaurant, "Session issued");
        (token, session)
    }

    /// Returns the live session behind `token`. Expired sessions are dropped on sight.
    pub fn validate(&self, token: &str) -> Option<Session> {
        let session = self.sessions.get(token).map(|s| s.clone())?;
        if session.expires_at <= Utc::now() {
            self.sessions.remove(token);
            return None;
        }
        Some(session)
    }

    pub fn revoke(&self, token: &str) -> bool {
        self.sessions.remove(token).is_some()
    }

    /// Drops every session of `restaurant`, e.g. after a password change.
    pub fn revoke_restaurant(&self, restaurant: &Slug) -> usize {
        self.remove_where(|s| &s.restaurant == restaurant)
    }

    /// Removes expired sessions, returning how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        self.remove_where(|s| s.expires_at <= now)
    }

    // Counted inside `retain`: logins may land while the shards are walked.
    fn remove_where(&self, doomed: impl Fn(&Session) -> bool) -> usize {
        let mut removed = 0;
        self.sessions.retain(|_, s| {
            let gone = doomed(s);
            removed += usize::from(gone);
            !gone
        });
        removed
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slug(s: &str) -> Slug {
        Slug::parse(s).unwrap()
    }

    #[test]
    fn issued_tokens_validate_until_revoked() {
        let store = SessionStore::new(Duration::hours(1));
        let (token, _) = store.issue(slug("chez-test"));
        assert_eq!(token.len(), 64);
        assert_eq!(store.validate(&token).unwrap().restaurant, slug("chez-test"));

        assert!(store.revoke(&token));
        assert!(store.validate(&token).is_none());
        assert!(!store.revoke(&token));
    }

    #[test]
    fn expired_sessions_are_purged() {
        let store = SessionStore::new(Duration::seconds(-1));
        let (token, _) = store.issue(slug("chez-test"));
        store.issue(slug("other-place"));
        assert_eq!(store.len(), 2);

        assert!(store.validate(&token).is_none());
        assert_eq!(store.purge_expired(), 1);
        assert!(store.is_empty());
    }

    #[test]
    fn purge_counts_survive_concurrent_logins() {
        let store = SessionStore::new(Duration::hours(1));
        let expired = SessionStore {
            sessions: store.sessions.clone(),
            ttl: Duration::seconds(-1),
        };
        let stop = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let login = {
            let store = store.clone();
            let stop = stop.clone();
            std::thread::spawn(move || {
                while !stop.load(std::sync::atomic::Ordering::Relaxed) {
                    store.issue(slug("chez-test"));
                }
            })
        };

        let mut purged = 0;
        for _ in 0..20_000 {
            expired.issue(slug("other-place"));
            purged += store.purge_expired();
            store.revoke_restaurant(&slug("chez-test"));
        }
        stop.store(true, std::sync::atomic::Ordering::Relaxed);
        login.join().unwrap();

        assert!(purged <= 20_000);
        assert_eq!(store.purge_expired() + purged, 20_000);
    }

    #[test]
    fn password_change_logs_out_one_restaurant() {
        let store = SessionStore::new(Duration::hours(1));
        store.issue(slug("chez-test"));
        store.issue(slug("chez-test"));
        let (other, _) = store.issue(slug("other-place"));

        assert_eq!(store.revoke_restaurant(&slug("chez-test")), 2);
        assert!(store.validate(&other).is_some());
    }
}
