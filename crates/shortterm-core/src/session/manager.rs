//! Persistence and validity of the current temporary address.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::Result;
use crate::clock::Clock;
use crate::model::Session;
use crate::store::KeyValueStore;

/// Key under which the session record is stored.
pub const STORAGE_KEY: &str = "shorttermemail";

/// Result of reading the persisted session on startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// A valid session was found and is now current.
    Restored(Session),
    /// A session was found but had expired; it has been discarded.
    Expired(Session),
    /// Nothing was stored.
    Missing,
    /// The stored record was unreadable and has been discarded.
    Corrupt,
}

/// Owns the current session and its persisted copy.
///
/// Timers and subscriptions are not managed here; see
/// [`Coordinator`](super::Coordinator).
pub struct SessionManager<S> {
    store: S,
    clock: Arc<dyn Clock>,
    current: Option<Session>,
}

impl<S: KeyValueStore> SessionManager<S> {
    /// Creates a manager with no current session.
    pub fn new(store: S, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            current: None,
        }
    }

    /// Current time according to the manager's clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Loads the persisted session.
    ///
    /// Expired and corrupt records are removed from storage.
    ///
    /// # Errors
    ///
    /// Returns an error only if the store itself cannot be accessed.
    pub fn restore(&mut self) -> Result<RestoreOutcome> {
        let Some(record) = self.store.get(STORAGE_KEY)? else {
            tracing::debug!("no stored session");
            return Ok(RestoreOutcome::Missing);
        };

        let session = match Session::from_record(&record) {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(error = %e, "discarding unreadable session record");
                self.store.remove(STORAGE_KEY)?;
                self.current = None;
                return Ok(RestoreOutcome::Corrupt);
            }
        };

        if !session.is_valid_at(self.now()) {
            tracing::info!(address = %session.address, "stored session has expired");
            self.store.remove(STORAGE_KEY)?;
            self.current = None;
            return Ok(RestoreOutcome::Expired(session));
        }

        tracing::info!(
            address = %session.address,
            expires_at = %session.expires_at,
            "session restored"
        );
        self.current = Some(session.clone());
        Ok(RestoreOutcome::Restored(session))
    }

    /// Installs and persists a new session created now.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be persisted; the previous
    /// session is left in place.
    pub fn create(
        &mut self,
        address: impl Into<String>,
        expires_at: DateTime<Utc>,
    ) -> Result<&Session> {
        let session = Session::new(address, expires_at, self.now());
        self.store.set(STORAGE_KEY, &session.to_record()?)?;
        tracing::info!(address = %session.address, %expires_at, "session created");
        Ok(&*self.current.insert(session))
    }

    /// Discards the current session and its persisted copy.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be modified. The in-memory session
    /// is dropped regardless.
    pub fn clear(&mut self) -> Result<()> {
        if let Some(session) = self.current.take() {
            tracing::info!(address = %session.address, "session cleared");
        }
        self.store.remove(STORAGE_KEY)
    }

    /// Returns true if a session exists and has not expired.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|session| session.is_valid_at(self.now()))
    }

    /// The current session, whether or not it is still valid.
    #[must_use]
    pub const fn current(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    /// Returns true if there is a current session that has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|session| !session.is_valid_at(self.now()))
    }

    /// Shared clock handle.
    #[must_use]
    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }
}

impl<S> std::fmt::Debug for SessionManager<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::store::MemoryStore;
    use chrono::Duration;

    fn start() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-01-15T11:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn manager(store: &MemoryStore, clock: &ManualClock) -> SessionManager<MemoryStore> {
        SessionManager::new(store.clone(), Arc::new(clock.clone()))
    }

    #[test]
    fn test_create_then_restore() {
        let store = MemoryStore::new();
        let clock = ManualClock::new(start());

        let mut first = manager(&store, &clock);
        first
            .create("k7x@shorttermemail.com", start() + Duration::seconds(60))
            .unwrap();
        assert!(first.is_active());

        let mut second = manager(&store, &clock);
        assert!(!second.is_active());
        let session = match second.restore().unwrap() {
            RestoreOutcome::Restored(session) => session,
            other => panic!("expected a restored session, got {other:?}"),
        };
        assert_eq!(session.address, "k7x@shorttermemail.com");
        assert_eq!(session.created_at, start());
        assert!(second.is_active());
    }

    #[test]
    fn test_restore_after_expiry_clears_storage() {
        let store = MemoryStore::new();
        let clock = ManualClock::new(start());
        manager(&store, &clock)
            .create("k7x@shorttermemail.com", start() + Duration::seconds(60))
            .unwrap();

        clock.advance(Duration::seconds(61));
        let mut restored = manager(&store, &clock);
        assert!(matches!(restored.restore().unwrap(), RestoreOutcome::Expired(_)));
        assert!(!restored.is_active());
        assert!(restored.current().is_none());
        assert!(!store.contains(STORAGE_KEY));
    }

    #[test]
    fn test_restore_exactly_at_expiry_is_expired() {
        let store = MemoryStore::new();
        let clock = ManualClock::new(start());
        manager(&store, &clock)
            .create("a@b.c", start() + Duration::seconds(60))
            .unwrap();

        clock.advance(Duration::seconds(60));
        assert!(matches!(
            manager(&store, &clock).restore().unwrap(),
            RestoreOutcome::Expired(_)
        ));
    }

    #[test]
    fn test_restore_missing() {
        let store = MemoryStore::new();
        let clock = ManualClock::new(start());
        assert_eq!(manager(&store, &clock).restore().unwrap(), RestoreOutcome::Missing);
    }

    #[test]
    fn test_corrupt_record_is_discarded() {
        let store = MemoryStore::new();
        let clock = ManualClock::new(start());
        for record in [
            "not json",
            r#"{"email":"a@b.c"}"#,
            r#"{"email":"","expires":1,"created":1}"#,
        ] {
            store.set(STORAGE_KEY, record).unwrap();
            let mut manager = manager(&store, &clock);
            assert_eq!(manager.restore().unwrap(), RestoreOutcome::Corrupt);
            assert!(!store.contains(STORAGE_KEY));
            assert!(!manager.is_active());
        }
    }

    #[test]
    fn test_legacy_record_with_language() {
        let store = MemoryStore::new();
        let clock = ManualClock::new(start());
        store
            .set(
                STORAGE_KEY,
                r#"{"email":"a@b.c","expires":"2026-01-15T12:00:00.000Z","created":1768474800000,"language":"ar"}"#,
            )
            .unwrap();
        assert!(matches!(
            manager(&store, &clock).restore().unwrap(),
            RestoreOutcome::Restored(_)
        ));
    }

    #[test]
    fn test_clear_removes_everything() {
        let store = MemoryStore::new();
        let clock = ManualClock::new(start());
        let mut manager = manager(&store, &clock);
        manager.create("a@b.c", start() + Duration::hours(1)).unwrap();

        manager.clear().unwrap();
        assert!(!manager.is_active());
        assert!(!store.contains(STORAGE_KEY));
        manager.clear().unwrap();
    }

    #[test]
    fn test_expiry_while_running() {
        let store = MemoryStore::new();
        let clock = ManualClock::new(start());
        let mut manager = manager(&store, &clock);
        manager.create("a@b.c", start() + Duration::minutes(10)).unwrap();
        assert!(!manager.is_expired());

        clock.advance(Duration::minutes(10));
        assert!(manager.is_expired());
        assert!(!manager.is_active());
    }
}
