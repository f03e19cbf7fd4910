// src/storage/session_store.rs
//! Persistent authenticated session.
//!
//! Exactly one session lives under the well-known slot [`SESSION_SLOT`],
//! encoded with the salted envelope from [`crate::utils::serialization`].
//!
//! # Failure semantics
//! Nothing here propagates an error. An unreadable, corrupt or foreign slot
//! reads as "no session", and a failed write is reported as `false`, so the
//! rest of the client can always treat a broken slot as logged-out.
//!
//! # Expiry
//! Expiry is lazy: `get_session` compares the stored timestamp with the
//! injected clock and purges the slot when the 24h window has passed. No
//! background timer runs.

use crate::models::session::{Session, UserPayload};
use crate::storage::kv_store::KeyValueStore;
use crate::utils::clock::{Clock, SystemClock};
use crate::utils::serialization::{decode, encode};
use std::sync::Arc;

/// Slot key holding the encoded session.
pub const SESSION_SLOT: &str = "zkp_session_data";

/// Session persistence with TTL semantics over a key-value backend.
///
/// Cheap to share: wrap in an `Arc` and hand it to the gateway and the
/// auth service. Concurrent writers follow a last-write-wins policy.
pub struct SessionStore {
    backend: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
}

impl SessionStore {
    /// Creates a store that uses the system clock.
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self::with_clock(backend, Arc::new(SystemClock))
    }

    pub fn with_clock(backend: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        SessionStore { backend, clock }
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Saves `user` as the active session, stamped with the current time.
    ///
    /// # Returns
    /// `true` when the slot was written, `false` on encode or storage failure.
    pub fn save_session(&self, user: &UserPayload) -> bool {
        let session = Session::new(user.clone(), self.clock.now_millis());
        let Some(encoded) = encode(&session) else {
            return false;
        };

        match self.backend.set(SESSION_SLOT, &encoded) {
            Ok(()) => {
                log::debug!("[Session] saved session for {}", user.display_name());
                true
            }
            Err(e) => {
                log::error!("[Session] failed to persist session: {}", e);
                false
            }
        }
    }

    /// Reads the active session's user, purging it when expired.
    pub fn get_session(&self) -> Option<UserPayload> {
        self.read_session().map(|session| session.user)
    }

    /// Full session envelope, with the same expiry rules as [`get_session`](Self::get_session).
    pub fn read_session(&self) -> Option<Session> {
        let raw = match self.backend.get(SESSION_SLOT) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                log::warn!("[Session] unreadable session slot: {}", e);
                return None;
            }
        };

        let Some(session) = decode::<Session>(&raw) else {
            log::warn!("[Session] discarding undecodable session slot");
            return None;
        };

        if !session.is_active_at(self.clock.now_millis()) {
            log::warn!("[Session] session expired");
            self.clear_session();
            return None;
        }

        Some(session)
    }

    /// Removes the session slot. Idempotent.
    pub fn clear_session(&self) {
        if let Err(e) = self.backend.remove(SESSION_SLOT) {
            log::error!("[Session] failed to clear session slot: {}", e);
        }
    }

    pub fn has_active_session(&self) -> bool {
        self.get_session().is_some()
    }

    /// Slides the 24h window forward, leaving the user payload unchanged.
    ///
    /// # Returns
    /// `true` if a session existed and was re-saved.
    pub fn renew_session(&self) -> bool {
        match self.get_session() {
            Some(user) => self.save_session(&user),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::session::{AuthMethod, SESSION_TTL_MS};
    use crate::storage::kv_store::{MemoryStore, StorageError};
    use crate::utils::clock::ManualClock;

    const T0: i64 = 1_700_000_000_000;

    fn user() -> UserPayload {
        UserPayload {
            name: Some("Ana".into()),
            email: Some("a@b.com".into()),
            did: Some("did:example:polygon:amoy:abc123".into()),
            auth_type: Some(AuthMethod::EmailPassword),
            token: Some("token-1".into()),
            ..Default::default()
        }
    }

    fn store_at(start: i64) -> (SessionStore, Arc<MemoryStore>, Arc<ManualClock>) {
        let backend = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(start));
        let store = SessionStore::with_clock(backend.clone(), clock.clone());
        (store, backend, clock)
    }

    #[test]
    fn test_save_and_get() {
        let (store, backend, _) = store_at(T0);
        assert!(!store.has_active_session());
        assert!(store.save_session(&user()));

        let raw = backend.get(SESSION_SLOT).unwrap().unwrap();
        assert!(raw.starts_with("zkp_salt_v1."));
        assert_eq!(store.get_session(), Some(user()));
        assert!(store.has_active_session());
    }

    #[test]
    fn test_ttl_boundaries() {
        let (store, backend, clock) = store_at(T0);
        store.save_session(&user());

        clock.set(T0 + SESSION_TTL_MS - 1);
        assert!(store.get_session().is_some());

        clock.set(T0 + SESSION_TTL_MS + 1);
        assert!(store.get_session().is_none());
        // Purged on read.
        assert!(backend.is_empty());
    }

    #[test]
    fn test_renew_slides_window() {
        let (store, _, clock) = store_at(T0);
        store.save_session(&user());

        clock.set(T0 + SESSION_TTL_MS - 10);
        assert!(store.renew_session());
        let renewed = store.read_session().unwrap();
        assert_eq!(renewed.timestamp, T0 + SESSION_TTL_MS - 10);
        assert_eq!(renewed.user, user());

        clock.set(T0 + SESSION_TTL_MS + 1_000);
        assert!(store.has_active_session());
    }

    #[test]
    fn test_renew_without_session_is_noop() {
        let (store, backend, _) = store_at(T0);
        assert!(!store.renew_session());
        assert!(backend.is_empty());
    }

    #[test]
    fn test_clear_is_idempotent() {
        let (store, _, _) = store_at(T0);
        store.save_session(&user());
        store.clear_session();
        store.clear_session();
        assert!(!store.has_active_session());
    }

    #[test]
    fn test_corrupt_slot_reads_as_logged_out() {
        let (store, backend, _) = store_at(T0);
        for garbage in ["", "plain text", "zkp_salt_v1.@@@", "zkp_salt_v1.e30="] {
            backend.set(SESSION_SLOT, garbage).unwrap();
            assert_eq!(store.get_session(), None, "{garbage:?}");
        }
    }

    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Poisoned)
        }
        fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Poisoned)
        }
        fn remove(&self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Poisoned)
        }
    }

    #[test]
    fn test_backend_failures_degrade() {
        let store = SessionStore::new(Arc::new(BrokenStore));
        assert!(!store.save_session(&user()));
        assert_eq!(store.get_session(), None);
        assert!(!store.renew_session());
        store.clear_session();
    }
}
