//! Session store: the single current user.
//!
//! The slot is a `watch` channel so every write reaches subscribers
//! immediately. When a [`Database`] is attached, every write is mirrored to
//! the `donorconnect.user` storage key and the `token` cookie. Storage
//! failures are logged and never block the session; the in-memory slot
//! stays authoritative.
//!
//! Storage writes are serialized and always copy what the slot holds when
//! the write lock is taken, so a slow write can never restore a user that
//! was cleared in the meantime.

use std::sync::Arc;

use donor_core::User;
use donor_storage::{cookies, local_storage, Database};
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use crate::error::DonorError;
use crate::location::{resolve_profile_location, LocationResolver};

/// Storage key of the serialized user record.
pub const USER_STORAGE_KEY: &str = "donorconnect.user";

/// Name of the cookie mirroring the bearer token.
pub const TOKEN_COOKIE: &str = "token";

struct Inner {
    slot: watch::Sender<Option<User>>,
    database: Option<Database>,
    writes: Mutex<()>,
    resolver: Option<Arc<dyn LocationResolver>>,
}

/// Shared handle to the session. Clones refer to the same slot.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Inner>,
}

impl SessionStore {
    /// Create an empty store, optionally backed by durable storage.
    pub fn new(database: Option<Database>) -> Self {
        Self::build(database, None)
    }

    /// Create an empty store that resolves missing location names on load.
    pub fn with_resolver(database: Option<Database>, resolver: Arc<dyn LocationResolver>) -> Self {
        Self::build(database, Some(resolver))
    }

    fn build(database: Option<Database>, resolver: Option<Arc<dyn LocationResolver>>) -> Self {
        let (slot, _) = watch::channel(None);
        Self {
            inner: Arc::new(Inner {
                slot,
                database,
                writes: Mutex::new(()),
                resolver,
            }),
        }
    }

    /// Restore the session from durable storage.
    ///
    /// A stored location id without its display name is resolved in the
    /// background; this call does not wait for it. An unreadable record is
    /// removed, the store is left empty, and
    /// [`DonorError::CorruptedSession`] is returned for the caller to log.
    pub async fn load(&self) -> Result<Option<User>, DonorError> {
        let Some(database) = &self.inner.database else {
            return Ok(self.current());
        };

        let raw = match local_storage::get_item(database.pool(), USER_STORAGE_KEY).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Failed to read stored session: {}", e);
                return Ok(self.current());
            }
        };

        let Some(raw) = raw else {
            debug!("No stored session");
            return Ok(None);
        };

        let mut user: User = match serde_json::from_str(&raw) {
            Ok(user) => user,
            Err(e) => {
                warn!("Discarding unreadable stored session: {}", e);
                self.clear().await;
                return Err(DonorError::CorruptedSession(e.to_string()));
            }
        };

        if let Ok(Some(token)) = cookies::get_cookie_value(database.pool(), TOKEN_COOKIE).await {
            if token != user.token {
                debug!("Token cookie differs from stored record, using the cookie");
                user.token = token;
            }
        }

        self.inner.slot.send_replace(Some(user.clone()));
        info!("Restored session for {}", user.email);

        if user.needs_location_resolution() {
            if let Some(resolver) = self.inner.resolver.clone() {
                let store = self.clone();
                tokio::spawn(async move {
                    store.refresh_location(resolver.as_ref()).await;
                });
            }
        }

        Ok(Some(user))
    }

    /// Replace the current user and persist it.
    pub async fn set(&self, user: User) {
        self.inner.slot.send_replace(Some(user));
        self.sync_storage().await;
    }

    /// Read-modify-write on the current user.
    ///
    /// Returns the updated user, or `None` (and does nothing) when signed out.
    pub async fn update<F>(&self, f: F) -> Option<User>
    where
        F: FnOnce(&mut User),
    {
        let mut updated = None;
        self.inner.slot.send_if_modified(|slot| match slot {
            Some(user) => {
                f(user);
                updated = Some(user.clone());
                true
            }
            None => false,
        });

        if updated.is_some() {
            self.sync_storage().await;
        }
        updated
    }

    /// Sign out locally: empty the slot and remove the stored record and the
    /// token cookie. Safe to call when already empty.
    pub async fn clear(&self) {
        self.inner.slot.send_replace(None);
        self.sync_storage().await;
    }

    /// Watch the session. The receiver sees every subsequent write.
    pub fn subscribe(&self) -> watch::Receiver<Option<User>> {
        self.inner.slot.subscribe()
    }

    pub fn current(&self) -> Option<User> {
        self.inner.slot.borrow().clone()
    }

    pub fn token(&self) -> Option<String> {
        self.inner.slot.borrow().as_ref().map(|user| user.token.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.slot.borrow().is_some()
    }

    /// Resolve missing wilaya/commune display data for the current user.
    ///
    /// Failures only leave the location display stale. Returns whether the
    /// session changed.
    pub async fn refresh_location(&self, resolver: &dyn LocationResolver) -> bool {
        let Some(user) = self.current() else {
            return false;
        };

        let fix = match resolve_profile_location(resolver, &user.profile).await {
            Ok(Some(fix)) => fix,
            Ok(None) => return false,
            Err(e) => {
                warn!("Could not resolve location for {}: {}", user.id, e);
                return false;
            }
        };

        let mut applied = false;
        self.update(|current| {
            if current.id == user.id {
                applied = fix.apply_to(&mut current.profile);
            }
        })
        .await;

        if applied {
            debug!("Resolved location for {}", user.id);
        }
        applied
    }

    /// Mirror the slot to durable storage: the record and cookie when signed
    /// in, neither when signed out.
    async fn sync_storage(&self) {
        let Some(database) = &self.inner.database else {
            return;
        };

        let _guard = self.inner.writes.lock().await;
        let current = self.inner.slot.borrow().clone();

        let Some(user) = current else {
            if let Err(e) = local_storage::remove_item(database.pool(), USER_STORAGE_KEY).await {
                warn!("Failed to remove stored session: {}", e);
            }
            if let Err(e) = cookies::remove_cookie(database.pool(), TOKEN_COOKIE).await {
                warn!("Failed to remove token cookie: {}", e);
            }
            return;
        };

        match serde_json::to_string(&user) {
            Ok(json) => {
                if let Err(e) = local_storage::set_item(database.pool(), USER_STORAGE_KEY, &json).await {
                    warn!("Failed to persist session: {}", e);
                }
            }
            Err(e) => warn!("Failed to serialize session: {}", e),
        }

        if let Err(e) = cookies::set_cookie(database.pool(), TOKEN_COOKIE, &user.token, None).await {
            warn!("Failed to persist token cookie: {}", e);
        }
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("authenticated", &self.is_authenticated())
            .field("durable", &self.inner.database.is_some())
            .finish()
    }
}
