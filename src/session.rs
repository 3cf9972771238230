//! Session context: the two independent token domains and their cached profiles.
//!
//! All mutation goes through `SessionContext`. Each domain carries a generation counter that
//! moves on every login, logout and invalidation; profile fetches capture it in a
//! `RefreshTicket` so a result arriving after the session changed is discarded.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};

use crate::{
    error::ConsoleError,
    models::{AdminProfile, PermissionSet, UserProfile},
    storage::{ADMIN_TOKEN_KEY, StoreState, USER_TOKEN_KEY},
};

/// The two authorization domains. Holding a token in one implies nothing about the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Realm {
    User,
    Admin,
}

impl Realm {
    pub fn storage_key(self) -> &'static str {
        match self {
            Realm::User => USER_TOKEN_KEY,
            Realm::Admin => ADMIN_TOKEN_KEY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Generation(u64);

impl Generation {
    fn bump(&mut self) {
        self.0 += 1;
    }
}

/// Session
///
/// A point-in-time view of the session. A token may be present while its profile is not yet
/// loaded, or after the upstream has already revoked it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub user_token: Option<String>,
    pub admin_token: Option<String>,
    pub user_profile: Option<UserProfile>,
    pub admin_profile: Option<AdminProfile>,
}

impl Session {
    /// Builds a profile-less session from raw tokens; empty strings count as absent.
    pub fn from_tokens(user_token: Option<String>, admin_token: Option<String>) -> Self {
        Self {
            user_token: non_empty(user_token),
            admin_token: non_empty(admin_token),
            ..Self::default()
        }
    }

    pub fn has_user_token(&self) -> bool {
        self.token(Realm::User).is_some()
    }

    pub fn has_admin_token(&self) -> bool {
        self.token(Realm::Admin).is_some()
    }

    /// The realm's token; blank values count as absent even when set directly on the fields.
    pub fn token(&self, realm: Realm) -> Option<&str> {
        let token = match realm {
            Realm::User => self.user_token.as_deref(),
            Realm::Admin => self.admin_token.as_deref(),
        };
        token.filter(|t| !t.trim().is_empty())
    }

    /// Permission codes of the cached admin profile; empty until a profile has loaded.
    pub fn permissions(&self) -> PermissionSet {
        self.admin_profile
            .as_ref()
            .map(AdminProfile::permission_set)
            .unwrap_or_default()
    }
}

fn non_empty(token: Option<String>) -> Option<String> {
    token.filter(|t| !t.trim().is_empty())
}

/// RefreshTicket
///
/// Captures which session a profile fetch was started for.
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshTicket {
    pub realm: Realm,
    pub generation: Generation,
    pub token: String,
}

#[derive(Default)]
struct Inner {
    session: Session,
    user_generation: Generation,
    admin_generation: Generation,
}

impl Inner {
    fn generation_mut(&mut self, realm: Realm) -> &mut Generation {
        match realm {
            Realm::User => &mut self.user_generation,
            Realm::Admin => &mut self.admin_generation,
        }
    }

    fn generation(&self, realm: Realm) -> Generation {
        match realm {
            Realm::User => self.user_generation,
            Realm::Admin => self.admin_generation,
        }
    }

    fn clear(&mut self, realm: Realm) {
        match realm {
            Realm::User => {
                self.session.user_token = None;
                self.session.user_profile = None;
            }
            Realm::Admin => {
                self.session.admin_token = None;
                self.session.admin_profile = None;
            }
        }
        self.generation_mut(realm).bump();
    }

    fn is_current(&self, ticket: &RefreshTicket) -> bool {
        self.generation(ticket.realm) == ticket.generation
            && self.session.token(ticket.realm) == Some(ticket.token.as_str())
    }
}

/// SessionContext
///
/// Injectable handle onto the shared session. Clones share state.
#[derive(Clone)]
pub struct SessionContext {
    inner: Arc<RwLock<Inner>>,
    store: StoreState,
}

impl SessionContext {
    /// bootstrap
    ///
    /// Restores whatever tokens survived in durable storage. Profiles always start empty.
    pub fn bootstrap(store: StoreState) -> Self {
        let session = Session::from_tokens(
            store.get(Realm::User.storage_key()),
            store.get(Realm::Admin.storage_key()),
        );

        tracing::debug!(
            user_token = session.has_user_token(),
            admin_token = session.has_admin_token(),
            "session restored"
        );

        Self {
            inner: Arc::new(RwLock::new(Inner {
                session,
                ..Inner::default()
            })),
            store,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }

    pub fn snapshot(&self) -> Session {
        self.read().session.clone()
    }

    pub fn generation(&self, realm: Realm) -> Generation {
        self.read().generation(realm)
    }

    pub fn permissions(&self) -> PermissionSet {
        self.read().session.permissions()
    }

    pub fn has_user_profile(&self) -> bool {
        self.read().session.user_profile.is_some()
    }

    pub fn has_admin_profile(&self) -> bool {
        self.read().session.admin_profile.is_some()
    }

    // --- Login / Logout ---

    /// Stores a freshly issued token. Any cached profile of that realm is dropped since it
    /// belonged to the previous token.
    pub fn login(&self, realm: Realm, token: &str) -> Result<(), ConsoleError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(ConsoleError::Unauthorized);
        }

        self.store.set(realm.storage_key(), token)?;

        let mut inner = self.write();
        inner.clear(realm);
        match realm {
            Realm::User => inner.session.user_token = Some(token.to_string()),
            Realm::Admin => inner.session.admin_token = Some(token.to_string()),
        }
        drop(inner);

        tracing::info!(?realm, "session login");
        Ok(())
    }

    pub fn login_user(&self, token: &str) -> Result<(), ConsoleError> {
        self.login(Realm::User, token)
    }

    pub fn login_admin(&self, token: &str) -> Result<(), ConsoleError> {
        self.login(Realm::Admin, token)
    }

    /// Clears the realm in memory first, then in durable storage. The in-memory session is
    /// logged out even when the storage write fails.
    pub fn logout(&self, realm: Realm) -> Result<(), ConsoleError> {
        self.write().clear(realm);
        tracing::info!(?realm, "session logout");
        self.store.remove(realm.storage_key())
    }

    pub fn logout_user(&self) -> Result<(), ConsoleError> {
        self.logout(Realm::User)
    }

    pub fn logout_admin(&self) -> Result<(), ConsoleError> {
        self.logout(Realm::Admin)
    }

    pub fn logout_all(&self) -> Result<(), ConsoleError> {
        let user = self.logout(Realm::User);
        let admin = self.logout(Realm::Admin);
        user.and(admin)
    }

    // --- Profile Refresh ---

    /// Starts a profile fetch for `realm`. `None` when there is no token to fetch with.
    pub fn begin_refresh(&self, realm: Realm) -> Option<RefreshTicket> {
        let inner = self.read();
        let token = inner.session.token(realm)?.to_string();
        Some(RefreshTicket {
            realm,
            generation: inner.generation(realm),
            token,
        })
    }

    pub fn begin_user_refresh(&self) -> Option<RefreshTicket> {
        self.begin_refresh(Realm::User)
    }

    pub fn begin_admin_refresh(&self) -> Option<RefreshTicket> {
        self.begin_refresh(Realm::Admin)
    }

    /// Caches the fetched user profile. Returns `false` when the ticket is stale.
    pub fn apply_user_profile(&self, ticket: &RefreshTicket, profile: UserProfile) -> bool {
        let mut inner = self.write();
        if ticket.realm != Realm::User || !inner.is_current(ticket) {
            tracing::debug!("discarding stale user profile");
            return false;
        }
        inner.session.user_profile = Some(profile);
        true
    }

    /// Caches the fetched admin profile, replacing the permission set wholesale. Returns
    /// `false` when the ticket is stale.
    pub fn apply_admin_profile(&self, ticket: &RefreshTicket, profile: AdminProfile) -> bool {
        let mut inner = self.write();
        if ticket.realm != Realm::Admin || !inner.is_current(ticket) {
            tracing::debug!("discarding stale admin profile");
            return false;
        }
        inner.session.admin_profile = Some(profile);
        true
    }

    /// Drops the realm after its profile fetch failed. A stale ticket leaves the session
    /// untouched and returns `false`.
    pub fn invalidate(&self, ticket: &RefreshTicket) -> bool {
        {
            let mut inner = self.write();
            if !inner.is_current(ticket) {
                tracing::debug!(realm = ?ticket.realm, "ignoring stale invalidation");
                return false;
            }
            inner.clear(ticket.realm);
        }

        tracing::info!(realm = ?ticket.realm, "session invalidated");
        if let Err(e) = self.store.remove(ticket.realm.storage_key()) {
            tracing::warn!("failed to remove persisted token: {}", e);
        }
        true
    }
}
