//! Session identity and the login gate.
//!
//! The login mechanism itself is external. The application only asks two
//! questions of it: is someone signed in, and who.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{MarginError, Result};
use crate::storage::KeyValueStore;

/// Storage key holding `"true"` while a user is signed in.
pub const LOGGED_IN_KEY: &str = "loggedIn";
/// Storage key holding the signed-in user's identifier.
pub const CURRENT_USER_KEY: &str = "currentUser";

/// Opaque identifier of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The external authentication collaborator.
pub trait SessionGate: Send + Sync {
    /// Whether a user is currently signed in.
    fn is_authenticated(&self) -> bool;

    /// The signed-in user, if any.
    fn current_user_id(&self) -> Option<UserId>;

    /// Ends the signed-in session.
    fn sign_out(&self) -> Result<()>;
}

/// Resolves the user a session should run as.
///
/// Fails with `MarginError::Unauthenticated` when the gate reports nobody
/// signed in, which callers treat as "leave the page".
pub fn require_user(gate: &dyn SessionGate) -> Result<UserId> {
    if !gate.is_authenticated() {
        return Err(MarginError::Unauthenticated);
    }
    gate.current_user_id().ok_or(MarginError::Unauthenticated)
}

/// Login state kept in the same key/value medium as the user data.
#[derive(Clone)]
pub struct StoredSessionGate {
    store: Arc<dyn KeyValueStore>,
}

impl StoredSessionGate {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Marks `user` as signed in.
    pub fn sign_in(&self, user: &UserId) -> Result<()> {
        if user.as_str().trim().is_empty() {
            return Err(MarginError::config("user id must not be empty"));
        }
        self.store.set(LOGGED_IN_KEY, "true")?;
        self.store.set(CURRENT_USER_KEY, user.as_str())?;
        tracing::info!(user = %user, "Signed in");
        Ok(())
    }
}

impl SessionGate for StoredSessionGate {
    fn is_authenticated(&self) -> bool {
        matches!(self.store.get(LOGGED_IN_KEY), Ok(Some(ref flag)) if flag == "true")
    }

    fn current_user_id(&self) -> Option<UserId> {
        self.store
            .get(CURRENT_USER_KEY)
            .ok()
            .flatten()
            .filter(|id| !id.is_empty())
            .map(UserId::new)
    }

    fn sign_out(&self) -> Result<()> {
        self.store.remove(LOGGED_IN_KEY)?;
        self.store.remove(CURRENT_USER_KEY)?;
        tracing::info!("Signed out");
        Ok(())
    }
}
