use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// The authenticated caller identity, as provided by the auth collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: String,
}

impl UserIdentity {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Source of the current caller identity.
///
/// Injected into the linker rather than read from ambient state, so the
/// component stays testable and the HTTP layer can supply a per-request
/// identity.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Returns the currently authenticated user, or `None` when the caller
    /// is anonymous.
    async fn current_user(&self) -> Option<UserIdentity>;
}

/// An identity fixed at construction time. Used by the HTTP layer (identity
/// extracted from the gateway-set header) and by tests.
#[derive(Debug, Clone)]
pub struct FixedIdentity(Option<UserIdentity>);

impl FixedIdentity {
    pub fn authenticated(id: impl Into<String>) -> Self {
        Self(Some(UserIdentity::new(id)))
    }

    pub fn anonymous() -> Self {
        Self(None)
    }
}

impl From<Option<String>> for FixedIdentity {
    fn from(id: Option<String>) -> Self {
        Self(id.map(UserIdentity::new))
    }
}

#[async_trait]
impl IdentityProvider for FixedIdentity {
    async fn current_user(&self) -> Option<UserIdentity> {
        self.0.clone()
    }
}
