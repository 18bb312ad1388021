use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::UserId;

/// The principal the access token belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub id: UserId,
    pub name: String,
    pub email: Option<String>,
}

impl AuthenticatedUser {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id: UserId::new(id),
            name: name.into(),
            email: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

/// Identity persisted between runs so an offline start still knows who "me" is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedIdentity {
    pub user: AuthenticatedUser,
    #[serde(with = "time::serde::rfc3339")]
    pub validated_at: OffsetDateTime,
}

/// Shared, session-scoped view of who is authenticated.
///
/// `None` means the principal is not known yet; timer ownership checks must
/// then refuse to attribute any running entry to this session.
#[derive(Debug, Default)]
pub struct SessionIdentity {
    user: RwLock<Option<AuthenticatedUser>>,
}

impl SessionIdentity {
    pub fn new(user: Option<AuthenticatedUser>) -> Self {
        Self {
            user: RwLock::new(user),
        }
    }

    pub fn user(&self) -> Option<AuthenticatedUser> {
        match self.user.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.user().map(|u| u.id)
    }

    pub fn set(&self, user: Option<AuthenticatedUser>) {
        match self.user.write() {
            Ok(mut guard) => *guard = user,
            Err(poisoned) => *poisoned.into_inner() = user,
        }
    }
}
