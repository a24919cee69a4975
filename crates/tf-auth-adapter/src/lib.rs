//! Identity provider seam: account creation, sign-in, sign-out and a
//! current-user feed.

mod firebase;
mod memory;

pub use firebase::FirebaseIdentityProvider;
pub use memory::InMemoryIdentityProvider;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub email: String,
    #[serde(default, skip_serializing)]
    pub id_token: Option<String>,
}

/// Display strings are fixed; `reason` carries the provider's own code for logs.
#[derive(Debug, Clone, Error)]
pub enum IdentityError {
    #[error("failed to create account, please try again")]
    SignUpFailed { reason: String },
    #[error("invalid email or password, please try again")]
    SignInFailed { reason: String },
}

impl IdentityError {
    pub fn reason(&self) -> &str {
        match self {
            Self::SignUpFailed { reason } | Self::SignInFailed { reason } => reason,
        }
    }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Creates the account and signs it in.
    async fn create_account(&self, email: &str, password: &str) -> Result<AuthenticatedUser, IdentityError>;
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthenticatedUser, IdentityError>;
    async fn sign_out(&self) -> Result<(), IdentityError>;
    fn current_user(&self) -> Option<AuthenticatedUser>;
    /// Receives every change of the signed-in user.
    fn subscribe(&self) -> watch::Receiver<Option<AuthenticatedUser>>;
}

/// Shared current-user cell behind both providers.
pub(crate) struct AuthState {
    current: watch::Sender<Option<AuthenticatedUser>>,
}

impl Default for AuthState {
    fn default() -> Self {
        let (current, _) = watch::channel(None);
        Self { current }
    }
}

impl AuthState {
    pub(crate) fn set(&self, user: Option<AuthenticatedUser>) {
        self.current.send_replace(user);
    }

    pub(crate) fn current(&self) -> Option<AuthenticatedUser> {
        self.current.borrow().clone()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<Option<AuthenticatedUser>> {
        self.current.subscribe()
    }
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
