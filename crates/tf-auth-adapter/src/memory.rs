use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tokio::sync::{RwLock, watch};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    AuthState, AuthenticatedUser, IdentityError, IdentityProvider, MIN_PASSWORD_LEN, normalize_email,
};

struct StoredAccount {
    user_id: String,
    salt: String,
    password_hash: [u8; 32],
}

/// Email/password accounts held in process memory.
#[derive(Default)]
pub struct InMemoryIdentityProvider {
    accounts: RwLock<HashMap<String, StoredAccount>>,
    state: AuthState,
}

impl InMemoryIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

fn hash_password(salt: &str, password: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    hasher.finalize().into()
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn create_account(&self, email: &str, password: &str) -> Result<AuthenticatedUser, IdentityError> {
        let email = normalize_email(email);
        let reject = |reason: &str| {
            warn!(%email, reason, "account creation rejected");
            IdentityError::SignUpFailed {
                reason: reason.to_owned(),
            }
        };

        if !email.contains('@') {
            return Err(reject("INVALID_EMAIL"));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(reject("WEAK_PASSWORD"));
        }

        let user = {
            let mut accounts = self.accounts.write().await;
            if accounts.contains_key(&email) {
                return Err(reject("EMAIL_EXISTS"));
            }

            let salt = Uuid::new_v4().to_string();
            let account = StoredAccount {
                user_id: Uuid::new_v4().to_string(),
                password_hash: hash_password(&salt, password),
                salt,
            };
            let user = AuthenticatedUser {
                user_id: account.user_id.clone(),
                email: email.clone(),
                id_token: None,
            };
            accounts.insert(email, account);
            user
        };

        info!(user_id = %user.user_id, "account created");
        self.state.set(Some(user.clone()));
        Ok(user)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthenticatedUser, IdentityError> {
        let email = normalize_email(email);
        let accounts = self.accounts.read().await;

        let Some(account) = accounts.get(&email) else {
            warn!(%email, "sign-in for unknown account");
            return Err(IdentityError::SignInFailed {
                reason: "EMAIL_NOT_FOUND".to_owned(),
            });
        };

        if hash_password(&account.salt, password) != account.password_hash {
            warn!(%email, "sign-in with wrong password");
            return Err(IdentityError::SignInFailed {
                reason: "INVALID_PASSWORD".to_owned(),
            });
        }

        let user = AuthenticatedUser {
            user_id: account.user_id.clone(),
            email,
            id_token: None,
        };
        info!(user_id = %user.user_id, "signed in");
        self.state.set(Some(user.clone()));
        Ok(user)
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        self.state.set(None);
        Ok(())
    }

    fn current_user(&self) -> Option<AuthenticatedUser> {
        self.state.current()
    }

    fn subscribe(&self) -> watch::Receiver<Option<AuthenticatedUser>> {
        self.state.subscribe()
    }
}
