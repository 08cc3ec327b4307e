use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tracing::debug;

use crate::error::{IamError, IamResult};

use super::digest::hash_password;
use super::principal::{Credential, UserSession};
use super::store::IdentityStore;

/// How long a freshly authenticated identity stays valid.
pub const SESSION_LIFETIME_SECS: i64 = 3600;

/// Turns a credential payload into a time-bounded identity assertion.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Authenticate a visitor. The failure is a single opaque
    /// `AuthenticationFailed` whether the credential shape is unsupported,
    /// the user is unknown, or the password is wrong.
    async fn login(&self, credential: &Credential) -> IamResult<UserSession>;

    /// Mint a time-bounded session for an anonymous visitor. Never fails.
    async fn anonymous_login(&self) -> UserSession;
}

/// Username/password authentication backed by an identity store. Hashes
/// the presented plaintext with the shared digest before delegating, so
/// the store only ever sees digests.
pub struct PasswordAuthProvider {
    identity_store: Arc<dyn IdentityStore>,
    lifetime: Duration,
}

impl PasswordAuthProvider {
    pub fn new(identity_store: Arc<dyn IdentityStore>) -> Self {
        Self {
            identity_store,
            lifetime: Duration::seconds(SESSION_LIFETIME_SECS),
        }
    }

    fn stamp(&self, identity: super::principal::Identity) -> UserSession {
        let now = Utc::now();
        UserSession {
            identity,
            created: now,
            expiry: now + self.lifetime,
        }
    }
}

#[async_trait]
impl AuthProvider for PasswordAuthProvider {
    async fn login(&self, credential: &Credential) -> IamResult<UserSession> {
        let Credential::UsernamePassword { username, password } = credential else {
            return Err(IamError::authentication_failed(
                "unsupported login credentials provided",
            ));
        };
        let hashed = Credential::UsernamePassword {
            username: username.clone(),
            password: hash_password(password),
        };
        match self.identity_store.lookup_identity(&hashed).await {
            Ok(identity) => {
                debug!(target: "circuit_iam::auth", "login succeeded for {}", username);
                Ok(self.stamp(identity))
            }
            // Collapse the store's rejection into the same opaque failure
            // as an unsupported shape; callers learn nothing about which
            // check failed.
            Err(_) => {
                debug!(target: "circuit_iam::auth", "login rejected for {}", username);
                Err(IamError::authentication_failed("unable to authenticate user"))
            }
        }
    }

    async fn anonymous_login(&self) -> UserSession {
        let identity = self.identity_store.anonymous_identity().await;
        debug!(target: "circuit_iam::auth", "anonymous login issued");
        self.stamp(identity)
    }
}
