use std::sync::Arc;

use chrono::Duration;

use crate::config::AppConfig;
use crate::error::IamResult;

use super::authenticator::{AuthProvider, PasswordAuthProvider};
use super::authorizer::{Authorizer, RbacAuthorizer};
use super::session::{MemorySessionStore, SessionCookieOptions, SessionStore};
use super::store::{IdentityStore, MemoryIdentityStore};

/// The four services, built once at process startup and handed to the
/// routing layer. No lazily resolved globals; whoever owns the `IamCore`
/// owns the lifetime of every service in it.
#[derive(Clone)]
pub struct IamCore {
    pub identity: Arc<dyn IdentityStore>,
    pub auth: Arc<dyn AuthProvider>,
    pub authorizer: Arc<dyn Authorizer>,
    pub sessions: Arc<dyn SessionStore>,
    pub cookies: SessionCookieOptions,
}

impl std::fmt::Debug for IamCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IamCore").finish_non_exhaustive()
    }
}

impl IamCore {
    /// Resolve every backend from configuration. Fails fast with a
    /// configuration error on an unknown identity source or an invalid
    /// role policy; nothing here is recoverable at runtime.
    pub fn from_config(config: &AppConfig) -> IamResult<Self> {
        config.validate()?;

        let seed = config.identity.seed()?;
        let identity: Arc<dyn IdentityStore> = Arc::new(MemoryIdentityStore::new(
            seed.users.clone(),
            seed.groups.clone(),
        ));
        let auth: Arc<dyn AuthProvider> =
            Arc::new(PasswordAuthProvider::new(Arc::clone(&identity)));
        let authorizer: Arc<dyn Authorizer> =
            Arc::new(RbacAuthorizer::new(config.authorisation.clone())?);
        let sessions: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new(
            Duration::seconds(config.session.ttl_secs),
        ));
        let cookies = SessionCookieOptions {
            domain: config.session.hostname.clone(),
            secure: config.session.secure,
            max_age_secs: config.session.ttl_secs,
        };

        Ok(Self {
            identity,
            auth,
            authorizer,
            sessions,
            cookies,
        })
    }
}
