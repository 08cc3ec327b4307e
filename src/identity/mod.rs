//! Central identity, authentication, authorisation and session management.
//! Keep the public surface thin and split implementation across sub-modules.

mod authenticator;
mod authorizer;
mod digest;
mod factory;
pub mod flows;
mod principal;
mod session;
mod store;

pub use authenticator::{AuthProvider, PasswordAuthProvider, SESSION_LIFETIME_SECS};
pub use authorizer::{Action, Authorizer, RbacAuthorizer, RolePolicy, RoleRule};
pub use digest::hash_password;
pub use factory::IamCore;
pub use principal::{Credential, GroupRecord, Identity, UserRecord, UserSession};
pub use session::{
    MemorySessionStore, Session, SessionCookieOptions, SessionState, SessionStore, Toast,
    SESSION_COOKIE,
};
pub use store::{IdentityStore, MemoryIdentityStore};
