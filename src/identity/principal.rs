use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Credentials a visitor can present when trying to associate themselves
/// with an identity. Exactly one shape at a time; only the
/// username/password shape is implemented by the reference backends, the
/// other two are reserved extension points for federated logins.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Credential {
    UsernamePassword { username: String, password: String },
    Oidc { access_token: String, user_claims: String },
    Saml { assertion: String },
}

/// The authenticated-or-anonymous principal attached to a session.
/// Role names are drawn from the user's group memberships at lookup time.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    pub id: String,
    pub username: String,
    pub name: String,
    pub access_token: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

/// An identity with the time bounds stamped on it at login. Expiry is
/// checked lazily by whoever reads it, never by a background timer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserSession {
    #[serde(flatten)]
    pub identity: Identity,
    pub created: DateTime<Utc>,
    pub expiry: DateTime<Utc>,
}

impl UserSession {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiry <= now
    }
}

/// A user as held by the identity store. The password field only ever
/// carries the lower-case hex digest, never plaintext.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserRecord {
    pub id: String,
    pub username: String,
    pub password: String,
    pub name: String,
    #[serde(default)]
    pub family_name: String,
    #[serde(default)]
    pub given_name: String,
    #[serde(default)]
    pub middle_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub groups: Vec<GroupRecord>,
    #[serde(default)]
    pub created_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub modified_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GroupRecord {
    pub name: String,
    #[serde(default)]
    pub description: String,
}
