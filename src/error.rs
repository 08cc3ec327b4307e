//! Unified error model for the identity/authentication/authorisation/session
//! core, along with the HTTP status mapping used by the routing layer above us.
//!
//! Authorisation denial is deliberately not represented here: `is_authorized`
//! answers with a boolean and the caller branches on it.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IamError {
    /// Fatal at startup: unknown identity source, unknown role reference,
    /// or a cyclic role `extends` chain. Never recovered at runtime.
    #[error("configuration: {message}")]
    Configuration { message: String },

    /// The identity store had no record matching the credential, or the
    /// credential shape is unsupported by the active backend.
    #[error("credential_rejected: {message}")]
    CredentialRejected { message: String },

    /// Login failed. Opaque by design: carries no distinction between an
    /// unknown user and a wrong password.
    #[error("authentication_failed: {message}")]
    AuthenticationFailed { message: String },

    /// Unknown user, group, or session token. The caller decides recovery,
    /// e.g. treating a missing session as "no session" rather than fatal.
    #[error("not_found: {message}")]
    NotFound { message: String },

    /// Wrong current password during a change-password flow.
    #[error("invalid_credential: {message}")]
    InvalidCredential { message: String },
}

impl IamError {
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        IamError::Configuration { message: msg.into() }
    }
    pub fn credential_rejected<S: Into<String>>(msg: S) -> Self {
        IamError::CredentialRejected { message: msg.into() }
    }
    pub fn authentication_failed<S: Into<String>>(msg: S) -> Self {
        IamError::AuthenticationFailed { message: msg.into() }
    }
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        IamError::NotFound { message: msg.into() }
    }
    pub fn invalid_credential<S: Into<String>>(msg: S) -> Self {
        IamError::InvalidCredential { message: msg.into() }
    }

    pub fn code_str(&self) -> &'static str {
        match self {
            IamError::Configuration { .. } => "configuration",
            IamError::CredentialRejected { .. } => "credential_rejected",
            IamError::AuthenticationFailed { .. } => "authentication_failed",
            IamError::NotFound { .. } => "not_found",
            IamError::InvalidCredential { .. } => "invalid_credential",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            IamError::Configuration { message }
            | IamError::CredentialRejected { message }
            | IamError::AuthenticationFailed { message }
            | IamError::NotFound { message }
            | IamError::InvalidCredential { message } => message.as_str(),
        }
    }

    /// Map to the HTTP status code the routing layer should answer with.
    pub fn http_status(&self) -> u16 {
        match self {
            IamError::Configuration { .. } => 500,
            IamError::CredentialRejected { .. } => 401,
            IamError::AuthenticationFailed { .. } => 401,
            IamError::NotFound { .. } => 404,
            IamError::InvalidCredential { .. } => 403,
        }
    }
}

pub type IamResult<T> = Result<T, IamError>;
