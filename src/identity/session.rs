use std::collections::HashMap;

use async_trait::async_trait;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{IamError, IamResult};

use super::authenticator::SESSION_LIFETIME_SECS;
use super::principal::UserSession;

/// Cookie the collaborating transport layer carries the token in. The
/// core itself never touches headers; it only renders values.
pub const SESSION_COOKIE: &str = "user-session";

/// A one-shot notification queued on a session and cleared after being
/// shown once.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Toast {
    pub title: String,
    pub html: String,
}

/// Everything a caller supplies when creating or replacing a session.
/// The toast queue is only honoured on overwrite; newly generated
/// sessions always start with an empty one.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub user: Option<UserSession>,
    pub anonymous: bool,
    pub toasts: Option<Vec<Toast>>,
}

/// A token-addressed record binding an identity to per-visit state.
/// Expiry is advisory: readers check it, the store never sweeps.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user: Option<UserSession>,
    pub anonymous: bool,
    pub created: DateTime<Utc>,
    pub expiry: DateTime<Utc>,
    pub toasts: Vec<Toast>,
}

/// Maps opaque tokens to session records. The single piece of mutable
/// shared state in the core; implementations must expose every operation
/// as atomic so a reader never observes a partially written record.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Store a new record under a fresh unique token and return the token.
    async fn generate_session(&self, state: SessionState) -> IamResult<String>;

    /// Fetch the record at `token`. Unknown tokens fail with `NotFound`;
    /// expired records are still returned, expiry being the caller's
    /// concern via the identity's own timestamps.
    async fn get_session(&self, token: &str) -> IamResult<Session>;

    /// Full-state replacement at an existing token. The token value is
    /// preserved and returned; unknown tokens fail with `NotFound`.
    async fn overwrite_session(&self, token: &str, state: SessionState) -> IamResult<String>;

    /// Append a toast to the session's queue.
    async fn push_toast(&self, token: &str, toast: Toast) -> IamResult<()>;

    /// Take every queued toast and leave the queue empty, as one atomic
    /// step.
    async fn drain_toasts(&self, token: &str) -> IamResult<Vec<Toast>>;
}

// 256-bit random token, base64url without padding.
fn gen_token() -> String {
    let mut buf = [0u8; 32];
    let _ = getrandom::getrandom(&mut buf);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(buf)
}

/// In-memory reference session store. One store-wide lock serializes all
/// writers; records are never physically deleted, superseded and expired
/// sessions simply go inert.
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, Session>>,
    ttl: Duration,
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new(Duration::seconds(SESSION_LIFETIME_SECS))
    }
}

impl MemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    fn record(&self, token: String, state: SessionState) -> Session {
        let now = Utc::now();
        Session {
            token,
            user: state.user,
            anonymous: state.anonymous,
            created: now,
            expiry: now + self.ttl,
            toasts: state.toasts.unwrap_or_default(),
        }
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn generate_session(&self, state: SessionState) -> IamResult<String> {
        let mut sessions = self.sessions.write();
        let mut token = gen_token();
        // Collisions are vanishingly unlikely at 256 bits, but tokens must
        // be unique within the store.
        while sessions.contains_key(&token) {
            token = gen_token();
        }
        // New sessions always start with an empty toast queue; only an
        // overwrite may carry one in.
        let record = self.record(token.clone(), SessionState { toasts: None, ..state });
        sessions.insert(token.clone(), record);
        debug!(target: "circuit_iam::session", "generated session, {} live", sessions.len());
        Ok(token)
    }

    async fn get_session(&self, token: &str) -> IamResult<Session> {
        let sessions = self.sessions.read();
        sessions
            .get(token)
            .cloned()
            .ok_or_else(|| IamError::not_found("unknown session token"))
    }

    async fn overwrite_session(&self, token: &str, state: SessionState) -> IamResult<String> {
        let mut sessions = self.sessions.write();
        if !sessions.contains_key(token) {
            return Err(IamError::not_found("unknown session token"));
        }
        let record = self.record(token.to_string(), state);
        sessions.insert(token.to_string(), record);
        debug!(target: "circuit_iam::session", "overwrote session");
        Ok(token.to_string())
    }

    async fn push_toast(&self, token: &str, toast: Toast) -> IamResult<()> {
        let mut sessions = self.sessions.write();
        let Some(session) = sessions.get_mut(token) else {
            return Err(IamError::not_found("unknown session token"));
        };
        session.toasts.push(toast);
        Ok(())
    }

    async fn drain_toasts(&self, token: &str) -> IamResult<Vec<Toast>> {
        let mut sessions = self.sessions.write();
        let Some(session) = sessions.get_mut(token) else {
            return Err(IamError::not_found("unknown session token"));
        };
        Ok(std::mem::take(&mut session.toasts))
    }
}

/// Attributes the transport layer needs when emitting the session cookie.
/// `secure` follows whether the deployment terminates TLS.
#[derive(Debug, Clone)]
pub struct SessionCookieOptions {
    pub domain: String,
    pub secure: bool,
    pub max_age_secs: i64,
}

impl SessionCookieOptions {
    /// Render the Set-Cookie value carrying a freshly issued token.
    pub fn header_value(&self, token: &str) -> String {
        let secure = if self.secure { "Secure; " } else { "" };
        format!(
            "{}={}; Max-Age={}; Domain={}; {}HttpOnly; SameSite=Strict",
            SESSION_COOKIE, token, self.max_age_secs, self.domain, secure
        )
    }

    /// Render a Set-Cookie value that forces the cookie to expire, used
    /// on logout. Dated five minutes in the past so clocks slightly out
    /// of step still drop it.
    pub fn clearing_value(&self) -> String {
        let expired = Utc::now() - Duration::minutes(5);
        let secure = if self.secure { "Secure; " } else { "" };
        format!(
            "{}=; Expires={}; Domain={}; {}HttpOnly; SameSite=Strict",
            SESSION_COOKIE,
            expired.to_rfc2822(),
            self.domain,
            secure
        )
    }
}
