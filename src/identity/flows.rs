//! Per-request glue over the four services: make sure every visitor has a
//! session, swap an anonymous session for an authenticated one at login,
//! and gate the login page itself. Transport-free; the routing layer
//! extracts the token from the cookie and emits the returned one.

use chrono::Utc;
use tracing::debug;

use crate::error::IamResult;

use super::authorizer::Action;
use super::factory::IamCore;
use super::principal::Credential;
use super::session::{Session, SessionState};

fn has_live_identity(session: &Session) -> bool {
    session
        .user
        .as_ref()
        .is_some_and(|u| !u.is_expired(Utc::now()))
}

/// Hand back the visitor's current session, or mint an anonymous one when
/// the presented token is absent, unknown, or bound to an expired
/// identity. Returns the token the transport layer should (re-)emit.
pub async fn ensure_session(
    core: &IamCore,
    token: Option<&str>,
) -> IamResult<(String, Session)> {
    if let Some(token) = token {
        if let Ok(session) = core.sessions.get_session(token).await {
            if has_live_identity(&session) {
                return Ok((token.to_string(), session));
            }
        }
    }
    debug!(target: "circuit_iam::flows", "no live session, generating anonymous identity");
    let ident = core.auth.anonymous_login().await;
    let token = core
        .sessions
        .generate_session(SessionState {
            user: Some(ident),
            anonymous: true,
            toasts: None,
        })
        .await?;
    let session = core.sessions.get_session(&token).await?;
    Ok((token, session))
}

/// Authenticate and bind the resulting identity to a session. A live
/// existing session is overwritten in place, keeping its token; otherwise
/// a fresh token is issued. Authentication failure propagates opaquely.
pub async fn login(
    core: &IamCore,
    current_token: Option<&str>,
    credential: &Credential,
) -> IamResult<(String, Session)> {
    let user = core.auth.login(credential).await?;
    let state = SessionState {
        user: Some(user),
        anonymous: false,
        toasts: None,
    };

    let live_token = match current_token {
        Some(token) => match core.sessions.get_session(token).await {
            Ok(session) if has_live_identity(&session) => Some(token.to_string()),
            _ => None,
        },
        None => None,
    };

    let token = match live_token {
        Some(token) => core.sessions.overwrite_session(&token, state).await?,
        None => core.sessions.generate_session(state).await?,
    };
    let session = core.sessions.get_session(&token).await?;
    Ok((token, session))
}

/// Whether the session's identity is still allowed to reach the login
/// page; anonymous visitors are, already-authenticated ones are not.
pub async fn can_login(core: &IamCore, session: &Session) -> bool {
    core.authorizer
        .is_authorized(session.user.as_ref(), Action::CanLogin)
        .await
}
