use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{IamError, IamResult};

use super::principal::UserSession;

/// The closed set of actions a page or handler can gate on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    CanLogin,
    ViewHomepage,
    ViewCalendar,
    ViewManager,
    UpdateManager,
}

/// One role's slice of the policy document. `extends` names a single
/// parent role consulted when this role is silent on an action.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoleRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allow: Vec<Action>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deny: Vec<Action>,
}

/// Immutable role policy, loaded once at process start and shared across
/// all concurrent authorisation checks without synchronisation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct RolePolicy {
    pub roles: BTreeMap<String, RoleRule>,
}

impl RolePolicy {
    pub fn new(roles: BTreeMap<String, RoleRule>) -> Self {
        Self { roles }
    }

    /// Startup check that every `extends` chain terminates: each target
    /// must exist and no chain may loop back on itself. A violation is a
    /// configuration error, never a runtime one.
    pub fn validate(&self) -> IamResult<()> {
        for (name, rule) in &self.roles {
            let mut seen: Vec<&str> = vec![name.as_str()];
            let mut current = rule;
            while let Some(parent) = current.extends.as_deref() {
                if seen.contains(&parent) {
                    return Err(IamError::configuration(format!(
                        "role '{}' has a cyclic extends chain through '{}'",
                        name, parent
                    )));
                }
                let Some(next) = self.roles.get(parent) else {
                    return Err(IamError::configuration(format!(
                        "role '{}' extends unknown role '{}'",
                        name, parent
                    )));
                };
                seen.push(parent);
                current = next;
            }
        }
        Ok(())
    }
}

/// Decides whether a session's identity may perform a named action.
/// Answers with a boolean, never an error; denial is normal control flow
/// for the caller.
#[async_trait]
pub trait Authorizer: Send + Sync {
    async fn is_authorized(&self, session: Option<&UserSession>, action: Action) -> bool;
}

/// Role-based implementation over the static policy document.
pub struct RbacAuthorizer {
    policy: RolePolicy,
}

impl RbacAuthorizer {
    /// Validates the policy graph up front so the recursive walk in
    /// `role_authorized` is guaranteed to terminate.
    pub fn new(policy: RolePolicy) -> IamResult<Self> {
        policy.validate()?;
        Ok(Self { policy })
    }

    /// Deny is checked before allow at every level and is never overridden
    /// by an ancestor's allow; a role silent on the action delegates to
    /// its parent. Unknown roles authorise nothing.
    fn role_authorized(&self, role: &str, action: Action) -> bool {
        let Some(rule) = self.policy.roles.get(role) else {
            return false;
        };
        let authorized = if rule.deny.contains(&action) {
            false
        } else if rule.allow.contains(&action) {
            true
        } else if let Some(parent) = rule.extends.as_deref() {
            debug!(target: "circuit_iam::authz", "role {} extends {}", role, parent);
            self.role_authorized(parent, action)
        } else {
            false
        };
        debug!(target: "circuit_iam::authz", "returning {} for role '{}', action {:?}", authorized, role, action);
        authorized
    }
}

#[async_trait]
impl Authorizer for RbacAuthorizer {
    async fn is_authorized(&self, session: Option<&UserSession>, action: Action) -> bool {
        let Some(session) = session else {
            debug!(target: "circuit_iam::authz", "session absent");
            return false;
        };
        if session.is_expired(Utc::now()) {
            debug!(target: "circuit_iam::authz", "session expired");
            return false;
        }
        session
            .identity
            .roles
            .iter()
            .any(|role| self.role_authorized(role, action))
    }
}
