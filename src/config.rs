//! Startup configuration: which identity backend to use, the seed data for
//! the in-memory backend, the role policy document, and the session cookie
//! settings. Loaded once, validated once, then treated as immutable.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{IamError, IamResult};
use crate::identity::{Action, GroupRecord, RolePolicy, RoleRule, UserRecord};

/// Literal user/group records seeding a memory-backed identity source.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct IdentitySeed {
    #[serde(default)]
    pub users: Vec<UserRecord>,
    #[serde(default)]
    pub groups: Vec<GroupRecord>,
}

/// Identity backend selection. `internal` and `test` both resolve to the
/// memory backend, each with its own seed section; anything else fails
/// validation at startup.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct IdentityConfig {
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal: Option<IdentitySeed>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test: Option<IdentitySeed>,
}

impl IdentityConfig {
    /// The seed section the configured source points at.
    pub fn seed(&self) -> IamResult<&IdentitySeed> {
        let section = match self.source.as_str() {
            "internal" => self.internal.as_ref(),
            "test" => self.test.as_ref(),
            other => {
                return Err(IamError::configuration(format!(
                    "invalid config: unknown identity source {}",
                    other
                )))
            }
        };
        section.ok_or_else(|| {
            IamError::configuration(format!(
                "invalid config: identity source '{}' has no seed section",
                self.source
            ))
        })
    }
}

/// Values the transport layer needs when emitting session cookies, plus
/// the session lifetime.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionConfig {
    pub hostname: String,
    pub secure: bool,
    pub ttl_secs: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            hostname: "localhost".to_string(),
            secure: false,
            ttl_secs: 3600,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    pub identity: IdentityConfig,
    pub authorisation: RolePolicy,
    pub session: SessionConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        let mut roles = BTreeMap::new();
        roles.insert(
            "default".to_string(),
            RoleRule {
                extends: None,
                allow: vec![Action::CanLogin, Action::ViewHomepage, Action::ViewCalendar],
                deny: vec![],
            },
        );
        roles.insert(
            "administrator".to_string(),
            RoleRule {
                extends: None,
                allow: vec![
                    Action::ViewHomepage,
                    Action::ViewCalendar,
                    Action::ViewManager,
                    Action::UpdateManager,
                ],
                deny: vec![],
            },
        );

        let groups = vec![
            GroupRecord {
                name: "default".to_string(),
                description: "Default actions that an anonymous user is able to do.".to_string(),
            },
            GroupRecord {
                name: "administrator".to_string(),
                description: "Actions that an administrative user is able to do.".to_string(),
            },
        ];
        let users = vec![UserRecord {
            id: "1".to_string(),
            username: "administrator".to_string(),
            // sha256("administrator"), lower hex
            password: "4194d1706ed1f408d5e02d672777019f4d5385c766a8c6ca8acba3167d36a7b9"
                .to_string(),
            name: "Administrator".to_string(),
            email: "admin@example.com".to_string(),
            groups: vec![GroupRecord {
                name: "administrator".to_string(),
                description: String::new(),
            }],
            ..Default::default()
        }];

        Self {
            identity: IdentityConfig {
                source: "internal".to_string(),
                internal: Some(IdentitySeed { users, groups }),
                test: None,
            },
            authorisation: RolePolicy::new(roles),
            session: SessionConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load a JSON configuration file. Any read or parse failure is a
    /// startup configuration error.
    pub fn load<P: AsRef<Path>>(path: P) -> IamResult<Self> {
        let text = fs::read_to_string(path.as_ref()).map_err(|e| {
            IamError::configuration(format!(
                "unable to read config {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        let config: AppConfig = serde_json::from_str(&text)
            .map_err(|e| IamError::configuration(format!("unable to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Check everything that must hold before the services are built:
    /// a resolvable identity source and a terminating role graph.
    pub fn validate(&self) -> IamResult<()> {
        self.identity.seed()?;
        self.authorisation.validate()?;
        if self.session.ttl_secs <= 0 {
            return Err(IamError::configuration("session ttl must be positive"));
        }
        Ok(())
    }
}
