use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;

use crate::error::{IamError, IamResult};

use super::digest::hash_password;
use super::principal::{Credential, GroupRecord, Identity, UserRecord};

/// A standardised interface for whichever identity backend an installation
/// chooses. Every call is a potential suspension point for durable
/// backends; the in-memory reference implementation never suspends and
/// never performs external I/O.
///
/// Password handling convention: `lookup_identity` receives the password
/// already in digest form (the authentication service hashes before
/// delegating), while `change_password` takes plaintexts and hashes them
/// itself.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Resolve credentials to the identity they belong to. Fails with
    /// `CredentialRejected` when nothing matches or the credential shape
    /// is unsupported by this backend.
    async fn lookup_identity(&self, credential: &Credential) -> IamResult<Identity>;

    /// The fixed identity handed to unauthenticated visitors. Always
    /// carries the baseline role; never fails.
    async fn anonymous_identity(&self) -> Identity;

    async fn get_user(&self, username: &str) -> IamResult<UserRecord>;

    async fn get_user_for_identity(&self, identity: &Identity) -> IamResult<UserRecord>;

    async fn get_user_groups(&self, user: &UserRecord) -> Vec<GroupRecord>;

    async fn create_user(&self, user: UserRecord) -> IamResult<UserRecord>;

    /// Confirm a newly created user via the administrative flow. The
    /// memory backend has no pending state, so this hands the record back.
    async fn confirm_user(&self, user: UserRecord) -> IamResult<UserRecord>;

    async fn create_group(&self, group: GroupRecord) -> IamResult<GroupRecord>;

    /// Fails with `NotFound` when no group exists under `group_name`.
    async fn add_user_to_group(&self, user: &UserRecord, group_name: &str)
        -> IamResult<UserRecord>;

    /// Replace the stored digest after verifying the current password.
    /// Fails with `InvalidCredential` when `current_plaintext` does not
    /// hash to the stored digest. Re-submitting the current password as
    /// the new one is tolerated as a no-op.
    async fn change_password(
        &self,
        identity: &Identity,
        current_plaintext: &str,
        new_plaintext: &str,
    ) -> IamResult<()>;

    async fn list_users(&self) -> Vec<UserRecord>;

    async fn get_groups(&self) -> Vec<GroupRecord>;

    async fn get_users_in_group(&self, group: &GroupRecord) -> Vec<UserRecord>;
}

/// Access token stamped on identities minted by the memory backend.
const MEMORY_ACCESS_TOKEN: &str = "memory-access-token";

/// In-memory identity backend seeded from configuration. The user and
/// group collections are exclusively owned behind a store-wide lock;
/// writers take it exclusively, readers share it.
pub struct MemoryIdentityStore {
    users: RwLock<Vec<UserRecord>>,
    groups: RwLock<Vec<GroupRecord>>,
}

impl MemoryIdentityStore {
    pub fn new(users: Vec<UserRecord>, groups: Vec<GroupRecord>) -> Self {
        Self {
            users: RwLock::new(users),
            groups: RwLock::new(groups),
        }
    }

    fn identity_for(user: &UserRecord) -> Identity {
        Identity {
            id: user.id.clone(),
            username: user.username.clone(),
            name: user.name.clone(),
            access_token: MEMORY_ACCESS_TOKEN.to_string(),
            roles: user.groups.iter().map(|g| g.name.clone()).collect(),
        }
    }
}

#[async_trait]
impl IdentityStore for MemoryIdentityStore {
    async fn lookup_identity(&self, credential: &Credential) -> IamResult<Identity> {
        match credential {
            Credential::UsernamePassword { username, password } => {
                let users = self.users.read();
                let found = users
                    .iter()
                    .find(|u| u.username == *username && u.password == *password);
                match found {
                    Some(user) => Ok(Self::identity_for(user)),
                    None => Err(IamError::credential_rejected(
                        "unable to find identity which matched credentials",
                    )),
                }
            }
            _ => Err(IamError::credential_rejected("unsupported credentials provided")),
        }
    }

    async fn anonymous_identity(&self) -> Identity {
        Identity {
            id: "0".to_string(),
            username: "anonymous".to_string(),
            name: "Anonymous".to_string(),
            access_token: MEMORY_ACCESS_TOKEN.to_string(),
            roles: vec!["default".to_string()],
        }
    }

    async fn get_user(&self, username: &str) -> IamResult<UserRecord> {
        let users = self.users.read();
        users
            .iter()
            .find(|u| u.username == username)
            .cloned()
            .ok_or_else(|| {
                IamError::not_found(format!("unable to find user with username {}", username))
            })
    }

    async fn get_user_for_identity(&self, identity: &Identity) -> IamResult<UserRecord> {
        self.get_user(&identity.username).await
    }

    async fn get_user_groups(&self, user: &UserRecord) -> Vec<GroupRecord> {
        user.groups.clone()
    }

    async fn create_user(&self, user: UserRecord) -> IamResult<UserRecord> {
        let mut users = self.users.write();
        users.push(user.clone());
        debug!(target: "circuit_iam::identity", "created user {}", user.username);
        Ok(user)
    }

    async fn confirm_user(&self, user: UserRecord) -> IamResult<UserRecord> {
        Ok(user)
    }

    async fn create_group(&self, group: GroupRecord) -> IamResult<GroupRecord> {
        let mut groups = self.groups.write();
        groups.push(group.clone());
        debug!(target: "circuit_iam::identity", "created group {}", group.name);
        Ok(group)
    }

    async fn add_user_to_group(
        &self,
        user: &UserRecord,
        group_name: &str,
    ) -> IamResult<UserRecord> {
        let group = {
            let groups = self.groups.read();
            groups.iter().find(|g| g.name == group_name).cloned()
        };
        let Some(group) = group else {
            return Err(IamError::not_found("unknown group"));
        };
        let mut users = self.users.write();
        let Some(stored) = users.iter_mut().find(|u| u.username == user.username) else {
            return Err(IamError::not_found(format!(
                "unable to find user with username {}",
                user.username
            )));
        };
        stored.groups.push(group);
        Ok(stored.clone())
    }

    async fn change_password(
        &self,
        identity: &Identity,
        current_plaintext: &str,
        new_plaintext: &str,
    ) -> IamResult<()> {
        let mut users = self.users.write();
        let Some(user) = users.iter_mut().find(|u| u.username == identity.username) else {
            return Err(IamError::not_found("unknown user"));
        };
        if hash_password(current_plaintext) != user.password {
            return Err(IamError::invalid_credential("invalid previous password"));
        }
        let new_digest = hash_password(new_plaintext);
        if new_digest != user.password {
            user.password = new_digest;
            debug!(target: "circuit_iam::identity", "password changed for {}", user.username);
        }
        Ok(())
    }

    async fn list_users(&self) -> Vec<UserRecord> {
        self.users.read().clone()
    }

    async fn get_groups(&self) -> Vec<GroupRecord> {
        self.groups.read().clone()
    }

    async fn get_users_in_group(&self, group: &GroupRecord) -> Vec<UserRecord> {
        let users = self.users.read();
        users
            .iter()
            .filter(|u| u.groups.iter().any(|g| g.name == group.name))
            .cloned()
            .collect()
    }
}
