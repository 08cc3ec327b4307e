//! Identity store tests: credential lookup, CRUD mutators, group
//! membership, and the change-password flow.

use anyhow::Result;

use circuit_iam::identity::{
    hash_password, Credential, GroupRecord, Identity, IdentityStore, MemoryIdentityStore,
    UserRecord,
};

fn seeded_store() -> MemoryIdentityStore {
    let groups = vec![
        GroupRecord {
            name: "default".into(),
            description: "Baseline access".into(),
        },
        GroupRecord {
            name: "administrator".into(),
            description: "Administrative access".into(),
        },
    ];
    let users = vec![UserRecord {
        id: "1".into(),
        username: "administrator".into(),
        password: hash_password("administrator"),
        name: "Administrator".into(),
        email: "admin@example.com".into(),
        groups: vec![groups[1].clone()],
        ..Default::default()
    }];
    MemoryIdentityStore::new(users, groups)
}

fn password_credential(username: &str, plaintext: &str) -> Credential {
    Credential::UsernamePassword {
        username: username.into(),
        password: hash_password(plaintext),
    }
}

#[tokio::test]
async fn lookup_resolves_identity_with_group_roles() -> Result<()> {
    let store = seeded_store();
    let ident = store
        .lookup_identity(&password_credential("administrator", "administrator"))
        .await?;
    assert_eq!(ident.id, "1");
    assert_eq!(ident.username, "administrator");
    assert_eq!(ident.name, "Administrator");
    assert_eq!(ident.roles, vec!["administrator".to_string()]);
    Ok(())
}

#[tokio::test]
async fn lookup_rejects_wrong_password_and_unknown_user_alike() -> Result<()> {
    let store = seeded_store();
    let wrong_pw = store
        .lookup_identity(&password_credential("administrator", "nope"))
        .await
        .unwrap_err();
    let no_user = store
        .lookup_identity(&password_credential("ghost", "administrator"))
        .await
        .unwrap_err();
    assert_eq!(wrong_pw.code_str(), "credential_rejected");
    assert_eq!(no_user.code_str(), "credential_rejected");
    assert_eq!(wrong_pw, no_user, "rejection must not leak which check failed");
    Ok(())
}

#[tokio::test]
async fn lookup_rejects_unsupported_credential_shapes() -> Result<()> {
    let store = seeded_store();
    let err = store
        .lookup_identity(&Credential::Saml {
            assertion: "blob".into(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.code_str(), "credential_rejected");
    Ok(())
}

#[tokio::test]
async fn anonymous_identity_carries_the_baseline_role() -> Result<()> {
    let store = seeded_store();
    let anon = store.anonymous_identity().await;
    assert_eq!(anon.id, "0");
    assert_eq!(anon.username, "anonymous");
    assert_eq!(anon.roles, vec!["default".to_string()]);
    Ok(())
}

#[tokio::test]
async fn get_user_paths_and_not_found() -> Result<()> {
    let store = seeded_store();
    let user = store.get_user("administrator").await?;
    assert_eq!(user.id, "1");

    let ident = Identity {
        username: "administrator".into(),
        ..Default::default()
    };
    let via_ident = store.get_user_for_identity(&ident).await?;
    assert_eq!(via_ident.username, user.username);

    let err = store.get_user("nobody").await.unwrap_err();
    assert_eq!(err.code_str(), "not_found");
    Ok(())
}

#[tokio::test]
async fn create_confirm_and_enumerate_users() -> Result<()> {
    let store = seeded_store();
    let alice = UserRecord {
        id: "2".into(),
        username: "alice".into(),
        password: hash_password("s3cr3t!"),
        name: "Alice".into(),
        ..Default::default()
    };
    let created = store.create_user(alice.clone()).await?;
    let confirmed = store.confirm_user(created).await?;
    assert_eq!(confirmed.username, "alice");

    let users = store.list_users().await;
    assert_eq!(users.len(), 2);
    assert!(users.iter().any(|u| u.username == "alice"));
    Ok(())
}

#[tokio::test]
async fn group_crud_and_membership_queries() -> Result<()> {
    let store = seeded_store();
    store
        .create_group(GroupRecord {
            name: "auditors".into(),
            description: "Read-only oversight".into(),
        })
        .await?;
    assert_eq!(store.get_groups().await.len(), 3);

    let admin = store.get_user("administrator").await?;
    let updated = store.add_user_to_group(&admin, "auditors").await?;
    assert!(updated.groups.iter().any(|g| g.name == "auditors"));

    // The membership must be visible on a fresh read, not just the
    // returned copy.
    let reread = store.get_user("administrator").await?;
    assert_eq!(store.get_user_groups(&reread).await.len(), 2);

    let auditors = GroupRecord {
        name: "auditors".into(),
        description: String::new(),
    };
    let members = store.get_users_in_group(&auditors).await;
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].username, "administrator");
    Ok(())
}

#[tokio::test]
async fn add_user_to_unknown_group_fails() -> Result<()> {
    let store = seeded_store();
    let admin = store.get_user("administrator").await?;
    let err = store.add_user_to_group(&admin, "no-such-group").await.unwrap_err();
    assert_eq!(err.code_str(), "not_found");
    Ok(())
}

#[tokio::test]
async fn change_password_replaces_the_digest() -> Result<()> {
    let store = seeded_store();
    let ident = Identity {
        username: "administrator".into(),
        ..Default::default()
    };
    store
        .change_password(&ident, "administrator", "hunter2")
        .await?;

    // Old credential no longer matches, new one does.
    assert!(store
        .lookup_identity(&password_credential("administrator", "administrator"))
        .await
        .is_err());
    assert!(store
        .lookup_identity(&password_credential("administrator", "hunter2"))
        .await
        .is_ok());
    Ok(())
}

#[tokio::test]
async fn change_password_rejects_wrong_current_password() -> Result<()> {
    let store = seeded_store();
    let ident = Identity {
        username: "administrator".into(),
        ..Default::default()
    };
    let err = store
        .change_password(&ident, "wrong", "hunter2")
        .await
        .unwrap_err();
    assert_eq!(err.code_str(), "invalid_credential");

    // Stored digest untouched.
    assert!(store
        .lookup_identity(&password_credential("administrator", "administrator"))
        .await
        .is_ok());
    Ok(())
}

#[tokio::test]
async fn change_password_to_same_value_is_an_idempotent_no_op() -> Result<()> {
    let store = seeded_store();
    let ident = Identity {
        username: "administrator".into(),
        ..Default::default()
    };
    store
        .change_password(&ident, "administrator", "administrator")
        .await?;
    assert!(store
        .lookup_identity(&password_credential("administrator", "administrator"))
        .await
        .is_ok());
    Ok(())
}

#[tokio::test]
async fn digest_is_deterministic() -> Result<()> {
    assert_eq!(hash_password("administrator"), hash_password("administrator"));
    assert_eq!(
        hash_password("administrator"),
        "4194d1706ed1f408d5e02d672777019f4d5385c766a8c6ca8acba3167d36a7b9"
    );
    Ok(())
}
