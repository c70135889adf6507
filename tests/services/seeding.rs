//! First-run seeding through the public surface.

use cabinet::{
    seed_root, Account, AccountService, BootstrapConfig, Error, Group, GroupService,
    ROLE_ADMIN, ROLE_MEMBER,
};

use crate::common;

fn config() -> BootstrapConfig {
    BootstrapConfig {
        group_name: "root".into(),
        username: "admin".into(),
        email: "admin@example.com".into(),
        password: "hashed-credential".into(),
    }
}

#[tokio::test]
async fn seeding_then_normal_operation() {
    let store = common::empty_store();
    let (group, admin) = seed_root(&config(), &store).await.unwrap().unwrap();
    assert!(group.root_admin);
    assert!(admin.root_admin);
    assert_eq!(admin.role, ROLE_ADMIN);
    assert_eq!(admin.group_id, group.id);

    // accounts created after the seed are plain members
    let accounts = AccountService::new(&store).unwrap();
    let member = accounts
        .create(&Account {
            username: "jsmith".into(),
            password: "hashed-credential".into(),
            email: "jsmith@example.com".into(),
            group_id: group.id.clone(),
            ..Account::default()
        })
        .await
        .unwrap();
    assert!(!member.root_admin);
    assert_eq!(member.role, ROLE_MEMBER);

    // the root group name is now taken like any other
    let groups = GroupService::new(&store).unwrap();
    let err = groups
        .create(&Group {
            name: "root".into(),
            ..Group::default()
        })
        .await
        .unwrap_err();
    assert_eq!(err, Error::duplicate_key("name"));
}

#[tokio::test]
async fn repeated_seeding_is_idempotent() {
    let store = common::empty_store();
    assert!(seed_root(&config(), &store).await.unwrap().is_some());
    assert!(seed_root(&config(), &store).await.unwrap().is_none());

    let groups = GroupService::new(&store).unwrap();
    assert_eq!(groups.count().await.unwrap(), 1);
    let accounts = AccountService::new(&store).unwrap();
    assert_eq!(
        accounts.find_many(&Account::default()).await.unwrap().len(),
        1
    );
}

#[tokio::test]
async fn a_populated_store_is_never_reseeded() {
    let seeded = common::seeded_store().await;
    assert!(seed_root(&config(), &seeded.store).await.unwrap().is_none());

    // alice keeps the root-admin slot she earned as the first account
    let accounts = AccountService::new(&seeded.store).unwrap();
    let alice = accounts
        .find(&Account {
            id: seeded.accounts[0].id.clone(),
            ..Account::default()
        })
        .await
        .unwrap();
    assert!(alice.root_admin);
}
