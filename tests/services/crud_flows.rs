//! Cross-service CRUD chains over one shared store.

use cabinet::{
    Account, AccountService, BlacklistService, Error, File, FileService, Group, GroupService,
    OwnerKind, Task, TaskService, TaskStatus,
};

use crate::common;

#[tokio::test]
async fn group_account_task_lifecycle() {
    let store = common::empty_store();
    let groups = GroupService::new(&store).unwrap();
    let accounts = AccountService::new(&store).unwrap();
    let tasks = TaskService::new(&store).unwrap();

    let eng = groups
        .create(&Group {
            name: "eng".into(),
            ..Group::default()
        })
        .await
        .unwrap();

    let u1 = accounts
        .create(&Account {
            username: "u1".into(),
            password: "hashed-credential".into(),
            email: "u1@example.com".into(),
            group_id: eng.id.clone(),
            ..Account::default()
        })
        .await
        .unwrap();

    let ship = tasks
        .create(&Task {
            name: "ship".into(),
            account_id: u1.id.clone(),
            group_id: eng.id.clone(),
            due: Some(chrono::Utc::now() + chrono::Duration::days(1)),
            ..Task::default()
        })
        .await
        .unwrap();

    // a second group may not reuse the name, even with a fresh identity
    let err = groups
        .create(&Group {
            name: "eng".into(),
            ..Group::default()
        })
        .await
        .unwrap_err();
    assert_eq!(err, Error::duplicate_key("name"));

    // a status-only update leaves every other field in place
    tasks
        .update(&Task {
            id: ship.id.clone(),
            status: Some(TaskStatus::Done),
            ..Task::default()
        })
        .await
        .unwrap();
    let done = tasks
        .find(&Task {
            id: ship.id.clone(),
            ..Task::default()
        })
        .await
        .unwrap();
    assert_eq!(done.status, Some(TaskStatus::Done));
    assert_eq!(done.name, "ship");
    assert_eq!(done.account_id, u1.id);
    assert_eq!(done.group_id, eng.id);

    // deleting the task ends its lifecycle; re-reads miss
    let removed = tasks
        .delete(&Task {
            id: ship.id.clone(),
            ..Task::default()
        })
        .await
        .unwrap();
    assert_eq!(removed.name, "ship");
    assert!(tasks
        .find(&Task {
            id: ship.id,
            ..Task::default()
        })
        .await
        .unwrap_err()
        .is_not_found());
}

#[tokio::test]
async fn seeded_fixture_lists_scope_correctly() {
    let seeded = common::seeded_store().await;
    let accounts = AccountService::new(&seeded.store).unwrap();
    let tasks = TaskService::new(&seeded.store).unwrap();

    let engineering = accounts
        .find_many(&Account {
            group_id: seeded.groups[0].id.clone(),
            ..Account::default()
        })
        .await
        .unwrap();
    assert_eq!(engineering.len(), 2);

    let sales = accounts
        .find_many(&Account {
            group_id: seeded.groups[1].id.clone(),
            ..Account::default()
        })
        .await
        .unwrap();
    assert_eq!(sales.len(), 1);
    assert_eq!(sales[0].username, "carol");

    let alices = tasks
        .find_many(&Task {
            account_id: seeded.accounts[0].id.clone(),
            ..Task::default()
        })
        .await
        .unwrap();
    assert_eq!(alices.len(), 2);
}

#[tokio::test]
async fn seeded_tokens_are_revoked_and_others_are_clean() {
    let seeded = common::seeded_store().await;
    let blacklist = BlacklistService::new(&seeded.store).unwrap();

    for token in &seeded.tokens {
        assert!(blacklist.is_blacklisted(token).await.unwrap());
    }
    assert!(!blacklist.is_blacklisted("still-valid-token").await.unwrap());
}

#[tokio::test]
async fn deleting_an_account_orphans_new_task_creation() {
    let seeded = common::seeded_store().await;
    let accounts = AccountService::new(&seeded.store).unwrap();
    let tasks = TaskService::new(&seeded.store).unwrap();

    let bob = &seeded.accounts[1];
    accounts
        .delete(&Account {
            id: bob.id.clone(),
            ..Account::default()
        })
        .await
        .unwrap();

    let err = tasks
        .create(&Task {
            name: "ghost work".into(),
            account_id: bob.id.clone(),
            group_id: seeded.groups[0].id.clone(),
            due: Some(chrono::Utc::now()),
            ..Task::default()
        })
        .await
        .unwrap_err();
    assert_eq!(err, Error::invalid_reference("invalid account reference"));
}

#[tokio::test]
async fn file_metadata_round_trip_over_a_seeded_store() {
    let seeded = common::seeded_store().await;
    let files = FileService::new(&seeded.store).unwrap();
    let alice = &seeded.accounts[0];

    let created = files
        .create(&File {
            owner_id: alice.id.clone(),
            owner_kind: Some(OwnerKind::Account),
            blob_id: bson::oid::ObjectId::new().to_hex(),
            name: "release-notes.md".into(),
            kind: "text/markdown".into(),
            size: Some(512),
            ..File::default()
        })
        .await
        .unwrap();
    assert_eq!(created.bucket, format!("account_{}_bucket", alice.id));

    // deletion hands back the blob reference for reaping
    let removed = files
        .delete(&File {
            id: created.id.clone(),
            ..File::default()
        })
        .await
        .unwrap();
    assert_eq!(removed.blob_id, created.blob_id);
    assert!(files
        .find(&File {
            id: created.id,
            ..File::default()
        })
        .await
        .unwrap_err()
        .is_not_found());
}
