//! Generic-handler behavior observed from outside the crate: the ordering
//! between writes and validation, selector short-circuits, and stamping.

use bson::Document;
use cabinet::{Datastore, Error, GroupRecord, Repo, StoreRecord, TaskRecord};

use crate::common;

fn group(name: &str) -> GroupRecord {
    GroupRecord {
        name: Some(name.into()),
        ..GroupRecord::default()
    }
}

#[tokio::test]
async fn insert_validates_after_the_write_lands() {
    let store = common::empty_store();
    let repo: Repo<GroupRecord> = Repo::new(&store).unwrap();

    // a nameless group fails post-validation, but the write itself is not
    // rolled back
    let err = repo.insert_one(GroupRecord::default()).await.unwrap_err();
    assert!(matches!(err, Error::Validation { .. }));

    let raw = store.collection("groups").unwrap();
    assert_eq!(raw.count(Document::new()).await.unwrap(), 1);
}

#[tokio::test]
async fn empty_selectors_short_circuit_before_any_store_change() {
    let store = common::empty_store();
    let repo: Repo<GroupRecord> = Repo::new(&store).unwrap();
    let stored = repo.insert_one(group("engineering")).await.unwrap();

    let err = repo
        .update_one(&GroupRecord::default(), group("renamed"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::MalformedSelector { .. }));
    let err = repo.delete_one(&GroupRecord::default()).await.unwrap_err();
    assert!(matches!(err, Error::MalformedSelector { .. }));

    // a well-formed selector that matches nothing maps to NotFound instead
    let absent = GroupRecord {
        id: Some(bson::oid::ObjectId::new()),
        ..GroupRecord::default()
    };
    assert!(repo.find_one(&absent).await.unwrap_err().is_not_found());

    // the stored group is untouched
    let found = repo
        .find_one(&GroupRecord {
            id: StoreRecord::id(&stored),
            ..GroupRecord::default()
        })
        .await
        .unwrap();
    assert_eq!(found.name.as_deref(), Some("engineering"));
}

#[tokio::test]
async fn update_restamps_only_the_modification_time() {
    let store = common::empty_store();
    let repo: Repo<GroupRecord> = Repo::new(&store).unwrap();
    let stored = repo.insert_one(group("engineering")).await.unwrap();
    let created = stored.created_at.unwrap();

    let filter = GroupRecord {
        id: StoreRecord::id(&stored),
        ..GroupRecord::default()
    };
    repo.update_one(&filter, group("platform")).await.unwrap();

    let after = repo.find_one(&filter).await.unwrap();
    assert_eq!(after.created_at.unwrap(), created);
    assert!(after.last_modified.unwrap() >= created);
    assert_eq!(after.name.as_deref(), Some("platform"));
}

#[tokio::test]
async fn count_narrows_through_the_record_filter() {
    let store = common::empty_store();
    let groups: Repo<GroupRecord> = Repo::new(&store).unwrap();
    let engineering = groups.insert_one(group("engineering")).await.unwrap();
    let sales = groups.insert_one(group("sales")).await.unwrap();

    let tasks: Repo<TaskRecord> = Repo::new(&store).unwrap();
    for (name, group_id) in [
        ("ship", StoreRecord::id(&engineering)),
        ("review", StoreRecord::id(&engineering)),
        ("forecast", StoreRecord::id(&sales)),
    ] {
        tasks
            .insert_one(TaskRecord {
                name: Some(name.into()),
                account_id: Some(bson::oid::ObjectId::new()),
                group_id,
                due: Some(bson::DateTime::now()),
                ..TaskRecord::default()
            })
            .await
            .unwrap();
    }

    let in_engineering = TaskRecord {
        group_id: StoreRecord::id(&engineering),
        ..TaskRecord::default()
    };
    assert_eq!(tasks.count(&in_engineering).await.unwrap(), 2);
    assert_eq!(tasks.count(&TaskRecord::default()).await.unwrap(), 3);
    assert_eq!(tasks.find_many(&in_engineering).await.unwrap().len(), 2);
}

#[tokio::test]
async fn repos_share_one_store_without_interference() {
    let store = common::empty_store();
    let first: Repo<GroupRecord> = Repo::new(&store).unwrap();
    let second = first.clone();
    assert_eq!(first.collection_name(), "groups");

    first.insert_one(group("engineering")).await.unwrap();
    // the clone observes the same collection
    assert_eq!(second.count(&GroupRecord::default()).await.unwrap(), 1);
}
