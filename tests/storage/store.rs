//! Store-level semantics exercised through the `Datastore` seam, the way the
//! services see the backend. The per-collection contract (insert idempotency,
//! cursors, connection guards) is covered by the backend's own unit tests;
//! this module checks the behaviors that only show up across records and
//! under concurrency.

use bson::oid::ObjectId;
use bson::{doc, Document};
use cabinet::{AccountRecord, BlacklistRecord, Datastore, Error, GroupRecord, StoreRecord, TaskRecord};

use crate::common;

fn group_doc(name: &str) -> Document {
    let mut record = GroupRecord {
        name: Some(name.into()),
        ..GroupRecord::default()
    };
    record.assign_id();
    record.stamp(true);
    record.to_document().unwrap()
}

fn account_doc(email: &str, group_id: ObjectId) -> (ObjectId, Document) {
    let mut record = AccountRecord {
        username: Some("jsmith".into()),
        email: Some(email.into()),
        role: Some("member".into()),
        group_id: Some(group_id),
        ..AccountRecord::default()
    };
    record.assign_id();
    record.stamp(true);
    (StoreRecord::id(&record).unwrap(), record.to_document().unwrap())
}

#[tokio::test]
async fn identity_idempotency_does_not_cover_other_unique_fields() {
    let store = common::empty_store();
    let groups = store.collection("groups").unwrap();
    groups.insert_one(group_doc("engineering")).await.unwrap();
    // a fresh identity with a colliding name is accepted at store level;
    // name uniqueness is the services' pre-write check
    groups.insert_one(group_doc("engineering")).await.unwrap();
    assert_eq!(groups.count(Document::new()).await.unwrap(), 2);
}

#[tokio::test]
async fn the_highest_priority_populated_field_decides_a_match() {
    let store = common::empty_store();
    let accounts = store.collection("accounts").unwrap();
    let group_id = ObjectId::new();
    let (id, doc) = account_doc("a@example.com", group_id);
    accounts.insert_one(doc).await.unwrap();
    accounts
        .insert_one(account_doc("b@example.com", group_id).1)
        .await
        .unwrap();

    // id outranks the (wrong) email in the same filter
    let found = accounts
        .find_one(doc! { "_id": id, "email": "b@example.com" })
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.get_str("email").unwrap(), "a@example.com");

    // group reference matches both
    assert_eq!(
        accounts.count(doc! { "group_id": group_id }).await.unwrap(),
        2
    );
}

#[tokio::test]
async fn zero_identity_in_a_filter_is_treated_as_unset() {
    let store = common::empty_store();
    let accounts = store.collection("accounts").unwrap();
    let (_, doc) = account_doc("a@example.com", ObjectId::new());
    accounts.insert_one(doc).await.unwrap();

    let zeroed = doc! {
        "_id": ObjectId::from_bytes([0u8; 12]),
        "email": "a@example.com",
    };
    assert!(accounts.find_one(zeroed).await.unwrap().is_some());
}

#[tokio::test]
async fn updates_preserve_typed_fields_they_do_not_touch() {
    let store = common::empty_store();
    let tasks = store.collection("tasks").unwrap();
    let mut record = TaskRecord {
        name: Some("ship".into()),
        account_id: Some(ObjectId::new()),
        group_id: Some(ObjectId::new()),
        due: Some(bson::DateTime::now()),
        ..TaskRecord::default()
    };
    record.assign_id();
    record.stamp(true);
    let id = StoreRecord::id(&record).unwrap();
    tasks.insert_one(record.to_document().unwrap()).await.unwrap();

    tasks
        .update_one(doc! { "_id": id }, doc! { "$set": { "status": "done" } })
        .await
        .unwrap();

    let stored = tasks.find_one(doc! { "_id": id }).await.unwrap().unwrap();
    assert_eq!(stored.get_str("status").unwrap(), "done");
    assert_eq!(stored.get_str("name").unwrap(), "ship");
    assert!(stored.get_datetime("due").is_ok());
    assert!(stored.get_object_id("group_id").is_ok());
}

#[tokio::test]
async fn scan_walk_and_delete_a_token_collection() {
    let store = common::empty_store();
    let blacklists = store.collection("blacklists").unwrap();
    let mut first_id = None;
    for token in ["revoked-1", "revoked-2"] {
        let mut marker = BlacklistRecord {
            auth_token: Some(token.into()),
            ..BlacklistRecord::default()
        };
        marker.assign_id();
        marker.stamp(true);
        first_id.get_or_insert(StoreRecord::id(&marker).unwrap());
        blacklists
            .insert_one(marker.to_document().unwrap())
            .await
            .unwrap();
    }

    // an empty filter scans everything; the cursor is strictly single-pass
    let mut cursor = blacklists.find(Document::new()).await.unwrap();
    let mut seen = 0;
    while cursor.advance().await.unwrap() {
        seen += 1;
        cursor.current().unwrap();
    }
    assert_eq!(seen, 2);
    assert!(matches!(cursor.current(), Err(Error::Decode { .. })));
    cursor.close().await.unwrap();

    // a token filter matches, but removal resolves through the identity
    assert!(blacklists
        .find_one_and_delete(doc! { "auth_token": "revoked-1" })
        .await
        .unwrap()
        .is_none());
    let removed = blacklists
        .find_one_and_delete(doc! { "_id": first_id.unwrap() })
        .await
        .unwrap()
        .unwrap();
    assert_eq!(removed.get_str("auth_token").unwrap(), "revoked-1");
    assert_eq!(blacklists.count(Document::new()).await.unwrap(), 1);
}

#[tokio::test]
async fn collections_are_isolated_per_record_shape() {
    let store = common::empty_store();
    let groups = store.collection("groups").unwrap();
    let accounts = store.collection("accounts").unwrap();
    groups.insert_one(group_doc("engineering")).await.unwrap();

    assert_eq!(groups.count(Document::new()).await.unwrap(), 1);
    assert_eq!(accounts.count(Document::new()).await.unwrap(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_inserts_and_scans_stay_consistent() {
    let store = common::empty_store();
    let mut writers = Vec::new();
    for i in 0..8 {
        let collection = store.collection("groups").unwrap();
        writers.push(tokio::spawn(async move {
            for j in 0..25 {
                collection
                    .insert_one(group_doc(&format!("group-{i}-{j}")))
                    .await
                    .unwrap();
            }
        }));
    }
    let readers: Vec<_> = (0..4)
        .map(|_| {
            let collection = store.collection("groups").unwrap();
            tokio::spawn(async move {
                // scans during writes must observe a consistent snapshot
                for _ in 0..50 {
                    let count = collection.count(Document::new()).await.unwrap();
                    assert!(count <= 200);
                }
            })
        })
        .collect();

    for handle in writers.into_iter().chain(readers) {
        handle.await.unwrap();
    }
    let groups = store.collection("groups").unwrap();
    assert_eq!(groups.count(Document::new()).await.unwrap(), 200);
}
