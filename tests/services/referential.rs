//! Concurrent referential checks and their fixed error precedence.
//!
//! The services fan their reference lookups out as parallel routines and
//! join all of them before deciding, so the reported error must not depend
//! on which lookup finishes first. The multi-threaded runtime plus repeated
//! rounds here give the scheduler room to reorder completions.

use bson::oid::ObjectId;
use cabinet::{Account, AccountService, Error, Task, TaskService};

use crate::common;

const ROUNDS: usize = 20;

fn stray_id() -> String {
    ObjectId::new().to_hex()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn duplicate_email_outranks_a_bad_group_reference() {
    let seeded = common::seeded_store().await;
    let accounts = AccountService::new(&seeded.store).unwrap();

    for _ in 0..ROUNDS {
        // both probes fail: alice's email is taken and the group is unknown
        let err = accounts
            .create(&Account {
                username: "impostor".into(),
                password: "hashed-credential".into(),
                email: seeded.accounts[0].email.clone(),
                group_id: stray_id(),
                ..Account::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err, Error::duplicate_key("email"));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn a_bad_group_reference_alone_is_reported_as_such() {
    let seeded = common::seeded_store().await;
    let accounts = AccountService::new(&seeded.store).unwrap();

    for round in 0..ROUNDS {
        let err = accounts
            .create(&Account {
                username: "newcomer".into(),
                password: "hashed-credential".into(),
                email: format!("newcomer-{round}@example.com"),
                group_id: stray_id(),
                ..Account::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err, Error::invalid_reference("invalid group reference"));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn task_group_errors_outrank_account_errors() {
    let seeded = common::seeded_store().await;
    let tasks = TaskService::new(&seeded.store).unwrap();

    for _ in 0..ROUNDS {
        // both references are unknown; the group error must win every time
        let err = tasks
            .create(&Task {
                name: "orphan work".into(),
                account_id: stray_id(),
                group_id: stray_id(),
                due: Some(chrono::Utc::now()),
                ..Task::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err, Error::invalid_reference("invalid group reference"));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn cross_group_tasks_are_a_scope_mismatch() {
    let seeded = common::seeded_store().await;
    let tasks = TaskService::new(&seeded.store).unwrap();

    // carol is in sales; the task claims engineering
    let err = tasks
        .create(&Task {
            name: "borrowed work".into(),
            account_id: seeded.accounts[2].id.clone(),
            group_id: seeded.groups[0].id.clone(),
            due: Some(chrono::Utc::now()),
            ..Task::default()
        })
        .await
        .unwrap_err();
    assert_eq!(
        err,
        Error::scope_mismatch("account is not in the task's group")
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn parallel_creations_agree_on_uniqueness() {
    let seeded = common::seeded_store().await;

    // many writers race on the same email; exactly one may win
    let mut handles = Vec::new();
    for i in 0..8 {
        let accounts = AccountService::new(&seeded.store).unwrap();
        let group_id = seeded.groups[2].id.clone();
        handles.push(tokio::spawn(async move {
            accounts
                .create(&Account {
                    username: format!("racer-{i}"),
                    password: "hashed-credential".into(),
                    email: "contested@example.com".into(),
                    group_id,
                    ..Account::default()
                })
                .await
        }));
    }

    let mut wins = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => wins += 1,
            Err(e) => assert_eq!(e, Error::duplicate_key("email")),
        }
    }
    assert!(wins >= 1);

    let accounts = AccountService::new(&seeded.store).unwrap();
    let contested = accounts
        .find(&Account {
            email: "contested@example.com".into(),
            ..Account::default()
        })
        .await
        .unwrap();
    assert_eq!(contested.email, "contested@example.com");
}
