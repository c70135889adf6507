//! Shared test utilities for the integration test suites.
//!
//! Import via `#[path = "../common/mod.rs"] mod common;` from any suite's
//! main.rs.

#![allow(dead_code)]

use std::sync::Arc;

use cabinet::{
    Account, AccountService, BlacklistService, Datastore, Group, GroupService, MemoryStore, Task,
    TaskService,
};
use once_cell::sync::Lazy;

static TRACING: Lazy<()> = Lazy::new(|| {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
});

/// Installs the test subscriber once per process.
pub fn init_tracing() {
    Lazy::force(&TRACING);
}

/// Fresh, empty in-memory datastore.
pub fn empty_store() -> Arc<dyn Datastore> {
    init_tracing();
    Arc::new(MemoryStore::new())
}

/// Deterministic seed data: three groups, three accounts, two tasks and two
/// blacklisted tokens, mirroring a small deployment.
pub struct Seeded {
    pub store: Arc<dyn Datastore>,
    pub groups: Vec<Group>,
    pub accounts: Vec<Account>,
    pub tasks: Vec<Task>,
    pub tokens: Vec<String>,
}

/// Builds the standard seeded store. Accounts 0 and 1 belong to group 0,
/// account 2 to group 1; both tasks belong to account 0 in group 0; group 2
/// is empty.
pub async fn seeded_store() -> Seeded {
    let store = empty_store();
    let group_svc = GroupService::new(&store).unwrap();
    let account_svc = AccountService::new(&store).unwrap();
    let task_svc = TaskService::new(&store).unwrap();
    let blacklist_svc = BlacklistService::new(&store).unwrap();

    let mut groups = Vec::new();
    for name in ["engineering", "sales", "archive"] {
        groups.push(
            group_svc
                .create(&Group {
                    name: name.into(),
                    ..Group::default()
                })
                .await
                .unwrap(),
        );
    }

    let mut accounts = Vec::new();
    for (username, email, group) in [
        ("alice", "alice@example.com", 0),
        ("bob", "bob@example.com", 0),
        ("carol", "carol@example.com", 1),
    ] {
        accounts.push(
            account_svc
                .create(&Account {
                    username: username.into(),
                    password: "hashed-credential".into(),
                    email: email.into(),
                    group_id: groups[group].id.clone(),
                    ..Account::default()
                })
                .await
                .unwrap(),
        );
    }

    let mut tasks = Vec::new();
    for name in ["ship the release", "write the postmortem"] {
        tasks.push(
            task_svc
                .create(&Task {
                    name: name.into(),
                    account_id: accounts[0].id.clone(),
                    group_id: groups[0].id.clone(),
                    due: Some(chrono::Utc::now() + chrono::Duration::days(7)),
                    ..Task::default()
                })
                .await
                .unwrap(),
        );
    }

    let tokens = vec!["revoked-token-1".to_string(), "revoked-token-2".to_string()];
    for token in &tokens {
        blacklist_svc.blacklist_token(token).await.unwrap();
    }

    Seeded {
        store,
        groups,
        accounts,
        tasks,
        tokens,
    }
}
