//! First-run seeding of the root group and root admin account.

use std::sync::Arc;

use cabinet_core::{Account, Group, Result};
use cabinet_storage::Datastore;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::accounts::AccountService;
use crate::groups::GroupService;

/// Seed values for the root group and account, passed explicitly at
/// bootstrap time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapConfig {
    /// Name of the root group.
    #[serde(default = "default_group_name")]
    pub group_name: String,
    /// Login name of the root admin.
    #[serde(default = "default_username")]
    pub username: String,
    /// Email of the root admin.
    #[serde(default = "default_email")]
    pub email: String,
    /// Opaque credential string for the root admin, hashed by the caller.
    pub password: String,
}

fn default_group_name() -> String {
    "root".to_string()
}

fn default_username() -> String {
    "admin".to_string()
}

fn default_email() -> String {
    "admin@localhost".to_string()
}

/// Seeds the root group and root admin account into an empty store.
///
/// A store that already holds any group is left untouched and `Ok(None)` is
/// returned, so running the seed on every start is safe. The seeded records
/// go through the regular services, so they are stamped, identified and
/// validated like any other write.
///
/// # Errors
///
/// Propagates service failures unchanged.
pub async fn seed_root(
    config: &BootstrapConfig,
    store: &Arc<dyn Datastore>,
) -> Result<Option<(Group, Account)>> {
    let groups = GroupService::new(store)?;
    if groups.count().await? > 0 {
        return Ok(None);
    }

    let group = groups
        .doc_insert(&Group {
            name: config.group_name.clone(),
            root_admin: true,
            ..Group::default()
        })
        .await?;

    let accounts = AccountService::new(store)?;
    let account = accounts
        .create(&Account {
            username: config.username.clone(),
            password: config.password.clone(),
            email: config.email.clone(),
            group_id: group.id.clone(),
            ..Account::default()
        })
        .await?;

    info!(group_id = %group.id, account_id = %account.id, "root group and admin seeded");
    Ok(Some((group, account)))
}
