//! Account service: credential-bearing principals inside a group.
//!
//! Credential strings pass through this layer opaquely; hashing and token
//! mechanics live outside the access layer.

use std::sync::Arc;

use cabinet_core::{
    Account, AccountRecord, Error, GroupRecord, Result, StoreRecord, ValidationCase,
};
use cabinet_storage::Datastore;
use tracing::{info, warn};

use crate::handler::Repo;
use crate::routine::{OpKind, Routine};

/// Role written for administrative accounts.
pub const ROLE_ADMIN: &str = "admin";
/// Role written for ordinary accounts.
pub const ROLE_MEMBER: &str = "member";

/// Business-rule layer over the accounts collection.
#[derive(Clone)]
pub struct AccountService {
    repo: Repo<AccountRecord>,
    groups: Repo<GroupRecord>,
}

impl AccountService {
    /// Binds the service to `store`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOperation`] when the store does not serve the
    /// accounts or groups collection.
    pub fn new(store: &Arc<dyn Datastore>) -> Result<Self> {
        Ok(AccountService {
            repo: Repo::new(store)?,
            groups: Repo::new(store)?,
        })
    }

    /// Fans out the email-uniqueness probe and the group-reference lookup,
    /// joins both, then decides with fixed precedence: email collision
    /// first, then the group reference. `own_id` excludes the account being
    /// updated from the collision test.
    async fn validate_links(&self, email: &str, group_id: &str, own_id: &str) -> Result<()> {
        let mut email_probe = Routine::new(self.repo.clone());
        email_probe.dispatch(
            OpKind::FindOne,
            AccountRecord {
                email: Some(email.to_string()),
                ..AccountRecord::default()
            },
            None,
        )?;
        let mut group_probe = Routine::new(self.groups.clone());
        group_probe.dispatch(
            OpKind::FindOne,
            GroupRecord::from_domain(&cabinet_core::Group {
                id: group_id.to_string(),
                ..cabinet_core::Group::default()
            })?,
            None,
        )?;

        // join-all before deciding; completion order must not matter
        email_probe.resolve().await;
        group_probe.resolve().await;

        match email_probe.into_outcome() {
            Ok(existing) => {
                if existing.to_domain().id != own_id {
                    return Err(Error::duplicate_key("email"));
                }
            }
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }
        if let Err(e) = group_probe.into_outcome() {
            warn!(%group_id, error = %e, "account group reference did not resolve");
            return Err(Error::invalid_reference("invalid group reference"));
        }
        Ok(())
    }

    /// Creates an account after validating its links.
    ///
    /// The first account written to an empty store becomes the root admin;
    /// later accounts keep an explicit `admin` role and are otherwise
    /// demoted to `member`.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] for missing fields, [`Error::DuplicateKey`]
    /// when the email is in use, [`Error::InvalidReference`] when the group
    /// does not resolve.
    pub async fn create(&self, account: &Account) -> Result<Account> {
        account.validate(ValidationCase::Create)?;
        let mut candidate = account.clone();
        if self.repo.count(&AccountRecord::default()).await? == 0 {
            candidate.role = ROLE_ADMIN.to_string();
            candidate.root_admin = true;
        } else {
            if candidate.role != ROLE_ADMIN {
                candidate.role = ROLE_MEMBER.to_string();
            }
            candidate.root_admin = false;
        }
        self.validate_links(&candidate.email, &candidate.group_id, "")
            .await?;
        let stored = self
            .repo
            .insert_one(AccountRecord::from_domain(&candidate)?)
            .await?;
        let created = stored.to_domain();
        info!(account_id = %created.id, group_id = %created.group_id, "account created");
        Ok(created)
    }

    /// Fetches the single account matching `filter`.
    pub async fn find(&self, filter: &Account) -> Result<Account> {
        let record = self
            .repo
            .find_one(&AccountRecord::from_domain(filter)?)
            .await?;
        Ok(record.to_domain())
    }

    /// Fetches every account matching `filter`; an unpopulated filter lists
    /// all accounts.
    pub async fn find_many(&self, filter: &Account) -> Result<Vec<Account>> {
        let records = self
            .repo
            .find_many(&AccountRecord::from_domain(filter)?)
            .await?;
        Ok(records.iter().map(AccountRecord::to_domain).collect())
    }

    /// Merges `account`'s populated fields into the stored account, after
    /// re-validating links on the merged result.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] when neither id nor email identifies the
    /// account, plus the same link failures as [`AccountService::create`].
    pub async fn update(&self, account: &Account) -> Result<Account> {
        account.validate(ValidationCase::Update)?;
        let filter = account.build_filter()?;
        let current = self.find(&filter).await?;
        let mut merged = account.clone();
        merged.merge_existing(&current);
        self.validate_links(&merged.email, &merged.group_id, &current.id)
            .await?;
        let by_id = Account {
            id: current.id.clone(),
            ..Account::default()
        };
        let stored = self
            .repo
            .update_one(
                &AccountRecord::from_domain(&by_id)?,
                AccountRecord::from_domain(&merged)?,
            )
            .await?;
        let updated = stored.to_domain();
        info!(account_id = %current.id, "account updated");
        Ok(updated)
    }

    /// Removes the account matching `filter` and returns it.
    pub async fn delete(&self, filter: &Account) -> Result<Account> {
        let removed = self
            .repo
            .delete_one(&AccountRecord::from_domain(filter)?)
            .await?;
        let gone = removed.to_domain();
        info!(account_id = %gone.id, "account deleted");
        Ok(gone)
    }

    /// Removes every account matching `filter`, returning the removed count.
    pub async fn delete_many(&self, filter: &Account) -> Result<u64> {
        self.repo
            .delete_many(&AccountRecord::from_domain(filter)?)
            .await
    }

    /// Direct insert for bootstrap paths: skips the business-rule checks
    /// but still stamps timestamps and assigns an identity.
    pub async fn doc_insert(&self, account: &Account) -> Result<Account> {
        let stored = self
            .repo
            .insert_one(AccountRecord::from_domain(account)?)
            .await?;
        Ok(stored.to_domain())
    }
}
