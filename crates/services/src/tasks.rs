//! Task service: work items whose account and group references must agree.

use std::sync::Arc;

use cabinet_core::{
    Account, AccountRecord, Error, Group, GroupRecord, Result, StoreRecord, Task, TaskRecord,
    ValidationCase,
};
use cabinet_storage::Datastore;
use tracing::{info, warn};

use crate::handler::Repo;
use crate::routine::{OpKind, Routine};

/// Business-rule layer over the tasks collection.
#[derive(Clone)]
pub struct TaskService {
    repo: Repo<TaskRecord>,
    accounts: Repo<AccountRecord>,
    groups: Repo<GroupRecord>,
}

impl TaskService {
    /// Binds the service to `store`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOperation`] when the store does not serve the
    /// tasks, accounts or groups collection.
    pub fn new(store: &Arc<dyn Datastore>) -> Result<Self> {
        Ok(TaskService {
            repo: Repo::new(store)?,
            accounts: Repo::new(store)?,
            groups: Repo::new(store)?,
        })
    }

    /// Fans out the group and account existence lookups, joins both, then
    /// decides with fixed precedence: group reference, account reference,
    /// and finally the cross-field scope check (the account must belong to
    /// the referenced group).
    async fn validate_links(&self, account_id: &str, group_id: &str) -> Result<()> {
        let mut group_probe = Routine::new(self.groups.clone());
        group_probe.dispatch(
            OpKind::FindOne,
            GroupRecord::from_domain(&Group {
                id: group_id.to_string(),
                ..Group::default()
            })?,
            None,
        )?;
        let mut account_probe = Routine::new(self.accounts.clone());
        account_probe.dispatch(
            OpKind::FindOne,
            AccountRecord::from_domain(&Account {
                id: account_id.to_string(),
                ..Account::default()
            })?,
            None,
        )?;

        // join-all before deciding; completion order must not matter
        group_probe.resolve().await;
        account_probe.resolve().await;

        let group = match group_probe.into_outcome() {
            Ok(record) => record.to_domain(),
            Err(e) => {
                warn!(%group_id, error = %e, "task group reference did not resolve");
                return Err(Error::invalid_reference("invalid group reference"));
            }
        };
        let account = match account_probe.into_outcome() {
            Ok(record) => record.to_domain(),
            Err(e) => {
                warn!(%account_id, error = %e, "task account reference did not resolve");
                return Err(Error::invalid_reference("invalid account reference"));
            }
        };
        if account.group_id != group.id {
            return Err(Error::scope_mismatch("account is not in the task's group"));
        }
        Ok(())
    }

    /// Creates a task after validating its references.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] for missing fields, [`Error::InvalidReference`]
    /// when a reference does not resolve, [`Error::ScopeMismatch`] when the
    /// account is not in the referenced group.
    pub async fn create(&self, task: &Task) -> Result<Task> {
        task.validate(ValidationCase::Create)?;
        self.validate_links(&task.account_id, &task.group_id).await?;
        let stored = self.repo.insert_one(TaskRecord::from_domain(task)?).await?;
        let created = stored.to_domain();
        info!(task_id = %created.id, account_id = %created.account_id, "task created");
        Ok(created)
    }

    /// Fetches the single task matching `filter`.
    pub async fn find(&self, filter: &Task) -> Result<Task> {
        let record = self.repo.find_one(&TaskRecord::from_domain(filter)?).await?;
        Ok(record.to_domain())
    }

    /// Fetches every task matching `filter`; an unpopulated filter lists
    /// all tasks.
    pub async fn find_many(&self, filter: &Task) -> Result<Vec<Task>> {
        let records = self
            .repo
            .find_many(&TaskRecord::from_domain(filter)?)
            .await?;
        Ok(records.iter().map(TaskRecord::to_domain).collect())
    }

    /// Merges `task`'s populated fields into the stored task, re-validating
    /// the references on the merged result.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] when `task` carries no identity, plus the same
    /// link failures as [`TaskService::create`].
    pub async fn update(&self, task: &Task) -> Result<Task> {
        task.validate(ValidationCase::Update)?;
        let by_id = Task {
            id: task.id.clone(),
            ..Task::default()
        };
        let current = self.find(&by_id).await?;
        let mut merged = task.clone();
        merged.merge_existing(&current);
        self.validate_links(&merged.account_id, &merged.group_id)
            .await?;
        let stored = self
            .repo
            .update_one(
                &TaskRecord::from_domain(&by_id)?,
                TaskRecord::from_domain(&merged)?,
            )
            .await?;
        let updated = stored.to_domain();
        info!(task_id = %current.id, "task updated");
        Ok(updated)
    }

    /// Removes the task matching `filter` and returns it.
    pub async fn delete(&self, filter: &Task) -> Result<Task> {
        let removed = self
            .repo
            .delete_one(&TaskRecord::from_domain(filter)?)
            .await?;
        let gone = removed.to_domain();
        info!(task_id = %gone.id, "task deleted");
        Ok(gone)
    }

    /// Removes every task matching `filter`, returning the removed count.
    pub async fn delete_many(&self, filter: &Task) -> Result<u64> {
        self.repo
            .delete_many(&TaskRecord::from_domain(filter)?)
            .await
    }

    /// Direct insert for bootstrap paths: skips the business-rule checks
    /// but still stamps timestamps and assigns an identity.
    pub async fn doc_insert(&self, task: &Task) -> Result<Task> {
        let stored = self.repo.insert_one(TaskRecord::from_domain(task)?).await?;
        Ok(stored.to_domain())
    }
}
