//! Group service: membership scopes with unique names.

use std::sync::Arc;

use cabinet_core::{Error, Group, GroupRecord, Result, StoreRecord, ValidationCase};
use cabinet_storage::Datastore;
use tracing::info;

use crate::handler::Repo;

/// Business-rule layer over the groups collection.
#[derive(Clone)]
pub struct GroupService {
    repo: Repo<GroupRecord>,
}

impl GroupService {
    /// Binds the service to `store`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOperation`] when the store does not serve the
    /// groups collection.
    pub fn new(store: &Arc<dyn Datastore>) -> Result<Self> {
        Ok(GroupService {
            repo: Repo::new(store)?,
        })
    }

    /// Name-uniqueness pre-check. `own_id` excludes the group being updated
    /// from the collision test.
    async fn check_name_free(&self, name: &str, own_id: &str) -> Result<()> {
        let probe = GroupRecord {
            name: Some(name.to_string()),
            ..GroupRecord::default()
        };
        match self.repo.find_one(&probe).await {
            Ok(existing) => {
                if existing.to_domain().id == own_id {
                    Ok(())
                } else {
                    Err(Error::duplicate_key("name"))
                }
            }
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Creates a group after checking its name is unused.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] for a nameless group, [`Error::DuplicateKey`]
    /// when the name is taken.
    pub async fn create(&self, group: &Group) -> Result<Group> {
        group.validate(ValidationCase::Create)?;
        self.check_name_free(&group.name, "").await?;
        let stored = self
            .repo
            .insert_one(GroupRecord::from_domain(group)?)
            .await?;
        let created = stored.to_domain();
        info!(group_id = %created.id, name = %created.name, "group created");
        Ok(created)
    }

    /// Fetches the single group matching `filter`.
    pub async fn find(&self, filter: &Group) -> Result<Group> {
        let record = self.repo.find_one(&GroupRecord::from_domain(filter)?).await?;
        Ok(record.to_domain())
    }

    /// Fetches every group matching `filter`; an unpopulated filter lists
    /// all groups.
    pub async fn find_many(&self, filter: &Group) -> Result<Vec<Group>> {
        let records = self
            .repo
            .find_many(&GroupRecord::from_domain(filter)?)
            .await?;
        Ok(records.iter().map(GroupRecord::to_domain).collect())
    }

    /// Merges `group`'s populated fields into the stored group.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] when `group` carries no identity,
    /// [`Error::DuplicateKey`] when a renamed group collides with another
    /// group's name.
    pub async fn update(&self, group: &Group) -> Result<Group> {
        group.validate(ValidationCase::Update)?;
        let by_id = Group {
            id: group.id.clone(),
            ..Group::default()
        };
        let current = self.find(&by_id).await?;
        let mut merged = group.clone();
        merged.merge_existing(&current);
        if merged.name != current.name {
            self.check_name_free(&merged.name, &merged.id).await?;
        }
        let stored = self
            .repo
            .update_one(
                &GroupRecord::from_domain(&by_id)?,
                GroupRecord::from_domain(&merged)?,
            )
            .await?;
        let updated = stored.to_domain();
        info!(group_id = %updated.id, "group updated");
        Ok(updated)
    }

    /// Removes the group matching `filter` and returns it.
    pub async fn delete(&self, filter: &Group) -> Result<Group> {
        let removed = self
            .repo
            .delete_one(&GroupRecord::from_domain(filter)?)
            .await?;
        let gone = removed.to_domain();
        info!(group_id = %gone.id, "group deleted");
        Ok(gone)
    }

    /// Removes every group matching `filter`, returning the removed count.
    pub async fn delete_many(&self, filter: &Group) -> Result<u64> {
        self.repo
            .delete_many(&GroupRecord::from_domain(filter)?)
            .await
    }

    /// Number of groups in the collection.
    pub async fn count(&self) -> Result<u64> {
        self.repo.count(&GroupRecord::default()).await
    }

    /// Direct insert for bootstrap paths: skips the business-rule checks
    /// but still stamps timestamps and assigns an identity.
    pub async fn doc_insert(&self, group: &Group) -> Result<Group> {
        let stored = self
            .repo
            .insert_one(GroupRecord::from_domain(group)?)
            .await?;
        Ok(stored.to_domain())
    }
}
