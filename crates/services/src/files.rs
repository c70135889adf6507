//! File service: blob metadata owned by an account or a group.
//!
//! Only metadata is managed here. The caller stores the bytes in the
//! external blob layer first and hands the resulting `blob_id` in;
//! deletion returns the removed metadata so the caller can reap the blob.

use std::sync::Arc;

use cabinet_core::{
    Account, AccountRecord, Error, File, FileRecord, Group, GroupRecord, OwnerKind, Result,
    ValidationCase,
};
use cabinet_storage::Datastore;
use tracing::{info, warn};

use crate::handler::Repo;

/// Metadata layer over the files collection.
#[derive(Clone)]
pub struct FileService {
    repo: Repo<FileRecord>,
    accounts: Repo<AccountRecord>,
    groups: Repo<GroupRecord>,
}

impl FileService {
    /// Binds the service to `store`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOperation`] when the store does not serve the
    /// files, accounts or groups collection.
    pub fn new(store: &Arc<dyn Datastore>) -> Result<Self> {
        Ok(FileService {
            repo: Repo::new(store)?,
            accounts: Repo::new(store)?,
            groups: Repo::new(store)?,
        })
    }

    /// Resolves the owner reference in the collection its kind names.
    async fn validate_owner(&self, kind: Option<OwnerKind>, owner_id: &str) -> Result<()> {
        let outcome = match kind {
            Some(OwnerKind::Account) => self
                .accounts
                .find_one(&AccountRecord::from_domain(&Account {
                    id: owner_id.to_string(),
                    ..Account::default()
                })?)
                .await
                .map(|_| ()),
            Some(OwnerKind::Group) => self
                .groups
                .find_one(&GroupRecord::from_domain(&Group {
                    id: owner_id.to_string(),
                    ..Group::default()
                })?)
                .await
                .map(|_| ()),
            None => return Err(Error::validation("file is missing an owner kind")),
        };
        outcome.map_err(|e| {
            warn!(%owner_id, error = %e, "file owner reference did not resolve");
            Error::invalid_reference("invalid file owner")
        })
    }

    /// Creates file metadata after resolving its owner. The bucket name is
    /// derived from the owner; the blob must already exist.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] for missing fields or a missing blob
    /// reference, [`Error::InvalidReference`] when the owner does not
    /// resolve.
    pub async fn create(&self, file: &File) -> Result<File> {
        file.validate(ValidationCase::Create)?;
        if !file.has_blob_id() {
            return Err(Error::validation(
                "missing the following file fields: blob_id",
            ));
        }
        self.validate_owner(file.owner_kind, &file.owner_id).await?;
        let mut candidate = file.clone();
        candidate.build_bucket()?;
        let stored = self
            .repo
            .insert_one(FileRecord::from_domain(&candidate)?)
            .await?;
        let created = stored.to_domain();
        info!(file_id = %created.id, bucket = %created.bucket, "file metadata created");
        Ok(created)
    }

    /// Fetches the single file matching `filter`.
    ///
    /// # Errors
    ///
    /// [`Error::MalformedSelector`] when neither id, owner nor blob
    /// reference is populated.
    pub async fn find(&self, filter: &File) -> Result<File> {
        let narrowed = filter.build_filter()?;
        let record = self
            .repo
            .find_one(&FileRecord::from_domain(&narrowed)?)
            .await?;
        Ok(record.to_domain())
    }

    /// Fetches every file matching `filter`; an unpopulated filter lists
    /// all files.
    pub async fn find_many(&self, filter: &File) -> Result<Vec<File>> {
        let records = self
            .repo
            .find_many(&FileRecord::from_domain(filter)?)
            .await?;
        Ok(records.iter().map(FileRecord::to_domain).collect())
    }

    /// Merges `file`'s populated fields into the stored metadata. An update
    /// that re-homes the file re-validates the new owner.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] when `file` carries no identity, plus the same
    /// owner failures as [`FileService::create`].
    pub async fn update(&self, file: &File) -> Result<File> {
        file.validate(ValidationCase::Update)?;
        let by_id = File {
            id: file.id.clone(),
            ..File::default()
        };
        let current = self.find(&by_id).await?;
        let mut merged = file.clone();
        merged.merge_existing(&current);
        if merged.bucket != current.bucket {
            self.validate_owner(merged.owner_kind, &merged.owner_id)
                .await?;
        }
        let stored = self
            .repo
            .update_one(
                &FileRecord::from_domain(&by_id)?,
                FileRecord::from_domain(&merged)?,
            )
            .await?;
        let updated = stored.to_domain();
        info!(file_id = %current.id, "file metadata updated");
        Ok(updated)
    }

    /// Removes the file matching `filter` and returns its metadata, blob
    /// reference included.
    pub async fn delete(&self, filter: &File) -> Result<File> {
        let narrowed = filter.build_filter()?;
        let removed = self
            .repo
            .delete_one(&FileRecord::from_domain(&narrowed)?)
            .await?;
        let gone = removed.to_domain();
        info!(file_id = %gone.id, blob_id = %gone.blob_id, "file metadata deleted");
        Ok(gone)
    }

    /// Removes every file matching `filter`, returning the removed count.
    pub async fn delete_many(&self, filter: &File) -> Result<u64> {
        self.repo
            .delete_many(&FileRecord::from_domain(filter)?)
            .await
    }
}
