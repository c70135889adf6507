//! Blacklist service: revoked-token markers.

use std::sync::Arc;

use cabinet_core::{Blacklist, BlacklistRecord, Error, Result};
use cabinet_storage::Datastore;
use tracing::info;

use crate::handler::Repo;

/// Revocation layer over the blacklists collection.
#[derive(Clone)]
pub struct BlacklistService {
    repo: Repo<BlacklistRecord>,
}

impl BlacklistService {
    /// Binds the service to `store`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOperation`] when the store does not serve the
    /// blacklists collection.
    pub fn new(store: &Arc<dyn Datastore>) -> Result<Self> {
        Ok(BlacklistService {
            repo: Repo::new(store)?,
        })
    }

    /// Records `token` as revoked.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for an empty token.
    pub async fn blacklist_token(&self, token: &str) -> Result<Blacklist> {
        if token.is_empty() {
            return Err(Error::validation("cannot blacklist an empty token"));
        }
        let marker = Blacklist {
            auth_token: token.to_string(),
            ..Blacklist::default()
        };
        let stored = self
            .repo
            .insert_one(BlacklistRecord::from_domain(&marker)?)
            .await?;
        let revoked = stored.to_domain();
        info!(marker_id = %revoked.id, "token blacklisted");
        Ok(revoked)
    }

    /// True when a marker for `token` exists. Lookup misses mean the token
    /// is clean; every other failure propagates.
    pub async fn is_blacklisted(&self, token: &str) -> Result<bool> {
        let probe = BlacklistRecord {
            auth_token: Some(token.to_string()),
            ..BlacklistRecord::default()
        };
        match self.repo.find_one(&probe).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }
}
