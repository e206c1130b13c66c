//! Registry of known individuals.
//!
//! The registry is an explicitly owned object, usually shared behind an
//! `Arc` by the sessions of one farm/project. Reads may run concurrently
//! with each other; writes lock only the shard holding the written id, so
//! two registrations of the same id never interleave while registrations of
//! different ids proceed independently.

use crate::{error::HerdTrackError, rect::Rect};
use dashmap::{mapref::entry::Entry, DashMap};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    sync::atomic::{AtomicU64, Ordering},
};

/// Free-form key/value metadata (code, name, breed, ...).
pub type Metadata = BTreeMap<String, String>;

/// One known individual.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityEntry {
    pub identity_id: String,
    /// `None` while the individual is known only by its metadata.
    pub embedding: Option<Vec<f32>>,
    pub metadata: Metadata,
    pub last_rect: Option<Rect>,
}

#[derive(Debug, Default)]
pub struct IdentityRegistry {
    entries: DashMap<String, IdentityEntry>,
    embedding_dim: Option<usize>,
    counter: AtomicU64,
}

impl IdentityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry that rejects embeddings whose length differs from `dim`.
    pub fn with_embedding_dim(dim: usize) -> Self {
        Self {
            embedding_dim: Some(dim),
            ..Self::default()
        }
    }

    /// Insert or overwrite an identity. Last write wins.
    pub fn register(
        &self,
        identity_id: impl Into<String>,
        embedding: Option<Vec<f32>>,
        metadata: Metadata,
        last_rect: Option<Rect>,
    ) -> Result<(), HerdTrackError> {
        if let Some(embedding) = &embedding {
            self.check_dim(embedding)?;
        }

        let identity_id = identity_id.into();
        log::debug!(
            "register identity {} (embedding: {})",
            identity_id,
            embedding.is_some()
        );
        self.entries.insert(
            identity_id.clone(),
            IdentityEntry {
                identity_id,
                embedding,
                metadata,
                last_rect,
            },
        );
        Ok(())
    }

    /// Register an individual nobody has named yet and return the generated id.
    ///
    /// The id is claimed and filled under the same shard lock, so an explicit
    /// `register` of an id like `ANIMAL007` is never overwritten.
    pub fn register_new(
        &self,
        embedding: Vec<f32>,
        last_rect: Option<Rect>,
    ) -> Result<String, HerdTrackError> {
        self.check_dim(&embedding)?;
        loop {
            let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
            let identity_id = format!("ANIMAL{:03}", n);
            match self.entries.entry(identity_id.clone()) {
                Entry::Occupied(_) => continue,
                Entry::Vacant(vacant) => {
                    let mut metadata = Metadata::new();
                    metadata.insert("code".to_string(), identity_id.clone());
                    vacant.insert(IdentityEntry {
                        identity_id: identity_id.clone(),
                        embedding: Some(embedding),
                        metadata,
                        last_rect,
                    });
                    log::debug!("register new identity {}", identity_id);
                    return Ok(identity_id);
                }
            }
        }
    }

    /// Replace the metadata of a known identity, keeping its embedding.
    /// Returns false when the id is unknown.
    pub fn update_metadata(&self, identity_id: &str, metadata: Metadata) -> bool {
        match self.entries.get_mut(identity_id) {
            Some(mut entry) => {
                entry.metadata = metadata;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, identity_id: &str) -> Option<IdentityEntry> {
        self.entries.get(identity_id).map(|entry| entry.clone())
    }

    pub fn metadata(&self, identity_id: &str) -> Option<Metadata> {
        self.entries
            .get(identity_id)
            .map(|entry| entry.metadata.clone())
    }

    pub fn contains(&self, identity_id: &str) -> bool {
        self.entries.contains_key(identity_id)
    }

    pub fn remove(&self, identity_id: &str) -> Option<IdentityEntry> {
        self.entries.remove(identity_id).map(|(_, entry)| entry)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All registered ids, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> =
            self.entries.iter().map(|entry| entry.key().clone()).collect();
        ids.sort();
        ids
    }

    fn check_dim(&self, embedding: &[f32]) -> Result<(), HerdTrackError> {
        match self.embedding_dim {
            Some(expected) if embedding.len() != expected => {
                Err(HerdTrackError::DimensionMismatch {
                    expected,
                    actual: embedding.len(),
                })
            }
            _ => Ok(()),
        }
    }

    /// Visit every entry that has an embedding. Order is unspecified.
    pub(crate) fn for_each_embedding<F>(&self, mut f: F)
    where
        F: FnMut(&IdentityEntry, &[f32]),
    {
        for entry in self.entries.iter() {
            if let Some(embedding) = entry.embedding.as_deref() {
                f(entry.value(), embedding);
            }
        }
    }
}
