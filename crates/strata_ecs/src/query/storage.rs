//! # Query Storage
//!
//! Per-combination cache of merge results.
//!
//! A storage remembers the summed structural version of the buffers it was
//! computed from. Versions only ever grow, so any attach or detach on any
//! participating buffer changes the sum and forces a recomputation; an
//! unchanged sum hands back the very same rows.

use super::merge::{pivot_merge, QueryRows};
use crate::entity::Entity;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use strata_shared::TypeIndex;

/// Cached merge result for one component-type combination.
pub struct QueryStorage {
    /// Participating types, ascending. Column `i` of the rows belongs to
    /// `types[i]`.
    types: Box<[TypeIndex]>,
    /// Version sum the rows were computed at; `None` before the first read.
    cached_version: Option<u64>,
    rows: Arc<QueryRows>,
    recomputations: u64,
}

impl QueryStorage {
    /// Creates an empty storage for `types` (ascending).
    #[must_use]
    pub fn new(types: Box<[TypeIndex]>) -> Self {
        Self {
            types,
            cached_version: None,
            rows: Arc::new(QueryRows::default()),
            recomputations: 0,
        }
    }

    /// Returns the rows for `columns` observed at `version_sum`.
    ///
    /// `columns` must be ordered like [`types`](Self::types) and the caller
    /// must hold shared locks on every buffer they come from.
    pub fn rows(&mut self, version_sum: u64, columns: &[&[Entity]]) -> Arc<QueryRows> {
        if self.cached_version != Some(version_sum) {
            self.rows = Arc::new(pivot_merge(columns));
            self.cached_version = Some(version_sum);
            self.recomputations += 1;
            tracing::trace!(
                types = ?self.types,
                version_sum,
                matched = self.rows.len(),
                "query cache recomputed"
            );
        }
        Arc::clone(&self.rows)
    }

    /// Returns the participating types in cache-key order.
    #[must_use]
    pub fn types(&self) -> &[TypeIndex] {
        &self.types
    }

    /// Returns the version sum of the cached rows.
    #[must_use]
    pub const fn cached_version(&self) -> Option<u64> {
        self.cached_version
    }

    /// Returns how many times the merge has run.
    #[must_use]
    pub const fn recomputations(&self) -> u64 {
        self.recomputations
    }
}

/// Lazily created cache of [`QueryStorage`] instances keyed by type
/// combination.
///
/// The key is the ascending set of participating types, so declaration
/// order never splits a cache.
#[derive(Default)]
pub struct QueryRegister {
    storages: Mutex<HashMap<Box<[TypeIndex]>, Arc<Mutex<QueryStorage>>>>,
}

impl QueryRegister {
    /// Creates an empty register.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the storage for the ascending type set `key`, creating it on
    /// first use.
    #[must_use]
    pub fn storage(&self, key: &[TypeIndex]) -> Arc<Mutex<QueryStorage>> {
        let mut storages = self.storages.lock();
        if let Some(storage) = storages.get(key) {
            return Arc::clone(storage);
        }

        tracing::debug!(types = ?key, "creating query storage");
        let boxed: Box<[TypeIndex]> = key.into();
        let storage = Arc::new(Mutex::new(QueryStorage::new(boxed.clone())));
        storages.insert(boxed, Arc::clone(&storage));
        storage
    }

    /// Returns the number of distinct combinations cached so far.
    #[must_use]
    pub fn storage_count(&self) -> usize {
        self.storages.lock().len()
    }
}
