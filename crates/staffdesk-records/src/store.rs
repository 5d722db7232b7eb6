//! In-memory record store
//!
//! One store holds the canonical list of a single entity kind, in display
//! order, keyed by id. [`StoreHandle`] is the shared, injectable container the
//! view, the transition engine and the form controller all hold.

use indexmap::IndexMap;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use staffdesk_core::{Error, Record, RecordId, Result};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Ordered collection of records with unique ids
#[derive(Debug, Clone)]
pub struct RecordStore<R: Record> {
    records: IndexMap<RecordId, R>,
}

impl<R: Record> Default for RecordStore<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Record> RecordStore<R> {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: IndexMap::new(),
        }
    }

    /// Overwrite the whole collection
    ///
    /// If `records` repeats an id the later record wins and keeps the earlier
    /// position. Records that break an entity invariant are skipped.
    pub fn replace_all(&mut self, records: impl IntoIterator<Item = R>) {
        self.records.clear();
        for record in records {
            if let Err(err) = record.check_invariants() {
                warn!(kind = R::KIND, id = %record.id(), error = %err, "Skipping invalid record");
                continue;
            }
            self.records.insert(record.id().clone(), record);
        }
        debug!(kind = R::KIND, count = self.records.len(), "Replaced store contents");
    }

    /// Append a record
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateId`] if the id is present, or a validation
    /// error if the record breaks an entity invariant.
    pub fn insert(&mut self, record: R) -> Result<()> {
        self.check_insertable(&record)?;
        trace!(kind = R::KIND, id = %record.id(), "Appending record");
        self.records.insert(record.id().clone(), record);
        Ok(())
    }

    /// Prepend a record
    ///
    /// # Errors
    ///
    /// Same as [`RecordStore::insert`].
    pub fn insert_front(&mut self, record: R) -> Result<()> {
        self.check_insertable(&record)?;
        trace!(kind = R::KIND, id = %record.id(), "Prepending record");
        self.records.shift_insert(0, record.id().clone(), record);
        Ok(())
    }

    fn check_insertable(&self, record: &R) -> Result<()> {
        if self.records.contains_key(record.id()) {
            return Err(Error::DuplicateId {
                kind: R::KIND,
                id: record.id().clone(),
            });
        }
        record.check_invariants()
    }

    /// Merge a field patch into an existing record
    ///
    /// The record is left untouched if the patched version would break an
    /// entity invariant.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the id is absent, or a validation error.
    pub fn update_by_id(&mut self, id: &RecordId, patch: &R::Patch) -> Result<&R> {
        let record = self
            .records
            .get_mut(id)
            .ok_or_else(|| Error::not_found(R::KIND, id))?;

        let mut patched = record.clone();
        patched.apply_patch(patch);
        patched.check_invariants()?;
        *record = patched;

        trace!(kind = R::KIND, %id, "Patched record");
        Ok(record)
    }

    /// Remove a record, returning it
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the id is absent.
    pub fn remove_by_id(&mut self, id: &RecordId) -> Result<R> {
        let removed = self
            .records
            .shift_remove(id)
            .ok_or_else(|| Error::not_found(R::KIND, id))?;
        trace!(kind = R::KIND, %id, "Removed record");
        Ok(removed)
    }

    /// Overwrite the status of a record
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the id is absent.
    pub fn set_status(&mut self, id: &RecordId, status: R::Status) -> Result<()> {
        let record = self
            .records
            .get_mut(id)
            .ok_or_else(|| Error::not_found(R::KIND, id))?;
        record.set_status(status);
        Ok(())
    }

    /// Put a snapshot back in place of the current record with the same id
    ///
    /// Returns `false` without inserting if the record has since been removed.
    pub fn restore(&mut self, snapshot: R) -> bool {
        match self.records.get_mut(snapshot.id()) {
            Some(current) => {
                *current = snapshot;
                true
            }
            None => false,
        }
    }

    /// Replace a record with the server's copy if it is still present
    ///
    /// Returns `false` (and discards `confirmed`) for a stale response. A
    /// server copy that breaks an entity invariant is discarded and the local
    /// record kept.
    pub fn reconcile(&mut self, confirmed: R) -> bool {
        let Some(current) = self.records.get_mut(confirmed.id()) else {
            return false;
        };
        match confirmed.check_invariants() {
            Ok(()) => *current = confirmed,
            Err(err) => {
                warn!(kind = R::KIND, id = %confirmed.id(), error = %err, "Keeping local copy over invalid server record");
            }
        }
        true
    }

    /// Swap a placeholder for the confirmed record, keeping its position
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the placeholder is gone, or
    /// [`Error::DuplicateId`] if the confirmed id is already present under a
    /// different entry.
    pub fn rekey(&mut self, placeholder: &RecordId, confirmed: R) -> Result<()> {
        let index = self
            .records
            .get_index_of(placeholder)
            .ok_or_else(|| Error::not_found(R::KIND, placeholder))?;

        if confirmed.id() != placeholder && self.records.contains_key(confirmed.id()) {
            return Err(Error::DuplicateId {
                kind: R::KIND,
                id: confirmed.id().clone(),
            });
        }

        self.records.shift_remove_index(index);
        debug!(kind = R::KIND, %placeholder, id = %confirmed.id(), "Placeholder confirmed");
        self.records
            .shift_insert(index, confirmed.id().clone(), confirmed);
        Ok(())
    }

    /// Look up a record
    pub fn get(&self, id: &RecordId) -> Option<&R> {
        self.records.get(id)
    }

    /// Whether the id is present
    pub fn contains(&self, id: &RecordId) -> bool {
        self.records.contains_key(id)
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Ids in display order
    pub fn ids(&self) -> Vec<RecordId> {
        self.records.keys().cloned().collect()
    }

    /// Iterate records in display order
    pub fn iter(&self) -> impl Iterator<Item = &R> {
        self.records.values()
    }

    /// Owned copy of all records in display order
    pub fn records(&self) -> Vec<R> {
        self.records.values().cloned().collect()
    }
}

/// Shared handle to a [`RecordStore`]
///
/// Cloning the handle shares the store. Guards must not be held across an
/// `.await`.
#[derive(Debug)]
pub struct StoreHandle<R: Record> {
    inner: Arc<RwLock<RecordStore<R>>>,
}

impl<R: Record> Clone for StoreHandle<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: Record> Default for StoreHandle<R> {
    fn default() -> Self {
        Self::new(RecordStore::new())
    }
}

impl<R: Record> StoreHandle<R> {
    /// Wrap a store
    pub fn new(store: RecordStore<R>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(store)),
        }
    }

    /// Handle over a store pre-filled with `records`
    pub fn with_records(records: impl IntoIterator<Item = R>) -> Self {
        let mut store = RecordStore::new();
        store.replace_all(records);
        Self::new(store)
    }

    /// Shared read access
    pub fn read(&self) -> RwLockReadGuard<'_, RecordStore<R>> {
        self.inner.read()
    }

    /// Exclusive write access
    pub fn write(&self) -> RwLockWriteGuard<'_, RecordStore<R>> {
        self.inner.write()
    }

    /// Clone of one record
    pub fn get(&self, id: &RecordId) -> Option<R> {
        self.inner.read().get(id).cloned()
    }

    /// Owned copy of all records in display order
    pub fn snapshot(&self) -> Vec<R> {
        self.inner.read().records()
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}
