//! Optimistic status transitions with rollback
//!
//! A transition is applied to the store before the gateway call is made and
//! undone from a snapshot if the call fails. At most one transition may be in
//! flight per record; a second request for a busy id fails with
//! [`Error::Conflict`] instead of queuing.

use crate::gateway::{BulkStatusEndpoint, StatusEndpoint};
use crate::store::StoreHandle;
use dashmap::DashSet;
use staffdesk_core::{Error, Record, RecordId, Result, StatusMachine};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Applies status changes optimistically and reconciles with the gateway
#[derive(Debug)]
pub struct TransitionEngine<R: Record, G> {
    store: StoreHandle<R>,
    gateway: Arc<G>,
    in_flight: Arc<DashSet<RecordId>>,
}

impl<R: Record, G> Clone for TransitionEngine<R, G> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            gateway: Arc::clone(&self.gateway),
            in_flight: Arc::clone(&self.in_flight),
        }
    }
}

/// Releases claimed ids when the transition finishes, however it finishes
struct InFlightGuard {
    set: Arc<DashSet<RecordId>>,
    ids: Vec<RecordId>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        for id in &self.ids {
            self.set.remove(id);
        }
    }
}

impl<R: Record, G> TransitionEngine<R, G> {
    /// Create an engine over a shared store
    pub fn new(store: StoreHandle<R>, gateway: Arc<G>) -> Self {
        Self {
            store,
            gateway,
            in_flight: Arc::new(DashSet::new()),
        }
    }

    /// Whether a transition is pending for `id`
    pub fn is_in_flight(&self, id: &RecordId) -> bool {
        self.in_flight.contains(id)
    }

    /// Number of records with a pending transition
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    fn claim(&self, ids: &[RecordId]) -> Result<InFlightGuard> {
        let mut guard = InFlightGuard {
            set: Arc::clone(&self.in_flight),
            ids: Vec::with_capacity(ids.len()),
        };
        for id in ids {
            if !self.in_flight.insert(id.clone()) {
                // Dropping the guard releases the ids claimed so far.
                return Err(Error::Conflict { id: id.clone() });
            }
            guard.ids.push(id.clone());
        }
        Ok(guard)
    }

    /// Move one record to `target`
    ///
    /// The store shows `target` immediately. On success the server's copy
    /// replaces the local record; on failure the pre-transition snapshot is
    /// restored. A response for a record deleted in the meantime is dropped.
    ///
    /// The gateway is called even when `target` equals the current status.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if the id is absent, [`Error::Conflict`] if a
    /// transition is already pending for it, and [`Error::TransitionFailed`]
    /// wrapping the gateway error after rollback.
    pub async fn transition(&self, id: &RecordId, target: R::Status) -> Result<R>
    where
        G: StatusEndpoint<R>,
    {
        if !self.store.read().contains(id) {
            return Err(Error::not_found(R::KIND, id));
        }
        let _guard = self.claim(std::slice::from_ref(id))?;

        let snapshot = {
            let mut store = self.store.write();
            let snapshot = store
                .get(id)
                .cloned()
                .ok_or_else(|| Error::not_found(R::KIND, id))?;

            let from = snapshot.status();
            if !from.is_offered(target) {
                warn!(kind = R::KIND, %id, %from, to = %target, "Transition is not an offered action");
            }
            store.set_status(id, target)?;
            debug!(kind = R::KIND, %id, %from, to = %target, "Applied optimistic transition");
            snapshot
        };

        match self.gateway.update_status(id, target).await {
            Ok(confirmed) => {
                let mut store = self.store.write();
                if confirmed.id() != id {
                    warn!(kind = R::KIND, %id, returned = %confirmed.id(), "Server returned a different record; keeping local copy");
                } else if !store.reconcile(confirmed.clone()) {
                    debug!(kind = R::KIND, %id, "Record removed while in flight; dropping response");
                    return Ok(confirmed);
                }
                info!(kind = R::KIND, %id, status = %target, "Status change confirmed");
                Ok(store.get(id).cloned().unwrap_or(confirmed))
            }
            Err(source) => {
                let restored = self.store.write().restore(snapshot);
                warn!(kind = R::KIND, %id, restored, error = %source, "Status change failed; rolled back");
                Err(Error::TransitionFailed {
                    id: id.clone(),
                    source: Box::new(source),
                })
            }
        }
    }

    /// Move a set of records to `target` with a single gateway call
    ///
    /// Ids are de-duplicated keeping first occurrence; an empty set is a
    /// no-op. Every id must be present and idle before anything is applied.
    /// Failure restores every record that still exists.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] or [`Error::Conflict`] before any change, and
    /// [`Error::BulkTransitionFailed`] after rollback.
    pub async fn bulk_transition(&self, ids: &[RecordId], target: R::Status) -> Result<Vec<R>>
    where
        G: BulkStatusEndpoint<R>,
    {
        let ids = dedupe(ids);
        if ids.is_empty() {
            debug!(kind = R::KIND, "Empty selection; nothing to update");
            return Ok(Vec::new());
        }

        {
            let store = self.store.read();
            if let Some(missing) = ids.iter().find(|id| !store.contains(id)) {
                return Err(Error::not_found(R::KIND, missing));
            }
        }
        let _guard = self.claim(&ids)?;

        let snapshots = {
            let mut store = self.store.write();
            let mut snapshots = Vec::with_capacity(ids.len());
            for id in &ids {
                let record = store
                    .get(id)
                    .cloned()
                    .ok_or_else(|| Error::not_found(R::KIND, id))?;
                if !record.status().is_offered(target) {
                    warn!(kind = R::KIND, %id, from = %record.status(), to = %target, "Transition is not an offered action");
                }
                snapshots.push(record);
            }
            for id in &ids {
                store.set_status(id, target)?;
            }
            snapshots
        };
        debug!(kind = R::KIND, count = ids.len(), to = %target, "Applied optimistic bulk transition");

        match self.gateway.update_status_bulk(&ids, target).await {
            Ok(outcome) => {
                let mut store = self.store.write();
                for confirmed in outcome.records {
                    if ids.contains(confirmed.id()) {
                        store.reconcile(confirmed);
                    }
                }
                info!(
                    kind = R::KIND,
                    count = ids.len(),
                    matched = ?outcome.matched_count,
                    modified = ?outcome.modified_count,
                    status = %target,
                    "Bulk status change confirmed"
                );
                Ok(ids.iter().filter_map(|id| store.get(id).cloned()).collect())
            }
            Err(source) => {
                let restored = {
                    let mut store = self.store.write();
                    snapshots
                        .into_iter()
                        .filter(|snapshot| store.restore(snapshot.clone()))
                        .count()
                };
                warn!(kind = R::KIND, count = ids.len(), restored, error = %source, "Bulk status change failed; rolled back");
                Err(Error::BulkTransitionFailed {
                    ids,
                    source: Box::new(source),
                })
            }
        }
    }
}

fn dedupe(ids: &[RecordId]) -> Vec<RecordId> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter().filter(|id| seen.insert(*id)).cloned().collect()
}
