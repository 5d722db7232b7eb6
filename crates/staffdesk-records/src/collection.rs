//! One dashboard list: store, view, transitions and forms for an entity kind

use crate::form::{FormController, FormModel};
use crate::gateway::{BulkStatusEndpoint, RecordEndpoint, StatusEndpoint};
use crate::store::StoreHandle;
use crate::transition::TransitionEngine;
use crate::view::{Page, ViewQuery};
use staffdesk_core::{Error, Record, RecordId, Result};
use std::sync::Arc;
use tracing::{error, info};

/// Record collection backed by a remote gateway
#[derive(Debug)]
pub struct Collection<R: Record, G> {
    store: StoreHandle<R>,
    gateway: Arc<G>,
    engine: TransitionEngine<R, G>,
}

impl<R: Record, G> Clone for Collection<R, G> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            gateway: Arc::clone(&self.gateway),
            engine: self.engine.clone(),
        }
    }
}

impl<R: Record, G> Collection<R, G> {
    /// Empty collection over `gateway`
    pub fn new(gateway: Arc<G>) -> Self {
        Self::with_store(StoreHandle::default(), gateway)
    }

    /// Collection over an existing store
    pub fn with_store(store: StoreHandle<R>, gateway: Arc<G>) -> Self {
        let engine = TransitionEngine::new(store.clone(), Arc::clone(&gateway));
        Self {
            store,
            gateway,
            engine,
        }
    }

    /// Shared store
    pub fn store(&self) -> &StoreHandle<R> {
        &self.store
    }

    /// Transition engine
    pub fn engine(&self) -> &TransitionEngine<R, G> {
        &self.engine
    }

    /// Current page of the list view
    pub fn view(&self, query: &ViewQuery<R>) -> Result<Page<R>> {
        query.apply(&self.store.snapshot())
    }

    /// Form bound to this collection's store and gateway
    pub fn form<F>(&self) -> FormController<F, G>
    where
        F: FormModel<Record = R>,
    {
        FormController::new(self.store.clone(), Arc::clone(&self.gateway))
    }

    /// Replace the store with the server's list
    pub async fn load(&self) -> Result<usize>
    where
        G: RecordEndpoint<R>,
    {
        let records = self.gateway.fetch_all().await?;
        let count = records.len();
        self.store.write().replace_all(records);
        info!(kind = R::KIND, count, "Loaded records");
        Ok(count)
    }

    /// See [`TransitionEngine::transition`]
    pub async fn transition(&self, id: &RecordId, target: R::Status) -> Result<R>
    where
        G: StatusEndpoint<R>,
    {
        self.engine.transition(id, target).await
    }

    /// See [`TransitionEngine::bulk_transition`]
    pub async fn bulk_transition(&self, ids: &[RecordId], target: R::Status) -> Result<Vec<R>>
    where
        G: BulkStatusEndpoint<R>,
    {
        self.engine.bulk_transition(ids, target).await
    }

    /// Remove locally, then on the server
    ///
    /// The record is not restored if the server rejects the delete; the
    /// error is returned for display and the next [`Collection::load`]
    /// brings it back.
    pub async fn delete(&self, id: &RecordId) -> Result<R>
    where
        G: RecordEndpoint<R>,
    {
        let removed = self
            .store
            .write()
            .remove_by_id(id)
            .inspect_err(|err| error!(kind = R::KIND, %id, error = %err, "Delete of unknown record"))?;
        match self.gateway.delete(id).await {
            Ok(()) => {
                info!(kind = R::KIND, %id, "Deleted record");
                Ok(removed)
            }
            Err(err) => {
                error!(kind = R::KIND, %id, error = %err, "Remote delete failed; record stays hidden until reload");
                Err(err)
            }
        }
    }

    /// Record by id
    pub fn get(&self, id: &RecordId) -> Result<R> {
        self.store
            .get(id)
            .ok_or_else(|| Error::not_found(R::KIND, id))
    }
}
