//! Record lifecycle for the staffdesk dashboard
//!
//! A [`Collection`] ties together an in-memory [`RecordStore`], the pure
//! [`ViewQuery`] pipeline, the optimistic [`TransitionEngine`] and the form
//! submission flow, on top of a remote gateway described by the traits in
//! [`gateway`]. The same machinery serves tasks, work logs and employees.

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    missing_docs
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::multiple_crate_versions,
    clippy::missing_errors_doc,
    clippy::significant_drop_tightening,
    clippy::missing_const_for_fn,
    clippy::return_self_not_must_use
)]

pub mod collection;
pub mod form;
pub mod gateway;
pub mod mock;
pub mod store;
pub mod testing;
pub mod transition;
pub mod view;

pub use collection::Collection;
pub use form::{EmployeeForm, FormController, FormMode, FormModel, TaskForm, WorkLogForm};
pub use gateway::{BulkOutcome, BulkStatusEndpoint, RecordEndpoint, StatusEndpoint};
pub use mock::{MockCall, MockGateway, MockRecord};
pub use store::{RecordStore, StoreHandle};
pub use transition::TransitionEngine;
pub use view::{Page, Predicate, SortDirection, SortSpec, ViewQuery};
