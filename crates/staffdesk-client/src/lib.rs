//! REST client for the staffdesk dashboard
//!
//! [`HttpGateway`] implements the gateway traits from `staffdesk-records`
//! against the dashboard's REST API, and [`Session`] holds the bearer token
//! and publishes re-authentication requests.

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
    clippy::missing_const_for_fn
)]

pub mod gateway;
pub mod render;
pub mod session;

pub use gateway::{HttpGateway, RemoteRecord, RemoteStatus};
pub use session::{AuthState, Session};
