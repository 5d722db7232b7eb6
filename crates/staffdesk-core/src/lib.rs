//! Core types and utilities for the staffdesk record lifecycle

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

pub mod config;
pub mod error;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use config::{Config, LoggingConfig, Portal};
pub use error::{Error, Result};
pub use types::{
    Employee, EmployeeDraft, EmployeePatch, EmployeeStatus, Record, RecordId, SortValue,
    StatusMachine, Task, TaskDraft, TaskPatch, TaskPriority, TaskStatus, WorkLog, WorkLogDraft,
    WorkLogPatch, WorkLogStatus,
};

/// Initialize the logging system
///
/// The `RUST_LOG` environment variable takes precedence over the configured
/// level.
///
/// # Errors
///
/// Returns an error if a global subscriber has already been installed.
pub fn init_logging(logging: &LoggingConfig) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| logging.level.as_str().into());

    let registry = tracing_subscriber::registry().with(filter);

    let result = if logging.format.eq_ignore_ascii_case("json") {
        registry.with(tracing_subscriber::fmt::layer().json()).try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer().pretty()).try_init()
    };

    result.map_err(|e| Error::Config {
        message: format!("failed to initialize logging: {e}"),
    })
}
