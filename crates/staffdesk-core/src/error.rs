//! Error types for the staffdesk record lifecycle

use crate::types::RecordId;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type shared by the store, view, transition engine and gateways
#[derive(Debug, Error)]
pub enum Error {
    /// An operation referenced an id absent from the store
    #[error("{kind} {id} not found")]
    NotFound {
        /// Entity kind (`task`, `worklog`, `employee`)
        kind: &'static str,
        /// Missing id
        id: RecordId,
    },

    /// Insert collided with an existing id
    #[error("{kind} {id} already exists")]
    DuplicateId {
        /// Entity kind
        kind: &'static str,
        /// Colliding id
        id: RecordId,
    },

    /// Invalid configuration or view parameters
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// A transition was requested for a record that already has one in flight
    #[error("{id} already has a status change in progress")]
    Conflict {
        /// Busy id
        id: RecordId,
    },

    /// Remote persistence failed after an optimistic local change
    #[error("Failed to update status of {id}: {source}")]
    TransitionFailed {
        /// Record that was rolled back
        id: RecordId,
        /// Underlying gateway error
        #[source]
        source: Box<Error>,
    },

    /// A bulk status change was rejected as a whole
    #[error("Failed to update status of {} records: {source}", .ids.len())]
    BulkTransitionFailed {
        /// Records that were rolled back
        ids: Vec<RecordId>,
        /// Underlying gateway error
        #[source]
        source: Box<Error>,
    },

    /// Input failed local checks
    #[error("Validation error: {field} - {message}")]
    Validation {
        /// Field that failed validation
        field: String,
        /// Human-readable message
        message: String,
    },

    /// Remote gateway unreachable or returned a non-success response
    #[error("Network error{}: {message}", .status.map(|s| format!(" ({s})")).unwrap_or_default())]
    Network {
        /// HTTP status, if a response was received
        status: Option<u16>,
        /// Error message
        message: String,
    },

    /// The session token was rejected; credentials have been cleared
    #[error("Session expired, please sign in again")]
    Unauthorized,

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create a not-found error
    pub fn not_found(kind: &'static str, id: impl Into<RecordId>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Create a validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a network error
    pub fn network(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Network {
            status,
            message: message.into(),
        }
    }

    /// Whether the error is expected at the UI boundary rather than a bug
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::TransitionFailed { .. }
                | Self::BulkTransitionFailed { .. }
                | Self::Validation { .. }
                | Self::Network { .. }
                | Self::Unauthorized
                | Self::Conflict { .. }
        )
    }

    /// The single record this error is about, if any
    pub const fn record_id(&self) -> Option<&RecordId> {
        match self {
            Self::NotFound { id, .. }
            | Self::DuplicateId { id, .. }
            | Self::Conflict { id }
            | Self::TransitionFailed { id, .. } => Some(id),
            _ => None,
        }
    }

    /// One-line message for a dismissible banner
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation { message, .. } => message.clone(),
            Self::TransitionFailed { id, source } => {
                format!("Could not update {id}: {}", source.user_message())
            }
            Self::BulkTransitionFailed { ids, source } => format!(
                "Could not update {} selected records: {}",
                ids.len(),
                source.user_message()
            ),
            Self::Network { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic, clippy::uninlined_format_args)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::error::Error as StdError;

    #[test]
    fn test_not_found_display() {
        let error = Error::not_found("task", "t-1");
        assert_eq!(error.to_string(), "task t-1 not found");
        assert_eq!(error.record_id().map(RecordId::as_str), Some("t-1"));
    }

    #[test]
    fn test_validation_user_message_is_bare() {
        let error = Error::validation("title", "Title is required");
        assert_eq!(error.to_string(), "Validation error: title - Title is required");
        assert_eq!(error.user_message(), "Title is required");
        assert!(error.is_recoverable());
    }

    #[test]
    fn test_network_display_with_and_without_status() {
        let error = Error::network(Some(503), "service unavailable");
        assert_eq!(error.to_string(), "Network error (503): service unavailable");

        let error = Error::network(None, "connection refused");
        assert_eq!(error.to_string(), "Network error: connection refused");
    }

    #[test]
    fn test_transition_failed_keeps_source() {
        let error = Error::TransitionFailed {
            id: RecordId::from("w-7"),
            source: Box::new(Error::network(Some(500), "boom")),
        };

        assert!(error.source().is_some());
        assert_eq!(error.record_id().map(RecordId::as_str), Some("w-7"));
        assert_eq!(error.user_message(), "Could not update w-7: boom");
    }

    #[test]
    fn test_bulk_failure_names_the_batch() {
        let error = Error::BulkTransitionFailed {
            ids: vec!["a".into(), "b".into(), "c".into()],
            source: Box::new(Error::Unauthorized),
        };

        assert!(error.record_id().is_none());
        assert_eq!(
            error.user_message(),
            "Could not update 3 selected records: Session expired, please sign in again"
        );
    }

    #[test]
    fn test_store_errors_are_not_recoverable() {
        assert!(!Error::not_found("task", "x").is_recoverable());
        assert!(
            !Error::DuplicateId {
                kind: "task",
                id: "x".into()
            }
            .is_recoverable()
        );
        assert!(!Error::config("page_size must be positive").is_recoverable());
    }

    #[test]
    fn test_serialization_error_conversion() {
        let json_error = serde_json::from_str::<serde_json::Value>("{invalid").unwrap_err();
        let error = Error::from(json_error);

        match error {
            Error::Serialization(_) => {}
            _ => panic!("Expected Serialization error variant"),
        }
    }
}
