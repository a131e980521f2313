//! Error taxonomy surfaced to callers
//!
//! Every failure an operation can report falls into one [`ErrorKind`].
//! Classified errors carry a stable machine-readable code, a message and an
//! optional structured detail. Unclassified store failures keep the original
//! error as their source so nothing is swallowed on the way up.

use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type DiveLogResult<T> = Result<T, DiveLogError>;

/// Coarse classification of a failed operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    MalformedRequest,
    AlreadyExists,
    InvalidReference,
    InvalidValues,
    StoreUnavailable,
}

/// Shape-level rejection of an inbound payload
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    #[error("{field} is not a valid email address")]
    InvalidEmail { field: &'static str },

    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },

    #[error("{field} must be an integer, got '{value}'")]
    NotInteger { field: &'static str, value: String },

    #[error("{0}")]
    Body(String),
}

impl ValidationError {
    /// Offending field, when the failure is tied to one
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::Empty { field }
            | Self::InvalidEmail { field }
            | Self::NotFinite { field }
            | Self::NotInteger { field, .. } => Some(field),
            Self::Body(_) => None,
        }
    }
}

fn named(constraint: &Option<String>) -> String {
    match constraint {
        Some(name) => format!(" (constraint {name})"),
        None => String::new(),
    }
}

#[derive(Debug, Error)]
pub enum DiveLogError {
    #[error("malformed request: {0}")]
    MalformedRequest(#[from] ValidationError),

    #[error("record already exists{}", named(.constraint))]
    AlreadyExists { constraint: Option<String> },

    #[error("referenced record does not exist{}", named(.constraint))]
    InvalidReference { constraint: Option<String> },

    #[error("values violate a domain check{}", named(.constraint))]
    InvalidValues { constraint: Option<String> },

    /// The store could not be reached (pool timeout, closed pool, I/O)
    #[error("store unavailable: {0}")]
    Unavailable(#[source] BoxError),

    /// Any other store failure that matched no constraint class
    #[error("unclassified store failure: {0}")]
    Unclassified(#[source] BoxError),
}

impl DiveLogError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedRequest(_) => ErrorKind::MalformedRequest,
            Self::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            Self::InvalidReference { .. } => ErrorKind::InvalidReference,
            Self::InvalidValues { .. } => ErrorKind::InvalidValues,
            Self::Unavailable(_) | Self::Unclassified(_) => ErrorKind::StoreUnavailable,
        }
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            Self::MalformedRequest(_) => "malformed_request",
            Self::AlreadyExists { .. } => "already_exists",
            Self::InvalidReference { .. } => "invalid_reference",
            Self::InvalidValues { .. } => "invalid_values",
            Self::Unavailable(_) => "store_unavailable",
            Self::Unclassified(_) => "internal_error",
        }
    }

    /// Name of the violated constraint, if the store reported one
    pub fn constraint(&self) -> Option<&str> {
        match self {
            Self::AlreadyExists { constraint }
            | Self::InvalidReference { constraint }
            | Self::InvalidValues { constraint } => constraint.as_deref(),
            _ => None,
        }
    }

    /// Message safe to hand to a caller. Store failures never leak their
    /// source text.
    pub fn public_message(&self) -> String {
        match self {
            Self::Unavailable(_) => "the data store is currently unavailable".to_string(),
            Self::Unclassified(_) => "an internal error occurred".to_string(),
            other => other.to_string(),
        }
    }

    /// Structured detail payload
    pub fn detail(&self) -> Option<Value> {
        if let Some(constraint) = self.constraint() {
            return Some(json!({ "constraint": constraint }));
        }
        match self {
            Self::MalformedRequest(e) => e.field().map(|field| json!({ "field": field })),
            _ => None,
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.kind() != ErrorKind::StoreUnavailable
    }
}
