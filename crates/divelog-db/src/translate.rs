//! Store rejection to error taxonomy translation
//!
//! [`classify`] is a pure function of what PostgreSQL reports about a
//! rejection: the SQLSTATE and the constraint name. Names declared by
//! [`crate::schema`] win; otherwise the SQLSTATE decides. [`translate`] wraps
//! it for `sqlx::Error` and is applied at the boundary of every repository
//! call.

use divelog_core::DiveLogError;
use tracing::debug;

use crate::schema::constraint_class;

/// Constraint violation classes recognised by the translator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationClass {
    Unique,
    ForeignKey,
    Check,
}

/// PostgreSQL SQLSTATE codes
pub mod sqlstate {
    pub const UNIQUE_VIOLATION: &str = "23505";
    pub const FOREIGN_KEY_VIOLATION: &str = "23503";
    pub const CHECK_VIOLATION: &str = "23514";
    pub const NUMERIC_VALUE_OUT_OF_RANGE: &str = "22003";
}

/// Classify a rejection from its SQLSTATE and constraint name
pub fn classify(code: Option<&str>, constraint: Option<&str>) -> Option<ViolationClass> {
    if let Some(class) = constraint.and_then(constraint_class) {
        return Some(class);
    }
    match code? {
        sqlstate::UNIQUE_VIOLATION => Some(ViolationClass::Unique),
        sqlstate::FOREIGN_KEY_VIOLATION => Some(ViolationClass::ForeignKey),
        sqlstate::CHECK_VIOLATION | sqlstate::NUMERIC_VALUE_OUT_OF_RANGE => {
            Some(ViolationClass::Check)
        }
        _ => None,
    }
}

/// Build the caller-facing error for a classified violation
pub fn violation_error(class: ViolationClass, constraint: Option<String>) -> DiveLogError {
    match class {
        ViolationClass::Unique => DiveLogError::AlreadyExists { constraint },
        ViolationClass::ForeignKey => DiveLogError::InvalidReference { constraint },
        ViolationClass::Check => DiveLogError::InvalidValues { constraint },
    }
}

/// Translate a store failure. Unrecognised failures keep the original
/// `sqlx::Error` as their source.
pub fn translate(err: sqlx::Error) -> DiveLogError {
    let violation = match &err {
        sqlx::Error::Database(db) => classify(db.code().as_deref(), db.constraint())
            .map(|class| (class, db.constraint().map(str::to_owned))),
        _ => None,
    };

    if let Some((class, constraint)) = violation {
        debug!(?class, constraint = ?constraint, "store rejected write");
        return violation_error(class, constraint);
    }

    if is_unreachable(&err) {
        DiveLogError::Unavailable(Box::new(err))
    } else {
        DiveLogError::Unclassified(Box::new(err))
    }
}

fn is_unreachable(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
    )
}
