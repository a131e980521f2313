//! Core records, request validation and error taxonomy for the dive log
//!
//! This crate holds everything about the dive log that does not depend on
//! a particular store: typed records, validated payloads, the error kinds
//! callers see, and the repository traits a store implements.

pub mod error;
pub mod repository;
pub mod types;
pub mod validate;

pub use error::*;
pub use repository::*;
pub use types::*;
pub use validate::*;
