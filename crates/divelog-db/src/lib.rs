//! PostgreSQL access layer for the dive log
//!
//! Owns the schema and its constraints, implements the repository traits
//! from `divelog-core` with one statement per operation, and translates
//! store rejections into the core error taxonomy.

pub mod client;
pub mod queries;
pub mod schema;
pub mod translate;

pub use client::*;
pub use schema::*;
pub use translate::{classify, translate, ViolationClass};
