//! Storage backend implementations.
//!
//! This module provides the concrete implementation of the repository traits
//! defined in `lotes_core::storage`.

pub mod sqlite;

pub use sqlite::SqliteRepository;
