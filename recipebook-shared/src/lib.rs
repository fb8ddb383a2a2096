//! # Recipe Book Shared Library
//!
//! Domain types, persistence and business rules used by the recipe book API
//! server.
//!
//! ## Module Organization
//!
//! - `models`: Database models and queries
//! - `auth`: JWT tokens and the bearer authentication middleware
//! - `db`: Connection pool and migrations
//! - `media`: Image decoding and media file storage
//! - `recipe_write`: Validated, transactional recipe writes
//! - `shopping_list`: Shopping list aggregation and CSV rendering
//! - `avatar`: Avatar upload and removal
//! - `shortlink`: Short recipe link codes
//! - `error`: Domain error type

pub mod auth;
pub mod avatar;
pub mod db;
pub mod error;
pub mod media;
pub mod models;
pub mod recipe_write;
pub mod shopping_list;
pub mod shortlink;

/// Current version of the shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
