//! # Inkshelf Shared Library
//!
//! Storage components shared by the inkshelf bot binary and its tests:
//! the ephemeral session store, the tenant registry, and the per-tenant
//! book datastores.
//!
//! ## Module Organization
//!
//! - `models`: Book record and pending-record data structures
//! - `redis`: Redis client wrapper backing the session store and registry
//! - `session`: Per-user session state with TTL'd pending records
//! - `registry`: Access-key to datastore-handle routing table
//! - `library`: Per-tenant SQLite datastores, opened lazily and cached

pub mod library;
pub mod models;
pub mod redis;
pub mod registry;
pub mod session;

/// Current version of the inkshelf shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
