/// Tenant registry
///
/// Routing table from opaque access keys to datastore handles. The mapping
/// lives in the same Redis deployment as the session store, under the
/// disjoint `registry:` namespace, so it is crash-durable and visible to
/// every bot process.
///
/// Registration is first-writer-wins: re-registering an existing key fails
/// with [`RegistryError::AlreadyExists`] and leaves the original handle in
/// place. Repointing a tenant's data file must be an explicit operation,
/// not an accidental overwrite.

use crate::redis::RedisClient;
use async_trait::async_trait;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use thiserror::Error;

/// Identifies the physical location of a tenant's datastore (a file path)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TenantHandle(String);

impl TenantHandle {
    /// Creates a handle from a datastore path
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// The handle as a path string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The handle as a filesystem path
    pub fn as_path(&self) -> &Path {
        Path::new(&self.0)
    }
}

impl std::fmt::Display for TenantHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for TenantHandle {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TenantHandle {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Registry errors
#[derive(Error, Debug)]
pub enum RegistryError {
    /// The key is already registered to a handle
    #[error("tenant key already registered: {0}")]
    AlreadyExists(String),

    /// Backing store unreachable or command failed
    #[error("registry backend error: {0}")]
    Backend(String),
}

impl From<redis::RedisError> for RegistryError {
    fn from(err: redis::RedisError) -> Self {
        RegistryError::Backend(err.to_string())
    }
}

/// Access-key to datastore-handle routing table
#[async_trait]
pub trait TenantRegistry: Send + Sync {
    /// Resolves an access key to its handle, or `None` for unknown keys.
    async fn resolve(&self, key: &str) -> Result<Option<TenantHandle>, RegistryError>;

    /// Registers a new key.
    ///
    /// Fails with [`RegistryError::AlreadyExists`] if the key is taken; the
    /// existing handle is never overwritten. A successful registration is
    /// immediately visible to `resolve` from any process sharing the
    /// backing store.
    async fn register(&self, key: &str, handle: &TenantHandle) -> Result<(), RegistryError>;
}

fn registry_key(key: &str) -> String {
    format!("registry:tenant:{}", key)
}

/// Redis-backed tenant registry
pub struct RedisTenantRegistry {
    client: RedisClient,
}

impl RedisTenantRegistry {
    pub fn new(client: RedisClient) -> Self {
        RedisTenantRegistry { client }
    }
}

#[async_trait]
impl TenantRegistry for RedisTenantRegistry {
    async fn resolve(&self, key: &str) -> Result<Option<TenantHandle>, RegistryError> {
        let mut conn = self.client.get_connection();
        let handle: Option<String> = conn.get(registry_key(key)).await?;
        Ok(handle.map(TenantHandle::from))
    }

    async fn register(&self, key: &str, handle: &TenantHandle) -> Result<(), RegistryError> {
        let mut conn = self.client.get_connection();
        let inserted: bool = conn.set_nx(registry_key(key), handle.as_str()).await?;

        if !inserted {
            return Err(RegistryError::AlreadyExists(key.to_string()));
        }

        tracing::info!(key, handle = %handle, "registered tenant");
        Ok(())
    }
}

/// In-memory tenant registry for tests and local development
#[derive(Default)]
pub struct MemoryTenantRegistry {
    tenants: Mutex<HashMap<String, TenantHandle>>,
}

impl MemoryTenantRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TenantRegistry for MemoryTenantRegistry {
    async fn resolve(&self, key: &str) -> Result<Option<TenantHandle>, RegistryError> {
        let tenants = self.tenants.lock().expect("registry map poisoned");
        Ok(tenants.get(key).cloned())
    }

    async fn register(&self, key: &str, handle: &TenantHandle) -> Result<(), RegistryError> {
        let mut tenants = self.tenants.lock().expect("registry map poisoned");
        if tenants.contains_key(key) {
            return Err(RegistryError::AlreadyExists(key.to_string()));
        }
        tenants.insert(key.to_string(), handle.clone());
        Ok(())
    }
}
