/// Ephemeral session store
///
/// Holds per-user interaction state: the selected access key (no expiry)
/// and at most one pending record (expires after a fixed TTL if never
/// confirmed). Multiple bot processes may share the backing store, so
/// nothing is cached in-process and expiry is enforced by the store itself.
///
/// # Key layout
///
/// All session entries live under the `session:` namespace, disjoint from
/// the registry's `registry:` namespace:
///
/// - `session:{user_id}:tenant`: selected access key, no TTL
/// - `session:{user_id}:pending`: staged record as JSON, TTL'd
/// - `session:{user_id}:staged`: token of the most recent staging, no TTL
///
/// # Staging tokens
///
/// Every staging writes a fresh token into both the pending record and the
/// `staged` marker. [`SessionStore::clear_pending_if`] removes the pending
/// entry and the marker atomically, and only while the marker still holds
/// the given token, so a commit never clobbers a staging that replaced its
/// record mid-flight. The marker outlives the TTL'd record: pending absent
/// with the marker present means a staging expired uncommitted, pending
/// absent with no marker means nothing is staged since the last commit.

use crate::models::PendingRecord;
use crate::redis::RedisClient;
use async_trait::async_trait;
use redis::AsyncCommands;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Default TTL for a staged pending record
pub const DEFAULT_PENDING_TTL: Duration = Duration::from_secs(3600);

/// Session store errors
#[derive(Error, Debug)]
pub enum SessionError {
    /// Backing store unreachable or command failed
    #[error("session backend error: {0}")]
    Backend(String),

    /// Pending record could not be encoded or decoded
    #[error("pending record encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

impl From<redis::RedisError> for SessionError {
    fn from(err: redis::RedisError) -> Self {
        SessionError::Backend(err.to_string())
    }
}

/// Per-user session state shared across bot processes
///
/// Implementations must enforce the pending-record TTL themselves; after
/// expiry, absence is indistinguishable from "never staged".
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Stages a pending record for the user, overwriting any prior one.
    ///
    /// Last-write-wins; overwriting is not an error. The record's TTL
    /// starts now.
    async fn set_pending(&self, user_id: &str, record: &PendingRecord)
        -> Result<(), SessionError>;

    /// Returns the user's pending record if present and not expired.
    async fn get_pending(&self, user_id: &str) -> Result<Option<PendingRecord>, SessionError>;

    /// Returns the token of the user's most recent staging, if any.
    ///
    /// The marker persists past record expiry and is removed only by
    /// [`clear_pending_if`](Self::clear_pending_if) or
    /// [`clear_pending`](Self::clear_pending).
    async fn staged_token(&self, user_id: &str) -> Result<Option<Uuid>, SessionError>;

    /// Atomically removes the pending entry and staging marker, but only
    /// while the marker still holds `token`.
    ///
    /// Returns `false` when a newer staging has replaced the record; the
    /// newer staging is left untouched.
    async fn clear_pending_if(&self, user_id: &str, token: Uuid) -> Result<bool, SessionError>;

    /// Unconditionally removes the pending entry and staging marker.
    ///
    /// Idempotent; no error if nothing is staged.
    async fn clear_pending(&self, user_id: &str) -> Result<(), SessionError>;

    /// Binds the user to an access key. No TTL; persists until changed.
    async fn set_access_key(&self, user_id: &str, key: &str) -> Result<(), SessionError>;

    /// Returns the user's bound access key, if any.
    async fn get_access_key(&self, user_id: &str) -> Result<Option<String>, SessionError>;
}

fn tenant_key(user_id: &str) -> String {
    format!("session:{}:tenant", user_id)
}

fn pending_key(user_id: &str) -> String {
    format!("session:{}:pending", user_id)
}

fn staged_key(user_id: &str) -> String {
    format!("session:{}:staged", user_id)
}

/// Compare-and-delete: clear the pending entry and marker only while the
/// marker still holds the caller's token.
const CLEAR_IF_TOKEN_SCRIPT: &str = r#"
if redis.call('GET', KEYS[2]) == ARGV[1] then
    redis.call('DEL', KEYS[1], KEYS[2])
    return 1
end
return 0
"#;

/// Redis-backed session store
pub struct RedisSessionStore {
    client: RedisClient,
    ttl: Duration,
}

impl RedisSessionStore {
    /// Creates a session store with the default 1 hour pending TTL
    pub fn new(client: RedisClient) -> Self {
        Self::with_ttl(client, DEFAULT_PENDING_TTL)
    }

    /// Creates a session store with a custom pending TTL
    pub fn with_ttl(client: RedisClient, ttl: Duration) -> Self {
        RedisSessionStore { client, ttl }
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn set_pending(
        &self,
        user_id: &str,
        record: &PendingRecord,
    ) -> Result<(), SessionError> {
        let payload = serde_json::to_string(record)?;
        let mut conn = self.client.get_connection();

        redis::pipe()
            .atomic()
            .set_ex(pending_key(user_id), payload, self.ttl.as_secs())
            .ignore()
            .set(staged_key(user_id), record.token.to_string())
            .ignore()
            .query_async::<_, ()>(&mut conn)
            .await?;

        tracing::debug!(user_id, token = %record.token, "staged pending record");
        Ok(())
    }

    async fn get_pending(&self, user_id: &str) -> Result<Option<PendingRecord>, SessionError> {
        let mut conn = self.client.get_connection();
        let payload: Option<String> = conn.get(pending_key(user_id)).await?;

        match payload {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn staged_token(&self, user_id: &str) -> Result<Option<Uuid>, SessionError> {
        let mut conn = self.client.get_connection();
        let raw: Option<String> = conn.get(staged_key(user_id)).await?;

        match raw {
            Some(s) => Uuid::parse_str(&s)
                .map(Some)
                .map_err(|e| SessionError::Backend(format!("corrupt staging marker: {}", e))),
            None => Ok(None),
        }
    }

    async fn clear_pending_if(&self, user_id: &str, token: Uuid) -> Result<bool, SessionError> {
        let mut conn = self.client.get_connection();
        let cleared: i64 = redis::Script::new(CLEAR_IF_TOKEN_SCRIPT)
            .key(pending_key(user_id))
            .key(staged_key(user_id))
            .arg(token.to_string())
            .invoke_async(&mut conn)
            .await?;

        Ok(cleared == 1)
    }

    async fn clear_pending(&self, user_id: &str) -> Result<(), SessionError> {
        let mut conn = self.client.get_connection();
        conn.del::<_, ()>(vec![pending_key(user_id), staged_key(user_id)])
            .await?;
        Ok(())
    }

    async fn set_access_key(&self, user_id: &str, key: &str) -> Result<(), SessionError> {
        let mut conn = self.client.get_connection();
        conn.set::<_, _, ()>(tenant_key(user_id), key).await?;
        Ok(())
    }

    async fn get_access_key(&self, user_id: &str) -> Result<Option<String>, SessionError> {
        let mut conn = self.client.get_connection();
        let key: Option<String> = conn.get(tenant_key(user_id)).await?;
        Ok(key)
    }
}

#[derive(Default)]
struct MemorySession {
    access_key: Option<String>,
    pending: Option<(PendingRecord, tokio::time::Instant)>,
    staged: Option<Uuid>,
}

/// In-memory session store for tests and local development
///
/// Not shared across processes; use [`RedisSessionStore`] in deployment.
/// Expiry deadlines use tokio's clock, so paused-time tests can advance
/// past the TTL without waiting.
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<String, MemorySession>>,
    ttl: Duration,
}

impl MemorySessionStore {
    /// Creates a store with the default 1 hour pending TTL
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_PENDING_TTL)
    }

    /// Creates a store with a custom pending TTL
    pub fn with_ttl(ttl: Duration) -> Self {
        MemorySessionStore {
            sessions: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    fn with_session<T>(&self, user_id: &str, f: impl FnOnce(&mut MemorySession) -> T) -> T {
        let mut sessions = self.sessions.lock().expect("session map poisoned");
        f(sessions.entry(user_id.to_string()).or_default())
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn set_pending(
        &self,
        user_id: &str,
        record: &PendingRecord,
    ) -> Result<(), SessionError> {
        let deadline = tokio::time::Instant::now() + self.ttl;
        self.with_session(user_id, |s| {
            s.pending = Some((record.clone(), deadline));
            s.staged = Some(record.token);
        });
        Ok(())
    }

    async fn get_pending(&self, user_id: &str) -> Result<Option<PendingRecord>, SessionError> {
        let now = tokio::time::Instant::now();
        Ok(self.with_session(user_id, |s| {
            match s.pending.take() {
                Some((record, deadline)) if now < deadline => {
                    s.pending = Some((record.clone(), deadline));
                    Some(record)
                }
                // Expired or never set: the record stays gone, the marker stays.
                _ => None,
            }
        }))
    }

    async fn staged_token(&self, user_id: &str) -> Result<Option<Uuid>, SessionError> {
        Ok(self.with_session(user_id, |s| s.staged))
    }

    async fn clear_pending_if(&self, user_id: &str, token: Uuid) -> Result<bool, SessionError> {
        Ok(self.with_session(user_id, |s| {
            if s.staged == Some(token) {
                s.pending = None;
                s.staged = None;
                true
            } else {
                false
            }
        }))
    }

    async fn clear_pending(&self, user_id: &str) -> Result<(), SessionError> {
        self.with_session(user_id, |s| {
            s.pending = None;
            s.staged = None;
        });
        Ok(())
    }

    async fn set_access_key(&self, user_id: &str, key: &str) -> Result<(), SessionError> {
        self.with_session(user_id, |s| s.access_key = Some(key.to_string()));
        Ok(())
    }

    async fn get_access_key(&self, user_id: &str) -> Result<Option<String>, SessionError> {
        Ok(self.with_session(user_id, |s| s.access_key.clone()))
    }
}
