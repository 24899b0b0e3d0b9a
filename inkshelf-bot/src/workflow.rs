/// Capture workflow
///
/// Orchestrates the life of a recognized record: intake, staging, user
/// confirmation, commit. Session state is an explicit machine:
///
/// ```text
/// Unbound --select-tenant--> Bound --photo recognized--> PendingConfirmation
///                              ^                              |
///                              +---- commit / expiry ---------+
/// ```
///
/// State is never cached in-process; it is derived from the session store
/// on every operation, since several bot processes may serve the same user.
/// Every store call is a suspension point, and the commit path holds no
/// cross-call lock: the two-step insert-then-clear is protected by the
/// staging-token conditional clear instead (see `session`).

use crate::error::{WorkflowError, WorkflowResult};
use inkshelf_shared::library::LibraryStore;
use inkshelf_shared::models::{BookFields, BookRecord, PendingRecord};
use inkshelf_shared::registry::{TenantHandle, TenantRegistry};
use inkshelf_shared::session::SessionStore;
use std::sync::Arc;

/// Where a user's session currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No access key selected
    Unbound,

    /// Access key selected, nothing staged
    Bound,

    /// A recognized record is staged, awaiting confirmation
    PendingConfirmation,
}

/// The session-staging and multi-tenant persistence workflow
pub struct CaptureWorkflow {
    sessions: Arc<dyn SessionStore>,
    registry: Arc<dyn TenantRegistry>,
    library: Arc<LibraryStore>,
    admin_user_id: String,
}

impl CaptureWorkflow {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        registry: Arc<dyn TenantRegistry>,
        library: Arc<LibraryStore>,
        admin_user_id: impl Into<String>,
    ) -> Self {
        CaptureWorkflow {
            sessions,
            registry,
            library,
            admin_user_id: admin_user_id.into(),
        }
    }

    /// Derives the user's current state from the session store.
    ///
    /// A pending record that expired reads as absent, so expiry needs no
    /// explicit transition: the next read simply observes `Bound`.
    pub async fn state(&self, user_id: &str) -> WorkflowResult<SessionState> {
        if self.sessions.get_access_key(user_id).await?.is_none() {
            return Ok(SessionState::Unbound);
        }
        if self.sessions.get_pending(user_id).await?.is_some() {
            return Ok(SessionState::PendingConfirmation);
        }
        Ok(SessionState::Bound)
    }

    /// `Unbound -> Bound`: binds the user to a tenant by access key.
    ///
    /// Fails with [`WorkflowError::InvalidKey`] if the key does not
    /// resolve, leaving the session unchanged. The tenant datastore is
    /// prepared eagerly so a broken handle surfaces here rather than at
    /// commit time.
    pub async fn bind_tenant(&self, user_id: &str, key: &str) -> WorkflowResult<TenantHandle> {
        let handle = self
            .registry
            .resolve(key)
            .await?
            .ok_or_else(|| WorkflowError::InvalidKey(key.to_string()))?;

        self.library.prepare(&handle).await?;
        self.sessions.set_access_key(user_id, key).await?;

        tracing::info!(user_id, key, handle = %handle, "bound user to tenant");
        Ok(handle)
    }

    /// `Bound -> PendingConfirmation`: stages a recognition result.
    ///
    /// Always succeeds from `Bound`; an earlier pending record is silently
    /// replaced (last recognized photo wins).
    pub async fn stage_recognition(
        &self,
        user_id: &str,
        fields: BookFields,
        image_ref: &str,
    ) -> WorkflowResult<PendingRecord> {
        if self.sessions.get_access_key(user_id).await?.is_none() {
            return Err(WorkflowError::NotBound);
        }

        let record = PendingRecord::new(fields, image_ref);
        self.sessions.set_pending(user_id, &record).await?;

        tracing::debug!(user_id, token = %record.token, "staged recognition result");
        Ok(record)
    }

    /// `PendingConfirmation -> Bound`: commits the staged record.
    ///
    /// Re-reads the pending record; inserts into the tenant datastore;
    /// clears the staging conditionally on its token. Not idempotent: a
    /// second confirmation after a successful commit fails with
    /// [`WorkflowError::NothingPending`], and a confirmation after the TTL
    /// elapsed fails with [`WorkflowError::Expired`].
    pub async fn confirm_pending(&self, user_id: &str) -> WorkflowResult<BookRecord> {
        let pending = match self.sessions.get_pending(user_id).await? {
            Some(pending) => pending,
            None => {
                // The staging marker outlives the TTL'd record: present
                // means a staging expired uncommitted, absent means
                // nothing is staged since the last commit.
                return if self.sessions.staged_token(user_id).await?.is_some() {
                    Err(WorkflowError::Expired)
                } else {
                    Err(WorkflowError::NothingPending)
                };
            }
        };

        let key = self
            .sessions
            .get_access_key(user_id)
            .await?
            .ok_or(WorkflowError::NotBound)?;

        // The tenant may have been removed since binding; not expected,
        // but the commit must not insert into a dangling handle.
        let handle = self
            .registry
            .resolve(&key)
            .await?
            .ok_or_else(|| WorkflowError::InvalidKey(key.clone()))?;

        let record = self
            .library
            .insert(&handle, &pending.fields, user_id)
            .await?;

        let cleared = self.sessions.clear_pending_if(user_id, pending.token).await?;
        if !cleared {
            tracing::debug!(
                user_id,
                token = %pending.token,
                "pending record replaced during commit; newer staging left in place"
            );
        }

        tracing::info!(user_id, key = %key, record_id = %record.id, "committed book record");
        Ok(record)
    }

    /// Total committed records in the user's bound tenant.
    pub async fn book_count(&self, user_id: &str) -> WorkflowResult<i64> {
        let handle = self.bound_handle(user_id).await?;
        Ok(self.library.count(&handle).await?)
    }

    /// Registers a new tenant key. Administrator only.
    ///
    /// A non-privileged caller is rejected before the registry is touched.
    pub async fn register_tenant(
        &self,
        caller_id: &str,
        key: &str,
        handle: &TenantHandle,
    ) -> WorkflowResult<()> {
        if caller_id != self.admin_user_id {
            tracing::warn!(caller_id, key, "rejected non-administrator registration");
            return Err(WorkflowError::PermissionDenied);
        }

        self.registry.register(key, handle).await?;
        self.library.prepare(handle).await?;
        Ok(())
    }

    /// Books in the bound tenant whose author matches `pattern`.
    pub async fn find_by_author(
        &self,
        user_id: &str,
        pattern: &str,
    ) -> WorkflowResult<Vec<BookRecord>> {
        let handle = self.bound_handle(user_id).await?;
        Ok(self.library.find_by_author(&handle, pattern).await?)
    }

    /// Books in the bound tenant published in `year`.
    pub async fn find_by_year(&self, user_id: &str, year: i64) -> WorkflowResult<Vec<BookRecord>> {
        let handle = self.bound_handle(user_id).await?;
        Ok(self.library.find_by_year(&handle, year).await?)
    }

    /// The most recently committed books in the bound tenant.
    pub async fn recent(&self, user_id: &str, limit: i64) -> WorkflowResult<Vec<BookRecord>> {
        let handle = self.bound_handle(user_id).await?;
        Ok(self.library.recent(&handle, limit).await?)
    }

    /// Resolves the user's bound access key to a live handle.
    async fn bound_handle(&self, user_id: &str) -> WorkflowResult<TenantHandle> {
        let key = self
            .sessions
            .get_access_key(user_id)
            .await?
            .ok_or(WorkflowError::NotBound)?;

        self.registry
            .resolve(&key)
            .await?
            .ok_or(WorkflowError::InvalidKey(key))
    }
}
