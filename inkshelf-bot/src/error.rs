/// Workflow error taxonomy
///
/// Every failure a user-triggered operation can produce. All of these are
/// recovered at the dispatch boundary and turned into a reply; none crash
/// the process. [`WorkflowError::user_message`] is that mapping.

use inkshelf_shared::library::LibraryError;
use inkshelf_shared::registry::RegistryError;
use inkshelf_shared::session::SessionError;
use thiserror::Error;

/// Workflow result type alias
pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// Errors surfaced by capture-workflow operations
#[derive(Error, Debug)]
pub enum WorkflowError {
    /// The access key does not resolve to a tenant
    #[error("unknown access key: {0}")]
    InvalidKey(String),

    /// Operation requires a bound tenant but none is selected
    #[error("no tenant selected")]
    NotBound,

    /// Caller is not the configured administrator
    #[error("operation restricted to the administrator")]
    PermissionDenied,

    /// The tenant key is already registered
    #[error("tenant key already registered: {0}")]
    AlreadyExists(String),

    /// The staged record's TTL elapsed before confirmation
    #[error("pending record expired")]
    Expired,

    /// Confirmation arrived with nothing staged
    #[error("no pending record to confirm")]
    NothingPending,

    /// Tenant datastore cannot be opened or written
    #[error("tenant datastore unavailable: {0}")]
    StorageUnavailable(String),

    /// The recognition collaborator failed; opaque, not retried
    #[error("recognition failed: {0}")]
    RecognitionFailed(String),

    /// Session store or registry backend failure
    #[error("shared state backend error: {0}")]
    Backend(String),
}

impl WorkflowError {
    /// The user-visible reply for this error
    pub fn user_message(&self) -> String {
        match self {
            WorkflowError::InvalidKey(_) => {
                "That access key is not registered. Ask the administrator to add it.".to_string()
            }
            WorkflowError::NotBound => {
                "Select a tenant first with: select-tenant <key>".to_string()
            }
            WorkflowError::PermissionDenied => {
                "Only the administrator can do that.".to_string()
            }
            WorkflowError::AlreadyExists(key) => {
                format!("Key {} is already registered; pick another.", key)
            }
            WorkflowError::Expired => {
                "The staged card has expired. Send the photo again.".to_string()
            }
            WorkflowError::NothingPending => {
                "There is nothing waiting for confirmation.".to_string()
            }
            WorkflowError::StorageUnavailable(_) => {
                "The book database is unavailable right now. Try again later.".to_string()
            }
            WorkflowError::RecognitionFailed(_) => {
                "Could not read the page. Try another photo.".to_string()
            }
            WorkflowError::Backend(_) => {
                "Temporary storage error. Try again.".to_string()
            }
        }
    }
}

impl From<SessionError> for WorkflowError {
    fn from(err: SessionError) -> Self {
        WorkflowError::Backend(err.to_string())
    }
}

impl From<RegistryError> for WorkflowError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::AlreadyExists(key) => WorkflowError::AlreadyExists(key),
            RegistryError::Backend(msg) => WorkflowError::Backend(msg),
        }
    }
}

impl From<LibraryError> for WorkflowError {
    fn from(err: LibraryError) -> Self {
        WorkflowError::StorageUnavailable(err.to_string())
    }
}
