/// Integration tests for the capture workflow
///
/// These run hermetically: in-memory session store and registry, tenant
/// datastores on throwaway SQLite files, canned recognition results.

use inkshelf_bot::adapters::{MockRecognizer, Recognizer};
use inkshelf_bot::dispatch::Dispatcher;
use inkshelf_bot::error::WorkflowError;
use inkshelf_bot::workflow::{CaptureWorkflow, SessionState};
use inkshelf_shared::library::LibraryStore;
use inkshelf_shared::models::BookFields;
use inkshelf_shared::registry::{MemoryTenantRegistry, TenantHandle, TenantRegistry};
use inkshelf_shared::session::{MemorySessionStore, SessionStore};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const ADMIN: &str = "admin-1001";
const USER: &str = "reader-42";

struct Fixture {
    workflow: CaptureWorkflow,
    registry: Arc<MemoryTenantRegistry>,
    library: Arc<LibraryStore>,
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        Self::with_ttl(Duration::from_secs(3600))
    }

    fn with_ttl(ttl: Duration) -> Self {
        let sessions: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::with_ttl(ttl));
        let registry = Arc::new(MemoryTenantRegistry::new());
        let library = Arc::new(LibraryStore::new());
        let workflow = CaptureWorkflow::new(
            sessions,
            registry.clone() as Arc<dyn TenantRegistry>,
            library.clone(),
            ADMIN,
        );
        Fixture {
            workflow,
            registry,
            library,
            dir: TempDir::new().unwrap(),
        }
    }

    fn handle(&self, name: &str) -> TenantHandle {
        TenantHandle::new(self.dir.path().join(name).to_string_lossy().to_string())
    }

    /// Registers a tenant as the administrator and returns its handle
    async fn tenant(&self, key: &str, file: &str) -> TenantHandle {
        let handle = self.handle(file);
        self.workflow
            .register_tenant(ADMIN, key, &handle)
            .await
            .unwrap();
        handle
    }
}

fn dune() -> BookFields {
    BookFields {
        author: "Frank Herbert".to_string(),
        title: "Dune".to_string(),
        publication_year: 1965,
        category: "Science Fiction".to_string(),
        publisher: "Chilton Books".to_string(),
    }
}

#[tokio::test]
async fn test_full_capture_scenario() {
    let fx = Fixture::new();
    let handle = fx.tenant("lib1", "lib1.db").await;

    assert_eq!(fx.workflow.state(USER).await.unwrap(), SessionState::Unbound);

    fx.workflow.bind_tenant(USER, "lib1").await.unwrap();
    assert_eq!(fx.workflow.state(USER).await.unwrap(), SessionState::Bound);

    let before = fx.library.count(&handle).await.unwrap();

    fx.workflow
        .stage_recognition(USER, dune(), "file-abc123.jpg")
        .await
        .unwrap();
    assert_eq!(
        fx.workflow.state(USER).await.unwrap(),
        SessionState::PendingConfirmation
    );

    let record = fx.workflow.confirm_pending(USER).await.unwrap();
    assert_eq!(record.title, "Dune");
    assert_eq!(record.user_id, USER);

    assert_eq!(fx.workflow.state(USER).await.unwrap(), SessionState::Bound);
    assert_eq!(fx.library.count(&handle).await.unwrap(), before + 1);
}

#[tokio::test]
async fn test_second_confirmation_reports_nothing_pending() {
    let fx = Fixture::new();
    let handle = fx.tenant("lib1", "lib1.db").await;

    fx.workflow.bind_tenant(USER, "lib1").await.unwrap();
    fx.workflow
        .stage_recognition(USER, dune(), "img.jpg")
        .await
        .unwrap();

    fx.workflow.confirm_pending(USER).await.unwrap();

    let err = fx.workflow.confirm_pending(USER).await.unwrap_err();
    assert!(matches!(err, WorkflowError::NothingPending));

    // The duplicate confirmation must not re-insert
    assert_eq!(fx.library.count(&handle).await.unwrap(), 1);
}

#[tokio::test]
async fn test_confirmation_after_ttl_reports_expired() {
    let fx = Fixture::with_ttl(Duration::from_millis(50));
    let handle = fx.tenant("lib1", "lib1.db").await;

    fx.workflow.bind_tenant(USER, "lib1").await.unwrap();
    fx.workflow
        .stage_recognition(USER, dune(), "img.jpg")
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(150)).await;

    let err = fx.workflow.confirm_pending(USER).await.unwrap_err();
    assert!(matches!(err, WorkflowError::Expired));

    // No insert happened
    assert_eq!(fx.library.count(&handle).await.unwrap(), 0);
    assert_eq!(fx.workflow.state(USER).await.unwrap(), SessionState::Bound);
}

#[tokio::test]
async fn test_confirmation_without_any_staging_reports_nothing_pending() {
    let fx = Fixture::new();
    fx.tenant("lib1", "lib1.db").await;
    fx.workflow.bind_tenant(USER, "lib1").await.unwrap();

    let err = fx.workflow.confirm_pending(USER).await.unwrap_err();
    assert!(matches!(err, WorkflowError::NothingPending));
}

#[tokio::test]
async fn test_binding_with_unknown_key_is_rejected() {
    let fx = Fixture::new();

    let err = fx.workflow.bind_tenant(USER, "nope").await.unwrap_err();
    assert!(matches!(err, WorkflowError::InvalidKey(ref k) if k == "nope"));
    assert_eq!(fx.workflow.state(USER).await.unwrap(), SessionState::Unbound);
}

#[tokio::test]
async fn test_staging_requires_a_bound_tenant() {
    let fx = Fixture::new();

    let err = fx
        .workflow
        .stage_recognition(USER, dune(), "img.jpg")
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::NotBound));
}

#[tokio::test]
async fn test_new_recognition_replaces_staged_record() {
    let fx = Fixture::new();
    let handle = fx.tenant("lib1", "lib1.db").await;
    fx.workflow.bind_tenant(USER, "lib1").await.unwrap();

    fx.workflow
        .stage_recognition(USER, dune(), "img-1.jpg")
        .await
        .unwrap();

    let newer = BookFields {
        author: "Isaac Asimov".to_string(),
        title: "Foundation".to_string(),
        publication_year: 1951,
        category: "Science Fiction".to_string(),
        publisher: "Gnome Press".to_string(),
    };
    fx.workflow
        .stage_recognition(USER, newer, "img-2.jpg")
        .await
        .unwrap();

    let record = fx.workflow.confirm_pending(USER).await.unwrap();
    assert_eq!(record.title, "Foundation");
    assert_eq!(fx.library.count(&handle).await.unwrap(), 1);
}

#[tokio::test]
async fn test_non_administrator_cannot_register() {
    let fx = Fixture::new();
    let handle = fx.handle("lib1.db");

    let err = fx
        .workflow
        .register_tenant(USER, "lib1", &handle)
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::PermissionDenied));

    // Registry untouched
    assert!(fx.registry.resolve("lib1").await.unwrap().is_none());
}

#[tokio::test]
async fn test_duplicate_registration_keeps_first_handle() {
    let fx = Fixture::new();
    let first = fx.tenant("lib1", "first.db").await;
    let second = fx.handle("second.db");

    let err = fx
        .workflow
        .register_tenant(ADMIN, "lib1", &second)
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::AlreadyExists(ref k) if k == "lib1"));

    assert_eq!(fx.registry.resolve("lib1").await.unwrap(), Some(first));
}

#[tokio::test]
async fn test_tenants_bound_by_different_users_stay_isolated() {
    let fx = Fixture::new();
    let lib1 = fx.tenant("lib1", "lib1.db").await;
    let lib2 = fx.tenant("lib2", "lib2.db").await;

    fx.workflow.bind_tenant("alice", "lib1").await.unwrap();
    fx.workflow.bind_tenant("bob", "lib2").await.unwrap();

    fx.workflow
        .stage_recognition("alice", dune(), "img.jpg")
        .await
        .unwrap();
    fx.workflow.confirm_pending("alice").await.unwrap();

    assert_eq!(fx.library.count(&lib1).await.unwrap(), 1);
    assert_eq!(fx.library.count(&lib2).await.unwrap(), 0);
    assert_eq!(fx.workflow.book_count("alice").await.unwrap(), 1);
    assert_eq!(fx.workflow.book_count("bob").await.unwrap(), 0);
}

#[tokio::test]
async fn test_queries_cover_committed_records() {
    let fx = Fixture::new();
    fx.tenant("lib1", "lib1.db").await;
    fx.workflow.bind_tenant(USER, "lib1").await.unwrap();

    for fields in [
        dune(),
        BookFields {
            author: "Frank Herbert".to_string(),
            title: "Dune Messiah".to_string(),
            publication_year: 1969,
            category: "Science Fiction".to_string(),
            publisher: "Putnam".to_string(),
        },
    ] {
        fx.workflow
            .stage_recognition(USER, fields, "img.jpg")
            .await
            .unwrap();
        fx.workflow.confirm_pending(USER).await.unwrap();
    }

    let by_author = fx.workflow.find_by_author(USER, "Herbert").await.unwrap();
    assert_eq!(by_author.len(), 2);

    let by_year = fx.workflow.find_by_year(USER, 1969).await.unwrap();
    assert_eq!(by_year.len(), 1);
    assert_eq!(by_year[0].title, "Dune Messiah");

    let recent = fx.workflow.recent(USER, 1).await.unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].title, "Dune Messiah");
}

#[tokio::test]
async fn test_dispatcher_runs_the_scenario_end_to_end() {
    let fx = Fixture::new();
    fx.tenant("lib1", "lib1.db").await;

    let recognizer: Arc<dyn Recognizer> = Arc::new(MockRecognizer::default_test());
    let dispatcher = Dispatcher::new(fx.workflow, recognizer);

    let reply = dispatcher.handle_line(USER, "show-count").await;
    assert!(reply.contains("Select a tenant first"));

    let reply = dispatcher.handle_line(USER, "select-tenant lib1").await;
    assert!(reply.contains("Connected to tenant lib1"));

    let reply = dispatcher.handle_line(USER, "submit-photo shelf.jpg").await;
    assert!(reply.contains("Title: Dune"));
    assert!(reply.contains("confirm-pending"));

    let reply = dispatcher.handle_line(USER, "confirm-pending").await;
    assert!(reply.contains("Saved \"Dune\""));

    let reply = dispatcher.handle_line(USER, "show-count").await;
    assert!(reply.contains("1 saved book"));

    let reply = dispatcher.handle_line(USER, "confirm-pending").await;
    assert!(reply.contains("nothing waiting"));

    let reply = dispatcher.handle_line(USER, "show-identity").await;
    assert!(reply.contains(USER));

    let reply = dispatcher.handle_line(USER, "frobnicate").await;
    assert!(reply.contains("unknown command"));
}

#[tokio::test]
async fn test_dispatcher_rejects_non_admin_registration() {
    let fx = Fixture::new();
    let handle = fx.handle("lib9.db");

    let recognizer: Arc<dyn Recognizer> = Arc::new(MockRecognizer::default_test());
    let dispatcher = Dispatcher::new(fx.workflow, recognizer);

    let line = format!("register-tenant lib9 {}", handle);
    let reply = dispatcher.handle_line(USER, &line).await;
    assert!(reply.contains("administrator"));

    let reply = dispatcher.handle_line(ADMIN, &line).await;
    assert!(reply.contains("registered"));
}
