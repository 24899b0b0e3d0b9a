//! Inkshelf bot entry point
//!
//! Wires the shared stores to the capture workflow and serves the console
//! transport.

use inkshelf_bot::adapters::{HttpRecognizer, MockRecognizer, Recognizer};
use inkshelf_bot::config::{BotConfig, RecognizerConfig};
use inkshelf_bot::dispatch::Dispatcher;
use inkshelf_bot::transport;
use inkshelf_bot::workflow::CaptureWorkflow;
use inkshelf_shared::library::LibraryStore;
use inkshelf_shared::redis::RedisClient;
use inkshelf_shared::registry::{RedisTenantRegistry, TenantRegistry};
use inkshelf_shared::session::{RedisSessionStore, SessionStore};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "inkshelf_bot=debug,inkshelf_shared=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("inkshelf bot v{} starting", env!("CARGO_PKG_VERSION"));

    let config = BotConfig::from_env()?;

    let redis = RedisClient::new(config.redis.clone()).await?;

    let sessions: Arc<dyn SessionStore> = Arc::new(RedisSessionStore::with_ttl(
        redis.clone(),
        config.pending_ttl,
    ));
    let registry: Arc<dyn TenantRegistry> = Arc::new(RedisTenantRegistry::new(redis));
    let library = Arc::new(LibraryStore::new());

    let workflow = CaptureWorkflow::new(
        sessions,
        registry,
        library,
        config.admin_user_id.clone(),
    );

    let recognizer: Arc<dyn Recognizer> = match &config.recognizer {
        RecognizerConfig::Http(http) => Arc::new(HttpRecognizer::new(http.clone())?),
        RecognizerConfig::Mock => {
            tracing::warn!("RECOGNIZER_API_URL not set; using the mock recognizer");
            Arc::new(MockRecognizer::default_test())
        }
    };
    tracing::info!(recognizer = recognizer.name(), "recognition provider ready");

    let dispatcher = Dispatcher::new(workflow, recognizer);
    transport::run_console(dispatcher, config.console_user_id).await
}
