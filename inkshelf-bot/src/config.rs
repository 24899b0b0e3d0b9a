/// Bot configuration
///
/// Loaded from environment variables; a `.env` file is honored in
/// development.
///
/// # Environment Variables
///
/// - `REDIS_URL`: shared session/registry store (required)
/// - `ADMIN_USER_ID`: the one identity allowed to register tenants (required)
/// - `PENDING_TTL_SECS`: staged-record TTL (default: 3600)
/// - `CONSOLE_USER_ID`: identity of the console session (default: local-console)
/// - `RECOGNIZER_API_URL` / `RECOGNIZER_API_KEY`: vision endpoint; when
///   unset, the mock recognizer is used
/// - `RECOGNIZER_TIMEOUT_SECS`: provider request timeout (default: 30)

use crate::adapters::HttpRecognizerConfig;
use inkshelf_shared::redis::RedisConfig;
use std::env;
use std::time::Duration;

/// Default staged-record TTL in seconds
pub const DEFAULT_PENDING_TTL_SECS: u64 = 3600;

/// Which recognition provider to wire in
#[derive(Debug, Clone)]
pub enum RecognizerConfig {
    /// External vision endpoint
    Http(HttpRecognizerConfig),

    /// Canned answers; local development only
    Mock,
}

/// Complete bot configuration
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Shared Redis store configuration
    pub redis: RedisConfig,

    /// Identity allowed to call register-tenant
    pub admin_user_id: String,

    /// TTL for staged pending records
    pub pending_ttl: Duration,

    /// User identity of the console session
    pub console_user_id: String,

    /// Recognition provider selection
    pub recognizer: RecognizerConfig,
}

impl BotConfig {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if required variables are missing or values do not
    /// parse.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let redis = RedisConfig::from_env()?;

        let admin_user_id = env::var("ADMIN_USER_ID")
            .map_err(|_| anyhow::anyhow!("ADMIN_USER_ID environment variable is required"))?;
        if admin_user_id.trim().is_empty() {
            anyhow::bail!("ADMIN_USER_ID must not be empty");
        }

        let pending_ttl_secs: u64 = env::var("PENDING_TTL_SECS")
            .unwrap_or_else(|_| DEFAULT_PENDING_TTL_SECS.to_string())
            .parse()?;
        if pending_ttl_secs == 0 {
            anyhow::bail!("PENDING_TTL_SECS must be greater than zero");
        }

        let console_user_id =
            env::var("CONSOLE_USER_ID").unwrap_or_else(|_| "local-console".to_string());

        let recognizer = match (env::var("RECOGNIZER_API_URL"), env::var("RECOGNIZER_API_KEY")) {
            (Ok(api_url), Ok(api_key)) => {
                let timeout_secs: u64 = env::var("RECOGNIZER_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()?;
                RecognizerConfig::Http(HttpRecognizerConfig {
                    api_url,
                    api_key,
                    timeout: Duration::from_secs(timeout_secs),
                })
            }
            _ => RecognizerConfig::Mock,
        };

        Ok(BotConfig {
            redis,
            admin_user_id,
            pending_ttl: Duration::from_secs(pending_ttl_secs),
            console_user_id,
            recognizer,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ttl_is_one_hour() {
        assert_eq!(DEFAULT_PENDING_TTL_SECS, 3600);
    }

    #[test]
    fn test_config_construction() {
        let config = BotConfig {
            redis: RedisConfig {
                url: "redis://localhost:6379".to_string(),
                connection_timeout_secs: 5,
                command_timeout_secs: 10,
            },
            admin_user_id: "1001".to_string(),
            pending_ttl: Duration::from_secs(DEFAULT_PENDING_TTL_SECS),
            console_user_id: "local-console".to_string(),
            recognizer: RecognizerConfig::Mock,
        };

        assert_eq!(config.pending_ttl, Duration::from_secs(3600));
        assert!(matches!(config.recognizer, RecognizerConfig::Mock));
    }
}
