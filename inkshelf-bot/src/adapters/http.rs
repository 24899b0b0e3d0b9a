/// HTTP recognition provider
///
/// Posts the image reference to a configured vision endpoint and parses
/// the card text it returns. One request per recognition; the workflow
/// surfaces failures to the user instead of retrying.

use super::recognizer::{parse_card, RecognitionError, RecognitionResult, Recognizer};
use async_trait::async_trait;
use inkshelf_shared::models::BookFields;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// HTTP recognizer configuration
#[derive(Clone)]
pub struct HttpRecognizerConfig {
    /// Base URL of the recognition service
    pub api_url: String,

    /// Bearer credential for the service
    pub api_key: String,

    /// Request timeout
    pub timeout: Duration,
}

impl std::fmt::Debug for HttpRecognizerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpRecognizerConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Serialize)]
struct RecognizeRequest<'a> {
    image_ref: &'a str,
}

#[derive(Deserialize)]
struct RecognizeResponse {
    card: String,
}

/// Recognizer backed by an external vision service
pub struct HttpRecognizer {
    client: reqwest::Client,
    config: HttpRecognizerConfig,
}

impl HttpRecognizer {
    /// Builds a recognizer with a dedicated HTTP client
    pub fn new(config: HttpRecognizerConfig) -> RecognitionResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RecognitionError::Provider(format!("HTTP client build failed: {}", e)))?;

        Ok(HttpRecognizer { client, config })
    }
}

#[async_trait]
impl Recognizer for HttpRecognizer {
    fn name(&self) -> &str {
        "http"
    }

    async fn recognize(&self, image_ref: &str) -> RecognitionResult<BookFields> {
        let url = format!("{}/v1/recognize", self.config.api_url.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&RecognizeRequest { image_ref })
            .send()
            .await
            .map_err(|e| RecognitionError::Provider(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(RecognitionError::Provider(format!(
                "provider returned status {}",
                response.status()
            )));
        }

        let body: RecognizeResponse = response
            .json()
            .await
            .map_err(|e| RecognitionError::Provider(format!("malformed response: {}", e)))?;

        tracing::debug!(image_ref, "recognition provider answered");
        Ok(parse_card(&body.card))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_credential() {
        let config = HttpRecognizerConfig {
            api_url: "https://vision.example.com".to_string(),
            api_key: "secret-key".to_string(),
            timeout: Duration::from_secs(30),
        };

        let rendered = format!("{:?}", config);
        assert!(rendered.contains("[REDACTED]"));
        assert!(!rendered.contains("secret-key"));
    }
}
