/// Mock recognizer for tests and local development
///
/// Returns the same fields for every image. Not wired to anything; use the
/// HTTP recognizer in deployment.

use super::recognizer::{RecognitionResult, Recognizer};
use async_trait::async_trait;
use inkshelf_shared::models::BookFields;

/// Deterministic recognizer answering with canned fields
pub struct MockRecognizer {
    fields: BookFields,
}

impl MockRecognizer {
    /// Mock answering with the given fields
    pub fn new(fields: BookFields) -> Self {
        MockRecognizer { fields }
    }

    /// Mock with a well-known book, for simple tests
    pub fn default_test() -> Self {
        Self::new(BookFields {
            author: "Frank Herbert".to_string(),
            title: "Dune".to_string(),
            publication_year: 1965,
            category: "Science Fiction".to_string(),
            publisher: "Chilton Books".to_string(),
        })
    }
}

impl Default for MockRecognizer {
    fn default() -> Self {
        Self::default_test()
    }
}

#[async_trait]
impl Recognizer for MockRecognizer {
    fn name(&self) -> &str {
        "mock"
    }

    async fn recognize(&self, _image_ref: &str) -> RecognitionResult<BookFields> {
        Ok(self.fields.clone())
    }
}
