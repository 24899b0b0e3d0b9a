/// Recognition collaborator adapters
///
/// The workflow treats recognition as a black box behind the
/// [`Recognizer`] trait: an image reference goes in, structured book
/// fields come out. Failures are opaque and surfaced to the user as "try
/// again"; the core never retries.

pub mod http;
pub mod mock;
pub mod recognizer;

pub use http::{HttpRecognizer, HttpRecognizerConfig};
pub use mock::MockRecognizer;
pub use recognizer::{parse_card, RecognitionError, Recognizer};
