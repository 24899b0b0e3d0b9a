/// Book record models
///
/// Three shapes of the same data, at different points in its life:
///
/// - [`BookFields`]: the structured fields produced by recognition
/// - [`PendingRecord`]: recognized fields staged in the session store,
///   waiting for user confirmation; carries a staging token and provenance
/// - [`BookRecord`]: a durably committed row in a tenant datastore;
///   never mutated after creation
///
/// # Example
///
/// ```
/// use inkshelf_shared::models::{BookFields, PendingRecord};
///
/// let fields = BookFields {
///     author: "Frank Herbert".to_string(),
///     title: "Dune".to_string(),
///     publication_year: 1965,
///     category: "Science Fiction".to_string(),
///     publisher: "Chilton Books".to_string(),
/// };
///
/// let pending = PendingRecord::new(fields, "file-abc123.jpg");
/// assert_eq!(pending.fields.title, "Dune");
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Structured bibliographic fields produced by the recognition collaborator
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookFields {
    /// Author name(s) as printed on the page
    pub author: String,

    /// Book title
    pub title: String,

    /// Publication year; 0 when the page carried no parseable year
    pub publication_year: i64,

    /// Category or genre
    pub category: String,

    /// Publisher name
    pub publisher: String,
}

/// A recognized-but-unconfirmed record staged in the session store
///
/// Exists only inside a user's session entry. Destroyed on TTL expiry,
/// on replacement by a newer recognition, or on successful commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingRecord {
    /// Staging token; a commit clears the pending entry only if the
    /// session still holds this token
    pub token: Uuid,

    /// The recognized fields
    pub fields: BookFields,

    /// Provenance: reference to the source image
    pub image_ref: String,

    /// When the record was staged
    pub staged_at: DateTime<Utc>,
}

impl PendingRecord {
    /// Stages freshly recognized fields with a new token
    pub fn new(fields: BookFields, image_ref: impl Into<String>) -> Self {
        PendingRecord {
            token: Uuid::new_v4(),
            fields,
            image_ref: image_ref.into(),
            staged_at: Utc::now(),
        }
    }
}

/// A committed row in a tenant datastore
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct BookRecord {
    /// Unique record ID (UUID v4, stored as text)
    pub id: String,

    /// Author name(s)
    pub author: String,

    /// Book title
    pub title: String,

    /// Publication year; 0 when unknown
    pub publication_year: i64,

    /// Category or genre
    pub category: String,

    /// Publisher name
    pub publisher: String,

    /// Identifier of the user who confirmed the record
    pub user_id: String,

    /// When the record was committed
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_fields() -> BookFields {
        BookFields {
            author: "Frank Herbert".to_string(),
            title: "Dune".to_string(),
            publication_year: 1965,
            category: "Science Fiction".to_string(),
            publisher: "Chilton Books".to_string(),
        }
    }

    #[test]
    fn test_pending_record_carries_fresh_token() {
        let a = PendingRecord::new(sample_fields(), "img-1.jpg");
        let b = PendingRecord::new(sample_fields(), "img-1.jpg");
        assert_ne!(a.token, b.token);
        assert_eq!(a.image_ref, "img-1.jpg");
    }

    #[test]
    fn test_pending_record_roundtrips_through_json() {
        let pending = PendingRecord::new(sample_fields(), "img-2.jpg");
        let json = serde_json::to_string(&pending).unwrap();
        let back: PendingRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.token, pending.token);
        assert_eq!(back.fields, pending.fields);
        assert_eq!(back.staged_at, pending.staged_at);
    }

    #[test]
    fn test_book_fields_default_year_is_zero() {
        let fields = BookFields::default();
        assert_eq!(fields.publication_year, 0);
        assert!(fields.author.is_empty());
    }
}
