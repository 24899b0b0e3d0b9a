/// Recognizer contract and card parsing
///
/// A recognizer turns an image reference (the first page of a book) into
/// [`BookFields`]. Providers answer with a line-oriented card:
///
/// ```text
/// Author: Frank Herbert
/// Title: Dune
/// Year: 1965
/// Category: Science Fiction
/// Publisher: Chilton Books
/// ```
///
/// [`parse_card`] maps labeled lines into fields. Unknown lines are
/// ignored and a non-numeric year parses as 0.

use async_trait::async_trait;
use inkshelf_shared::models::BookFields;
use thiserror::Error;

/// Recognition errors; opaque to the workflow
#[derive(Error, Debug)]
pub enum RecognitionError {
    /// Provider call failed (network, auth, malformed answer)
    #[error("recognition provider error: {0}")]
    Provider(String),
}

/// Recognition result type alias
pub type RecognitionResult<T> = Result<T, RecognitionError>;

/// Turns an image reference into structured book fields
#[async_trait]
pub trait Recognizer: Send + Sync {
    /// Returns the recognizer name, for logging
    fn name(&self) -> &str;

    /// Recognizes the book on the referenced image
    async fn recognize(&self, image_ref: &str) -> RecognitionResult<BookFields>;
}

/// Parses a provider card into book fields
pub fn parse_card(text: &str) -> BookFields {
    let mut fields = BookFields::default();

    for line in text.lines() {
        let Some((label, value)) = line.split_once(": ") else {
            continue;
        };
        let value = value.trim();
        match label.trim() {
            "Author" => fields.author = value.to_string(),
            "Title" => fields.title = value.to_string(),
            "Year" => fields.publication_year = value.parse().unwrap_or(0),
            "Category" => fields.category = value.to_string(),
            "Publisher" => fields.publisher = value.to_string(),
            _ => {}
        }
    }

    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_card() {
        let card = "Author: Frank Herbert\n\
                    Title: Dune\n\
                    Year: 1965\n\
                    Category: Science Fiction\n\
                    Publisher: Chilton Books";

        let fields = parse_card(card);
        assert_eq!(fields.author, "Frank Herbert");
        assert_eq!(fields.title, "Dune");
        assert_eq!(fields.publication_year, 1965);
        assert_eq!(fields.category, "Science Fiction");
        assert_eq!(fields.publisher, "Chilton Books");
    }

    #[test]
    fn test_parse_skips_unknown_lines_and_chatter() {
        let card = "Here is the card you asked for:\n\
                    Author: Isaac Asimov\n\
                    Title: Foundation\n\
                    ISBN: 978-0-553-29335-7\n\
                    Year: 1951";

        let fields = parse_card(card);
        assert_eq!(fields.author, "Isaac Asimov");
        assert_eq!(fields.title, "Foundation");
        assert_eq!(fields.publication_year, 1951);
        assert!(fields.category.is_empty());
    }

    #[test]
    fn test_parse_non_numeric_year_becomes_zero() {
        let fields = parse_card("Title: Dune\nYear: unknown");
        assert_eq!(fields.publication_year, 0);
    }

    #[test]
    fn test_parse_empty_card_yields_defaults() {
        let fields = parse_card("");
        assert_eq!(fields, BookFields::default());
    }
}
