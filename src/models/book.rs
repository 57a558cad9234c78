//! Book model and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Book record as persisted.
///
/// `0 <= available_copies <= total_copies` must hold after every unit of work;
/// copy counts are only changed through [`crate::services::inventory`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub isbn: String,
    pub total_copies: i32,
    pub available_copies: i32,
}

impl Book {
    /// Copies currently out on loan
    pub fn borrowed_copies(&self) -> i32 {
        self.total_copies - self.available_copies
    }
}

/// Book with its author associations, as exposed by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookDetails {
    pub id: i64,
    pub title: String,
    pub isbn: String,
    pub total_copies: i32,
    pub available_copies: i32,
    /// Sorted ids of the linked authors
    pub author_ids: Vec<i64>,
}

impl BookDetails {
    pub fn new(book: Book, mut author_ids: Vec<i64>) -> Self {
        author_ids.sort_unstable();
        author_ids.dedup();
        Self {
            id: book.id,
            title: book.title,
            isbn: book.isbn,
            total_copies: book.total_copies,
            available_copies: book.available_copies,
            author_ids,
        }
    }
}

/// Create book request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBook {
    #[validate(length(min = 1, max = 255, message = "Title is required, at most 255 characters"))]
    pub title: String,
    #[validate(length(min = 1, max = 32, message = "ISBN is required, at most 32 characters"))]
    pub isbn: String,
    #[validate(range(min = 1, message = "A book has at least one copy"))]
    pub total_copies: i32,
}

/// Update book request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBook {
    #[validate(length(min = 1, max = 255, message = "Title is required, at most 255 characters"))]
    pub title: String,
    #[validate(range(min = 1, message = "A book has at least one copy"))]
    pub total_copies: i32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_details_sort_author_ids() {
        let book = Book {
            id: 1,
            title: "Dune".into(),
            isbn: "9780441013593".into(),
            total_copies: 3,
            available_copies: 1,
        };
        assert_eq!(book.borrowed_copies(), 2);

        let details = BookDetails::new(book, vec![7, 2, 7]);
        assert_eq!(details.author_ids, vec![2, 7]);

        let json = serde_json::to_value(&details).unwrap();
        assert_eq!(json["availableCopies"], 1);
        assert_eq!(json["authorIds"], serde_json::json!([2, 7]));
    }

    #[test]
    fn test_create_requires_one_copy() {
        let request = CreateBook {
            title: "Dune".into(),
            isbn: "123".into(),
            total_copies: 0,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_text_fits_the_columns() {
        let request = CreateBook {
            title: "Dune".into(),
            isbn: "9".repeat(40),
            total_copies: 1,
        };
        assert!(request.validate().is_err());

        let request = UpdateBook {
            title: "x".repeat(256),
            total_copies: 1,
        };
        assert!(request.validate().is_err());

        let request = CreateBook {
            title: "x".repeat(255),
            isbn: "9".repeat(32),
            total_copies: 1,
        };
        assert!(request.validate().is_ok());
    }
}
