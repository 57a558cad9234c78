//! Data models for the library

pub mod author;
pub mod book;
pub mod loan;
pub mod profile;
pub mod user;

// Re-export commonly used types
pub use author::Author;
pub use book::{Book, BookDetails};
pub use loan::{Loan, LoanStatus};
pub use profile::UserProfile;
pub use user::User;

use crate::error::{AppError, AppResult};

/// Reject values that are empty once surrounding whitespace is removed.
///
/// `validator` only checks lengths, so a title of `"   "` would otherwise pass.
pub fn require_text(field: &str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{} must not be blank", field)));
    }
    Ok(())
}
