//! Copy-count rules for books
//!
//! These functions are the only place where `total_copies` and
//! `available_copies` change. They edit the record in place and leave it
//! untouched when they fail; persisting is up to the caller.

use crate::{
    error::{AppError, AppResult},
    models::Book,
};

/// Take one copy out for a loan
pub fn reserve_copy(book: &mut Book) -> AppResult<()> {
    if book.available_copies <= 0 {
        return Err(AppError::Capacity(format!(
            "Book {} is not available for loan",
            book.id
        )));
    }
    book.available_copies -= 1;
    Ok(())
}

/// Put one copy back after a return or the deletion of an active loan.
///
/// Fails when every copy is already on the shelf: a release without a matching
/// reservation would push `available_copies` past `total_copies`.
pub fn release_copy(book: &mut Book) -> AppResult<()> {
    if book.available_copies >= book.total_copies {
        return Err(AppError::State(format!(
            "Book {} has no borrowed copy to release",
            book.id
        )));
    }
    book.available_copies += 1;
    Ok(())
}

/// Change the number of copies owned, moving `available_copies` by the same delta
pub fn resize_total_copies(book: &mut Book, new_total: i32) -> AppResult<()> {
    if new_total < 1 {
        return Err(AppError::Validation(
            "A book has at least one copy".to_string(),
        ));
    }

    let delta = new_total - book.total_copies;
    if delta < 0 {
        let borrowed = book.borrowed_copies();
        if new_total < borrowed {
            return Err(AppError::Capacity(format!(
                "Cannot reduce total copies below currently borrowed count ({} < {})",
                new_total, borrowed
            )));
        }
    }

    book.total_copies = new_total;
    book.available_copies += delta;
    Ok(())
}
