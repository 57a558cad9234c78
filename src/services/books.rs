//! Book catalog service: CRUD, copy-count resizing and author links

use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{CreateBook, UpdateBook},
        require_text, Book, BookDetails,
    },
    repository::{EntityStore, UnitOfWork},
};

use super::inventory;

#[derive(Clone)]
pub struct BooksService {
    store: Arc<dyn EntityStore>,
}

async fn with_authors(uow: &mut dyn UnitOfWork, book: Book) -> AppResult<BookDetails> {
    let author_ids = uow.author_ids_for_book(book.id).await?;
    Ok(BookDetails::new(book, author_ids))
}

impl BooksService {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    /// Create a book with every copy available. The ISBN must be unused.
    pub async fn create(&self, data: &CreateBook) -> AppResult<BookDetails> {
        require_text("title", &data.title)?;
        require_text("isbn", &data.isbn)?;

        let mut uow = self.store.begin().await?;
        if uow.find_book_by_isbn(&data.isbn).await?.is_some() {
            return Err(AppError::Validation(format!("ISBN already exists: {}", data.isbn)));
        }
        let book = uow.insert_book(data).await?;
        uow.commit().await?;

        tracing::info!("Book created: id={} isbn={} copies={}", book.id, book.isbn, book.total_copies);
        Ok(BookDetails::new(book, Vec::new()))
    }

    pub async fn get_by_id(&self, id: i64) -> AppResult<BookDetails> {
        let mut uow = self.store.begin().await?;
        let book = uow.get_book(id).await?;
        let details = with_authors(&mut *uow, book).await?;
        Ok(details)
    }

    pub async fn list(&self) -> AppResult<Vec<BookDetails>> {
        let mut uow = self.store.begin().await?;
        let books = uow.list_books().await?;

        let mut result = Vec::with_capacity(books.len());
        for book in books {
            result.push(with_authors(&mut *uow, book).await?);
        }
        Ok(result)
    }

    /// Retitle a book and resize its stock
    pub async fn update(&self, id: i64, data: &UpdateBook) -> AppResult<BookDetails> {
        require_text("title", &data.title)?;

        let mut uow = self.store.begin().await?;
        let mut book = uow.get_book_locked(id).await?;

        if let Err(e) = inventory::resize_total_copies(&mut book, data.total_copies) {
            tracing::warn!("Book {} resize to {} rejected: {}", id, data.total_copies, e);
            return Err(e);
        }
        book.title = data.title.clone();

        uow.update_book(&book).await?;
        let details = with_authors(&mut *uow, book).await?;
        uow.commit().await?;
        Ok(details)
    }

    /// Delete a book. Books with loan records are kept so loan history stays intact.
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        let mut uow = self.store.begin().await?;
        uow.get_book(id).await?;

        let loans = uow.count_loans_for_book(id).await?;
        if loans > 0 {
            return Err(AppError::State(format!(
                "Book {} is referenced by {} loan(s) and cannot be deleted",
                id, loans
            )));
        }

        let author_ids = uow.author_ids_for_book(id).await?;
        for author_id in author_ids {
            uow.unlink_author(id, author_id).await?;
        }
        uow.delete_book(id).await?;
        uow.commit().await?;

        tracing::info!("Book deleted: id={}", id);
        Ok(())
    }

    /// Link an author to a book. Linking twice is a no-op.
    pub async fn add_author(&self, book_id: i64, author_id: i64) -> AppResult<BookDetails> {
        let mut uow = self.store.begin().await?;
        let book = uow.get_book(book_id).await?;
        uow.get_author(author_id).await?;

        uow.link_author(book_id, author_id).await?;
        let details = with_authors(&mut *uow, book).await?;
        uow.commit().await?;

        tracing::info!("Author {} linked to book {}", author_id, book_id);
        Ok(details)
    }

    /// Unlink an author from a book. Missing links are ignored.
    pub async fn remove_author(&self, book_id: i64, author_id: i64) -> AppResult<BookDetails> {
        let mut uow = self.store.begin().await?;
        let book = uow.get_book(book_id).await?;
        uow.get_author(author_id).await?;

        uow.unlink_author(book_id, author_id).await?;
        let details = with_authors(&mut *uow, book).await?;
        uow.commit().await?;

        tracing::info!("Author {} unlinked from book {}", author_id, book_id);
        Ok(details)
    }
}
