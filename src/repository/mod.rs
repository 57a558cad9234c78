//! Repository layer: the Entity Store contract and its backends
//!
//! Every service operation opens one [`UnitOfWork`], performs its reads and
//! writes through it and commits. A unit of work dropped before `commit` leaves
//! the store untouched.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::{
    error::{AppError, AppResult},
    models::{
        author::CreateAuthor,
        book::CreateBook,
        loan::NewLoan,
        profile::CreateProfile,
        user::CreateUser,
        Author, Book, Loan, User, UserProfile,
    },
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Handle on the persistent store
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Open an atomic unit of work
    async fn begin(&self) -> AppResult<Box<dyn UnitOfWork>>;

    /// Check that the store is reachable
    async fn ping(&self) -> AppResult<()>;
}

/// Reads and writes applied together on `commit`, or not at all
#[async_trait]
pub trait UnitOfWork: Send {
    // Authors
    async fn find_author(&mut self, id: i64) -> AppResult<Option<Author>>;
    async fn list_authors(&mut self) -> AppResult<Vec<Author>>;
    async fn insert_author(&mut self, data: &CreateAuthor) -> AppResult<Author>;
    async fn update_author(&mut self, author: &Author) -> AppResult<()>;
    async fn delete_author(&mut self, id: i64) -> AppResult<()>;

    // Books
    async fn find_book(&mut self, id: i64) -> AppResult<Option<Book>>;
    /// Load a book and hold it against concurrent copy-count changes until commit
    async fn lock_book(&mut self, id: i64) -> AppResult<Option<Book>>;
    async fn find_book_by_isbn(&mut self, isbn: &str) -> AppResult<Option<Book>>;
    async fn list_books(&mut self) -> AppResult<Vec<Book>>;
    async fn insert_book(&mut self, data: &CreateBook) -> AppResult<Book>;
    async fn update_book(&mut self, book: &Book) -> AppResult<()>;
    async fn delete_book(&mut self, id: i64) -> AppResult<()>;

    // Book <-> author association table
    async fn author_ids_for_book(&mut self, book_id: i64) -> AppResult<Vec<i64>>;
    async fn book_ids_for_author(&mut self, author_id: i64) -> AppResult<Vec<i64>>;
    /// Insert the pair; no-op when already present
    async fn link_author(&mut self, book_id: i64, author_id: i64) -> AppResult<()>;
    /// Remove the pair; no-op when absent
    async fn unlink_author(&mut self, book_id: i64, author_id: i64) -> AppResult<()>;

    // Users
    async fn find_user(&mut self, id: i64) -> AppResult<Option<User>>;
    async fn find_user_by_email(&mut self, email: &str) -> AppResult<Option<User>>;
    async fn list_users(&mut self) -> AppResult<Vec<User>>;
    async fn insert_user(&mut self, data: &CreateUser) -> AppResult<User>;
    async fn update_user(&mut self, user: &User) -> AppResult<()>;
    async fn delete_user(&mut self, id: i64) -> AppResult<()>;

    // Profiles
    async fn find_profile(&mut self, id: i64) -> AppResult<Option<UserProfile>>;
    async fn find_profile_by_user(&mut self, user_id: i64) -> AppResult<Option<UserProfile>>;
    async fn insert_profile(&mut self, user_id: i64, data: &CreateProfile) -> AppResult<UserProfile>;
    async fn update_profile(&mut self, profile: &UserProfile) -> AppResult<()>;
    async fn delete_profile(&mut self, id: i64) -> AppResult<()>;

    // Loans
    async fn find_loan(&mut self, id: i64) -> AppResult<Option<Loan>>;
    async fn list_loans(&mut self) -> AppResult<Vec<Loan>>;
    async fn loans_for_user(&mut self, user_id: i64) -> AppResult<Vec<Loan>>;
    async fn count_loans_for_book(&mut self, book_id: i64) -> AppResult<i64>;
    async fn insert_loan(&mut self, loan: &NewLoan) -> AppResult<Loan>;
    async fn update_loan(&mut self, loan: &Loan) -> AppResult<()>;
    async fn delete_loan(&mut self, id: i64) -> AppResult<()>;

    /// Apply every write of this unit of work
    async fn commit(&mut self) -> AppResult<()>;

    // Loaders that turn a missing record into NotFound

    async fn get_author(&mut self, id: i64) -> AppResult<Author> {
        self.find_author(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Author with id {} not found", id)))
    }

    async fn get_book(&mut self, id: i64) -> AppResult<Book> {
        self.find_book(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    async fn get_book_locked(&mut self, id: i64) -> AppResult<Book> {
        self.lock_book(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    async fn get_user(&mut self, id: i64) -> AppResult<User> {
        self.find_user(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    async fn get_profile(&mut self, id: i64) -> AppResult<UserProfile> {
        self.find_profile(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Profile with id {} not found", id)))
    }

    async fn get_loan(&mut self, id: i64) -> AppResult<Loan> {
        self.find_loan(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", id)))
    }
}
