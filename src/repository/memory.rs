//! In-memory Entity Store
//!
//! Used for local runs without a database and by the test suites. A unit of
//! work holds the store lock for its whole lifetime and edits a private copy of
//! the state, written back only on `commit`.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{EntityStore, UnitOfWork};
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

#[derive(Debug, Clone, Default)]
struct Sequences {
    authors: i64,
    books: i64,
    users: i64,
    profiles: i64,
    loans: i64,
}

fn next(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

#[derive(Debug, Clone, Default)]
struct MemoryState {
    authors: BTreeMap<i64, Author>,
    books: BTreeMap<i64, Book>,
    /// (book_id, author_id)
    book_authors: BTreeSet<(i64, i64)>,
    users: BTreeMap<i64, User>,
    profiles: BTreeMap<i64, UserProfile>,
    loans: BTreeMap<i64, Loan>,
    sequences: Sequences,
}

/// Same integrity rules the SQL schema declares
fn constraint(message: impl Into<String>) -> AppError {
    AppError::Internal(format!("constraint violation: {}", message.into()))
}

fn not_found(what: &str, id: i64) -> AppError {
    AppError::NotFound(format!("{} with id {} not found", what, id))
}

fn check_copies(book: &Book) -> AppResult<()> {
    if book.total_copies < 1 || book.available_copies < 0 || book.available_copies > book.total_copies {
        return Err(constraint(format!(
            "book {} copies {}/{}",
            book.id, book.available_copies, book.total_copies
        )));
    }
    Ok(())
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn begin(&self) -> AppResult<Box<dyn UnitOfWork>> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryUnitOfWork {
            guard: Some(guard),
            working,
        }))
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

pub struct MemoryUnitOfWork {
    guard: Option<OwnedMutexGuard<MemoryState>>,
    working: MemoryState,
}

impl MemoryUnitOfWork {
    fn state(&mut self) -> AppResult<&mut MemoryState> {
        if self.guard.is_none() {
            return Err(AppError::Internal("Unit of work already committed".to_string()));
        }
        Ok(&mut self.working)
    }
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn find_author(&mut self, id: i64) -> AppResult<Option<Author>> {
        Ok(self.state()?.authors.get(&id).cloned())
    }

    async fn list_authors(&mut self) -> AppResult<Vec<Author>> {
        Ok(self.state()?.authors.values().cloned().collect())
    }

    async fn insert_author(&mut self, data: &CreateAuthor) -> AppResult<Author> {
        let state = self.state()?;
        let author = Author {
            id: next(&mut state.sequences.authors),
            name: data.name.clone(),
        };
        state.authors.insert(author.id, author.clone());
        Ok(author)
    }

    async fn update_author(&mut self, author: &Author) -> AppResult<()> {
        let slot = self
            .state()?
            .authors
            .get_mut(&author.id)
            .ok_or_else(|| not_found("Author", author.id))?;
        *slot = author.clone();
        Ok(())
    }

    async fn delete_author(&mut self, id: i64) -> AppResult<()> {
        let state = self.state()?;
        if state.book_authors.iter().any(|&(_, a)| a == id) {
            return Err(constraint(format!("author {} is still linked to books", id)));
        }
        state.authors.remove(&id).map(|_| ()).ok_or_else(|| not_found("Author", id))
    }

    async fn find_book(&mut self, id: i64) -> AppResult<Option<Book>> {
        Ok(self.state()?.books.get(&id).cloned())
    }

    async fn lock_book(&mut self, id: i64) -> AppResult<Option<Book>> {
        // The whole store is already locked by this unit of work
        self.find_book(id).await
    }

    async fn find_book_by_isbn(&mut self, isbn: &str) -> AppResult<Option<Book>> {
        Ok(self.state()?.books.values().find(|b| b.isbn == isbn).cloned())
    }

    async fn list_books(&mut self) -> AppResult<Vec<Book>> {
        Ok(self.state()?.books.values().cloned().collect())
    }

    async fn insert_book(&mut self, data: &CreateBook) -> AppResult<Book> {
        let state = self.state()?;
        if state.books.values().any(|b| b.isbn == data.isbn) {
            return Err(constraint(format!("duplicate isbn {}", data.isbn)));
        }
        let book = Book {
            id: next(&mut state.sequences.books),
            title: data.title.clone(),
            isbn: data.isbn.clone(),
            total_copies: data.total_copies,
            available_copies: data.total_copies,
        };
        check_copies(&book)?;
        state.books.insert(book.id, book.clone());
        Ok(book)
    }

    async fn update_book(&mut self, book: &Book) -> AppResult<()> {
        check_copies(book)?;
        let slot = self
            .state()?
            .books
            .get_mut(&book.id)
            .ok_or_else(|| not_found("Book", book.id))?;
        *slot = book.clone();
        Ok(())
    }

    async fn delete_book(&mut self, id: i64) -> AppResult<()> {
        let state = self.state()?;
        if state.loans.values().any(|l| l.book_id == id) {
            return Err(constraint(format!("book {} is referenced by loans", id)));
        }
        if state.book_authors.iter().any(|&(b, _)| b == id) {
            return Err(constraint(format!("book {} is still linked to authors", id)));
        }
        state.books.remove(&id).map(|_| ()).ok_or_else(|| not_found("Book", id))
    }

    async fn author_ids_for_book(&mut self, book_id: i64) -> AppResult<Vec<i64>> {
        Ok(self
            .state()?
            .book_authors
            .iter()
            .filter(|&&(b, _)| b == book_id)
            .map(|&(_, a)| a)
            .collect())
    }

    async fn book_ids_for_author(&mut self, author_id: i64) -> AppResult<Vec<i64>> {
        let mut ids: Vec<i64> = self
            .state()?
            .book_authors
            .iter()
            .filter(|&&(_, a)| a == author_id)
            .map(|&(b, _)| b)
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }

    async fn link_author(&mut self, book_id: i64, author_id: i64) -> AppResult<()> {
        let state = self.state()?;
        if !state.books.contains_key(&book_id) || !state.authors.contains_key(&author_id) {
            return Err(constraint(format!("link ({}, {}) references a missing record", book_id, author_id)));
        }
        state.book_authors.insert((book_id, author_id));
        Ok(())
    }

    async fn unlink_author(&mut self, book_id: i64, author_id: i64) -> AppResult<()> {
        self.state()?.book_authors.remove(&(book_id, author_id));
        Ok(())
    }

    async fn find_user(&mut self, id: i64) -> AppResult<Option<User>> {
        Ok(self.state()?.users.get(&id).cloned())
    }

    async fn find_user_by_email(&mut self, email: &str) -> AppResult<Option<User>> {
        Ok(self
            .state()?
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn list_users(&mut self) -> AppResult<Vec<User>> {
        Ok(self.state()?.users.values().cloned().collect())
    }

    async fn insert_user(&mut self, data: &CreateUser) -> AppResult<User> {
        let state = self.state()?;
        if state.users.values().any(|u| u.email.eq_ignore_ascii_case(&data.email)) {
            return Err(constraint(format!("duplicate email {}", data.email)));
        }
        let user = User {
            id: next(&mut state.sequences.users),
            email: data.email.clone(),
            full_name: data.full_name.clone(),
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_user(&mut self, user: &User) -> AppResult<()> {
        let slot = self
            .state()?
            .users
            .get_mut(&user.id)
            .ok_or_else(|| not_found("User", user.id))?;
        *slot = user.clone();
        Ok(())
    }

    async fn delete_user(&mut self, id: i64) -> AppResult<()> {
        let state = self.state()?;
        if state.loans.values().any(|l| l.user_id == id) {
            return Err(constraint(format!("user {} is referenced by loans", id)));
        }
        if state.profiles.values().any(|p| p.user_id == id) {
            return Err(constraint(format!("user {} is referenced by a profile", id)));
        }
        state.users.remove(&id).map(|_| ()).ok_or_else(|| not_found("User", id))
    }

    async fn find_profile(&mut self, id: i64) -> AppResult<Option<UserProfile>> {
        Ok(self.state()?.profiles.get(&id).cloned())
    }

    async fn find_profile_by_user(&mut self, user_id: i64) -> AppResult<Option<UserProfile>> {
        Ok(self
            .state()?
            .profiles
            .values()
            .find(|p| p.user_id == user_id)
            .cloned())
    }

    async fn insert_profile(&mut self, user_id: i64, data: &CreateProfile) -> AppResult<UserProfile> {
        let state = self.state()?;
        if !state.users.contains_key(&user_id) {
            return Err(constraint(format!("profile references missing user {}", user_id)));
        }
        if state.profiles.values().any(|p| p.user_id == user_id) {
            return Err(constraint(format!("user {} already owns a profile", user_id)));
        }
        let profile = UserProfile {
            id: next(&mut state.sequences.profiles),
            user_id,
            address: data.address.clone(),
            phone: data.phone.clone(),
        };
        state.profiles.insert(profile.id, profile.clone());
        Ok(profile)
    }

    async fn update_profile(&mut self, profile: &UserProfile) -> AppResult<()> {
        let slot = self
            .state()?
            .profiles
            .get_mut(&profile.id)
            .ok_or_else(|| not_found("Profile", profile.id))?;
        *slot = profile.clone();
        Ok(())
    }

    async fn delete_profile(&mut self, id: i64) -> AppResult<()> {
        self.state()?
            .profiles
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| not_found("Profile", id))
    }

    async fn find_loan(&mut self, id: i64) -> AppResult<Option<Loan>> {
        Ok(self.state()?.loans.get(&id).cloned())
    }

    async fn list_loans(&mut self) -> AppResult<Vec<Loan>> {
        Ok(self.state()?.loans.values().cloned().collect())
    }

    async fn loans_for_user(&mut self, user_id: i64) -> AppResult<Vec<Loan>> {
        let mut loans: Vec<Loan> = self
            .state()?
            .loans
            .values()
            .filter(|l| l.user_id == user_id)
            .cloned()
            .collect();
        loans.sort_by_key(|l| (l.loan_date, l.id));
        Ok(loans)
    }

    async fn count_loans_for_book(&mut self, book_id: i64) -> AppResult<i64> {
        Ok(self.state()?.loans.values().filter(|l| l.book_id == book_id).count() as i64)
    }

    async fn insert_loan(&mut self, loan: &NewLoan) -> AppResult<Loan> {
        let state = self.state()?;
        if !state.users.contains_key(&loan.user_id) || !state.books.contains_key(&loan.book_id) {
            return Err(constraint("loan references a missing user or book"));
        }
        let created = Loan {
            id: next(&mut state.sequences.loans),
            user_id: loan.user_id,
            book_id: loan.book_id,
            loan_date: loan.loan_date,
            due_date: loan.due_date,
            return_date: None,
        };
        state.loans.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_loan(&mut self, loan: &Loan) -> AppResult<()> {
        let slot = self
            .state()?
            .loans
            .get_mut(&loan.id)
            .ok_or_else(|| not_found("Loan", loan.id))?;
        *slot = loan.clone();
        Ok(())
    }

    async fn delete_loan(&mut self, id: i64) -> AppResult<()> {
        self.state()?
            .loans
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| not_found("Loan", id))
    }

    async fn commit(&mut self) -> AppResult<()> {
        let mut guard = self
            .guard
            .take()
            .ok_or_else(|| AppError::Internal("Unit of work already committed".to_string()))?;
        *guard = std::mem::take(&mut self.working);
        Ok(())
    }
}
