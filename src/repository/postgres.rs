//! PostgreSQL-backed Entity Store (sqlx)

use async_trait::async_trait;
use sqlx::{PgConnection, Pool, Postgres, Transaction};

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

const BOOK_COLUMNS: &str = "id, title, isbn, total_copies, available_copies";
const LOAN_COLUMNS: &str = "id, user_id, book_id, loan_date, due_date, return_date";

#[derive(Clone)]
pub struct PgStore {
    pool: Pool<Postgres>,
}

impl PgStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EntityStore for PgStore {
    async fn begin(&self) -> AppResult<Box<dyn UnitOfWork>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgUnitOfWork { tx: Some(tx) }))
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// One database transaction. Dropping it without `commit` rolls back.
pub struct PgUnitOfWork {
    tx: Option<Transaction<'static, Postgres>>,
}

impl PgUnitOfWork {
    fn conn(&mut self) -> AppResult<&mut PgConnection> {
        self.tx
            .as_deref_mut()
            .ok_or_else(|| AppError::Internal("Unit of work already committed".to_string()))
    }
}

/// Turn a zero-row UPDATE/DELETE into a NotFound error
fn expect_row(rows_affected: u64, what: &str, id: i64) -> AppResult<()> {
    if rows_affected == 0 {
        return Err(AppError::NotFound(format!("{} with id {} not found", what, id)));
    }
    Ok(())
}

const UNIQUE_VIOLATION: &str = "23505";

/// Map a unique-index violation to `conflict`, anything else to a database error.
/// Covers inserts that lose a race against the service-level duplicate check.
fn on_unique_violation(err: sqlx::Error, conflict: impl FnOnce() -> AppError) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => conflict(),
        _ => AppError::Database(err),
    }
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn find_author(&mut self, id: i64) -> AppResult<Option<Author>> {
        let author = sqlx::query_as::<_, Author>("SELECT id, name FROM authors WHERE id = $1")
            .bind(id)
            .fetch_optional(self.conn()?)
            .await?;
        Ok(author)
    }

    async fn list_authors(&mut self) -> AppResult<Vec<Author>> {
        let authors = sqlx::query_as::<_, Author>("SELECT id, name FROM authors ORDER BY id")
            .fetch_all(self.conn()?)
            .await?;
        Ok(authors)
    }

    async fn insert_author(&mut self, data: &CreateAuthor) -> AppResult<Author> {
        let author = sqlx::query_as::<_, Author>(
            "INSERT INTO authors (name) VALUES ($1) RETURNING id, name",
        )
        .bind(&data.name)
        .fetch_one(self.conn()?)
        .await?;
        Ok(author)
    }

    async fn update_author(&mut self, author: &Author) -> AppResult<()> {
        let result = sqlx::query("UPDATE authors SET name = $1 WHERE id = $2")
            .bind(&author.name)
            .bind(author.id)
            .execute(self.conn()?)
            .await?;
        expect_row(result.rows_affected(), "Author", author.id)
    }

    async fn delete_author(&mut self, id: i64) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM authors WHERE id = $1")
            .bind(id)
            .execute(self.conn()?)
            .await?;
        expect_row(result.rows_affected(), "Author", id)
    }

    async fn find_book(&mut self, id: i64) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>(&format!("SELECT {} FROM books WHERE id = $1", BOOK_COLUMNS))
            .bind(id)
            .fetch_optional(self.conn()?)
            .await?;
        Ok(book)
    }

    async fn lock_book(&mut self, id: i64) -> AppResult<Option<Book>> {
        // Row lock held until the transaction ends, so two loans cannot both
        // take the last copy.
        let book = sqlx::query_as::<_, Book>(&format!(
            "SELECT {} FROM books WHERE id = $1 FOR UPDATE",
            BOOK_COLUMNS
        ))
        .bind(id)
        .fetch_optional(self.conn()?)
        .await?;
        Ok(book)
    }

    async fn find_book_by_isbn(&mut self, isbn: &str) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>(&format!("SELECT {} FROM books WHERE isbn = $1", BOOK_COLUMNS))
            .bind(isbn)
            .fetch_optional(self.conn()?)
            .await?;
        Ok(book)
    }

    async fn list_books(&mut self) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(&format!("SELECT {} FROM books ORDER BY id", BOOK_COLUMNS))
            .fetch_all(self.conn()?)
            .await?;
        Ok(books)
    }

    async fn insert_book(&mut self, data: &CreateBook) -> AppResult<Book> {
        let book = sqlx::query_as::<_, Book>(&format!(
            r#"
            INSERT INTO books (title, isbn, total_copies, available_copies)
            VALUES ($1, $2, $3, $3)
            RETURNING {}
            "#,
            BOOK_COLUMNS
        ))
        .bind(&data.title)
        .bind(&data.isbn)
        .bind(data.total_copies)
        .fetch_one(self.conn()?)
        .await
        .map_err(|e| {
            on_unique_violation(e, || {
                AppError::Validation(format!("ISBN already exists: {}", data.isbn))
            })
        })?;
        Ok(book)
    }

    async fn update_book(&mut self, book: &Book) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE books
            SET title = $1, total_copies = $2, available_copies = $3
            WHERE id = $4
            "#,
        )
        .bind(&book.title)
        .bind(book.total_copies)
        .bind(book.available_copies)
        .bind(book.id)
        .execute(self.conn()?)
        .await?;
        expect_row(result.rows_affected(), "Book", book.id)
    }

    async fn delete_book(&mut self, id: i64) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(self.conn()?)
            .await?;
        expect_row(result.rows_affected(), "Book", id)
    }

    async fn author_ids_for_book(&mut self, book_id: i64) -> AppResult<Vec<i64>> {
        let ids = sqlx::query_scalar::<_, i64>(
            "SELECT author_id FROM book_authors WHERE book_id = $1 ORDER BY author_id",
        )
        .bind(book_id)
        .fetch_all(self.conn()?)
        .await?;
        Ok(ids)
    }

    async fn book_ids_for_author(&mut self, author_id: i64) -> AppResult<Vec<i64>> {
        let ids = sqlx::query_scalar::<_, i64>(
            "SELECT book_id FROM book_authors WHERE author_id = $1 ORDER BY book_id",
        )
        .bind(author_id)
        .fetch_all(self.conn()?)
        .await?;
        Ok(ids)
    }

    async fn link_author(&mut self, book_id: i64, author_id: i64) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO book_authors (book_id, author_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(book_id)
        .bind(author_id)
        .execute(self.conn()?)
        .await?;
        Ok(())
    }

    async fn unlink_author(&mut self, book_id: i64, author_id: i64) -> AppResult<()> {
        sqlx::query("DELETE FROM book_authors WHERE book_id = $1 AND author_id = $2")
            .bind(book_id)
            .bind(author_id)
            .execute(self.conn()?)
            .await?;
        Ok(())
    }

    async fn find_user(&mut self, id: i64) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT id, email, full_name FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(self.conn()?)
            .await?;
        Ok(user)
    }

    async fn find_user_by_email(&mut self, email: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, full_name FROM users WHERE LOWER(email) = LOWER($1)",
        )
        .bind(email)
        .fetch_optional(self.conn()?)
        .await?;
        Ok(user)
    }

    async fn list_users(&mut self) -> AppResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>("SELECT id, email, full_name FROM users ORDER BY id")
            .fetch_all(self.conn()?)
            .await?;
        Ok(users)
    }

    async fn insert_user(&mut self, data: &CreateUser) -> AppResult<User> {
        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (email, full_name) VALUES ($1, $2) RETURNING id, email, full_name",
        )
        .bind(&data.email)
        .bind(&data.full_name)
        .fetch_one(self.conn()?)
        .await
        .map_err(|e| {
            on_unique_violation(e, || {
                AppError::Validation(format!("Email already exists: {}", data.email))
            })
        })?;
        Ok(user)
    }

    async fn update_user(&mut self, user: &User) -> AppResult<()> {
        let result = sqlx::query("UPDATE users SET email = $1, full_name = $2 WHERE id = $3")
            .bind(&user.email)
            .bind(&user.full_name)
            .bind(user.id)
            .execute(self.conn()?)
            .await?;
        expect_row(result.rows_affected(), "User", user.id)
    }

    async fn delete_user(&mut self, id: i64) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(self.conn()?)
            .await?;
        expect_row(result.rows_affected(), "User", id)
    }

    async fn find_profile(&mut self, id: i64) -> AppResult<Option<UserProfile>> {
        let profile = sqlx::query_as::<_, UserProfile>(
            "SELECT id, user_id, address, phone FROM user_profiles WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.conn()?)
        .await?;
        Ok(profile)
    }

    async fn find_profile_by_user(&mut self, user_id: i64) -> AppResult<Option<UserProfile>> {
        let profile = sqlx::query_as::<_, UserProfile>(
            "SELECT id, user_id, address, phone FROM user_profiles WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(self.conn()?)
        .await?;
        Ok(profile)
    }

    async fn insert_profile(&mut self, user_id: i64, data: &CreateProfile) -> AppResult<UserProfile> {
        let profile = sqlx::query_as::<_, UserProfile>(
            r#"
            INSERT INTO user_profiles (user_id, address, phone)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, address, phone
            "#,
        )
        .bind(user_id)
        .bind(&data.address)
        .bind(&data.phone)
        .fetch_one(self.conn()?)
        .await
        .map_err(|e| {
            on_unique_violation(e, || {
                AppError::State(format!("Profile already exists for user: {}", user_id))
            })
        })?;
        Ok(profile)
    }

    async fn update_profile(&mut self, profile: &UserProfile) -> AppResult<()> {
        let result = sqlx::query("UPDATE user_profiles SET address = $1, phone = $2 WHERE id = $3")
            .bind(&profile.address)
            .bind(&profile.phone)
            .bind(profile.id)
            .execute(self.conn()?)
            .await?;
        expect_row(result.rows_affected(), "Profile", profile.id)
    }

    async fn delete_profile(&mut self, id: i64) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM user_profiles WHERE id = $1")
            .bind(id)
            .execute(self.conn()?)
            .await?;
        expect_row(result.rows_affected(), "Profile", id)
    }

    async fn find_loan(&mut self, id: i64) -> AppResult<Option<Loan>> {
        let loan = sqlx::query_as::<_, Loan>(&format!("SELECT {} FROM loans WHERE id = $1", LOAN_COLUMNS))
            .bind(id)
            .fetch_optional(self.conn()?)
            .await?;
        Ok(loan)
    }

    async fn list_loans(&mut self) -> AppResult<Vec<Loan>> {
        let loans = sqlx::query_as::<_, Loan>(&format!("SELECT {} FROM loans ORDER BY id", LOAN_COLUMNS))
            .fetch_all(self.conn()?)
            .await?;
        Ok(loans)
    }

    async fn loans_for_user(&mut self, user_id: i64) -> AppResult<Vec<Loan>> {
        let loans = sqlx::query_as::<_, Loan>(&format!(
            "SELECT {} FROM loans WHERE user_id = $1 ORDER BY loan_date, id",
            LOAN_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(self.conn()?)
        .await?;
        Ok(loans)
    }

    async fn count_loans_for_book(&mut self, book_id: i64) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM loans WHERE book_id = $1")
            .bind(book_id)
            .fetch_one(self.conn()?)
            .await?;
        Ok(count)
    }

    async fn insert_loan(&mut self, loan: &NewLoan) -> AppResult<Loan> {
        let created = sqlx::query_as::<_, Loan>(&format!(
            r#"
            INSERT INTO loans (user_id, book_id, loan_date, due_date)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            LOAN_COLUMNS
        ))
        .bind(loan.user_id)
        .bind(loan.book_id)
        .bind(loan.loan_date)
        .bind(loan.due_date)
        .fetch_one(self.conn()?)
        .await?;
        Ok(created)
    }

    async fn update_loan(&mut self, loan: &Loan) -> AppResult<()> {
        let result = sqlx::query("UPDATE loans SET due_date = $1, return_date = $2 WHERE id = $3")
            .bind(loan.due_date)
            .bind(loan.return_date)
            .bind(loan.id)
            .execute(self.conn()?)
            .await?;
        expect_row(result.rows_affected(), "Loan", loan.id)
    }

    async fn delete_loan(&mut self, id: i64) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM loans WHERE id = $1")
            .bind(id)
            .execute(self.conn()?)
            .await?;
        expect_row(result.rows_affected(), "Loan", id)
    }

    async fn commit(&mut self) -> AppResult<()> {
        let tx = self
            .tx
            .take()
            .ok_or_else(|| AppError::Internal("Unit of work already committed".to_string()))?;
        tx.commit().await?;
        Ok(())
    }
}
