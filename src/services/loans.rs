//! Loan lifecycle service
//!
//! A loan is ACTIVE until its return date is set, then RETURNED for good.
//! Creating a loan takes one copy of the book; returning it, or deleting it
//! while still active, gives the copy back.

use std::sync::Arc;

use chrono::Duration;

use crate::{
    error::{AppError, AppResult},
    models::loan::{CreateLoan, Loan, NewLoan},
    repository::EntityStore,
};

use super::{clock::Clock, inventory};

#[derive(Clone)]
pub struct LoansService {
    store: Arc<dyn EntityStore>,
    clock: Arc<dyn Clock>,
    duration: Duration,
}

impl LoansService {
    pub fn new(store: Arc<dyn EntityStore>, clock: Arc<dyn Clock>, duration_days: i64) -> Self {
        Self {
            store,
            clock,
            duration: Duration::days(duration_days),
        }
    }

    /// Lend a copy of a book to a user, due after the loan period
    pub async fn create(&self, request: &CreateLoan) -> AppResult<Loan> {
        let mut uow = self.store.begin().await?;
        let user = uow.get_user(request.user_id).await?;
        let mut book = uow.get_book_locked(request.book_id).await?;

        if let Err(e) = inventory::reserve_copy(&mut book) {
            tracing::warn!("Loan refused: book {} has no copy available", book.id);
            return Err(e);
        }

        if user.email.trim().is_empty() {
            return Err(AppError::Validation(format!("User {} email invalid", user.id)));
        }

        let today = self.clock.today();
        let due_date = today
            .checked_add_signed(self.duration)
            .ok_or_else(|| AppError::Internal(format!("Due date out of range from {}", today)))?;
        let new_loan = NewLoan {
            user_id: user.id,
            book_id: book.id,
            loan_date: today,
            due_date,
        };

        uow.update_book(&book).await?;
        let loan = uow.insert_loan(&new_loan).await?;
        uow.commit().await?;

        tracing::info!(
            "Loan created: id={} user={} book={} due={} ({} copies left)",
            loan.id,
            loan.user_id,
            loan.book_id,
            loan.due_date,
            book.available_copies
        );
        Ok(loan)
    }

    pub async fn get_by_id(&self, id: i64) -> AppResult<Loan> {
        let mut uow = self.store.begin().await?;
        let loan = uow.get_loan(id).await?;
        Ok(loan)
    }

    pub async fn list(&self) -> AppResult<Vec<Loan>> {
        let mut uow = self.store.begin().await?;
        let loans = uow.list_loans().await?;
        Ok(loans)
    }

    /// Mark an active loan returned today and give its copy back
    pub async fn return_loan(&self, id: i64) -> AppResult<Loan> {
        let mut uow = self.store.begin().await?;
        let mut loan = uow.get_loan(id).await?;

        if !loan.is_active() {
            tracing::warn!("Loan {} already returned", id);
            return Err(AppError::State(format!("Loan {} already returned", id)));
        }

        loan.return_date = Some(self.clock.today());

        let mut book = uow.get_book_locked(loan.book_id).await?;
        inventory::release_copy(&mut book)?;

        uow.update_book(&book).await?;
        uow.update_loan(&loan).await?;
        uow.commit().await?;

        tracing::info!("Loan returned: id={} book={}", loan.id, loan.book_id);
        Ok(loan)
    }

    /// Delete a loan record; an active loan gives its copy back first
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        let mut uow = self.store.begin().await?;
        let loan = uow.get_loan(id).await?;

        if loan.is_active() {
            let mut book = uow.get_book_locked(loan.book_id).await?;
            inventory::release_copy(&mut book)?;
            uow.update_book(&book).await?;
        }

        uow.delete_loan(id).await?;
        uow.commit().await?;

        tracing::info!("Loan deleted: id={} (was active: {})", id, loan.is_active());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{book::CreateBook, book::UpdateBook, loan::LoanStatus, user::CreateUser};
    use crate::services::{
        testing::{date, services_on},
        Services,
    };

    async fn user(services: &Services, n: u32) -> i64 {
        services
            .users
            .create(&CreateUser {
                email: format!("reader{}@example.org", n),
                full_name: format!("Reader {}", n),
            })
            .await
            .unwrap()
            .id
    }

    async fn book(services: &Services, copies: i32) -> i64 {
        services
            .books
            .create(&CreateBook {
                title: "The Dispossessed".into(),
                isbn: "9780060512750".into(),
                total_copies: copies,
            })
            .await
            .unwrap()
            .id
    }

    async fn available(services: &Services, book_id: i64) -> i32 {
        services.books.get_by_id(book_id).await.unwrap().available_copies
    }

    #[tokio::test]
    async fn test_last_copy_is_lent_for_fourteen_days() {
        let services = services_on(date(2025, 1, 1));
        let user_id = user(&services, 1).await;
        let book_id = book(&services, 1).await;

        let loan = services.loans.create(&CreateLoan { user_id, book_id }).await.unwrap();

        assert_eq!(loan.loan_date, date(2025, 1, 1));
        assert_eq!(loan.due_date, date(2025, 1, 15));
        assert_eq!(loan.return_date, None);
        assert_eq!(loan.status(), LoanStatus::Active);
        assert_eq!(available(&services, book_id).await, 0);
    }

    #[tokio::test]
    async fn test_no_copy_left_changes_nothing() {
        let services = services_on(date(2025, 1, 1));
        let first = user(&services, 1).await;
        let second = user(&services, 2).await;
        let book_id = book(&services, 1).await;
        services
            .loans
            .create(&CreateLoan { user_id: first, book_id })
            .await
            .unwrap();

        let err = services
            .loans
            .create(&CreateLoan { user_id: second, book_id })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Capacity(_)));
        assert_eq!(available(&services, book_id).await, 0);
        assert_eq!(services.loans.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_user_or_book() {
        let services = services_on(date(2025, 1, 1));
        let user_id = user(&services, 1).await;
        let book_id = book(&services, 1).await;

        let err = services
            .loans
            .create(&CreateLoan { user_id: 99, book_id })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let err = services
            .loans
            .create(&CreateLoan { user_id, book_id: 99 })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(available(&services, book_id).await, 1);
    }

    #[tokio::test]
    async fn test_two_copies_three_borrowers() {
        let services = services_on(date(2025, 3, 10));
        let book_id = book(&services, 2).await;
        let a = user(&services, 1).await;
        let b = user(&services, 2).await;
        let c = user(&services, 3).await;

        let first = services.loans.create(&CreateLoan { user_id: a, book_id }).await.unwrap();
        assert_eq!(available(&services, book_id).await, 1);

        services.loans.create(&CreateLoan { user_id: b, book_id }).await.unwrap();
        assert_eq!(available(&services, book_id).await, 0);

        let err = services
            .loans
            .create(&CreateLoan { user_id: c, book_id })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Capacity(_)));

        let returned = services.loans.return_loan(first.id).await.unwrap();
        assert_eq!(returned.return_date, Some(date(2025, 3, 10)));
        assert_eq!(available(&services, book_id).await, 1);
    }

    #[tokio::test]
    async fn test_double_return_is_rejected() {
        let services = services_on(date(2025, 1, 1));
        let user_id = user(&services, 1).await;
        let book_id = book(&services, 2).await;
        let loan = services.loans.create(&CreateLoan { user_id, book_id }).await.unwrap();

        services.loans.return_loan(loan.id).await.unwrap();
        assert_eq!(available(&services, book_id).await, 2);

        let err = services.loans.return_loan(loan.id).await.unwrap_err();
        assert!(matches!(err, AppError::State(_)));
        assert_eq!(available(&services, book_id).await, 2);
    }

    #[tokio::test]
    async fn test_return_unknown_loan() {
        let services = services_on(date(2025, 1, 1));
        assert!(matches!(
            services.loans.return_loan(5).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(services.loans.delete(5).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_deleting_active_loan_releases_copy() {
        let services = services_on(date(2025, 1, 1));
        let user_id = user(&services, 1).await;
        let book_id = book(&services, 1).await;
        let loan = services.loans.create(&CreateLoan { user_id, book_id }).await.unwrap();

        services.loans.delete(loan.id).await.unwrap();
        assert_eq!(available(&services, book_id).await, 1);

        // a second delete finds nothing and cannot release twice
        assert!(matches!(services.loans.delete(loan.id).await, Err(AppError::NotFound(_))));
        assert_eq!(available(&services, book_id).await, 1);
    }

    #[tokio::test]
    async fn test_deleting_returned_loan_keeps_counts() {
        let services = services_on(date(2025, 1, 1));
        let user_id = user(&services, 1).await;
        let book_id = book(&services, 1).await;
        let loan = services.loans.create(&CreateLoan { user_id, book_id }).await.unwrap();
        services.loans.return_loan(loan.id).await.unwrap();

        services.loans.delete(loan.id).await.unwrap();
        assert_eq!(available(&services, book_id).await, 1);
    }

    #[tokio::test]
    async fn test_return_after_shrinking_stock() {
        let services = services_on(date(2025, 1, 1));
        let user_id = user(&services, 1).await;
        let book_id = book(&services, 3).await;
        let loan = services.loans.create(&CreateLoan { user_id, book_id }).await.unwrap();

        services
            .books
            .update(book_id, &UpdateBook { title: "The Dispossessed".into(), total_copies: 1 })
            .await
            .unwrap();
        assert_eq!(available(&services, book_id).await, 0);

        services.loans.return_loan(loan.id).await.unwrap();
        let stored = services.books.get_by_id(book_id).await.unwrap();
        assert_eq!((stored.total_copies, stored.available_copies), (1, 1));
    }
}
