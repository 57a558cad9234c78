//! Loan (borrow) model and related types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Loan record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Loan {
    pub id: i64,
    pub user_id: i64,
    pub book_id: i64,
    pub loan_date: NaiveDate,
    pub due_date: NaiveDate,
    /// `None` while the loan is active
    pub return_date: Option<NaiveDate>,
}

/// Loan lifecycle state, derived from `return_date`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoanStatus {
    Active,
    Returned,
}

impl Loan {
    pub fn status(&self) -> LoanStatus {
        match self.return_date {
            None => LoanStatus::Active,
            Some(_) => LoanStatus::Returned,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status() == LoanStatus::Active
    }
}

/// Loan about to be inserted
#[derive(Debug, Clone)]
pub struct NewLoan {
    pub user_id: i64,
    pub book_id: i64,
    pub loan_date: NaiveDate,
    pub due_date: NaiveDate,
}

/// Create loan request
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateLoan {
    pub user_id: i64,
    pub book_id: i64,
}
