//! User management service

use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{
        require_text,
        user::{CreateUser, UpdateUser},
        Loan, User,
    },
    repository::EntityStore,
};

use super::inventory;

#[derive(Clone)]
pub struct UsersService {
    store: Arc<dyn EntityStore>,
}

impl UsersService {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    /// Register a user. Emails are unique, compared case-insensitively.
    pub async fn create(&self, data: &CreateUser) -> AppResult<User> {
        require_text("email", &data.email)?;
        require_text("fullName", &data.full_name)?;

        let mut uow = self.store.begin().await?;
        if uow.find_user_by_email(&data.email).await?.is_some() {
            return Err(AppError::Validation(format!("Email already exists: {}", data.email)));
        }
        let user = uow.insert_user(data).await?;
        uow.commit().await?;

        tracing::info!("User created: id={}", user.id);
        Ok(user)
    }

    pub async fn get_by_id(&self, id: i64) -> AppResult<User> {
        let mut uow = self.store.begin().await?;
        let user = uow.get_user(id).await?;
        Ok(user)
    }

    pub async fn list(&self) -> AppResult<Vec<User>> {
        let mut uow = self.store.begin().await?;
        let users = uow.list_users().await?;
        Ok(users)
    }

    pub async fn update(&self, id: i64, data: &UpdateUser) -> AppResult<User> {
        require_text("fullName", &data.full_name)?;

        let mut uow = self.store.begin().await?;
        let mut user = uow.get_user(id).await?;
        user.full_name = data.full_name.clone();
        uow.update_user(&user).await?;
        uow.commit().await?;
        Ok(user)
    }

    /// Loans of a user, active and returned, oldest first
    pub async fn get_loans(&self, id: i64) -> AppResult<Vec<Loan>> {
        let mut uow = self.store.begin().await?;
        uow.get_user(id).await?;
        let loans = uow.loans_for_user(id).await?;
        Ok(loans)
    }

    /// Delete a user together with its loans and profile.
    ///
    /// Dependents go first: loans (an active loan gives its copy back), then
    /// the profile, then the user row.
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        let mut uow = self.store.begin().await?;
        uow.get_user(id).await?;

        let loans = uow.loans_for_user(id).await?;
        let mut released = 0;
        for loan in &loans {
            if loan.is_active() {
                let mut book = uow.get_book_locked(loan.book_id).await?;
                inventory::release_copy(&mut book)?;
                uow.update_book(&book).await?;
                released += 1;
            }
            uow.delete_loan(loan.id).await?;
        }

        let profile = uow.find_profile_by_user(id).await?;
        if let Some(profile) = profile {
            uow.delete_profile(profile.id).await?;
        }

        uow.delete_user(id).await?;
        uow.commit().await?;

        tracing::info!(
            "User deleted: id={} ({} loans removed, {} copies released)",
            id,
            loans.len(),
            released
        );
        Ok(())
    }
}
