//! User profile service (one profile per user)

use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{
        profile::{CreateProfile, UpdateProfile},
        require_text, UserProfile,
    },
    repository::EntityStore,
};

#[derive(Clone)]
pub struct ProfilesService {
    store: Arc<dyn EntityStore>,
}

impl ProfilesService {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    /// Attach a profile to a user that has none yet
    pub async fn create(&self, user_id: i64, data: &CreateProfile) -> AppResult<UserProfile> {
        require_text("address", &data.address)?;
        require_text("phone", &data.phone)?;

        let mut uow = self.store.begin().await?;
        uow.get_user(user_id).await?;

        if uow.find_profile_by_user(user_id).await?.is_some() {
            tracing::warn!("Profile creation refused: user {} already has one", user_id);
            return Err(AppError::State(format!("Profile already exists for user: {}", user_id)));
        }

        let profile = uow.insert_profile(user_id, data).await?;
        uow.commit().await?;

        tracing::info!("Profile created: id={} user={}", profile.id, user_id);
        Ok(profile)
    }

    pub async fn get_by_id(&self, id: i64) -> AppResult<UserProfile> {
        let mut uow = self.store.begin().await?;
        let profile = uow.get_profile(id).await?;
        Ok(profile)
    }

    pub async fn update(&self, id: i64, data: &UpdateProfile) -> AppResult<UserProfile> {
        require_text("address", &data.address)?;
        require_text("phone", &data.phone)?;

        let mut uow = self.store.begin().await?;
        let mut profile = uow.get_profile(id).await?;
        profile.address = data.address.clone();
        profile.phone = data.phone.clone();
        uow.update_profile(&profile).await?;
        uow.commit().await?;
        Ok(profile)
    }

    /// Delete a profile. The user stays and may get a new profile afterwards.
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        let mut uow = self.store.begin().await?;
        let profile = uow.get_profile(id).await?;

        // The profile row carries the only link to its user
        uow.delete_profile(profile.id).await?;
        uow.commit().await?;

        tracing::info!("Profile deleted: id={} user={}", profile.id, profile.user_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::CreateUser;
    use crate::services::testing::{date, services_on};

    fn address() -> CreateProfile {
        CreateProfile {
            address: "1 Library Lane".into(),
            phone: "555-0100".into(),
        }
    }

    #[tokio::test]
    async fn test_second_profile_is_rejected() {
        let services = services_on(date(2025, 1, 1));
        let user = services
            .users
            .create(&CreateUser {
                email: "ada@example.org".into(),
                full_name: "Ada".into(),
            })
            .await
            .unwrap();

        let profile = services.profiles.create(user.id, &address()).await.unwrap();
        assert_eq!(profile.user_id, user.id);

        let err = services.profiles.create(user.id, &address()).await.unwrap_err();
        assert!(matches!(err, AppError::State(_)));
    }

    #[tokio::test]
    async fn test_profile_for_missing_user() {
        let services = services_on(date(2025, 1, 1));
        let err = services.profiles.create(42, &address()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_then_delete_frees_the_slot() {
        let services = services_on(date(2025, 1, 1));
        let user = services
            .users
            .create(&CreateUser {
                email: "ada@example.org".into(),
                full_name: "Ada".into(),
            })
            .await
            .unwrap();
        let profile = services.profiles.create(user.id, &address()).await.unwrap();

        let updated = services
            .profiles
            .update(
                profile.id,
                &UpdateProfile {
                    address: "2 Archive Road".into(),
                    phone: "555-0199".into(),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.address, "2 Archive Road");

        services.profiles.delete(profile.id).await.unwrap();
        assert!(matches!(services.profiles.get_by_id(profile.id).await, Err(AppError::NotFound(_))));
        assert!(services.users.get_by_id(user.id).await.is_ok());

        // the user can own a profile again
        services.profiles.create(user.id, &address()).await.unwrap();
    }
}
