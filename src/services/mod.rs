//! Business logic services

pub mod authors;
pub mod books;
pub mod clock;
pub mod inventory;
pub mod loans;
pub mod profiles;
pub mod users;

use std::sync::Arc;

use crate::{config::LoansConfig, error::AppResult, repository::EntityStore};

use clock::Clock;

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub authors: authors::AuthorsService,
    pub books: books::BooksService,
    pub users: users::UsersService,
    pub profiles: profiles::ProfilesService,
    pub loans: loans::LoansService,
    store: Arc<dyn EntityStore>,
}

impl Services {
    /// Create all services over the given store
    pub fn new(store: Arc<dyn EntityStore>, clock: Arc<dyn Clock>, loans_config: &LoansConfig) -> Self {
        Self {
            authors: authors::AuthorsService::new(store.clone()),
            books: books::BooksService::new(store.clone()),
            users: users::UsersService::new(store.clone()),
            profiles: profiles::ProfilesService::new(store.clone()),
            loans: loans::LoansService::new(store.clone(), clock, loans_config.duration_days),
            store,
        }
    }

    /// Readiness probe: the store answers
    pub async fn ping(&self) -> AppResult<()> {
        self.store.ping().await
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use chrono::NaiveDate;

    use super::*;
    use crate::repository::MemoryStore;

    /// Services over an empty in-memory store, with "today" pinned to `today`
    pub fn services_on(today: NaiveDate) -> Services {
        let mut clock = clock::MockClock::new();
        clock.expect_today().return_const(today);
        Services::new(
            Arc::new(MemoryStore::new()),
            Arc::new(clock),
            &LoansConfig::default(),
        )
    }

    pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }
}
