//! Author management service

use std::sync::Arc;

use crate::{
    error::AppResult,
    models::{
        author::{CreateAuthor, UpdateAuthor},
        require_text, Author,
    },
    repository::EntityStore,
};

#[derive(Clone)]
pub struct AuthorsService {
    store: Arc<dyn EntityStore>,
}

impl AuthorsService {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, data: &CreateAuthor) -> AppResult<Author> {
        require_text("name", &data.name)?;

        let mut uow = self.store.begin().await?;
        let author = uow.insert_author(data).await?;
        uow.commit().await?;

        tracing::info!("Author created: id={}", author.id);
        Ok(author)
    }

    pub async fn get_by_id(&self, id: i64) -> AppResult<Author> {
        let mut uow = self.store.begin().await?;
        let author = uow.get_author(id).await?;
        Ok(author)
    }

    pub async fn list(&self) -> AppResult<Vec<Author>> {
        let mut uow = self.store.begin().await?;
        let authors = uow.list_authors().await?;
        Ok(authors)
    }

    pub async fn update(&self, id: i64, data: &UpdateAuthor) -> AppResult<Author> {
        require_text("name", &data.name)?;

        let mut uow = self.store.begin().await?;
        let mut author = uow.get_author(id).await?;
        author.name = data.name.clone();
        uow.update_author(&author).await?;
        uow.commit().await?;
        Ok(author)
    }

    /// Delete an author; its books stay, only the associations go
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        let mut uow = self.store.begin().await?;
        uow.get_author(id).await?;

        let book_ids = uow.book_ids_for_author(id).await?;
        for book_id in book_ids {
            uow.unlink_author(book_id, id).await?;
        }
        uow.delete_author(id).await?;
        uow.commit().await?;

        tracing::info!("Author deleted: id={}", id);
        Ok(())
    }
}
