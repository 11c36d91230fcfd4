use std::sync::Arc;

use blog_core::{Category, CategoryId, CategoryRequest};
use tracing::instrument;

use crate::data::category_repository::CategoryRepository;
use crate::domain::error::DomainError;
use crate::domain::post::NewCategory;

#[derive(Clone)]
pub struct CategoryService {
    repo: Arc<dyn CategoryRepository>,
}

impl CategoryService {
    pub fn new(repo: Arc<dyn CategoryRepository>) -> Self {
        Self { repo }
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>, DomainError> {
        self.repo.list().await
    }

    pub async fn get_category(&self, id: CategoryId) -> Result<Category, DomainError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or(DomainError::CategoryNotFound(id))
    }

    #[instrument(skip(self))]
    pub async fn create_category(&self, req: CategoryRequest) -> Result<Category, DomainError> {
        let category = NewCategory::try_from(req)?;
        self.repo.create(category).await
    }

    #[instrument(skip(self))]
    pub async fn update_category(
        &self,
        id: CategoryId,
        req: CategoryRequest,
    ) -> Result<Category, DomainError> {
        let category = NewCategory::try_from(req)?;
        self.repo
            .update(id, category)
            .await?
            .ok_or(DomainError::CategoryNotFound(id))
    }

    #[instrument(skip(self))]
    pub async fn delete_category(&self, id: CategoryId) -> Result<(), DomainError> {
        if self.repo.delete(id).await? {
            Ok(())
        } else {
            Err(DomainError::CategoryNotFound(id))
        }
    }
}
