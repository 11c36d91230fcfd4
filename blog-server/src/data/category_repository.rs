use async_trait::async_trait;
use blog_core::{Category, CategoryId};
use sqlx::PgPool;
use tracing::{error, info};

use crate::domain::error::DomainError;
use crate::domain::post::NewCategory;

#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<Category>, DomainError>;
    async fn find_by_id(&self, id: CategoryId) -> Result<Option<Category>, DomainError>;
    async fn create(&self, category: NewCategory) -> Result<Category, DomainError>;
    async fn update(
        &self,
        id: CategoryId,
        category: NewCategory,
    ) -> Result<Option<Category>, DomainError>;
    async fn delete(&self, id: CategoryId) -> Result<bool, DomainError>;
}

#[derive(Clone)]
pub struct PostgresCategoryRepository {
    pool: PgPool,
}

impl PostgresCategoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: i64,
    name: String,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Category {
            id: row.id,
            name: row.name,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl CategoryRepository for PostgresCategoryRepository {
    async fn list(&self) -> Result<Vec<Category>, DomainError> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            r#"
            SELECT id, name, created_at, updated_at
            FROM categories
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("db error while fetching categories: {}", e);
            DomainError::Internal(e.to_string())
        })?;

        Ok(rows.into_iter().map(Category::from).collect())
    }

    async fn find_by_id(&self, id: CategoryId) -> Result<Option<Category>, DomainError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, name, created_at, updated_at FROM categories WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("db error find_by_id {}: {}", id, e);
            DomainError::Internal(e.to_string())
        })?;

        Ok(row.map(Category::from))
    }

    async fn create(&self, category: NewCategory) -> Result<Category, DomainError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r#"
            INSERT INTO categories (name)
            VALUES ($1)
            RETURNING id, name, created_at, updated_at
            "#,
        )
        .bind(&category.name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("failed to create category: {}", e);
            DomainError::Internal(format!("database error: {}", e))
        })?;

        info!(category_id = row.id, "category created");
        Ok(row.into())
    }

    async fn update(
        &self,
        id: CategoryId,
        category: NewCategory,
    ) -> Result<Option<Category>, DomainError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r#"
            UPDATE categories
            SET name = $1, updated_at = NOW()
            WHERE id = $2
            RETURNING id, name, created_at, updated_at
            "#,
        )
        .bind(&category.name)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("failed to update category {}: {}", id, e);
            DomainError::Internal(e.to_string())
        })?;

        if row.is_some() {
            info!(category_id = id, "category updated");
        }
        Ok(row.map(Category::from))
    }

    async fn delete(&self, id: CategoryId) -> Result<bool, DomainError> {
        let deleted = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::Internal(e.to_string()))?;

        let found = deleted.rows_affected() > 0;
        if found {
            info!(category_id = id, "category deleted");
        }
        Ok(found)
    }
}
