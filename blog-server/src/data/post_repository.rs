use std::collections::HashMap;

use async_trait::async_trait;
use blog_core::{Category, CategoryId, Post, PostCategory, PostId};
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{error, info};

use crate::domain::error::DomainError;
use crate::domain::post::NewPost;

#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<Post>, DomainError>;
    async fn find_by_id(&self, id: PostId) -> Result<Option<Post>, DomainError>;
    async fn create(&self, post: NewPost) -> Result<Post, DomainError>;
    async fn update(&self, id: PostId, post: NewPost) -> Result<Option<Post>, DomainError>;
    /// Returns `false` when no post had that id.
    async fn delete(&self, id: PostId) -> Result<bool, DomainError>;
}

#[derive(Clone)]
pub struct PostgresPostRepository {
    pool: PgPool,
}

impl PostgresPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct PostRow {
    id: i64,
    title: String,
    content: String,
    thumbnail_image_key: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct PostCategoryRow {
    id: i64,
    post_id: i64,
    category_id: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    category_name: String,
    category_created_at: DateTime<Utc>,
    category_updated_at: DateTime<Utc>,
}

impl From<PostCategoryRow> for PostCategory {
    fn from(row: PostCategoryRow) -> Self {
        PostCategory {
            id: row.id,
            post_id: row.post_id,
            category_id: row.category_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
            category: Category {
                id: row.category_id,
                name: row.category_name,
                created_at: row.category_created_at,
                updated_at: row.category_updated_at,
            },
        }
    }
}

fn db_error(context: &'static str) -> impl Fn(sqlx::Error) -> DomainError {
    move |e| {
        error!("{}: {}", context, e);
        DomainError::Internal(format!("database error: {}", e))
    }
}

impl PostgresPostRepository {
    async fn attach_categories(&self, rows: Vec<PostRow>) -> Result<Vec<Post>, DomainError> {
        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let links = sqlx::query_as::<_, PostCategoryRow>(
            r#"
            SELECT pc.id, pc.post_id, pc.category_id, pc.created_at, pc.updated_at,
                   c.name AS category_name,
                   c.created_at AS category_created_at,
                   c.updated_at AS category_updated_at
            FROM post_categories pc
            JOIN categories c ON c.id = pc.category_id
            WHERE pc.post_id = ANY($1)
            ORDER BY pc.id
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("failed to load post categories"))?;

        let mut by_post: HashMap<i64, Vec<PostCategory>> = HashMap::new();
        for link in links {
            by_post.entry(link.post_id).or_default().push(link.into());
        }

        Ok(rows
            .into_iter()
            .map(|row| Post {
                post_categories: by_post.remove(&row.id).unwrap_or_default(),
                id: row.id,
                title: row.title,
                content: row.content,
                thumbnail_image_key: row.thumbnail_image_key,
                created_at: row.created_at,
                updated_at: row.updated_at,
            })
            .collect())
    }

    async fn ensure_categories_exist(
        tx: &mut Transaction<'_, Postgres>,
        ids: &[CategoryId],
    ) -> Result<(), DomainError> {
        let found: Vec<i64> = sqlx::query_scalar("SELECT id FROM categories WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&mut **tx)
            .await
            .map_err(db_error("failed to check categories"))?;

        match ids.iter().find(|id| !found.contains(id)) {
            Some(missing) => Err(DomainError::CategoryNotFound(*missing)),
            None => Ok(()),
        }
    }

    async fn link_categories(
        tx: &mut Transaction<'_, Postgres>,
        post_id: PostId,
        ids: &[CategoryId],
    ) -> Result<(), DomainError> {
        for category_id in ids {
            sqlx::query("INSERT INTO post_categories (post_id, category_id) VALUES ($1, $2)")
                .bind(post_id)
                .bind(category_id)
                .execute(&mut **tx)
                .await
                .map_err(db_error("failed to link category"))?;
        }
        Ok(())
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn list(&self) -> Result<Vec<Post>, DomainError> {
        let rows = sqlx::query_as::<_, PostRow>(
            r#"
            SELECT id, title, content, thumbnail_image_key, created_at, updated_at
            FROM posts
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("db error while fetching posts"))?;

        self.attach_categories(rows).await
    }

    async fn find_by_id(&self, id: PostId) -> Result<Option<Post>, DomainError> {
        let row = sqlx::query_as::<_, PostRow>(
            r#"
            SELECT id, title, content, thumbnail_image_key, created_at, updated_at
            FROM posts WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("db error find_by_id"))?;

        match row {
            Some(row) => Ok(self.attach_categories(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn create(&self, post: NewPost) -> Result<Post, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("failed to open transaction"))?;

        Self::ensure_categories_exist(&mut tx, &post.category_ids).await?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO posts (title, content, thumbnail_image_key)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(&post.title)
        .bind(&post.content)
        .bind(&post.thumbnail_image_key)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error("failed to create post"))?;

        Self::link_categories(&mut tx, id, &post.category_ids).await?;
        tx.commit()
            .await
            .map_err(db_error("failed to commit post"))?;

        info!(post_id = id, "post created");
        self.find_by_id(id)
            .await?
            .ok_or(DomainError::PostNotFound(id))
    }

    async fn update(&self, id: PostId, post: NewPost) -> Result<Option<Post>, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("failed to open transaction"))?;

        let updated = sqlx::query(
            r#"
            UPDATE posts
            SET title = $1, content = $2, thumbnail_image_key = $3, updated_at = NOW()
            WHERE id = $4
            "#,
        )
        .bind(&post.title)
        .bind(&post.content)
        .bind(&post.thumbnail_image_key)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(db_error("failed to update post"))?;

        if updated.rows_affected() == 0 {
            return Ok(None);
        }

        Self::ensure_categories_exist(&mut tx, &post.category_ids).await?;
        sqlx::query("DELETE FROM post_categories WHERE post_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db_error("failed to unlink categories"))?;
        Self::link_categories(&mut tx, id, &post.category_ids).await?;
        tx.commit()
            .await
            .map_err(db_error("failed to commit post update"))?;

        info!(post_id = id, "post updated");
        self.find_by_id(id).await
    }

    async fn delete(&self, id: PostId) -> Result<bool, DomainError> {
        let deleted = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error("failed to delete post"))?;

        let found = deleted.rows_affected() > 0;
        if found {
            info!(post_id = id, "post deleted");
        }
        Ok(found)
    }
}
