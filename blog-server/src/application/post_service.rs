use std::sync::Arc;

use blog_core::{Post, PostId, PostRequest};
use tracing::instrument;

use crate::data::post_repository::PostRepository;
use crate::domain::error::DomainError;
use crate::domain::post::NewPost;

#[derive(Clone)]
pub struct PostService {
    repo: Arc<dyn PostRepository>,
}

impl PostService {
    pub fn new(repo: Arc<dyn PostRepository>) -> Self {
        Self { repo }
    }

    pub async fn get_post(&self, id: PostId) -> Result<Post, DomainError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or(DomainError::PostNotFound(id))
    }

    pub async fn list_posts(&self) -> Result<Vec<Post>, DomainError> {
        self.repo.list().await
    }

    #[instrument(skip(self, req), fields(title = %req.title))]
    pub async fn create_post(&self, req: PostRequest) -> Result<Post, DomainError> {
        let post = NewPost::try_from(req)?;
        self.repo.create(post).await
    }

    #[instrument(skip(self, req))]
    pub async fn update_post(&self, id: PostId, req: PostRequest) -> Result<Post, DomainError> {
        let post = NewPost::try_from(req)?;
        self.repo
            .update(id, post)
            .await?
            .ok_or(DomainError::PostNotFound(id))
    }

    #[instrument(skip(self))]
    pub async fn delete_post(&self, id: PostId) -> Result<(), DomainError> {
        if self.repo.delete(id).await? {
            Ok(())
        } else {
            Err(DomainError::PostNotFound(id))
        }
    }
}
