use async_trait::async_trait;
use blog_core::model::{
    AuthResponse, CategoriesEnvelope, CategoryEnvelope, CreatedEnvelope, LoginRequest,
    PostEnvelope, PostsEnvelope,
};
use blog_core::{
    Category, CategoryId, CategoryRequest, Post, PostId, PostRequest, SignupRequest,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::info;

use crate::api::{ApiClient, endpoints};
use crate::cache::FetchCache;
use crate::error::BlogClientError;
use crate::session::Session;

/// Everything the pages and forms need from the server.
///
/// Reads go through [`BlogApi::cache`]; writes never touch it, callers
/// invalidate once the write has succeeded.
#[async_trait]
pub trait BlogApi: Send + Sync {
    fn cache(&self) -> &FetchCache;

    async fn signup(&self, request: &SignupRequest) -> Result<(), BlogClientError>;
    async fn login(&self, request: &LoginRequest) -> Result<Session, BlogClientError>;

    async fn public_posts(&self) -> Result<Vec<Post>, BlogClientError>;
    async fn public_post(&self, id: PostId) -> Result<Post, BlogClientError>;

    async fn list_posts(&self, session: &Session) -> Result<Vec<Post>, BlogClientError>;
    async fn get_post(&self, session: &Session, id: PostId) -> Result<Post, BlogClientError>;
    async fn create_post(
        &self,
        session: &Session,
        request: &PostRequest,
    ) -> Result<PostId, BlogClientError>;
    async fn update_post(
        &self,
        session: &Session,
        id: PostId,
        request: &PostRequest,
    ) -> Result<Post, BlogClientError>;
    async fn delete_post(&self, session: &Session, id: PostId) -> Result<(), BlogClientError>;

    async fn list_categories(&self, session: &Session) -> Result<Vec<Category>, BlogClientError>;
    async fn get_category(
        &self,
        session: &Session,
        id: CategoryId,
    ) -> Result<Category, BlogClientError>;
    async fn create_category(
        &self,
        session: &Session,
        request: &CategoryRequest,
    ) -> Result<CategoryId, BlogClientError>;
    async fn update_category(
        &self,
        session: &Session,
        id: CategoryId,
        request: &CategoryRequest,
    ) -> Result<Category, BlogClientError>;
    async fn delete_category(
        &self,
        session: &Session,
        id: CategoryId,
    ) -> Result<(), BlogClientError>;
}

/// [`BlogApi`] over HTTP.
pub struct BlogClient {
    api: ApiClient,
    cache: FetchCache,
}

impl BlogClient {
    pub fn connect(endpoint: &str) -> Result<Self, BlogClientError> {
        Ok(Self::new(ApiClient::new(endpoint)?))
    }

    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            cache: FetchCache::new(),
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    async fn cached<T: DeserializeOwned>(
        &self,
        session: &Session,
        path: &str,
    ) -> Result<T, BlogClientError> {
        let value = self
            .cache
            .get_or_fetch(path, || self.api.get::<Value>(session, path))
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn cached_public<T: DeserializeOwned>(&self, path: &str) -> Result<T, BlogClientError> {
        let value = self
            .cache
            .get_or_fetch(path, || self.api.get_public::<Value>(path))
            .await?;
        Ok(serde_json::from_value(value)?)
    }
}

#[async_trait]
impl BlogApi for BlogClient {
    fn cache(&self) -> &FetchCache {
        &self.cache
    }

    async fn signup(&self, request: &SignupRequest) -> Result<(), BlogClientError> {
        self.api.post_public(endpoints::SIGNUP, request).await?;
        info!(email = %request.email, "signed up");
        Ok(())
    }

    async fn login(&self, request: &LoginRequest) -> Result<Session, BlogClientError> {
        let resp = self.api.post_public(endpoints::LOGIN, request).await?;
        let auth: AuthResponse = resp.json().await?;
        Ok(Session::new(auth.access_token))
    }

    async fn public_posts(&self) -> Result<Vec<Post>, BlogClientError> {
        let envelope: PostsEnvelope = self.cached_public(endpoints::PUBLIC_POSTS).await?;
        Ok(envelope.posts)
    }

    async fn public_post(&self, id: PostId) -> Result<Post, BlogClientError> {
        let envelope: PostEnvelope = self.cached_public(&endpoints::public_post(id)).await?;
        Ok(envelope.post)
    }

    async fn list_posts(&self, session: &Session) -> Result<Vec<Post>, BlogClientError> {
        let envelope: PostsEnvelope = self.cached(session, endpoints::ADMIN_POSTS).await?;
        Ok(envelope.posts)
    }

    async fn get_post(&self, session: &Session, id: PostId) -> Result<Post, BlogClientError> {
        let envelope: PostEnvelope = self.cached(session, &endpoints::admin_post(id)).await?;
        Ok(envelope.post)
    }

    async fn create_post(
        &self,
        session: &Session,
        request: &PostRequest,
    ) -> Result<PostId, BlogClientError> {
        let resp = self.api.post(session, endpoints::ADMIN_POSTS, request).await?;
        let created: CreatedEnvelope = resp.json().await?;
        info!(post_id = created.id, "post created");
        Ok(created.id)
    }

    async fn update_post(
        &self,
        session: &Session,
        id: PostId,
        request: &PostRequest,
    ) -> Result<Post, BlogClientError> {
        let resp = self
            .api
            .put(session, &endpoints::admin_post(id), request)
            .await?;
        let envelope: PostEnvelope = resp.json().await?;
        Ok(envelope.post)
    }

    async fn delete_post(&self, session: &Session, id: PostId) -> Result<(), BlogClientError> {
        self.api.delete(session, &endpoints::admin_post(id)).await?;
        info!(post_id = id, "post deleted");
        Ok(())
    }

    async fn list_categories(&self, session: &Session) -> Result<Vec<Category>, BlogClientError> {
        let envelope: CategoriesEnvelope =
            self.cached(session, endpoints::ADMIN_CATEGORIES).await?;
        Ok(envelope.categories)
    }

    async fn get_category(
        &self,
        session: &Session,
        id: CategoryId,
    ) -> Result<Category, BlogClientError> {
        let envelope: CategoryEnvelope = self
            .cached(session, &endpoints::admin_category(id))
            .await?;
        Ok(envelope.category)
    }

    async fn create_category(
        &self,
        session: &Session,
        request: &CategoryRequest,
    ) -> Result<CategoryId, BlogClientError> {
        let resp = self
            .api
            .post(session, endpoints::ADMIN_CATEGORIES, request)
            .await?;
        let created: CreatedEnvelope = resp.json().await?;
        info!(category_id = created.id, "category created");
        Ok(created.id)
    }

    async fn update_category(
        &self,
        session: &Session,
        id: CategoryId,
        request: &CategoryRequest,
    ) -> Result<Category, BlogClientError> {
        let resp = self
            .api
            .put(session, &endpoints::admin_category(id), request)
            .await?;
        let envelope: CategoryEnvelope = resp.json().await?;
        Ok(envelope.category)
    }

    async fn delete_category(
        &self,
        session: &Session,
        id: CategoryId,
    ) -> Result<(), BlogClientError> {
        self.api
            .delete(session, &endpoints::admin_category(id))
            .await?;
        info!(category_id = id, "category deleted");
        Ok(())
    }
}
