//! Authenticated JSON client for the blog endpoints.

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderValue};
use reqwest::{Client, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::BlogClientError;
use crate::session::Session;

/// Endpoint paths. They double as cache keys.
pub mod endpoints {
    use blog_core::{CategoryId, PostId};

    pub const ADMIN_POSTS: &str = "/api/admin/posts";
    pub const ADMIN_CATEGORIES: &str = "/api/admin/categories";
    pub const PUBLIC_POSTS: &str = "/api/posts";
    pub const SIGNUP: &str = "/api/auth/signup";
    pub const LOGIN: &str = "/api/auth/login";

    pub fn admin_post(id: PostId) -> String {
        format!("{ADMIN_POSTS}/{id}")
    }

    pub fn admin_category(id: CategoryId) -> String {
        format!("{ADMIN_CATEGORIES}/{id}")
    }

    pub fn public_post(id: PostId) -> String {
        format!("{PUBLIC_POSTS}/{id}")
    }
}

#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, BlogClientError> {
        Ok(Self::with_client(Client::builder().build()?, base_url))
    }

    pub fn with_client(http: Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub(crate) fn http(&self) -> &Client {
        &self.http
    }

    fn authorized(
        &self,
        session: &Session,
        builder: RequestBuilder,
    ) -> Result<RequestBuilder, BlogClientError> {
        let token = session.access_token().ok_or(BlogClientError::Unauthorized)?;
        let value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| BlogClientError::InvalidRequest("malformed access token".into()))?;

        Ok(builder
            .header(AUTHORIZATION, value)
            .header(CONTENT_TYPE, "application/json"))
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        session: &Session,
        path: &str,
    ) -> Result<T, BlogClientError> {
        debug!(path, "GET");
        let req = self.authorized(session, self.http.get(self.url(path)))?;
        let resp = ensure_success(req.send().await?).await?;
        Ok(resp.json().await?)
    }

    pub async fn post<B: Serialize + ?Sized>(
        &self,
        session: &Session,
        path: &str,
        body: &B,
    ) -> Result<Response, BlogClientError> {
        debug!(path, "POST");
        let req = self.authorized(session, self.http.post(self.url(path)))?;
        ensure_success(req.json(body).send().await?).await
    }

    pub async fn put<B: Serialize + ?Sized>(
        &self,
        session: &Session,
        path: &str,
        body: &B,
    ) -> Result<Response, BlogClientError> {
        debug!(path, "PUT");
        let req = self.authorized(session, self.http.put(self.url(path)))?;
        ensure_success(req.json(body).send().await?).await
    }

    pub async fn delete(&self, session: &Session, path: &str) -> Result<Response, BlogClientError> {
        debug!(path, "DELETE");
        let req = self.authorized(session, self.http.delete(self.url(path)))?;
        ensure_success(req.send().await?).await
    }

    /// Unauthenticated GET for the public endpoints.
    pub async fn get_public<T: DeserializeOwned>(&self, path: &str) -> Result<T, BlogClientError> {
        debug!(path, "GET (public)");
        let resp = ensure_success(self.http.get(self.url(path)).send().await?).await?;
        Ok(resp.json().await?)
    }

    pub async fn post_public<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Response, BlogClientError> {
        debug!(path, "POST (public)");
        ensure_success(self.http.post(self.url(path)).json(body).send().await?).await
    }
}

pub(crate) async fn ensure_success(resp: Response) -> Result<Response, BlogClientError> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let url = resp.url().path().to_string();
    let err = BlogClientError::from_http_response(resp).await;
    warn!(path = %url, error = %err, "request failed");
    Err(err)
}
