//! In-process [`BlogApi`] for page and form tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use blog_core::model::LoginRequest;
use blog_core::{
    Category, CategoryId, CategoryRequest, Post, PostCategory, PostId, PostRequest,
    SignupRequest,
};
use chrono::{TimeZone, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::api::endpoints;
use crate::cache::FetchCache;
use crate::error::BlogClientError;
use crate::http_client::BlogApi;
use crate::session::Session;

pub fn session() -> Session {
    Session::new("test-token")
}

pub fn category(id: CategoryId, name: &str) -> Category {
    let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    Category {
        id,
        name: name.to_string(),
        created_at: ts,
        updated_at: ts,
    }
}

pub fn post(id: PostId, title: &str, category_ids: &[CategoryId]) -> Post {
    let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    Post {
        id,
        title: title.to_string(),
        content: "content".to_string(),
        thumbnail_image_key: None,
        created_at: ts,
        updated_at: ts,
        post_categories: category_ids
            .iter()
            .enumerate()
            .map(|(i, cid)| PostCategory {
                id: i as i64 + 100,
                post_id: id,
                category_id: *cid,
                created_at: ts,
                updated_at: ts,
                category: category(*cid, &format!("category-{cid}")),
            })
            .collect(),
    }
}

/// Puts a placeholder value in the cache under `key`.
pub async fn seed(api: &FakeApi, key: &str) {
    api.cache()
        .get_or_fetch(key, || async { Ok(json!({"status": "OK"})) })
        .await
        .unwrap();
}

#[derive(Default)]
pub struct FakeApi {
    pub posts: Mutex<Vec<Post>>,
    pub categories: Mutex<Vec<Category>>,
    calls: Mutex<Vec<&'static str>>,
    fetches: AtomicUsize,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    cache: FetchCache,
}

impl FakeApi {
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    /// Reads that missed the cache.
    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Serves `key` from the cache the way `BlogClient` does, loading it on a miss.
    async fn cached<T, F>(&self, key: &str, load: F) -> Result<T, BlogClientError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Result<T, BlogClientError> + Send,
    {
        let value = self
            .cache
            .get_or_fetch(key, || async move {
                self.fetches.fetch_add(1, Ordering::SeqCst);
                Ok(serde_json::to_value(load()?)?)
            })
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    fn all_posts(&self) -> Result<Vec<Post>, BlogClientError> {
        self.read()?;
        Ok(self.posts.lock().unwrap().clone())
    }

    fn find_category(&self, id: CategoryId) -> Result<Category, BlogClientError> {
        self.read()?;
        self.categories
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or(BlogClientError::NotFound)
    }

    fn read(&self) -> Result<(), BlogClientError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(BlogClientError::Http {
                status: 500,
                message: "request failed with status 500".into(),
            });
        }
        Ok(())
    }

    fn write(&self, call: &'static str) -> Result<(), BlogClientError> {
        self.calls.lock().unwrap().push(call);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(BlogClientError::Http {
                status: 500,
                message: "database unavailable".into(),
            });
        }
        Ok(())
    }

    fn find_post(&self, id: PostId) -> Result<Post, BlogClientError> {
        self.read()?;
        self.posts
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or(BlogClientError::NotFound)
    }

    fn build_post(&self, id: PostId, request: &PostRequest) -> Post {
        let mut built = post(id, &request.title, &request.category_ids());
        built.content = request.content.clone();
        built.thumbnail_image_key = request.thumbnail_image_key.clone();
        built
    }
}

#[async_trait]
impl BlogApi for FakeApi {
    fn cache(&self) -> &FetchCache {
        &self.cache
    }

    async fn signup(&self, _request: &SignupRequest) -> Result<(), BlogClientError> {
        self.write("signup")
    }

    async fn login(&self, _request: &LoginRequest) -> Result<Session, BlogClientError> {
        self.write("login")?;
        Ok(Session::new("fake-token"))
    }

    async fn public_posts(&self) -> Result<Vec<Post>, BlogClientError> {
        self.cached(endpoints::PUBLIC_POSTS, || self.all_posts()).await
    }

    async fn public_post(&self, id: PostId) -> Result<Post, BlogClientError> {
        self.cached(&endpoints::public_post(id), || self.find_post(id)).await
    }

    async fn list_posts(&self, _session: &Session) -> Result<Vec<Post>, BlogClientError> {
        self.cached(endpoints::ADMIN_POSTS, || self.all_posts()).await
    }

    async fn get_post(&self, _session: &Session, id: PostId) -> Result<Post, BlogClientError> {
        self.cached(&endpoints::admin_post(id), || self.find_post(id)).await
    }

    async fn create_post(
        &self,
        _session: &Session,
        request: &PostRequest,
    ) -> Result<PostId, BlogClientError> {
        self.write("create_post")?;
        let mut posts = self.posts.lock().unwrap();
        let id = posts.iter().map(|p| p.id).max().unwrap_or(0) + 1;
        posts.push(self.build_post(id, request));
        Ok(id)
    }

    async fn update_post(
        &self,
        _session: &Session,
        id: PostId,
        request: &PostRequest,
    ) -> Result<Post, BlogClientError> {
        self.write("update_post")?;
        let updated = self.build_post(id, request);
        let mut posts = self.posts.lock().unwrap();
        let slot = posts
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(BlogClientError::NotFound)?;
        *slot = updated.clone();
        Ok(updated)
    }

    async fn delete_post(&self, _session: &Session, id: PostId) -> Result<(), BlogClientError> {
        self.write("delete_post")?;
        self.posts.lock().unwrap().retain(|p| p.id != id);
        Ok(())
    }

    async fn list_categories(&self, _session: &Session) -> Result<Vec<Category>, BlogClientError> {
        self.cached(endpoints::ADMIN_CATEGORIES, || {
            self.read()?;
            Ok(self.categories.lock().unwrap().clone())
        })
        .await
    }

    async fn get_category(
        &self,
        _session: &Session,
        id: CategoryId,
    ) -> Result<Category, BlogClientError> {
        self.cached(&endpoints::admin_category(id), || self.find_category(id)).await
    }

    async fn create_category(
        &self,
        _session: &Session,
        request: &CategoryRequest,
    ) -> Result<CategoryId, BlogClientError> {
        self.write("create_category")?;
        let mut categories = self.categories.lock().unwrap();
        let id = categories.iter().map(|c| c.id).max().unwrap_or(0) + 1;
        categories.push(category(id, &request.name));
        Ok(id)
    }

    async fn update_category(
        &self,
        _session: &Session,
        id: CategoryId,
        request: &CategoryRequest,
    ) -> Result<Category, BlogClientError> {
        self.write("update_category")?;
        let mut categories = self.categories.lock().unwrap();
        let slot = categories
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(BlogClientError::NotFound)?;
        slot.name = request.name.clone();
        Ok(slot.clone())
    }

    async fn delete_category(
        &self,
        _session: &Session,
        id: CategoryId,
    ) -> Result<(), BlogClientError> {
        self.write("delete_category")?;
        self.categories.lock().unwrap().retain(|c| c.id != id);
        Ok(())
    }
}
