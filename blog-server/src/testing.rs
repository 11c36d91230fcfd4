//! In-memory repositories and object store for handler tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use blog_core::{Category, CategoryId, Post, PostCategory, PostId};
use chrono::Utc;
use uuid::Uuid;

use crate::app::AppState;
use crate::application::auth_service::AuthService;
use crate::application::category_service::CategoryService;
use crate::application::post_service::PostService;
use crate::application::storage_service::StorageService;
use crate::data::category_repository::CategoryRepository;
use crate::data::post_repository::PostRepository;
use crate::data::user_repository::UserRepository;
use crate::domain::error::DomainError;
use crate::domain::post::{NewCategory, NewPost};
use crate::domain::user::User;
use crate::infrastructure::security::JwtKeys;
use crate::infrastructure::storage::{ObjectKey, ObjectStore, StoredObject};

pub const TEST_SECRET: &str = "test-secret";

#[derive(Default)]
struct Tables {
    categories: Vec<Category>,
    posts: Vec<Post>,
    next_category_id: i64,
    next_post_id: i64,
    next_link_id: i64,
}

#[derive(Default)]
pub struct MemoryDb {
    tables: Mutex<Tables>,
}

impl Tables {
    fn links_for(
        &mut self,
        post_id: PostId,
        ids: &[CategoryId],
    ) -> Result<Vec<PostCategory>, DomainError> {
        let mut links = Vec::with_capacity(ids.len());
        for id in ids {
            let category = self
                .categories
                .iter()
                .find(|c| c.id == *id)
                .cloned()
                .ok_or(DomainError::CategoryNotFound(*id))?;
            self.next_link_id += 1;
            links.push(PostCategory {
                id: self.next_link_id,
                post_id,
                category_id: *id,
                created_at: Utc::now(),
                updated_at: Utc::now(),
                category,
            });
        }
        Ok(links)
    }
}

#[async_trait]
impl PostRepository for MemoryDb {
    async fn list(&self) -> Result<Vec<Post>, DomainError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.posts.iter().rev().cloned().collect())
    }

    async fn find_by_id(&self, id: PostId) -> Result<Option<Post>, DomainError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.posts.iter().find(|p| p.id == id).cloned())
    }

    async fn create(&self, post: NewPost) -> Result<Post, DomainError> {
        let mut tables = self.tables.lock().unwrap();
        let id = tables.next_post_id + 1;
        let links = tables.links_for(id, &post.category_ids)?;
        tables.next_post_id = id;
        let now = Utc::now();
        let post = Post {
            id,
            title: post.title,
            content: post.content,
            thumbnail_image_key: post.thumbnail_image_key,
            created_at: now,
            updated_at: now,
            post_categories: links,
        };
        tables.posts.push(post.clone());
        Ok(post)
    }

    async fn update(&self, id: PostId, post: NewPost) -> Result<Option<Post>, DomainError> {
        let mut tables = self.tables.lock().unwrap();
        if !tables.posts.iter().any(|p| p.id == id) {
            return Ok(None);
        }
        let links = tables.links_for(id, &post.category_ids)?;
        let existing = tables
            .posts
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(DomainError::PostNotFound(id))?;
        existing.title = post.title;
        existing.content = post.content;
        existing.thumbnail_image_key = post.thumbnail_image_key;
        existing.post_categories = links;
        existing.updated_at = Utc::now();
        Ok(Some(existing.clone()))
    }

    async fn delete(&self, id: PostId) -> Result<bool, DomainError> {
        let mut tables = self.tables.lock().unwrap();
        let before = tables.posts.len();
        tables.posts.retain(|p| p.id != id);
        Ok(tables.posts.len() != before)
    }
}

#[async_trait]
impl CategoryRepository for MemoryDb {
    async fn list(&self) -> Result<Vec<Category>, DomainError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.categories.iter().rev().cloned().collect())
    }

    async fn find_by_id(&self, id: CategoryId) -> Result<Option<Category>, DomainError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.categories.iter().find(|c| c.id == id).cloned())
    }

    async fn create(&self, category: NewCategory) -> Result<Category, DomainError> {
        let mut tables = self.tables.lock().unwrap();
        tables.next_category_id += 1;
        let now = Utc::now();
        let category = Category {
            id: tables.next_category_id,
            name: category.name,
            created_at: now,
            updated_at: now,
        };
        tables.categories.push(category.clone());
        Ok(category)
    }

    async fn update(
        &self,
        id: CategoryId,
        category: NewCategory,
    ) -> Result<Option<Category>, DomainError> {
        let mut tables = self.tables.lock().unwrap();
        let Some(existing) = tables.categories.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };
        existing.name = category.name;
        existing.updated_at = Utc::now();
        let updated = existing.clone();
        for post in tables.posts.iter_mut() {
            for link in post.post_categories.iter_mut().filter(|l| l.category_id == id) {
                link.category = updated.clone();
            }
        }
        Ok(Some(updated))
    }

    async fn delete(&self, id: CategoryId) -> Result<bool, DomainError> {
        let mut tables = self.tables.lock().unwrap();
        let before = tables.categories.len();
        tables.categories.retain(|c| c.id != id);
        for post in tables.posts.iter_mut() {
            post.post_categories.retain(|l| l.category_id != id);
        }
        Ok(tables.categories.len() != before)
    }
}

#[derive(Default)]
pub struct MemoryUsers {
    users: Mutex<Vec<User>>,
}

#[async_trait]
impl UserRepository for MemoryUsers {
    async fn create(&self, user: User) -> Result<User, DomainError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == user.email) {
            return Err(DomainError::UserAlreadyExists(
                "email already registered".to_string(),
            ));
        }
        users.push(user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.id == id).cloned())
    }
}

#[derive(Default)]
pub struct MemoryObjectStore {
    objects: Mutex<HashMap<(String, ObjectKey), StoredObject>>,
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(
        &self,
        bucket: &str,
        key: &ObjectKey,
        object: StoredObject,
        upsert: bool,
    ) -> Result<(), DomainError> {
        let mut objects = self.objects.lock().unwrap();
        let slot = (bucket.to_string(), key.clone());
        if !upsert && objects.contains_key(&slot) {
            return Err(DomainError::Conflict(format!("object already exists: {key}")));
        }
        objects.insert(slot, object);
        Ok(())
    }

    async fn get(
        &self,
        bucket: &str,
        key: &ObjectKey,
    ) -> Result<Option<StoredObject>, DomainError> {
        let objects = self.objects.lock().unwrap();
        Ok(objects.get(&(bucket.to_string(), key.clone())).cloned())
    }
}

/// Application state wired to fresh in-memory backends.
pub fn memory_state() -> AppState {
    let db = Arc::new(MemoryDb::default());
    AppState {
        auth: AuthService::new(
            Arc::new(MemoryUsers::default()),
            JwtKeys::new(TEST_SECRET.to_string(), 3600),
        ),
        posts: PostService::new(db.clone()),
        categories: CategoryService::new(db),
        storage: StorageService::new(
            Arc::new(MemoryObjectStore::default()),
            vec!["post-thumbnail".to_string()],
        ),
        max_upload_bytes: 1024 * 1024,
    }
}
