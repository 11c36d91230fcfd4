use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type PostId = i64;
pub type CategoryId = i64;

/// Bucket that holds post thumbnails.
pub const THUMBNAIL_BUCKET: &str = "post-thumbnail";
/// Every generated thumbnail key lives under this prefix.
pub const THUMBNAIL_KEY_PREFIX: &str = "private/";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostCategory {
    pub id: i64,
    pub post_id: PostId,
    pub category_id: CategoryId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub category: Category,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_image_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub post_categories: Vec<PostCategory>,
}

impl Post {
    pub fn category_ids(&self) -> Vec<CategoryId> {
        self.post_categories.iter().map(|pc| pc.category_id).collect()
    }

    pub fn category_names(&self) -> Vec<&str> {
        self.post_categories
            .iter()
            .map(|pc| pc.category.name.as_str())
            .collect()
    }
}

// ======================= REQUESTS =======================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRef {
    pub id: CategoryId,
}

/// Body of `POST /api/admin/posts` and `PUT /api/admin/posts/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRequest {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub thumbnail_image_key: Option<String>,
    #[serde(default)]
    pub categories: Vec<CategoryRef>,
}

impl PostRequest {
    pub fn category_ids(&self) -> Vec<CategoryId> {
        self.categories.iter().map(|c| c.id).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRequest {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRequest {
    pub name: String,
    pub email: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
}

pub type LoginRequest = SignupRequest;

// ======================= RESPONSES =======================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostsEnvelope {
    pub status: String,
    pub posts: Vec<Post>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostEnvelope {
    pub status: String,
    pub post: Post,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoriesEnvelope {
    pub status: String,
    pub categories: Vec<Category>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryEnvelope {
    pub status: String,
    pub category: Category,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedEnvelope {
    pub status: String,
    pub message: String,
    pub id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
    pub expires_in: i64,
    pub token_type: String,
}
