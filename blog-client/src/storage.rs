//! Thumbnail upload and public URL resolution.

use std::path::Path;

use blog_core::model::{THUMBNAIL_BUCKET, THUMBNAIL_KEY_PREFIX};
use reqwest::Client;
use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE};
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::api::ApiClient;
use crate::error::BlogClientError;
use crate::session::Session;

const OBJECT_PATH: &str = "/storage/v1/object";
const UPLOAD_CACHE_CONTROL: &str = "max-age=3600";
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, Deserialize)]
struct UploadResponse {
    path: String,
}

#[derive(Clone)]
pub struct StorageClient {
    http: Client,
    base_url: String,
    bucket: String,
}

impl StorageClient {
    pub fn new(api: &ApiClient) -> Self {
        Self {
            http: api.http().clone(),
            base_url: api.base_url().to_string(),
            bucket: THUMBNAIL_BUCKET.to_string(),
        }
    }

    /// A fresh `private/<uuid>` key.
    pub fn generate_key() -> String {
        format!("{THUMBNAIL_KEY_PREFIX}{}", Uuid::new_v4())
    }

    /// Uploads `bytes` under a newly generated key without overwriting and
    /// returns the stored key.
    pub async fn upload(
        &self,
        session: &Session,
        bytes: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<String, BlogClientError> {
        let token = session.access_token().ok_or(BlogClientError::Unauthorized)?;
        let key = Self::generate_key();
        let url = format!("{}{}/{}/{}", self.base_url, OBJECT_PATH, self.bucket, key);

        let resp = self
            .http
            .post(url)
            .bearer_auth(token)
            .header("x-upsert", "false")
            .header(CACHE_CONTROL, UPLOAD_CACHE_CONTROL)
            .header(CONTENT_TYPE, content_type.unwrap_or(DEFAULT_CONTENT_TYPE))
            .body(bytes)
            .send()
            .await
            .map_err(|e| BlogClientError::Upload(e.to_string()))?;

        if !resp.status().is_success() {
            let err = BlogClientError::from_http_response(resp).await;
            warn!(key = %key, error = %err, "thumbnail upload failed");
            return Err(BlogClientError::Upload(err.to_string()));
        }

        let body: UploadResponse = resp
            .json()
            .await
            .map_err(|e| BlogClientError::Upload(e.to_string()))?;
        info!(key = %body.path, "thumbnail uploaded");
        Ok(body.path)
    }

    pub async fn upload_file(
        &self,
        session: &Session,
        path: &Path,
    ) -> Result<String, BlogClientError> {
        let bytes = tokio::fs::read(path).await?;
        self.upload(session, bytes, content_type_for(path)).await
    }

    pub fn public_url(&self, key: &str) -> String {
        format!(
            "{}{}/public/{}/{}",
            self.base_url, OBJECT_PATH, self.bucket, key
        )
    }

    /// Public URL for a post's thumbnail key, if it has one.
    pub fn resolve(&self, key: Option<&str>) -> Option<String> {
        key.map(str::trim)
            .filter(|k| !k.is_empty())
            .map(|k| self.public_url(k))
    }
}

/// Image content type guessed from the file extension.
pub fn content_type_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "svg" => Some("image/svg+xml"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn storage(uri: &str) -> StorageClient {
        StorageClient::new(&ApiClient::new(uri).unwrap())
    }

    #[test]
    fn generated_keys_are_private_and_unique() {
        let a = StorageClient::generate_key();
        let b = StorageClient::generate_key();
        assert!(a.starts_with("private/"));
        assert_eq!(a.len(), "private/".len() + 36);
        assert_ne!(a, b);
    }

    #[test]
    fn resolve_builds_public_url() {
        let client = storage("http://localhost:8080/");
        assert_eq!(
            client.resolve(Some("private/abc")).as_deref(),
            Some("http://localhost:8080/storage/v1/object/public/post-thumbnail/private/abc")
        );
        assert_eq!(client.resolve(None), None);
        assert_eq!(client.resolve(Some("")), None);
    }

    #[test]
    fn content_type_from_extension() {
        assert_eq!(content_type_for(Path::new("a/b.PNG")), Some("image/png"));
        assert_eq!(content_type_for(Path::new("photo.jpeg")), Some("image/jpeg"));
        assert_eq!(content_type_for(Path::new("notes")), None);
    }

    #[tokio::test]
    async fn upload_sends_no_overwrite_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path_regex(r"^/storage/v1/object/post-thumbnail/private/[0-9a-f-]{36}$"))
            .and(header("authorization", "Bearer tok"))
            .and(header("x-upsert", "false"))
            .and(header("content-type", "image/png"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Key": "post-thumbnail/private/x",
                "path": "private/x"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let key = storage(&server.uri())
            .upload(&Session::new("tok"), vec![1, 2, 3], Some("image/png"))
            .await
            .unwrap();
        assert_eq!(key, "private/x");
    }

    #[tokio::test]
    async fn upload_failure_is_user_facing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(409)
                    .set_body_json(json!({"status": "object already exists"})),
            )
            .mount(&server)
            .await;

        let err = storage(&server.uri())
            .upload(&Session::new("tok"), vec![1], None)
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Failed to upload image: object already exists"
        );
    }
}
