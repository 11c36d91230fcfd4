//! Form view-models.
//!
//! Each submit walks `Idle -> (Invalid | Submitting) -> (Done | Failed)`.
//! Validation runs on every attempt and blocks the request. A failed request
//! keeps the entered values and surfaces an alert; nothing is retried. After
//! a successful write the affected cache entries are dropped before the form
//! reports where to navigate.

use std::path::Path;

use blog_core::validation::{validate_category, validate_contact, validate_post, validate_signup};
use blog_core::{
    Category, CategoryId, CategoryRef, CategoryRequest, ContactRequest, Post, PostId,
    PostRequest, SignupRequest, ThumbnailPolicy, ValidationErrors,
};
use tracing::warn;

use crate::api::endpoints;
use crate::contact::ContactClient;
use crate::error::BlogClientError;
use crate::http_client::BlogApi;
use crate::pages::Route;
use crate::session::Session;
use crate::storage::StorageClient;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum FormState {
    #[default]
    Idle,
    Invalid(ValidationErrors),
    Submitting,
    Done {
        notice: String,
        route: Option<Route>,
    },
    Failed(String),
}

impl FormState {
    pub fn is_submitting(&self) -> bool {
        matches!(self, FormState::Submitting)
    }

    pub fn errors(&self) -> Option<&ValidationErrors> {
        match self {
            FormState::Invalid(errors) => Some(errors),
            _ => None,
        }
    }

    pub fn alert(&self) -> Option<&str> {
        match self {
            FormState::Failed(msg) => Some(msg),
            _ => None,
        }
    }

    pub fn notice(&self) -> Option<&str> {
        match self {
            FormState::Done { notice, .. } => Some(notice),
            _ => None,
        }
    }

    pub fn navigation(&self) -> Option<Route> {
        match self {
            FormState::Done { route, .. } => *route,
            _ => None,
        }
    }

    /// Moves to `Submitting` if no submit is running and `errors` is empty.
    fn begin(&mut self, errors: ValidationErrors) -> bool {
        if self.is_submitting() {
            return false;
        }
        if !errors.is_empty() {
            *self = FormState::Invalid(errors);
            return false;
        }
        *self = FormState::Submitting;
        true
    }

    fn finish<T>(
        &mut self,
        result: Result<T, BlogClientError>,
        ok: &str,
        failed: &str,
        route: Option<Route>,
    ) -> Option<T> {
        match result {
            Ok(value) => {
                *self = FormState::Done {
                    notice: ok.to_string(),
                    route,
                };
                Some(value)
            }
            Err(err) => {
                warn!(error = %err, "{failed}");
                *self = FormState::Failed(failure_alert(failed, &err));
                None
            }
        }
    }
}

fn failure_alert(action: &str, err: &BlogClientError) -> String {
    match err {
        BlogClientError::Request(_) => format!("{action} Please try again."),
        other => format!("{action} {other}"),
    }
}

fn invalidate_posts(api: &dyn BlogApi, id: Option<PostId>) {
    let cache = api.cache();
    cache.invalidate(endpoints::ADMIN_POSTS);
    cache.invalidate(endpoints::PUBLIC_POSTS);
    if let Some(id) = id {
        cache.invalidate(&endpoints::admin_post(id));
        cache.invalidate(&endpoints::public_post(id));
    }
}

fn invalidate_categories(api: &dyn BlogApi, id: Option<CategoryId>) {
    let cache = api.cache();
    cache.invalidate(endpoints::ADMIN_CATEGORIES);
    if let Some(id) = id {
        cache.invalidate(&endpoints::admin_category(id));
        // posts embed their categories
        cache.invalidate_prefix(endpoints::ADMIN_POSTS);
        cache.invalidate_prefix(endpoints::PUBLIC_POSTS);
    }
}

/// Create/edit form for a post.
#[derive(Debug, Clone, Default)]
pub struct PostForm {
    pub values: PostRequest,
    pub thumbnail: ThumbnailPolicy,
    state: FormState,
    populated: bool,
}

impl PostForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn is_submitting(&self) -> bool {
        self.state.is_submitting()
    }

    pub fn is_populated(&self) -> bool {
        self.populated
    }

    /// Copies `post` into the form unless it was populated before.
    pub fn populate(&mut self, post: &Post) -> bool {
        if self.populated {
            return false;
        }
        self.values = PostRequest {
            title: post.title.clone(),
            content: post.content.clone(),
            thumbnail_image_key: post.thumbnail_image_key.clone(),
            categories: post
                .category_ids()
                .into_iter()
                .map(|id| CategoryRef { id })
                .collect(),
        };
        self.populated = true;
        true
    }

    pub fn select_categories(&mut self, ids: impl IntoIterator<Item = CategoryId>) {
        self.values.categories = ids.into_iter().map(|id| CategoryRef { id }).collect();
    }

    pub fn validate(&self) -> ValidationErrors {
        validate_post(&self.values, self.thumbnail)
    }

    /// Uploads a thumbnail and stores its key in the form. On failure the
    /// form is left untouched and the user-facing error is returned.
    pub async fn attach_thumbnail(
        &mut self,
        storage: &StorageClient,
        session: &Session,
        bytes: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<&str, BlogClientError> {
        let key = storage.upload(session, bytes, content_type).await?;
        Ok(self.values.thumbnail_image_key.insert(key).as_str())
    }

    /// Same as [`attach_thumbnail`](Self::attach_thumbnail) for a file on disk.
    pub async fn attach_thumbnail_file(
        &mut self,
        storage: &StorageClient,
        session: &Session,
        path: &Path,
    ) -> Result<&str, BlogClientError> {
        let key = storage.upload_file(session, path).await?;
        Ok(self.values.thumbnail_image_key.insert(key).as_str())
    }

    pub async fn submit_create(&mut self, api: &dyn BlogApi, session: &Session) -> &FormState {
        let errors = self.validate();
        if !self.state.begin(errors) {
            return &self.state;
        }
        let result = api.create_post(session, &self.values).await;
        if self
            .state
            .finish(result, "Post created.", "Failed to create post.", Some(Route::AdminPosts))
            .is_some()
        {
            invalidate_posts(api, None);
        }
        &self.state
    }

    pub async fn submit_update(
        &mut self,
        api: &dyn BlogApi,
        session: &Session,
        id: PostId,
    ) -> &FormState {
        let errors = self.validate();
        if !self.state.begin(errors) {
            return &self.state;
        }
        let result = api.update_post(session, id, &self.values).await;
        if self
            .state
            .finish(result, "Post updated.", "Failed to update post.", Some(Route::AdminPosts))
            .is_some()
        {
            invalidate_posts(api, Some(id));
        }
        &self.state
    }

    pub async fn delete(
        &mut self,
        api: &dyn BlogApi,
        session: &Session,
        id: PostId,
    ) -> &FormState {
        if !self.state.begin(ValidationErrors::new()) {
            return &self.state;
        }
        let result = api.delete_post(session, id).await;
        if self
            .state
            .finish(result, "Post deleted.", "Failed to delete post.", Some(Route::AdminPosts))
            .is_some()
        {
            invalidate_posts(api, Some(id));
        }
        &self.state
    }
}

/// Create/edit form for a category.
#[derive(Debug, Clone, Default)]
pub struct CategoryForm {
    pub values: CategoryRequest,
    state: FormState,
    populated: bool,
}

impl CategoryForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn is_submitting(&self) -> bool {
        self.state.is_submitting()
    }

    pub fn populate(&mut self, category: &Category) -> bool {
        if self.populated {
            return false;
        }
        self.values.name = category.name.clone();
        self.populated = true;
        true
    }

    pub fn validate(&self) -> ValidationErrors {
        validate_category(&self.values)
    }

    pub async fn submit_create(&mut self, api: &dyn BlogApi, session: &Session) -> &FormState {
        let errors = self.validate();
        if !self.state.begin(errors) {
            return &self.state;
        }
        let result = api.create_category(session, &self.values).await;
        if self
            .state
            .finish(
                result,
                "Category created.",
                "Failed to create category.",
                Some(Route::AdminCategories),
            )
            .is_some()
        {
            invalidate_categories(api, None);
        }
        &self.state
    }

    pub async fn submit_update(
        &mut self,
        api: &dyn BlogApi,
        session: &Session,
        id: CategoryId,
    ) -> &FormState {
        let errors = self.validate();
        if !self.state.begin(errors) {
            return &self.state;
        }
        let result = api.update_category(session, id, &self.values).await;
        if self
            .state
            .finish(
                result,
                "Category updated.",
                "Failed to update category.",
                Some(Route::AdminCategories),
            )
            .is_some()
        {
            invalidate_categories(api, Some(id));
        }
        &self.state
    }

    pub async fn delete(
        &mut self,
        api: &dyn BlogApi,
        session: &Session,
        id: CategoryId,
    ) -> &FormState {
        if !self.state.begin(ValidationErrors::new()) {
            return &self.state;
        }
        let result = api.delete_category(session, id).await;
        if self
            .state
            .finish(
                result,
                "Category deleted.",
                "Failed to delete category.",
                Some(Route::AdminCategories),
            )
            .is_some()
        {
            invalidate_categories(api, Some(id));
        }
        &self.state
    }
}

/// Contact form. A sent message clears the fields.
#[derive(Debug, Clone, Default)]
pub struct ContactForm {
    pub values: ContactRequest,
    state: FormState,
}

impl ContactForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub async fn submit(&mut self, client: &ContactClient) -> &FormState {
        let errors = validate_contact(&self.values);
        if !self.state.begin(errors) {
            return &self.state;
        }
        let result = client.send(&self.values).await;
        if self
            .state
            .finish(result, "Message sent.", "Failed to send message.", None)
            .is_some()
        {
            self.values = ContactRequest::default();
        }
        &self.state
    }
}

/// Signup form. The password is dropped once the account exists.
#[derive(Debug, Clone, Default)]
pub struct SignupForm {
    pub values: SignupRequest,
    state: FormState,
}

impl SignupForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub async fn submit(&mut self, api: &dyn BlogApi) -> &FormState {
        let errors = validate_signup(&self.values);
        if !self.state.begin(errors) {
            return &self.state;
        }
        let result = api.signup(&self.values).await;
        if self
            .state
            .finish(
                result,
                "Account created. You can now log in.",
                "Failed to sign up.",
                Some(Route::Login),
            )
            .is_some()
        {
            self.values = SignupRequest::default();
        }
        &self.state
    }
}

/// Login form. Yields the new session on success.
#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub values: SignupRequest,
    state: FormState,
}

impl LoginForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub async fn submit(&mut self, api: &dyn BlogApi) -> Option<Session> {
        if !self.state.begin(ValidationErrors::new()) {
            return None;
        }
        let result = api.login(&self.values).await;
        let session = self.state.finish(
            result,
            "Logged in.",
            "Failed to log in.",
            Some(Route::AdminPosts),
        )?;
        self.values.password.clear();
        Some(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::api::ApiClient;
    use crate::testing::{FakeApi, category, post, seed, session};

    fn storage(server: &MockServer) -> StorageClient {
        StorageClient::new(&ApiClient::new(&server.uri()).unwrap())
    }

    fn contact_form() -> ContactForm {
        let mut form = ContactForm::new();
        form.values.name = "Ann".into();
        form.values.email = "ann@example.com".into();
        form.values.message = "Hello there".into();
        form
    }

    fn valid_post() -> PostForm {
        let mut form = PostForm::new();
        form.values.title = "Hello".into();
        form.values.content = "World".into();
        form.select_categories([1]);
        form
    }

    #[tokio::test]
    async fn invalid_post_is_not_sent() {
        let api = FakeApi::default();
        let mut form = PostForm::new();

        let state = form.submit_create(&api, &session()).await;
        let errors = state.errors().unwrap();
        assert_eq!(errors.get("title"), Some("Title is required."));
        assert_eq!(errors.get("categories"), Some("Select at least one category."));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn required_thumbnail_policy_blocks_submit() {
        let api = FakeApi::default();
        let mut form = valid_post();
        form.thumbnail = ThumbnailPolicy::Required;

        let state = form.submit_create(&api, &session()).await;
        assert_eq!(
            state.errors().unwrap().get("thumbnailImageKey"),
            Some("Thumbnail image is required.")
        );
    }

    #[tokio::test]
    async fn create_success_invalidates_list_and_navigates() {
        let api = FakeApi::default();
        api.categories.lock().unwrap().push(category(1, "rust"));
        seed(&api, endpoints::ADMIN_POSTS).await;
        seed(&api, endpoints::PUBLIC_POSTS).await;

        let mut form = valid_post();
        let state = form.submit_create(&api, &session()).await;

        assert_eq!(state.navigation(), Some(Route::AdminPosts));
        assert_eq!(state.notice(), Some("Post created."));
        assert!(!api.cache().contains(endpoints::ADMIN_POSTS));
        assert!(!api.cache().contains(endpoints::PUBLIC_POSTS));
        assert_eq!(api.calls(), vec!["create_post"]);
        assert_eq!(api.posts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn update_failure_keeps_values_and_cache() {
        let api = FakeApi::default();
        api.posts.lock().unwrap().push(post(7, "before", &[1]));
        seed(&api, endpoints::ADMIN_POSTS).await;
        seed(&api, &endpoints::admin_post(7)).await;
        api.fail_writes(true);

        let mut form = valid_post();
        form.values.title = "after".into();
        let state = form.submit_update(&api, &session(), 7).await;

        assert_eq!(state.alert(), Some("Failed to update post. database unavailable"));
        assert_eq!(state.navigation(), None);
        assert!(!form.is_submitting());
        assert_eq!(form.values.title, "after");
        assert!(api.cache().contains(endpoints::ADMIN_POSTS));
        assert!(api.cache().contains(&endpoints::admin_post(7)));
        assert_eq!(api.posts.lock().unwrap()[0].title, "before");
    }

    #[tokio::test]
    async fn delete_failure_does_not_navigate() {
        let api = FakeApi::default();
        api.fail_writes(true);
        let mut form = CategoryForm::new();
        form.values.name = "rust".into();

        let state = form.delete(&api, &session(), 3).await;
        assert_eq!(state.alert(), Some("Failed to delete category. database unavailable"));
        assert_eq!(state.navigation(), None);
        assert_eq!(form.values.name, "rust");
    }

    #[tokio::test]
    async fn category_update_invalidates_item_and_posts() {
        let api = FakeApi::default();
        api.categories.lock().unwrap().push(category(3, "old"));
        for key in [
            endpoints::ADMIN_CATEGORIES.to_string(),
            endpoints::admin_category(3),
            endpoints::admin_post(1),
        ] {
            seed(&api, &key).await;
        }

        let mut form = CategoryForm::new();
        form.values.name = "new".into();
        let state = form.submit_update(&api, &session(), 3).await;

        assert_eq!(state.navigation(), Some(Route::AdminCategories));
        assert!(!api.cache().contains(endpoints::ADMIN_CATEGORIES));
        assert!(!api.cache().contains(&endpoints::admin_category(3)));
        assert!(!api.cache().contains(&endpoints::admin_post(1)));
    }

    #[tokio::test]
    async fn submit_while_submitting_is_ignored() {
        let api = FakeApi::default();
        let mut form = valid_post();
        form.state = FormState::Submitting;

        form.submit_create(&api, &session()).await;
        form.delete(&api, &session(), 1).await;
        assert!(form.is_submitting());
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn populate_maps_category_ids_once() {
        let mut form = PostForm::new();
        assert!(form.populate(&post(1, "a", &[4, 5])));
        assert_eq!(form.values.category_ids(), vec![4, 5]);
        assert!(!form.populate(&post(1, "b", &[])));
        assert_eq!(form.values.title, "a");
        assert!(form.is_populated());
    }

    #[tokio::test]
    async fn login_yields_session_and_clears_password() {
        let api = FakeApi::default();
        let mut form = LoginForm::new();
        form.values.email = "a@example.com".into();
        form.values.password = "password1".into();

        let session = form.submit(&api).await.unwrap();
        assert_eq!(session.access_token(), Some("fake-token"));
        assert!(form.values.password.is_empty());
        assert_eq!(form.state().navigation(), Some(Route::AdminPosts));
    }

    #[tokio::test]
    async fn signup_validates_before_calling() {
        let api = FakeApi::default();
        let mut form = SignupForm::new();
        form.values.email = "a@example.com".into();
        form.values.password = "short".into();

        let state = form.submit(&api).await;
        assert_eq!(
            state.errors().unwrap().get("password"),
            Some("Password must be at least 8 characters.")
        );
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn failed_upload_keeps_previous_thumbnail() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path_regex(r"^/storage/v1/object/post-thumbnail/private/"))
            .respond_with(
                ResponseTemplate::new(409)
                    .set_body_json(json!({"status": "conflict: object already exists"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let mut form = valid_post();
        form.values.thumbnail_image_key = Some("private/old".into());
        let err = form
            .attach_thumbnail(&storage(&server), &session(), vec![1, 2], Some("image/png"))
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Failed to upload image: conflict: object already exists"
        );
        assert_eq!(form.values.thumbnail_image_key.as_deref(), Some("private/old"));
        assert_eq!(form.state(), &FormState::Idle);
    }

    #[tokio::test]
    async fn uploaded_file_key_is_stored() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path_regex(r"^/storage/v1/object/post-thumbnail/private/"))
            .and(header("content-type", "image/png"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Key": "post-thumbnail/private/new",
                "path": "private/new"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("thumb.png");
        std::fs::write(&file, b"png").unwrap();

        let mut form = valid_post();
        let key = form
            .attach_thumbnail_file(&storage(&server), &session(), &file)
            .await
            .unwrap();
        assert_eq!(key, "private/new");
        assert_eq!(form.values.thumbnail_image_key.as_deref(), Some("private/new"));
    }

    #[tokio::test]
    async fn sent_contact_message_clears_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        let client = ContactClient::new(format!("{}/hook", server.uri())).unwrap();

        let mut form = contact_form();
        let state = form.submit(&client).await;
        assert_eq!(state.notice(), Some("Message sent."));
        assert_eq!(state.navigation(), None);
        assert_eq!(form.values, ContactRequest::default());
    }

    #[tokio::test]
    async fn failed_contact_message_keeps_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .respond_with(
                ResponseTemplate::new(502).set_body_json(json!({"message": "webhook down"})),
            )
            .expect(1)
            .mount(&server)
            .await;
        let client = ContactClient::new(format!("{}/hook", server.uri())).unwrap();

        let mut form = contact_form();
        let state = form.submit(&client).await;
        assert_eq!(state.alert(), Some("Failed to send message. webhook down"));
        assert_eq!(form.values.name, "Ann");
        assert_eq!(form.values.message, "Hello there");
    }
}
