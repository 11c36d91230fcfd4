//! Headless list and detail pages.
//!
//! A page is a fetch through [`BlogApi`] (and therefore the cache) folded into
//! a view state a front-end renders.

use blog_core::{Category, CategoryId, Post, PostId};
use derive_more::Display;

use crate::error::BlogClientError;
use crate::forms::{CategoryForm, PostForm};
use crate::http_client::BlogApi;
use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Route {
    #[display("/")]
    Home,
    #[display("/posts/{_0}")]
    Post(PostId),
    #[display("/admin/posts")]
    AdminPosts,
    #[display("/admin/posts/new")]
    NewPost,
    #[display("/admin/posts/{_0}")]
    EditPost(PostId),
    #[display("/admin/categories")]
    AdminCategories,
    #[display("/admin/categories/new")]
    NewCategory,
    #[display("/admin/categories/{_0}")]
    EditCategory(CategoryId),
    #[display("/contact")]
    Contact,
    #[display("/signup")]
    Signup,
    #[display("/login")]
    Login,
}

impl Route {
    pub fn parse(path: &str) -> Option<Self> {
        let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
        let route = match segments.as_slice() {
            [""] => Route::Home,
            ["posts", id] => Route::Post(id.parse().ok()?),
            ["admin", "posts"] => Route::AdminPosts,
            ["admin", "posts", "new"] => Route::NewPost,
            ["admin", "posts", id] => Route::EditPost(id.parse().ok()?),
            ["admin", "categories"] => Route::AdminCategories,
            ["admin", "categories", "new"] => Route::NewCategory,
            ["admin", "categories", id] => Route::EditCategory(id.parse().ok()?),
            ["contact"] => Route::Contact,
            ["signup"] => Route::Signup,
            ["login"] => Route::Login,
            _ => return None,
        };
        Some(route)
    }

    pub fn is_admin(&self) -> bool {
        matches!(
            self,
            Route::AdminPosts
                | Route::NewPost
                | Route::EditPost(_)
                | Route::AdminCategories
                | Route::NewCategory
                | Route::EditCategory(_)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum ListView<T> {
    #[default]
    Loading,
    Failed(String),
    Empty,
    Loaded(Vec<T>),
}

impl<T> ListView<T> {
    pub fn from_result(result: Result<Vec<T>, BlogClientError>) -> Self {
        match result {
            Ok(items) if items.is_empty() => ListView::Empty,
            Ok(items) => ListView::Loaded(items),
            Err(err) => ListView::Failed(err.to_string()),
        }
    }

    pub fn items(&self) -> &[T] {
        match self {
            ListView::Loaded(items) => items,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum DetailView<T> {
    #[default]
    Loading,
    Failed(String),
    NotFound,
    Loaded(T),
}

impl<T> DetailView<T> {
    pub fn from_result(result: Result<T, BlogClientError>) -> Self {
        match result {
            Ok(item) => DetailView::Loaded(item),
            Err(err) if err.is_not_found() => DetailView::NotFound,
            Err(err) => DetailView::Failed(err.to_string()),
        }
    }

    pub fn loaded(&self) -> Option<&T> {
        match self {
            DetailView::Loaded(item) => Some(item),
            _ => None,
        }
    }
}

/// A row of a list page and the route it links to.
#[derive(Debug, Clone, PartialEq)]
pub struct Link<T> {
    pub item: T,
    pub route: Route,
}

fn linked<T>(view: ListView<T>, route: impl Fn(&T) -> Route) -> ListView<Link<T>> {
    match view {
        ListView::Loaded(items) => ListView::Loaded(
            items
                .into_iter()
                .map(|item| Link {
                    route: route(&item),
                    item,
                })
                .collect(),
        ),
        ListView::Loading => ListView::Loading,
        ListView::Failed(msg) => ListView::Failed(msg),
        ListView::Empty => ListView::Empty,
    }
}

/// `/`
pub async fn home(api: &dyn BlogApi) -> ListView<Link<Post>> {
    let view = ListView::from_result(api.public_posts().await);
    linked(view, |post| Route::Post(post.id))
}

/// `/posts/{id}`
pub async fn post_detail(api: &dyn BlogApi, id: PostId) -> DetailView<Post> {
    DetailView::from_result(api.public_post(id).await)
}

/// `/admin/posts`
pub async fn admin_posts(api: &dyn BlogApi, session: &Session) -> ListView<Link<Post>> {
    let view = ListView::from_result(api.list_posts(session).await);
    linked(view, |post| Route::EditPost(post.id))
}

/// `/admin/categories`
pub async fn admin_categories(api: &dyn BlogApi, session: &Session) -> ListView<Link<Category>> {
    let view = ListView::from_result(api.list_categories(session).await);
    linked(view, |category| Route::EditCategory(category.id))
}

/// `/admin/posts/{id}`: fetches the post and fills `form` the first time it
/// loads. Later refetches leave the user's edits alone.
pub async fn edit_post(
    api: &dyn BlogApi,
    session: &Session,
    id: PostId,
    form: &mut PostForm,
) -> DetailView<Post> {
    let view = DetailView::from_result(api.get_post(session, id).await);
    if let DetailView::Loaded(post) = &view {
        form.populate(post);
    }
    view
}

/// `/admin/categories/{id}`
pub async fn edit_category(
    api: &dyn BlogApi,
    session: &Session,
    id: CategoryId,
    form: &mut CategoryForm,
) -> DetailView<Category> {
    let view = DetailView::from_result(api.get_category(session, id).await);
    if let DetailView::Loaded(category) = &view {
        form.populate(category);
    }
    view
}
