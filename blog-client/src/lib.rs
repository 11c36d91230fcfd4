pub mod api;
pub mod cache;
pub mod contact;
pub mod error;
pub mod forms;
pub mod http_client;
pub mod pages;
pub mod session;
pub mod storage;

#[cfg(test)]
mod testing;

pub use api::{ApiClient, endpoints};
pub use cache::FetchCache;
pub use contact::ContactClient;
pub use error::BlogClientError;
pub use forms::{CategoryForm, ContactForm, FormState, LoginForm, PostForm, SignupForm};
pub use http_client::{BlogApi, BlogClient};
pub use pages::{DetailView, Link, ListView, Route};
pub use session::{Session, TOKEN_FILE};
pub use storage::StorageClient;
