pub mod model;
pub mod validation;

pub use model::{
    Category, CategoryId, CategoryRef, CategoryRequest, ContactRequest, Post, PostCategory,
    PostId, PostRequest, SignupRequest,
};
pub use validation::{ThumbnailPolicy, ValidationErrors};
