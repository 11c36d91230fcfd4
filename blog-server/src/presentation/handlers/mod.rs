pub mod auth;
pub mod category;
pub mod post;
pub mod public;
pub mod storage;
