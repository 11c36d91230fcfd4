pub mod auth_service;
pub mod category_service;
pub mod post_service;
pub mod storage_service;
