mod app;
mod application;
mod data;
mod domain;
mod infrastructure;
mod presentation;
#[cfg(test)]
mod testing;

use std::sync::Arc;

use application::auth_service::AuthService;
use application::category_service::CategoryService;
use application::post_service::PostService;
use application::storage_service::StorageService;
use data::category_repository::PostgresCategoryRepository;
use data::post_repository::PostgresPostRepository;
use data::user_repository::PostgresUserRepository;
use infrastructure::config::AppConfig;
use infrastructure::database::{create_pool, run_migrations};
use infrastructure::logging::init_logging;
use infrastructure::security::JwtKeys;
use infrastructure::storage::FsObjectStore;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let config = AppConfig::from_env()?;
    let pool = create_pool(&config.database_url).await?;
    run_migrations(&pool).await?;

    let auth = AuthService::new(
        Arc::new(PostgresUserRepository::new(pool.clone())),
        JwtKeys::new(config.jwt_secret.clone(), config.token_ttl_secs),
    );
    let posts = PostService::new(Arc::new(PostgresPostRepository::new(pool.clone())));
    let categories = CategoryService::new(Arc::new(PostgresCategoryRepository::new(pool)));
    let storage = StorageService::new(
        Arc::new(FsObjectStore::new(config.storage_dir.clone())),
        config.storage_buckets.clone(),
    );

    let state = app::AppState {
        auth,
        posts,
        categories,
        storage,
        max_upload_bytes: config.max_upload_bytes,
    };

    app::start_rest_server(config, state).await
}
