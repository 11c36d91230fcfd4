use actix_cors::Cors;
use actix_web::middleware::DefaultHeaders;
use actix_web::{App, HttpResponse, HttpServer, Responder, web};
use chrono::Utc;
use tracing::info;

use crate::application::auth_service::AuthService;
use crate::application::category_service::CategoryService;
use crate::application::post_service::PostService;
use crate::application::storage_service::StorageService;
use crate::domain::error::DomainError;
use crate::infrastructure::config::AppConfig;
use crate::presentation::dto::HealthResponse;
use crate::presentation::handlers;
use crate::presentation::middleware::{JwtAuthMiddleware, RequestIdMiddleware, TimingMiddleware};

/// Everything the handlers need, cloned into every worker.
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub posts: PostService,
    pub categories: CategoryService,
    pub storage: StorageService,
    pub max_upload_bytes: usize,
}

pub fn configure(cfg: &mut web::ServiceConfig, state: &AppState) {
    cfg.app_data(web::Data::new(state.auth.clone()))
        .app_data(web::Data::new(state.posts.clone()))
        .app_data(web::Data::new(state.categories.clone()))
        .app_data(web::Data::new(state.storage.clone()))
        .app_data(web::PayloadConfig::new(state.max_upload_bytes))
        .app_data(web::JsonConfig::default().error_handler(|err, _req| {
            DomainError::BadRequest(err.to_string()).into()
        }))
        .app_data(web::PathConfig::default().error_handler(|err, _req| {
            DomainError::NotFound(err.to_string()).into()
        }))
        .service(
            web::scope("/api/admin")
                .wrap(JwtAuthMiddleware::new(state.auth.clone()))
                .service(handlers::post::list_posts)
                .service(handlers::post::create_post)
                .service(handlers::post::get_post)
                .service(handlers::post::update_post)
                .service(handlers::post::delete_post)
                .service(handlers::category::list_categories)
                .service(handlers::category::create_category)
                .service(handlers::category::get_category)
                .service(handlers::category::update_category)
                .service(handlers::category::delete_category),
        )
        .service(
            web::scope("/api")
                .route("/health", web::get().to(health))
                .service(handlers::auth::scope())
                .service(handlers::public::list_posts)
                .service(handlers::public::get_post),
        )
        .service(
            web::scope("/storage/v1/object")
                .route(
                    "/public/{bucket}/{key:.*}",
                    web::get().to(handlers::storage::download),
                )
                .service(
                    web::resource("/{bucket}/{key:.*}")
                        .wrap(JwtAuthMiddleware::new(state.auth.clone()))
                        .route(web::post().to(handlers::storage::upload)),
                ),
        );
}

pub async fn start_rest_server(config: AppConfig, state: AppState) -> anyhow::Result<()> {
    let bind_address = (config.host.clone(), config.port);
    info!(host = %bind_address.0, port = bind_address.1, "HTTP server starting");

    HttpServer::new(move || {
        App::new()
            .wrap(build_cors(&config))
            .wrap(
                DefaultHeaders::new()
                    .add(("X-Content-Type-Options", "nosniff"))
                    .add(("Referrer-Policy", "no-referrer"))
                    .add(("Permissions-Policy", "geolocation=()"))
                    .add(("Cross-Origin-Opener-Policy", "same-origin")),
            )
            .wrap(TimingMiddleware)
            .wrap(RequestIdMiddleware)
            .configure(|cfg| configure(cfg, &state))
    })
    .bind(bind_address)?
    .run()
    .await
    .map_err(anyhow::Error::new)?;

    Ok(())
}

fn build_cors(config: &AppConfig) -> Cors {
    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
        .allowed_headers(vec![
            actix_web::http::header::CONTENT_TYPE,
            actix_web::http::header::AUTHORIZATION,
            actix_web::http::header::CACHE_CONTROL,
        ])
        .allowed_header("x-upsert")
        .expose_headers(vec!["x-request-id", "server-timing"])
        .max_age(3600);

    for origin in &config.cors_origins {
        if origin == "*" {
            cors = cors.allow_any_origin();
        } else {
            cors = cors.allowed_origin(origin);
        }
    }

    cors
}

async fn health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok",
        timestamp: Utc::now(),
    })
}
