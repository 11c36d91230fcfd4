use actix_web::{HttpRequest, HttpResponse, Scope, post, web};
use blog_core::SignupRequest;
use blog_core::model::{AuthResponse, LoginRequest};
use tracing::info;

use crate::application::auth_service::AuthService;
use crate::domain::error::DomainError;
use crate::presentation::dto::{STATUS_OK, SignupResponse};
use crate::presentation::utils::request_id;

pub fn scope() -> Scope {
    web::scope("/auth").service(signup).service(login)
}

#[post("/signup")]
async fn signup(
    req: HttpRequest,
    service: web::Data<AuthService>,
    payload: web::Json<SignupRequest>,
) -> Result<HttpResponse, DomainError> {
    let user = service.signup(payload.into_inner()).await?;

    info!(request_id = %request_id(&req), user_id = %user.id, "user signed up");

    Ok(HttpResponse::Created().json(SignupResponse {
        status: STATUS_OK.to_string(),
        user: user.into(),
    }))
}

#[post("/login")]
async fn login(
    req: HttpRequest,
    service: web::Data<AuthService>,
    payload: web::Json<LoginRequest>,
) -> Result<HttpResponse, DomainError> {
    let token = service.login(&payload).await?;

    info!(request_id = %request_id(&req), "user logged in");

    Ok(HttpResponse::Ok().json(AuthResponse {
        access_token: token,
        expires_in: service.keys().ttl_secs(),
        token_type: "Bearer".to_string(),
    }))
}
