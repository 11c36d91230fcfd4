use actix_web::{HttpRequest, HttpResponse, delete, get, post, put, web};
use blog_core::model::{CreatedEnvelope, PostEnvelope, PostsEnvelope};
use blog_core::{PostId, PostRequest};
use tracing::info;

use crate::application::auth_service::AuthenticatedUser;
use crate::application::post_service::PostService;
use crate::domain::error::DomainError;
use crate::presentation::dto::{STATUS_OK, StatusResponse};
use crate::presentation::utils::request_id;

#[get("/posts")]
async fn list_posts(service: web::Data<PostService>) -> Result<HttpResponse, DomainError> {
    let posts = service.list_posts().await?;
    Ok(HttpResponse::Ok().json(PostsEnvelope {
        status: STATUS_OK.to_string(),
        posts,
    }))
}

#[post("/posts")]
async fn create_post(
    req: HttpRequest,
    user: AuthenticatedUser,
    service: web::Data<PostService>,
    payload: web::Json<PostRequest>,
) -> Result<HttpResponse, DomainError> {
    let post = service.create_post(payload.into_inner()).await?;

    info!(
        request_id = %request_id(&req),
        user = %user.email,
        post_id = post.id,
        "post created"
    );

    Ok(HttpResponse::Created().json(CreatedEnvelope {
        status: STATUS_OK.to_string(),
        message: "post created".to_string(),
        id: post.id,
    }))
}

#[get("/posts/{id}")]
async fn get_post(
    service: web::Data<PostService>,
    path: web::Path<PostId>,
) -> Result<HttpResponse, DomainError> {
    let post = service.get_post(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(PostEnvelope {
        status: STATUS_OK.to_string(),
        post,
    }))
}

#[put("/posts/{id}")]
async fn update_post(
    req: HttpRequest,
    user: AuthenticatedUser,
    service: web::Data<PostService>,
    path: web::Path<PostId>,
    payload: web::Json<PostRequest>,
) -> Result<HttpResponse, DomainError> {
    let post = service
        .update_post(path.into_inner(), payload.into_inner())
        .await?;

    info!(
        request_id = %request_id(&req),
        user = %user.email,
        post_id = post.id,
        "post updated"
    );

    Ok(HttpResponse::Ok().json(PostEnvelope {
        status: STATUS_OK.to_string(),
        post,
    }))
}

#[delete("/posts/{id}")]
async fn delete_post(
    req: HttpRequest,
    user: AuthenticatedUser,
    service: web::Data<PostService>,
    path: web::Path<PostId>,
) -> Result<HttpResponse, DomainError> {
    let post_id = path.into_inner();
    service.delete_post(post_id).await?;

    info!(
        request_id = %request_id(&req),
        user = %user.email,
        post_id,
        "post deleted"
    );

    Ok(HttpResponse::Ok().json(StatusResponse::ok()))
}
