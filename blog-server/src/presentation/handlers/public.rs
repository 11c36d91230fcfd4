use actix_web::{HttpResponse, get, web};
use blog_core::PostId;
use blog_core::model::{PostEnvelope, PostsEnvelope};

use crate::application::post_service::PostService;
use crate::domain::error::DomainError;
use crate::presentation::dto::STATUS_OK;

#[get("/posts")]
async fn list_posts(service: web::Data<PostService>) -> Result<HttpResponse, DomainError> {
    let posts = service.list_posts().await?;
    Ok(HttpResponse::Ok().json(PostsEnvelope {
        status: STATUS_OK.to_string(),
        posts,
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
