use actix_web::{HttpRequest, HttpResponse, delete, get, post, put, web};
use blog_core::model::{CategoriesEnvelope, CategoryEnvelope, CreatedEnvelope};
use blog_core::{CategoryId, CategoryRequest};
use tracing::info;

use crate::application::auth_service::AuthenticatedUser;
use crate::application::category_service::CategoryService;
use crate::domain::error::DomainError;
use crate::presentation::dto::{STATUS_OK, StatusResponse};
use crate::presentation::utils::request_id;

#[get("/categories")]
async fn list_categories(
    service: web::Data<CategoryService>,
) -> Result<HttpResponse, DomainError> {
    let categories = service.list_categories().await?;
    Ok(HttpResponse::Ok().json(CategoriesEnvelope {
        status: STATUS_OK.to_string(),
        categories,
    }))
}

#[post("/categories")]
async fn create_category(
    req: HttpRequest,
    user: AuthenticatedUser,
    service: web::Data<CategoryService>,
    payload: web::Json<CategoryRequest>,
) -> Result<HttpResponse, DomainError> {
    let category = service.create_category(payload.into_inner()).await?;

    info!(
        request_id = %request_id(&req),
        user = %user.email,
        category_id = category.id,
        "category created"
    );

    Ok(HttpResponse::Created().json(CreatedEnvelope {
        status: STATUS_OK.to_string(),
        message: "category created".to_string(),
        id: category.id,
    }))
}

#[get("/categories/{id}")]
async fn get_category(
    service: web::Data<CategoryService>,
    path: web::Path<CategoryId>,
) -> Result<HttpResponse, DomainError> {
    let category = service.get_category(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(CategoryEnvelope {
        status: STATUS_OK.to_string(),
        category,
    }))
}

#[put("/categories/{id}")]
async fn update_category(
    req: HttpRequest,
    user: AuthenticatedUser,
    service: web::Data<CategoryService>,
    path: web::Path<CategoryId>,
    payload: web::Json<CategoryRequest>,
) -> Result<HttpResponse, DomainError> {
    let category = service
        .update_category(path.into_inner(), payload.into_inner())
        .await?;

    info!(
        request_id = %request_id(&req),
        user = %user.email,
        category_id = category.id,
        "category updated"
    );

    Ok(HttpResponse::Ok().json(CategoryEnvelope {
        status: STATUS_OK.to_string(),
        category,
    }))
}

#[delete("/categories/{id}")]
async fn delete_category(
    req: HttpRequest,
    user: AuthenticatedUser,
    service: web::Data<CategoryService>,
    path: web::Path<CategoryId>,
) -> Result<HttpResponse, DomainError> {
    let category_id = path.into_inner();
    service.delete_category(category_id).await?;

    info!(
        request_id = %request_id(&req),
        user = %user.email,
        category_id,
        "category deleted"
    );

    Ok(HttpResponse::Ok().json(StatusResponse::ok()))
}
