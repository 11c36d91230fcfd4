use actix_web::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use actix_web::{HttpRequest, HttpResponse, web};
use tracing::info;

use crate::application::auth_service::AuthenticatedUser;
use crate::application::storage_service::StorageService;
use crate::domain::error::DomainError;
use crate::infrastructure::storage::StoredObject;
use crate::presentation::dto::UploadResponse;
use crate::presentation::utils::request_id;

const UPSERT_HEADER: &str = "x-upsert";
const PUBLIC_CACHE_CONTROL: &str = "max-age=3600";

fn header_str<'a>(req: &'a HttpRequest, name: &str) -> Option<&'a str> {
    req.headers().get(name).and_then(|v| v.to_str().ok())
}

/// `POST /storage/v1/object/{bucket}/{key:.*}`
pub async fn upload(
    req: HttpRequest,
    user: AuthenticatedUser,
    service: web::Data<StorageService>,
    path: web::Path<(String, String)>,
    body: web::Bytes,
) -> Result<HttpResponse, DomainError> {
    let (bucket, key) = path.into_inner();
    let upsert = header_str(&req, UPSERT_HEADER)
        .map(|v| v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    let content_type = header_str(&req, CONTENT_TYPE.as_str()).map(str::to_string);

    let key = service
        .upload(
            &bucket,
            &key,
            StoredObject::new(body.to_vec(), content_type),
            upsert,
        )
        .await?;

    info!(
        request_id = %request_id(&req),
        user = %user.email,
        bucket = %bucket,
        key = %key,
        "object uploaded"
    );

    Ok(HttpResponse::Ok().json(UploadResponse {
        full_key: format!("{bucket}/{key}"),
        path: key.to_string(),
    }))
}

/// `GET /storage/v1/object/public/{bucket}/{key:.*}`
pub async fn download(
    service: web::Data<StorageService>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, DomainError> {
    let (bucket, key) = path.into_inner();
    let object = service.download(&bucket, &key).await?;

    Ok(HttpResponse::Ok()
        .insert_header((CONTENT_TYPE, object.content_type))
        .insert_header((CACHE_CONTROL, PUBLIC_CACHE_CONTROL))
        .body(object.bytes))
}
