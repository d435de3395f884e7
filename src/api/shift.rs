use crate::auth::auth::AuthUser;
use crate::model::shift::Shift;
use crate::service::shift::{self, CreateShift};
use crate::utils::shift_cache;
use actix_web::{HttpResponse, Responder, web};
use serde_json::{Value, json};
use sqlx::MySqlPool;

#[utoipa::path(
    get,
    path = "/api/shifts",
    responses(
        (status = 200, description = "All shifts", body = [Shift]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Shift"
)]
pub async fn list_shifts(auth: AuthUser, pool: web::Data<MySqlPool>) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_ceo()?;

    let shifts = shift_cache::list_all(pool.get_ref())
        .await
        .map_err(crate::error::AppError::from)?;
    Ok(HttpResponse::Ok().json(shifts))
}

#[utoipa::path(
    post,
    path = "/api/shifts",
    request_body = CreateShift,
    responses(
        (status = 201, description = "Shift created", body = Shift),
        (status = 400, description = "Missing fields or unparseable times"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Shift"
)]
pub async fn create_shift(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateShift>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_ceo()?;

    let created = shift::create(pool.get_ref(), &payload).await?;
    Ok(HttpResponse::Created().json(created))
}

/// Partial update; only the fields present are changed.
#[utoipa::path(
    put,
    path = "/api/shifts/{shift_id}",
    params(("shift_id" = u64, Path, description = "Shift id")),
    request_body(content = Object, example = json!({ "graceTime": 10, "loginTime": "09:30" })),
    responses(
        (status = 200, description = "Updated shift", body = Shift),
        (status = 400, description = "Unknown field or bad value"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Shift not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Shift"
)]
pub async fn update_shift(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<Value>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_ceo()?;

    let updated = shift::update(pool.get_ref(), path.into_inner(), &payload).await?;
    Ok(HttpResponse::Ok().json(updated))
}

#[utoipa::path(
    delete,
    path = "/api/shifts/{shift_id}",
    params(("shift_id" = u64, Path, description = "Shift id")),
    responses(
        (status = 200, description = "Shift deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Shift not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Shift"
)]
pub async fn delete_shift(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_ceo()?;

    shift::delete(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Shift deleted" })))
}
