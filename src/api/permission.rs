use crate::api::StatusUpdate;
use crate::auth::auth::AuthUser;
use crate::model::permission::Permission;
use crate::push::AttendanceHub;
use crate::service::permission::{self, CreatePermission, PermissionFilter, PermissionListResponse};
use actix_web::{HttpResponse, Responder, web};
use sqlx::MySqlPool;

/// Request a short absence
#[utoipa::path(
    post,
    path = "/api/permissions",
    request_body = CreatePermission,
    responses(
        (status = 201, description = "Permission requested", body = Permission),
        (status = 400, description = "Missing fields, bad times or longer than 3 hours", body = Object, example = json!({
            "message": "Permission cannot exceed 3 hours. Please apply for Half-Day or Leave."
        })),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Permission"
)]
pub async fn create_permission(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreatePermission>,
) -> actix_web::Result<impl Responder> {
    let created = permission::create(pool.get_ref(), auth.user_id, &payload).await?;
    Ok(HttpResponse::Created().json(created))
}

#[utoipa::path(
    get,
    path = "/api/permissions",
    params(PermissionFilter),
    responses(
        (status = 200, description = "Paginated permission list", body = PermissionListResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Permission"
)]
pub async fn permission_list(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<PermissionFilter>,
) -> actix_web::Result<impl Responder> {
    let page = permission::list(pool.get_ref(), &auth, &query).await?;
    Ok(HttpResponse::Ok().json(page))
}

/// Approve or reject a pending permission (HR/CEO)
#[utoipa::path(
    put,
    path = "/api/permissions/{permission_id}/status",
    params(
        ("permission_id" = u64, Path, description = "ID of the permission request")
    ),
    request_body = StatusUpdate,
    responses(
        (status = 200, description = "Permission decided", body = Permission),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not HR/CEO, or own request"),
        (status = 404, description = "Permission not found"),
        (status = 409, description = "Permission already processed")
    ),
    security(("bearer_auth" = [])),
    tag = "Permission"
)]
pub async fn update_status(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    hub: web::Data<AttendanceHub>,
    path: web::Path<u64>,
    payload: web::Json<StatusUpdate>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_ceo()?;

    let permission_id = path.into_inner();
    let decided =
        permission::decide(pool.get_ref(), hub.get_ref(), &auth, permission_id, payload.status).await?;
    Ok(HttpResponse::Ok().json(decided))
}
