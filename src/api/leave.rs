use crate::api::StatusUpdate;
use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::model::leave_request::LeaveRequest;
use crate::push::AttendanceHub;
use crate::service::attendance;
use crate::service::leave::{self, CreateLeave, LeaveFilter, LeaveListResponse, LeaveToday};
use actix_web::{HttpResponse, Responder, web};
use sqlx::MySqlPool;

/// Apply for leave
#[utoipa::path(
    post,
    path = "/api/leaves",
    request_body(
        content = CreateLeave,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Leave request submitted", body = LeaveRequest),
        (status = 400, description = "Missing fields or start after end", body = Object, example = json!({
            "message": "Please fill all fields"
        })),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn create_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateLeave>,
) -> actix_web::Result<impl Responder> {
    let leave = leave::create(pool.get_ref(), auth.user_id, &payload).await?;
    Ok(HttpResponse::Created().json(leave))
}

/// Own requests for employees and interns, every request for HR/CEO
#[utoipa::path(
    get,
    path = "/api/leaves",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Paginated leave list", body = LeaveListResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn leave_list(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<LeaveFilter>,
) -> actix_web::Result<impl Responder> {
    let page = leave::list(pool.get_ref(), &auth, &query).await?;
    Ok(HttpResponse::Ok().json(page))
}

/// Whether the caller is on approved leave today
#[utoipa::path(
    get,
    path = "/api/leaves/check-today",
    responses(
        (status = 200, description = "Leave covering today, if any", body = LeaveToday),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn check_today(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> actix_web::Result<impl Responder> {
    let today = attendance::today(config.org_timezone);
    let result = leave::check_today(pool.get_ref(), auth.user_id, today).await?;
    Ok(HttpResponse::Ok().json(result))
}

/// Approve or reject a pending leave (HR/CEO)
#[utoipa::path(
    put,
    path = "/api/leaves/{leave_id}/status",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request")
    ),
    request_body = StatusUpdate,
    responses(
        (status = 200, description = "Leave decided", body = LeaveRequest),
        (status = 400, description = "Status must be Approved or Rejected"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not HR/CEO, or own request"),
        (status = 404, description = "Leave not found"),
        (status = 409, description = "Leave already processed", body = Object, example = json!({
            "message": "Request already Approved"
        }))
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn update_status(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    hub: web::Data<AttendanceHub>,
    path: web::Path<u64>,
    payload: web::Json<StatusUpdate>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_ceo()?;

    let leave_id = path.into_inner();
    let leave = leave::decide(pool.get_ref(), hub.get_ref(), &auth, leave_id, payload.status).await?;
    Ok(HttpResponse::Ok().json(leave))
}
