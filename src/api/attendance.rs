use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::model::attendance::Attendance;
use crate::push::{AttendanceHub, sse_frame};
use crate::rules::mark::MarkRequest;
use crate::rules::summary::MonthlySummary;
use crate::service::attendance::{self, AttendanceFilter, AttendanceListResponse};
use crate::service::report;
use actix_web::{HttpResponse, Responder, http::header, web};
use futures_util::StreamExt;
use serde::Deserialize;
use sqlx::MySqlPool;
use utoipa::IntoParams;

/// Attendance records, newest day first.
#[utoipa::path(
    get,
    path = "/api/attendance",
    params(AttendanceFilter),
    responses(
        (status = 200, description = "Paginated attendance records", body = AttendanceListResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn list_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<AttendanceFilter>,
) -> actix_web::Result<impl Responder> {
    let page = attendance::list(pool.get_ref(), &auth, &query).await?;
    Ok(HttpResponse::Ok().json(page))
}

/// The caller's record for today, or `{}` before the first login.
#[utoipa::path(
    get,
    path = "/api/attendance/today",
    responses(
        (status = 200, description = "Today's record", body = Attendance),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn today(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> actix_web::Result<impl Responder> {
    let date = attendance::today(config.org_timezone);
    let record = attendance::find_day(pool.get_ref(), auth.user_id, date)
        .await
        .map_err(crate::error::AppError::from)?;

    Ok(match record {
        Some(record) => HttpResponse::Ok().json(record),
        None => HttpResponse::Ok().json(serde_json::json!({})),
    })
}

/// Login, lunch-out, lunch-in or logout for today.
#[utoipa::path(
    post,
    path = "/api/attendance/mark",
    request_body = MarkRequest,
    responses(
        (status = 200, description = "Updated record", body = Attendance),
        (status = 400, description = "Out-of-order or repeated punch", body = Object, example = json!({
            "message": "Must login first"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Approved leave today, override required", body = Object, example = json!({
            "message": "You have approved leave today. Provide an override reason to log in.",
            "requiresOverride": true
        }))
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn mark(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    hub: web::Data<AttendanceHub>,
    config: web::Data<Config>,
    payload: web::Json<MarkRequest>,
) -> actix_web::Result<impl Responder> {
    let record = attendance::mark(
        pool.get_ref(),
        hub.get_ref(),
        config.org_timezone,
        auth.user_id,
        &payload,
    )
    .await?;
    Ok(HttpResponse::Ok().json(record))
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct SummaryQuery {
    /// Employee to summarise (HR/CEO only); defaults to the caller
    pub user_id: Option<u64>,
}

#[utoipa::path(
    get,
    path = "/api/attendance/summary/{month}/{year}",
    params(
        ("month" = u32, Path, description = "Month, 1-12"),
        ("year" = i32, Path, description = "Four-digit year"),
        SummaryQuery
    ),
    responses(
        (status = 200, description = "Monthly summary", body = MonthlySummary),
        (status = 400, description = "Invalid month or year"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn summary(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<(u32, i32)>,
    query: web::Query<SummaryQuery>,
) -> actix_web::Result<impl Responder> {
    let (month, year) = path.into_inner();
    let user_id = auth.scoped_user(query.user_id).unwrap_or(auth.user_id);
    let today = attendance::today(config.org_timezone);

    let summary = report::monthly_summary(pool.get_ref(), user_id, year, month, today).await?;
    Ok(HttpResponse::Ok().json(summary))
}

/// Server-Sent Events stream of attendance updates visible to the caller.
#[utoipa::path(
    get,
    path = "/api/attendance/stream",
    responses(
        (status = 200, description = "text/event-stream of `attendanceUpdate` events"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn stream(auth: AuthUser, hub: web::Data<AttendanceHub>) -> impl Responder {
    tracing::debug!(user_id = auth.user_id, role = %auth.role, "Push subscriber connected");

    let hello = futures::stream::once(async {
        Ok::<_, serde_json::Error>(web::Bytes::from_static(b": connected\n\n"))
    });
    let events = hub
        .subscribe(auth.viewer())
        .map(|record| sse_frame(&record));

    HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header((header::CACHE_CONTROL, "no-cache"))
        .streaming(hello.chain(events))
}
