use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::service::{attendance, report};
use actix_web::{HttpResponse, Responder, web};
use sqlx::MySqlPool;

/// Headline numbers for HR and the CEO.
#[utoipa::path(
    get,
    path = "/api/dashboard/stats",
    responses(
        (status = 200, description = "Dashboard statistics", body = report::DashboardStats),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Dashboard"
)]
pub async fn stats(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_ceo()?;

    let today = attendance::today(config.org_timezone);
    let stats = report::dashboard_stats(pool.get_ref(), today).await?;
    Ok(HttpResponse::Ok().json(stats))
}
