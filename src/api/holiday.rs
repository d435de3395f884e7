use crate::auth::auth::AuthUser;
use crate::model::holiday::CompanyHoliday;
use crate::service::holiday::{self, HolidayPayload};
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HolidayQuery {
    /// Only holidays in this year (recurring ones always included)
    pub year: Option<i32>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HolidayCheck {
    pub is_holiday: bool,
    pub holiday: Option<CompanyHoliday>,
}

#[utoipa::path(
    get,
    path = "/api/holidays",
    params(HolidayQuery),
    responses(
        (status = 200, description = "Company holidays", body = [CompanyHoliday]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Holiday"
)]
pub async fn list_holidays(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<HolidayQuery>,
) -> actix_web::Result<impl Responder> {
    let holidays = holiday::list(pool.get_ref(), query.year).await?;
    Ok(HttpResponse::Ok().json(holidays))
}

#[utoipa::path(
    get,
    path = "/api/holidays/month/{year}/{month}",
    params(
        ("year" = i32, Path, description = "Four-digit year"),
        ("month" = u32, Path, description = "Month, 1-12")
    ),
    responses(
        (status = 200, description = "Holidays in the month", body = [CompanyHoliday]),
        (status = 400, description = "Invalid month"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Holiday"
)]
pub async fn month_holidays(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<(i32, u32)>,
) -> actix_web::Result<impl Responder> {
    let (year, month) = path.into_inner();
    let holidays = holiday::in_month(pool.get_ref(), year, month).await?;
    Ok(HttpResponse::Ok().json(holidays))
}

#[utoipa::path(
    get,
    path = "/api/holidays/check/{date}",
    params(("date" = String, Path, description = "Day to check, YYYY-MM-DD")),
    responses(
        (status = 200, description = "Whether the day is a holiday", body = HolidayCheck),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Holiday"
)]
pub async fn check_date(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<NaiveDate>,
) -> actix_web::Result<impl Responder> {
    let found = holiday::on_date(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(HolidayCheck {
        is_holiday: found.is_some(),
        holiday: found,
    }))
}

#[utoipa::path(
    post,
    path = "/api/holidays",
    request_body = HolidayPayload,
    responses(
        (status = 201, description = "Holiday created", body = CompanyHoliday),
        (status = 400, description = "Missing fields or date already taken"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Holiday"
)]
pub async fn create_holiday(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<HolidayPayload>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_ceo()?;

    let created = holiday::create(pool.get_ref(), auth.user_id, &payload).await?;
    Ok(HttpResponse::Created().json(created))
}

#[utoipa::path(
    put,
    path = "/api/holidays/{holiday_id}",
    params(("holiday_id" = u64, Path, description = "Holiday id")),
    request_body = HolidayPayload,
    responses(
        (status = 200, description = "Holiday updated", body = CompanyHoliday),
        (status = 400, description = "Date already taken"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Holiday not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Holiday"
)]
pub async fn update_holiday(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<HolidayPayload>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_ceo()?;

    let updated = holiday::update(pool.get_ref(), path.into_inner(), &payload).await?;
    Ok(HttpResponse::Ok().json(updated))
}

#[utoipa::path(
    delete,
    path = "/api/holidays/{holiday_id}",
    params(("holiday_id" = u64, Path, description = "Holiday id")),
    responses(
        (status = 200, description = "Holiday deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Holiday not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Holiday"
)]
pub async fn delete_holiday(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_ceo()?;

    holiday::delete(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Holiday deleted" })))
}
