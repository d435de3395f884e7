use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::model::permission::{PERMISSION_COLUMNS, Permission};
use crate::model::status::RequestStatus;
use crate::push::AttendanceHub;
use crate::rules::MAX_PERMISSION_MINUTES;
use crate::rules::time::{parse_time_of_day, span_minutes};
use crate::service::{attendance, leave::check_decision};
use crate::utils::db_utils::{Filter, FilterValue, Window};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePermission {
    #[schema(example = "2026-03-05")]
    pub date: Option<NaiveDate>,
    #[schema(example = "15:00")]
    pub start_time: Option<String>,
    #[schema(example = "16:30")]
    pub end_time: Option<String>,
    #[schema(example = "Bank visit")]
    pub reason: Option<String>,
}

#[derive(Debug, PartialEq)]
pub struct NewPermission {
    pub date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub duration_minutes: i64,
    pub reason: String,
}

/// Minutes between two same-day times, bounded to `(0, 180]`.
pub fn permission_duration(start: &str, end: &str) -> AppResult<i64> {
    parse_window(start, end).map(|(_, _, minutes)| minutes)
}

fn parse_window(start: &str, end: &str) -> AppResult<(NaiveTime, NaiveTime, i64)> {
    let (Some(start), Some(end)) = (parse_time_of_day(start), parse_time_of_day(end)) else {
        return Err(AppError::validation("Invalid time format, expected HH:mm"));
    };

    let minutes = span_minutes(start, end);
    if minutes <= 0 {
        return Err(AppError::validation("Invalid time duration"));
    }
    if minutes > MAX_PERMISSION_MINUTES {
        return Err(AppError::validation(
            "Permission cannot exceed 3 hours. Please apply for Half-Day or Leave.",
        ));
    }
    Ok((start, end, minutes))
}

impl CreatePermission {
    /// Checks the payload and normalises both times to `HH:mm`, the stored form.
    pub fn validate(&self) -> AppResult<NewPermission> {
        let text = |v: &Option<String>| v.as_deref().map(str::trim).unwrap_or_default().to_string();
        let (start_time, end_time, reason) = (text(&self.start_time), text(&self.end_time), text(&self.reason));

        let Some(date) = self.date else {
            return Err(AppError::validation("Please fill all fields"));
        };
        if start_time.is_empty() || end_time.is_empty() || reason.is_empty() {
            return Err(AppError::validation("Please fill all fields"));
        }

        let (start, end, duration_minutes) = parse_window(&start_time, &end_time)?;
        Ok(NewPermission {
            date,
            start_time: start.format("%H:%M").to_string(),
            end_time: end.format("%H:%M").to_string(),
            duration_minutes,
            reason,
        })
    }
}

pub async fn find(pool: &MySqlPool, permission_id: u64) -> Result<Option<Permission>, sqlx::Error> {
    sqlx::query_as::<_, Permission>(&format!(
        "SELECT {PERMISSION_COLUMNS} FROM permissions WHERE id = ?"
    ))
    .bind(permission_id)
    .fetch_optional(pool)
    .await
}

pub async fn create(pool: &MySqlPool, user_id: u64, payload: &CreatePermission) -> AppResult<Permission> {
    let permission = payload.validate()?;

    let result = sqlx::query(
        r#"
        INSERT INTO permissions (user_id, date, start_time, end_time, duration_minutes, reason, status)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(user_id)
    .bind(permission.date)
    .bind(&permission.start_time)
    .bind(&permission.end_time)
    .bind(permission.duration_minutes)
    .bind(&permission.reason)
    .bind(RequestStatus::Pending.as_ref())
    .execute(pool)
    .await?;

    info!(
        user_id,
        date = %permission.date,
        minutes = permission.duration_minutes,
        "Permission requested"
    );

    find(pool, result.last_insert_id())
        .await?
        .ok_or_else(|| AppError::Internal("inserted permission not found".into()))
}

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PermissionFilter {
    /// Filter by employee (HR/CEO only)
    pub user_id: Option<u64>,
    pub status: Option<RequestStatus>,
    /// Only permissions on this day
    #[schema(example = "2026-03-05")]
    pub date: Option<NaiveDate>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PermissionListResponse {
    pub data: Vec<Permission>,
    pub page: u64,
    pub per_page: u64,
    pub total: i64,
}

pub async fn list(
    pool: &MySqlPool,
    caller: &AuthUser,
    query: &PermissionFilter,
) -> AppResult<PermissionListResponse> {
    let window = Window::new(query.page, query.per_page);

    let mut filter = Filter::default();
    if let Some(user_id) = caller.scoped_user(query.user_id) {
        filter.and("user_id = ?", FilterValue::U64(user_id));
    }
    if let Some(status) = query.status {
        filter.and("status = ?", FilterValue::Str(status.to_string()));
    }
    if let Some(date) = query.date {
        filter.and("date = ?", FilterValue::Date(date));
    }

    let total = filter.count(pool, "permissions").await?;
    let data = filter
        .fetch_page::<Permission>(
            pool,
            &format!("SELECT {PERMISSION_COLUMNS} FROM permissions"),
            "created_at DESC, id DESC",
            window,
        )
        .await?;

    Ok(PermissionListResponse {
        data,
        page: window.page,
        per_page: window.per_page,
        total,
    })
}

/// Approves or rejects a pending permission. Approval folds every approved
/// permission of the day into the attendance totals in the same transaction.
#[instrument(name = "permission_decide", skip(pool, hub, reviewer), fields(reviewer = reviewer.user_id))]
pub async fn decide(
    pool: &MySqlPool,
    hub: &AttendanceHub,
    reviewer: &AuthUser,
    permission_id: u64,
    next: RequestStatus,
) -> AppResult<Permission> {
    let mut tx = pool.begin().await?;

    let mut permission = sqlx::query_as::<_, Permission>(&format!(
        "SELECT {PERMISSION_COLUMNS} FROM permissions WHERE id = ? FOR UPDATE"
    ))
    .bind(permission_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::not_found("Permission not found"))?;

    check_decision(reviewer, permission.user_id, permission.status, next)?;

    permission.status = next;
    permission.approved_by = Some(reviewer.user_id);

    sqlx::query("UPDATE permissions SET status = ?, approved_by = ? WHERE id = ?")
        .bind(permission.status.as_ref())
        .bind(permission.approved_by)
        .bind(permission.id)
        .execute(&mut *tx)
        .await?;

    let record = match next {
        RequestStatus::Approved => {
            Some(attendance::fold_permissions(&mut tx, permission.user_id, permission.date).await?)
        }
        _ => None,
    };

    tx.commit().await?;

    info!(
        permission_id,
        user_id = permission.user_id,
        status = %permission.status,
        "Permission decided"
    );
    if let Some(record) = record {
        info!(
            user_id = record.user_id,
            date = %record.date,
            total_permission_minutes = record.total_permission_minutes,
            is_half_day = record.is_half_day,
            "Attendance totals refreshed"
        );
        hub.publish(record);
    }
    Ok(permission)
}
