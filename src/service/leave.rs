use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{MySqlConnection, MySqlPool};
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::model::attendance::Attendance;
use crate::model::leave_request::{LEAVE_COLUMNS, LeaveRequest};
use crate::model::status::RequestStatus;
use crate::push::AttendanceHub;
use crate::rules::lop::{chargeable_days, lop_days};
use crate::service::attendance;
use crate::utils::db_utils::{Filter, FilterValue, Window};

pub const DEFAULT_LEAVE_TYPE: &str = "Loss of Pay";

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateLeave {
    #[schema(example = "2026-03-02")]
    pub start_date: Option<NaiveDate>,
    #[schema(example = "2026-03-04")]
    pub end_date: Option<NaiveDate>,
    #[schema(example = "Family function")]
    pub reason: Option<String>,
    #[schema(example = "Loss of Pay")]
    pub leave_type: Option<String>,
}

/// Validated leave application.
#[derive(Debug, PartialEq)]
pub struct NewLeave {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
    pub leave_type: String,
}

impl CreateLeave {
    pub fn validate(&self) -> AppResult<NewLeave> {
        let reason = self.reason.as_deref().map(str::trim).unwrap_or_default();
        let (Some(start_date), Some(end_date)) = (self.start_date, self.end_date) else {
            return Err(AppError::validation("Please fill all fields"));
        };
        if reason.is_empty() {
            return Err(AppError::validation("Please fill all fields"));
        }
        if start_date > end_date {
            return Err(AppError::validation("startDate cannot be after endDate"));
        }

        let leave_type = self
            .leave_type
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_LEAVE_TYPE)
            .to_string();

        Ok(NewLeave {
            start_date,
            end_date,
            reason: reason.to_string(),
            leave_type,
        })
    }
}

pub async fn find(pool: &MySqlPool, leave_id: u64) -> Result<Option<LeaveRequest>, sqlx::Error> {
    sqlx::query_as::<_, LeaveRequest>(&format!(
        "SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE id = ?"
    ))
    .bind(leave_id)
    .fetch_optional(pool)
    .await
}

pub async fn create(pool: &MySqlPool, user_id: u64, payload: &CreateLeave) -> AppResult<LeaveRequest> {
    let leave = payload.validate()?;

    let result = sqlx::query(
        r#"
        INSERT INTO leave_requests (user_id, start_date, end_date, reason, leave_type, status)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(user_id)
    .bind(leave.start_date)
    .bind(leave.end_date)
    .bind(&leave.reason)
    .bind(&leave.leave_type)
    .bind(RequestStatus::Pending.as_ref())
    .execute(pool)
    .await?;

    info!(user_id, start = %leave.start_date, end = %leave.end_date, "Leave requested");

    find(pool, result.last_insert_id())
        .await?
        .ok_or_else(|| AppError::Internal("inserted leave request not found".into()))
}

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct LeaveFilter {
    /// Filter by employee (HR/CEO only)
    #[schema(example = 7)]
    pub user_id: Option<u64>,
    /// Pending, Approved or Rejected
    #[schema(example = "Pending")]
    pub status: Option<RequestStatus>,
    /// 1-based page number
    #[schema(example = 1)]
    pub page: Option<u64>,
    #[schema(example = 10)]
    pub per_page: Option<u64>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaveListResponse {
    pub data: Vec<LeaveRequest>,
    #[schema(example = 1)]
    pub page: u64,
    #[schema(example = 10)]
    pub per_page: u64,
    #[schema(example = 1)]
    pub total: i64,
}

/// Employees and interns see their own requests; HR and CEO see all.
pub async fn list(pool: &MySqlPool, caller: &AuthUser, query: &LeaveFilter) -> AppResult<LeaveListResponse> {
    let window = Window::new(query.page, query.per_page);

    let mut filter = Filter::default();
    if let Some(user_id) = caller.scoped_user(query.user_id) {
        filter.and("user_id = ?", FilterValue::U64(user_id));
    }
    if let Some(status) = query.status {
        filter.and("status = ?", FilterValue::Str(status.to_string()));
    }

    let total = filter.count(pool, "leave_requests").await?;
    let data = filter
        .fetch_page::<LeaveRequest>(
            pool,
            &format!("SELECT {LEAVE_COLUMNS} FROM leave_requests"),
            "created_at DESC, id DESC",
            window,
        )
        .await?;

    Ok(LeaveListResponse {
        data,
        page: window.page,
        per_page: window.per_page,
        total,
    })
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaveToday {
    pub has_leave: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leave: Option<LeaveRequest>,
}

/// Whether the caller has approved leave covering `today`.
pub async fn check_today(pool: &MySqlPool, user_id: u64, today: NaiveDate) -> AppResult<LeaveToday> {
    let leave = covering(pool, user_id, today).await?;
    Ok(LeaveToday {
        has_leave: leave.is_some(),
        leave,
    })
}

/// Checks a reviewer may move a request owned by `owner_id` to `next`.
pub fn check_decision(
    reviewer: &AuthUser,
    owner_id: u64,
    current: RequestStatus,
    next: RequestStatus,
) -> AppResult<()> {
    reviewer.require_hr_or_ceo()?;
    if next == RequestStatus::Pending {
        return Err(AppError::validation("Status must be Approved or Rejected"));
    }
    if owner_id == reviewer.user_id {
        return Err(AppError::forbidden("You cannot review your own request"));
    }
    if !current.can_transition_to(next) {
        return Err(AppError::conflict(format!("Request already {current}")));
    }
    Ok(())
}

/// Approves or rejects a pending leave. Approval computes LOP days and
/// marks every chargeable day On-Leave.
#[instrument(name = "leave_decide", skip(pool, hub, reviewer), fields(reviewer = reviewer.user_id))]
pub async fn decide(
    pool: &MySqlPool,
    hub: &AttendanceHub,
    reviewer: &AuthUser,
    leave_id: u64,
    next: RequestStatus,
) -> AppResult<LeaveRequest> {
    let mut tx = pool.begin().await?;

    let mut leave = sqlx::query_as::<_, LeaveRequest>(&format!(
        "SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE id = ? FOR UPDATE"
    ))
    .bind(leave_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::not_found("Leave not found"))?;

    check_decision(reviewer, leave.user_id, leave.status, next)?;

    let mut touched: Vec<Attendance> = Vec::new();
    leave.lop_days = match next {
        RequestStatus::Approved => {
            for day in chargeable_days(leave.start_date, leave.end_date) {
                touched.push(attendance::mark_on_leave(&mut tx, leave.user_id, day).await?);
            }
            lop_days(leave.start_date, leave.end_date)
        }
        _ => 0,
    };
    leave.status = next;
    leave.approved_by = Some(reviewer.user_id);

    sqlx::query("UPDATE leave_requests SET status = ?, approved_by = ?, lop_days = ? WHERE id = ?")
        .bind(leave.status.as_ref())
        .bind(leave.approved_by)
        .bind(leave.lop_days)
        .bind(leave.id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    info!(
        leave_id,
        user_id = leave.user_id,
        status = %leave.status,
        lop_days = leave.lop_days,
        days_marked = touched.len(),
        "Leave decided"
    );
    for record in touched {
        hub.publish(record);
    }
    Ok(leave)
}

/// Copies an override reason onto the approved leave covering `date`.
/// Best effort: when several match, the latest-starting one wins.
pub async fn attach_override(
    conn: &mut MySqlConnection,
    user_id: u64,
    date: NaiveDate,
    reason: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE leave_requests
        SET override_reason = ?
        WHERE user_id = ? AND status = ? AND start_date <= ? AND end_date >= ?
        ORDER BY start_date DESC
        LIMIT 1
        "#,
    )
    .bind(reason)
    .bind(user_id)
    .bind(RequestStatus::Approved.as_ref())
    .bind(date)
    .bind(date)
    .execute(conn)
    .await?;

    Ok(result.rows_affected())
}

/// Approved leave covering `date`, if any.
pub async fn covering(
    pool: &MySqlPool,
    user_id: u64,
    date: NaiveDate,
) -> Result<Option<LeaveRequest>, sqlx::Error> {
    sqlx::query_as::<_, LeaveRequest>(&format!(
        "SELECT {LEAVE_COLUMNS} FROM leave_requests \
         WHERE user_id = ? AND status = ? AND start_date <= ? AND end_date >= ? \
         ORDER BY start_date DESC LIMIT 1"
    ))
    .bind(user_id)
    .bind(RequestStatus::Approved.as_ref())
    .bind(date)
    .bind(date)
    .fetch_optional(pool)
    .await
}
