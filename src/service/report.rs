//! Monthly summaries and the HR/CEO dashboard.

use std::collections::HashMap;

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;
use sqlx::MySqlPool;
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};
use crate::model::attendance::{ATTENDANCE_COLUMNS, Attendance};
use crate::model::leave_request::{LEAVE_COLUMNS, LeaveRequest};
use crate::model::permission::{PERMISSION_COLUMNS, Permission};
use crate::model::role::Role;
use crate::model::status::{AttendanceStatus, RequestStatus};
use crate::rules::summary::{MonthInput, MonthlySummary, month_bounds, summarize_month};
use crate::service::holiday;

const TREND_DAYS: i64 = 7;
const RECENT_LIMIT: i64 = 5;

pub async fn monthly_summary(
    pool: &MySqlPool,
    user_id: u64,
    year: i32,
    month: u32,
    today: NaiveDate,
) -> AppResult<MonthlySummary> {
    let (first, last) = month_bounds(year, month).ok_or_else(|| AppError::validation("Invalid month or year"))?;

    let records = sqlx::query_as::<_, Attendance>(&format!(
        "SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE user_id = ? AND date BETWEEN ? AND ?"
    ))
    .bind(user_id)
    .bind(first)
    .bind(last)
    .fetch_all(pool)
    .await?;

    let holidays: Vec<NaiveDate> = holiday::in_month(pool, year, month)
        .await?
        .into_iter()
        .map(|h| h.date)
        .collect();

    let approved_leaves = sqlx::query_as::<_, (NaiveDate, NaiveDate)>(
        r#"
        SELECT start_date, end_date
        FROM leave_requests
        WHERE user_id = ? AND status = ? AND start_date <= ? AND end_date >= ?
        "#,
    )
    .bind(user_id)
    .bind(RequestStatus::Approved.as_ref())
    .bind(last)
    .bind(first)
    .fetch_all(pool)
    .await?;

    summarize_month(&MonthInput {
        user_id,
        year,
        month,
        today,
        records: &records,
        holidays: &holidays,
        approved_leaves: &approved_leaves,
    })
    .ok_or_else(|| AppError::validation("Invalid month or year"))
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub total_employees: i64,
    pub present_today: i64,
    pub absent_today: i64,
    pub late_today: i64,
    pub on_leave_today: i64,
    /// Percent of employee-days attended so far this month, one decimal.
    pub avg_attendance_rate: f64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PendingRequests {
    pub leaves: i64,
    pub permissions: i64,
    pub total: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecentActivity {
    pub leaves: Vec<LeaveRequest>,
    pub permissions: Vec<Permission>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct RoleCount {
    pub role: Role,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct TrendPoint {
    #[schema(example = "Mar 02")]
    pub date: String,
    pub count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub overview: Overview,
    pub pending_requests: PendingRequests,
    pub recent_activity: RecentActivity,
    pub role_distribution: Vec<RoleCount>,
    pub attendance_trend: Vec<TrendPoint>,
}

/// A record counts as attended once the employee logged in.
fn attended(record: &Attendance) -> bool {
    record.login_time.is_some()
        || matches!(record.status, AttendanceStatus::Present | AttendanceStatus::HalfDay)
}

pub fn overview(
    total_employees: i64,
    today_records: &[Attendance],
    month_attended: i64,
    days_elapsed: u32,
) -> Overview {
    let present_today = today_records.iter().filter(|r| attended(r)).count() as i64;
    let rate = if total_employees > 0 && days_elapsed > 0 {
        let pct = month_attended as f64 / (total_employees as f64 * days_elapsed as f64) * 100.0;
        (pct * 10.0).round() / 10.0
    } else {
        0.0
    };

    Overview {
        total_employees,
        present_today,
        absent_today: (total_employees - present_today).max(0),
        late_today: today_records.iter().filter(|r| r.late_minutes > 0).count() as i64,
        on_leave_today: today_records
            .iter()
            .filter(|r| r.status == AttendanceStatus::OnLeave)
            .count() as i64,
        avg_attendance_rate: rate,
    }
}

/// Attendance counts for the seven days ending `today`, oldest first.
pub fn trend(today: NaiveDate, counts: &HashMap<NaiveDate, i64>) -> Vec<TrendPoint> {
    (0..TREND_DAYS)
        .rev()
        .map(|back| {
            let day = today - Duration::days(back);
            TrendPoint {
                date: day.format("%b %d").to_string(),
                count: counts.get(&day).copied().unwrap_or(0),
            }
        })
        .collect()
}

async fn count_pending(pool: &MySqlPool, table: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {table} WHERE status = ?"))
        .bind(RequestStatus::Pending.as_ref())
        .fetch_one(pool)
        .await
}

pub async fn dashboard_stats(pool: &MySqlPool, today: NaiveDate) -> AppResult<DashboardStats> {
    let total_employees = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM users WHERE is_active AND role_id IN (?, ?)",
    )
    .bind(Role::Employee.id())
    .bind(Role::Intern.id())
    .fetch_one(pool)
    .await?;

    let today_records = sqlx::query_as::<_, Attendance>(&format!(
        "SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE date = ?"
    ))
    .bind(today)
    .fetch_all(pool)
    .await?;

    let month_start = today.with_day(1).unwrap_or(today);
    let attended_sql = "(status IN (?, ?) OR login_time IS NOT NULL)";

    let month_attended = sqlx::query_scalar::<_, i64>(&format!(
        "SELECT COUNT(*) FROM attendance WHERE date BETWEEN ? AND ? AND {attended_sql}"
    ))
    .bind(month_start)
    .bind(today)
    .bind(AttendanceStatus::Present.as_ref())
    .bind(AttendanceStatus::HalfDay.as_ref())
    .fetch_one(pool)
    .await?;

    let trend_rows = sqlx::query_as::<_, (NaiveDate, i64)>(&format!(
        "SELECT date, COUNT(*) FROM attendance WHERE date BETWEEN ? AND ? AND {attended_sql} GROUP BY date"
    ))
    .bind(today - Duration::days(TREND_DAYS - 1))
    .bind(today)
    .bind(AttendanceStatus::Present.as_ref())
    .bind(AttendanceStatus::HalfDay.as_ref())
    .fetch_all(pool)
    .await?;

    let pending_leaves = count_pending(pool, "leave_requests").await?;
    let pending_permissions = count_pending(pool, "permissions").await?;

    let recent_leaves = sqlx::query_as::<_, LeaveRequest>(&format!(
        "SELECT {LEAVE_COLUMNS} FROM leave_requests ORDER BY created_at DESC, id DESC LIMIT ?"
    ))
    .bind(RECENT_LIMIT)
    .fetch_all(pool)
    .await?;

    let recent_permissions = sqlx::query_as::<_, Permission>(&format!(
        "SELECT {PERMISSION_COLUMNS} FROM permissions ORDER BY created_at DESC, id DESC LIMIT ?"
    ))
    .bind(RECENT_LIMIT)
    .fetch_all(pool)
    .await?;

    let role_distribution = sqlx::query_as::<_, (u8, i64)>(
        "SELECT role_id, COUNT(*) FROM users WHERE is_active GROUP BY role_id ORDER BY role_id",
    )
    .fetch_all(pool)
    .await?
    .into_iter()
    .filter_map(|(id, count)| Role::from_id(id).map(|role| RoleCount { role, count }))
    .collect();

    Ok(DashboardStats {
        overview: overview(total_employees, &today_records, month_attended, today.day()),
        pending_requests: PendingRequests {
            leaves: pending_leaves,
            permissions: pending_permissions,
            total: pending_leaves + pending_permissions,
        },
        recent_activity: RecentActivity {
            leaves: recent_leaves,
            permissions: recent_permissions,
        },
        role_distribution,
        attendance_trend: trend(today, &trend_rows.into_iter().collect()),
    })
}
