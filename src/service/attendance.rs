use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use sqlx::{MySqlConnection, MySqlPool};
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;

use crate::error::{AppError, AppResult};
use crate::model::attendance::{ATTENDANCE_COLUMNS, Attendance};
use crate::model::status::{AttendanceStatus, RequestStatus};
use crate::push::AttendanceHub;
use crate::rules::day::apply_day_totals;
use crate::rules::mark::{MarkClock, MarkRequest, MarkType, apply_mark};
use crate::service::leave;
use crate::utils::db_utils::{Filter, FilterValue, Window};
use crate::utils::shift_cache;

/// The organisation's calendar day and wall clock for an instant.
pub fn clock_at(now: DateTime<Utc>, tz: Tz) -> (NaiveDate, MarkClock) {
    let local = now.with_timezone(&tz).naive_local();
    (local.date(), MarkClock { now, local })
}

/// Today's date in the organisation timezone.
pub fn today(tz: Tz) -> NaiveDate {
    clock_at(Utc::now(), tz).0
}

/// Locks the (user, day) row, if it exists.
pub async fn lock_day(
    conn: &mut MySqlConnection,
    user_id: u64,
    date: NaiveDate,
) -> Result<Option<Attendance>, sqlx::Error> {
    sqlx::query_as::<_, Attendance>(&format!(
        "SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE user_id = ? AND date = ? FOR UPDATE"
    ))
    .bind(user_id)
    .bind(date)
    .fetch_optional(conn)
    .await
}

/// Creates a skeleton row with `status` unless one exists, then locks it.
pub async fn ensure_day(
    conn: &mut MySqlConnection,
    user_id: u64,
    date: NaiveDate,
    status: AttendanceStatus,
) -> AppResult<Attendance> {
    sqlx::query(
        r#"
        INSERT INTO attendance (user_id, date, status)
        VALUES (?, ?, ?)
        ON DUPLICATE KEY UPDATE id = id
        "#,
    )
    .bind(user_id)
    .bind(date)
    .bind(status.as_ref())
    .execute(&mut *conn)
    .await?;

    lock_day(conn, user_id, date)
        .await?
        .ok_or_else(|| AppError::Internal(format!("attendance row for user {user_id} on {date} vanished")))
}

/// Durations of every approved permission of the day. Read with a shared
/// lock so approvals committed while we waited for the row are included.
pub async fn approved_permission_minutes(
    conn: &mut MySqlConnection,
    user_id: u64,
    date: NaiveDate,
) -> Result<Vec<i64>, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        SELECT duration_minutes
        FROM permissions
        WHERE user_id = ? AND date = ? AND status = ?
        LOCK IN SHARE MODE
        "#,
    )
    .bind(user_id)
    .bind(date)
    .bind(RequestStatus::Approved.as_ref())
    .fetch_all(conn)
    .await
}

/// Writes back a locked row and bumps its version.
pub async fn save_day(conn: &mut MySqlConnection, record: &mut Attendance) -> AppResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE attendance
        SET shift_name = ?, login_time = ?, logout_time = ?, lunch_out = ?, lunch_in = ?,
            late_minutes = ?, lunch_exceeded_minutes = ?, total_permission_minutes = ?,
            is_half_day = ?, status = ?, override_reason = ?, version = version + 1
        WHERE id = ? AND version = ?
        "#,
    )
    .bind(&record.shift_name)
    .bind(record.login_time)
    .bind(record.logout_time)
    .bind(record.lunch_out)
    .bind(record.lunch_in)
    .bind(record.late_minutes)
    .bind(record.lunch_exceeded_minutes)
    .bind(record.total_permission_minutes)
    .bind(record.is_half_day)
    .bind(record.status.as_ref())
    .bind(&record.override_reason)
    .bind(record.id)
    .bind(record.version)
    .execute(conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::conflict(
            "Attendance record changed concurrently, please retry",
        ));
    }

    record.version += 1;
    Ok(())
}

/// Recomputes totals for a locked row against the day's approved permissions.
pub async fn recompute_and_save(conn: &mut MySqlConnection, record: &mut Attendance) -> AppResult<()> {
    let approved = approved_permission_minutes(&mut *conn, record.user_id, record.date).await?;
    apply_day_totals(record, &approved);
    save_day(conn, record).await
}

/// Punches that may open the day's row. These insert before locking so two
/// first logins never hold gap locks on the same missing row.
fn creates_day(kind: MarkType) -> bool {
    kind == MarkType::Login
}

/// Handles one login / lunch / logout punch for today.
#[instrument(name = "attendance_mark", skip(pool, hub, tz, request), fields(kind = ?request.kind))]
pub async fn mark(
    pool: &MySqlPool,
    hub: &AttendanceHub,
    tz: Tz,
    user_id: u64,
    request: &MarkRequest,
) -> AppResult<Attendance> {
    let (date, clock) = clock_at(Utc::now(), tz);
    let shift = shift_cache::for_user(pool, user_id).await?;

    let mut tx = pool.begin().await?;

    let mut record = if creates_day(request.kind) {
        ensure_day(&mut tx, user_id, date, AttendanceStatus::Absent).await?
    } else {
        lock_day(&mut tx, user_id, date)
            .await?
            .ok_or_else(|| AppError::validation("Must login first"))?
    };

    let effect = apply_mark(&mut record, request, clock, shift.as_deref())?;
    recompute_and_save(&mut tx, &mut record).await?;

    if let Some(reason) = effect.leave_override.as_deref() {
        leave::attach_override(&mut tx, user_id, date, reason).await?;
        info!(user_id, %date, "Logged in despite approved leave");
    }

    tx.commit().await?;

    info!(
        user_id,
        %date,
        status = %record.status,
        late_minutes = record.late_minutes,
        total_permission_minutes = record.total_permission_minutes,
        "Attendance marked"
    );
    hub.publish(record.clone());
    Ok(record)
}

/// Marks a leave day, keeping every other field of an existing row.
pub async fn mark_on_leave(
    conn: &mut MySqlConnection,
    user_id: u64,
    date: NaiveDate,
) -> AppResult<Attendance> {
    let mut record = ensure_day(&mut *conn, user_id, date, AttendanceStatus::OnLeave).await?;
    record.status = AttendanceStatus::OnLeave;
    recompute_and_save(conn, &mut record).await?;
    Ok(record)
}

/// Folds the day's approved permissions into its totals, creating a
/// Present skeleton when the employee hasn't logged in yet.
pub async fn fold_permissions(
    conn: &mut MySqlConnection,
    user_id: u64,
    date: NaiveDate,
) -> AppResult<Attendance> {
    let mut record = ensure_day(&mut *conn, user_id, date, AttendanceStatus::Present).await?;
    recompute_and_save(conn, &mut record).await?;
    Ok(record)
}

pub async fn find_day(
    pool: &MySqlPool,
    user_id: u64,
    date: NaiveDate,
) -> Result<Option<Attendance>, sqlx::Error> {
    sqlx::query_as::<_, Attendance>(&format!(
        "SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE user_id = ? AND date = ?"
    ))
    .bind(user_id)
    .bind(date)
    .fetch_optional(pool)
    .await
}

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct AttendanceFilter {
    /// Filter by employee (HR/CEO only)
    pub user_id: Option<u64>,
    /// First day, inclusive
    #[schema(example = "2026-03-01")]
    pub from: Option<NaiveDate>,
    /// Last day, inclusive
    #[schema(example = "2026-03-31")]
    pub to: Option<NaiveDate>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceListResponse {
    pub data: Vec<Attendance>,
    pub page: u64,
    pub per_page: u64,
    pub total: i64,
}

pub async fn list(
    pool: &MySqlPool,
    caller: &AuthUser,
    query: &AttendanceFilter,
) -> AppResult<AttendanceListResponse> {
    let window = Window::new(query.page, query.per_page);

    let mut filter = Filter::default();
    if let Some(user_id) = caller.scoped_user(query.user_id) {
        filter.and("user_id = ?", FilterValue::U64(user_id));
    }
    if let Some(from) = query.from {
        filter.and("date >= ?", FilterValue::Date(from));
    }
    if let Some(to) = query.to {
        filter.and("date <= ?", FilterValue::Date(to));
    }

    let total = filter.count(pool, "attendance").await?;
    let data = filter
        .fetch_page::<Attendance>(
            pool,
            &format!("SELECT {ATTENDANCE_COLUMNS} FROM attendance"),
            "date DESC, user_id",
            window,
        )
        .await?;

    Ok(AttendanceListResponse {
        data,
        page: window.page,
        per_page: window.per_page,
        total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    #[test]
    fn calendar_day_follows_org_timezone() {
        // 20:00 UTC on the 1st is already the 2nd in Kolkata (+05:30).
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 20, 0, 0).unwrap();
        let (date, clock) = clock_at(now, chrono_tz::Asia::Kolkata);
        assert_eq!(date, NaiveDate::from_ymd_opt(2026, 3, 2).unwrap());
        assert_eq!((clock.local.hour(), clock.local.minute()), (1, 30));
        assert_eq!(clock.now, now);

        let (utc_date, _) = clock_at(now, chrono_tz::UTC);
        assert_eq!(utc_date, NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
    }

    #[test]
    fn only_login_opens_the_day() {
        assert!(creates_day(MarkType::Login));
        for kind in [MarkType::LunchOut, MarkType::LunchIn, MarkType::Logout] {
            assert!(!creates_day(kind));
        }
    }
}
