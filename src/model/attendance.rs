use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::status::AttendanceStatus;

/// One row per (user, calendar day).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Attendance {
    pub id: u64,
    pub user_id: u64,
    pub date: NaiveDate,
    pub shift_name: Option<String>,
    pub login_time: Option<DateTime<Utc>>,
    pub logout_time: Option<DateTime<Utc>>,
    pub lunch_out: Option<DateTime<Utc>>,
    pub lunch_in: Option<DateTime<Utc>>,
    pub late_minutes: i64,
    pub lunch_exceeded_minutes: i64,
    pub total_permission_minutes: i64,
    pub is_half_day: bool,
    #[sqlx(try_from = "String")]
    pub status: AttendanceStatus,
    pub override_reason: Option<String>,
    pub version: u64,
}

pub const ATTENDANCE_COLUMNS: &str = "id, user_id, date, shift_name, login_time, logout_time, \
     lunch_out, lunch_in, late_minutes, lunch_exceeded_minutes, total_permission_minutes, \
     is_half_day, status, override_reason, version";
