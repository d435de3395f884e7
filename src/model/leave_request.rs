use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::status::RequestStatus;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaveRequest {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 7)]
    pub user_id: u64,
    #[schema(example = "2026-03-02")]
    pub start_date: NaiveDate,
    #[schema(example = "2026-03-04")]
    pub end_date: NaiveDate,
    #[schema(example = "Family function")]
    pub reason: String,
    #[schema(example = "Loss of Pay")]
    pub leave_type: String,
    #[sqlx(try_from = "String")]
    pub status: RequestStatus,
    pub approved_by: Option<u64>,
    /// Computed once, when the request is approved.
    #[schema(example = 4)]
    pub lop_days: i64,
    pub override_reason: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

pub const LEAVE_COLUMNS: &str = "id, user_id, start_date, end_date, reason, leave_type, status, \
     approved_by, lop_days, override_reason, created_at";
