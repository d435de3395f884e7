use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::status::RequestStatus;

/// Short intra-day absence.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    #[schema(example = 3)]
    pub id: u64,
    #[schema(example = 7)]
    pub user_id: u64,
    #[schema(example = "2026-03-05")]
    pub date: NaiveDate,
    #[schema(example = "15:00")]
    pub start_time: String,
    #[schema(example = "16:30")]
    pub end_time: String,
    #[schema(example = 90)]
    pub duration_minutes: i64,
    #[schema(example = "Bank visit")]
    pub reason: String,
    #[sqlx(try_from = "String")]
    pub status: RequestStatus,
    pub approved_by: Option<u64>,
    pub created_at: Option<DateTime<Utc>>,
}

pub const PERMISSION_COLUMNS: &str = "id, user_id, date, start_time, end_time, duration_minutes, \
     reason, status, approved_by, created_at";
