use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Shift policy. Time-of-day fields keep the text HR entered; both
/// `HH:mm` and `hh:mm AM/PM` are accepted.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Shift {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "General")]
    pub name: String,
    #[schema(example = "09:00")]
    pub login_time: String,
    /// Minutes after login time that are not penalised.
    #[schema(example = 15)]
    pub grace_time: i64,
    #[schema(example = "13:00", nullable = true)]
    pub lunch_start_time: Option<String>,
    /// Allowed lunch length in minutes.
    #[schema(example = 45)]
    pub lunch_duration: i64,
    #[schema(example = "18:00")]
    pub logout_time: String,
    pub is_active: bool,
}
