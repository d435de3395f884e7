use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Default, Serialize, Deserialize, Display, EnumString,
    AsRefStr, ToSchema,
)]
pub enum HolidayType {
    #[default]
    #[serde(rename = "Public Holiday")]
    #[strum(serialize = "Public Holiday")]
    PublicHoliday,
    #[serde(rename = "Company Event")]
    #[strum(serialize = "Company Event")]
    CompanyEvent,
    Festival,
    Other,
}

impl TryFrom<String> for HolidayType {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompanyHoliday {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "2026-01-26")]
    pub date: NaiveDate,
    #[schema(example = "Republic Day")]
    pub name: String,
    pub description: String,
    #[sqlx(try_from = "String")]
    #[serde(rename = "type")]
    pub holiday_type: HolidayType,
    pub is_recurring: bool,
    pub created_by: u64,
}

pub const HOLIDAY_COLUMNS: &str =
    "id, date, name, description, holiday_type, is_recurring, created_by";
