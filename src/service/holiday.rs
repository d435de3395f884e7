use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use sqlx::MySqlPool;
use tracing::info;
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};
use crate::model::holiday::{CompanyHoliday, HOLIDAY_COLUMNS, HolidayType};
use crate::rules::summary::month_bounds;
use crate::utils::db_utils::is_duplicate_key;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HolidayPayload {
    #[schema(example = "2026-01-26")]
    pub date: Option<NaiveDate>,
    #[schema(example = "Republic Day")]
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub holiday_type: Option<HolidayType>,
    pub is_recurring: Option<bool>,
}

/// Where a recurring holiday falls in `year`. Feb 29 has no counterpart in
/// common years.
pub fn occurrence_in(holiday: &CompanyHoliday, year: i32) -> Option<NaiveDate> {
    if !holiday.is_recurring {
        return (holiday.date.year() == year).then_some(holiday.date);
    }
    NaiveDate::from_ymd_opt(year, holiday.date.month(), holiday.date.day())
}

fn duplicate_or(err: sqlx::Error) -> AppError {
    if is_duplicate_key(&err) {
        AppError::validation("A holiday already exists on this date")
    } else {
        err.into()
    }
}

pub async fn find(pool: &MySqlPool, holiday_id: u64) -> Result<Option<CompanyHoliday>, sqlx::Error> {
    sqlx::query_as::<_, CompanyHoliday>(&format!(
        "SELECT {HOLIDAY_COLUMNS} FROM company_holidays WHERE id = ?"
    ))
    .bind(holiday_id)
    .fetch_optional(pool)
    .await
}

pub async fn list(pool: &MySqlPool, year: Option<i32>) -> AppResult<Vec<CompanyHoliday>> {
    let holidays = match year {
        Some(year) => {
            sqlx::query_as::<_, CompanyHoliday>(&format!(
                "SELECT {HOLIDAY_COLUMNS} FROM company_holidays \
                 WHERE YEAR(date) = ? OR is_recurring ORDER BY date"
            ))
            .bind(year)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, CompanyHoliday>(&format!(
                "SELECT {HOLIDAY_COLUMNS} FROM company_holidays ORDER BY date"
            ))
            .fetch_all(pool)
            .await?
        }
    };
    Ok(holidays)
}

/// Holidays falling in a month, recurring ones moved onto that year.
pub async fn in_month(pool: &MySqlPool, year: i32, month: u32) -> AppResult<Vec<CompanyHoliday>> {
    let (first, last) = month_bounds(year, month).ok_or_else(|| AppError::validation("Invalid month"))?;

    let rows = sqlx::query_as::<_, CompanyHoliday>(&format!(
        "SELECT {HOLIDAY_COLUMNS} FROM company_holidays \
         WHERE date BETWEEN ? AND ? OR (is_recurring AND MONTH(date) = ?) ORDER BY date"
    ))
    .bind(first)
    .bind(last)
    .bind(month)
    .fetch_all(pool)
    .await?;

    let mut holidays: Vec<CompanyHoliday> = rows
        .into_iter()
        .filter_map(|mut h| {
            let date = occurrence_in(&h, year)?;
            h.date = date;
            (date >= first && date <= last).then_some(h)
        })
        .collect();
    holidays.sort_by_key(|h| h.date);
    holidays.dedup_by_key(|h| h.date);
    Ok(holidays)
}

pub async fn on_date(pool: &MySqlPool, date: NaiveDate) -> AppResult<Option<CompanyHoliday>> {
    Ok(in_month(pool, date.year(), date.month())
        .await?
        .into_iter()
        .find(|h| h.date == date))
}

pub async fn create(pool: &MySqlPool, created_by: u64, payload: &HolidayPayload) -> AppResult<CompanyHoliday> {
    let name = payload.name.as_deref().map(str::trim).unwrap_or_default();
    let Some(date) = payload.date else {
        return Err(AppError::validation("Date and name are required"));
    };
    if name.is_empty() {
        return Err(AppError::validation("Date and name are required"));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO company_holidays (date, name, description, holiday_type, is_recurring, created_by)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(date)
    .bind(name)
    .bind(payload.description.as_deref().unwrap_or_default())
    .bind(payload.holiday_type.unwrap_or_default().as_ref())
    .bind(payload.is_recurring.unwrap_or(false))
    .bind(created_by)
    .execute(pool)
    .await
    .map_err(duplicate_or)?;

    info!(%date, name, created_by, "Holiday created");

    find(pool, result.last_insert_id())
        .await?
        .ok_or_else(|| AppError::Internal("inserted holiday not found".into()))
}

/// Replaces the fields present in `payload`.
pub async fn update(pool: &MySqlPool, holiday_id: u64, payload: &HolidayPayload) -> AppResult<CompanyHoliday> {
    let mut holiday = find(pool, holiday_id)
        .await?
        .ok_or_else(|| AppError::not_found("Holiday not found"))?;

    if let Some(date) = payload.date {
        holiday.date = date;
    }
    if let Some(name) = payload.name.as_deref().map(str::trim) {
        if name.is_empty() {
            return Err(AppError::validation("Name cannot be empty"));
        }
        holiday.name = name.to_string();
    }
    if let Some(description) = &payload.description {
        holiday.description = description.clone();
    }
    if let Some(kind) = payload.holiday_type {
        holiday.holiday_type = kind;
    }
    if let Some(recurring) = payload.is_recurring {
        holiday.is_recurring = recurring;
    }

    sqlx::query(
        r#"
        UPDATE company_holidays
        SET date = ?, name = ?, description = ?, holiday_type = ?, is_recurring = ?
        WHERE id = ?
        "#,
    )
    .bind(holiday.date)
    .bind(&holiday.name)
    .bind(&holiday.description)
    .bind(holiday.holiday_type.as_ref())
    .bind(holiday.is_recurring)
    .bind(holiday.id)
    .execute(pool)
    .await
    .map_err(duplicate_or)?;

    Ok(holiday)
}

pub async fn delete(pool: &MySqlPool, holiday_id: u64) -> AppResult<()> {
    let result = sqlx::query("DELETE FROM company_holidays WHERE id = ?")
        .bind(holiday_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Holiday not found"));
    }
    info!(holiday_id, "Holiday deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn holiday(y: i32, m: u32, d: u32, recurring: bool) -> CompanyHoliday {
        CompanyHoliday {
            id: 1,
            date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            name: "Day".into(),
            description: String::new(),
            holiday_type: HolidayType::default(),
            is_recurring: recurring,
            created_by: 1,
        }
    }

    #[test]
    fn one_off_holidays_stay_in_their_year() {
        let h = holiday(2025, 8, 15, false);
        assert_eq!(occurrence_in(&h, 2025), Some(h.date));
        assert_eq!(occurrence_in(&h, 2026), None);
    }

    #[test]
    fn recurring_holidays_move_to_the_requested_year() {
        let h = holiday(2020, 1, 26, true);
        assert_eq!(occurrence_in(&h, 2026), NaiveDate::from_ymd_opt(2026, 1, 26));
    }

    #[test]
    fn leap_day_skips_common_years() {
        let h = holiday(2024, 2, 29, true);
        assert_eq!(occurrence_in(&h, 2026), None);
        assert_eq!(occurrence_in(&h, 2028), NaiveDate::from_ymd_opt(2028, 2, 29));
    }

    #[test]
    fn default_type_is_public_holiday() {
        assert_eq!(HolidayType::default().as_ref(), "Public Holiday");
    }
}
