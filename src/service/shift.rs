use serde::Deserialize;
use serde_json::Value;
use sqlx::MySqlPool;
use tracing::info;
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};
use crate::model::shift::Shift;
use crate::rules::time::parse_time_of_day;
use crate::utils::db_utils::{Updatable, build_update_sql, execute_update};
use crate::utils::shift_cache;

const SHIFT_UPDATABLE: [Updatable<'static>; 7] = [
    ("name", "name"),
    ("loginTime", "login_time"),
    ("graceTime", "grace_time"),
    ("lunchStartTime", "lunch_start_time"),
    ("lunchDuration", "lunch_duration"),
    ("logoutTime", "logout_time"),
    ("isActive", "is_active"),
];

const TIME_FIELDS: [&str; 3] = ["loginTime", "lunchStartTime", "logoutTime"];

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateShift {
    #[schema(example = "General")]
    pub name: Option<String>,
    #[schema(example = "09:00")]
    pub login_time: Option<String>,
    #[schema(example = 15)]
    pub grace_time: Option<i64>,
    #[schema(example = "13:00")]
    pub lunch_start_time: Option<String>,
    #[schema(example = 45)]
    pub lunch_duration: Option<i64>,
    #[schema(example = "18:00")]
    pub logout_time: Option<String>,
    pub is_active: Option<bool>,
}

fn check_time(field: &str, raw: &str) -> AppResult<()> {
    parse_time_of_day(raw)
        .map(|_| ())
        .ok_or_else(|| AppError::validation(format!("{field} must be HH:mm or hh:mm AM/PM")))
}

fn check_minutes(field: &str, value: i64) -> AppResult<()> {
    if value < 0 {
        return Err(AppError::validation(format!("{field} cannot be negative")));
    }
    Ok(())
}

impl CreateShift {
    pub fn validate(&self) -> AppResult<Shift> {
        let text = |v: &Option<String>| v.as_deref().map(str::trim).unwrap_or_default().to_string();
        let (name, login_time, logout_time) =
            (text(&self.name), text(&self.login_time), text(&self.logout_time));

        if name.is_empty() || login_time.is_empty() || logout_time.is_empty() {
            return Err(AppError::validation("Name, login time and logout time are required"));
        }
        check_time("loginTime", &login_time)?;
        check_time("logoutTime", &logout_time)?;

        let lunch_start_time = self
            .lunch_start_time
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);
        if let Some(t) = &lunch_start_time {
            check_time("lunchStartTime", t)?;
        }

        let grace_time = self.grace_time.unwrap_or(0);
        let lunch_duration = self.lunch_duration.unwrap_or(60);
        check_minutes("graceTime", grace_time)?;
        check_minutes("lunchDuration", lunch_duration)?;

        Ok(Shift {
            id: 0,
            name,
            login_time,
            grace_time,
            lunch_start_time,
            lunch_duration,
            logout_time,
            is_active: self.is_active.unwrap_or(true),
        })
    }
}

/// Rejects malformed time and minute fields in a partial update.
pub fn validate_update(payload: &Value) -> AppResult<()> {
    let Some(obj) = payload.as_object() else {
        return Err(AppError::validation("Payload must be a JSON object"));
    };

    for field in TIME_FIELDS {
        match obj.get(field) {
            Some(Value::String(raw)) => check_time(field, raw)?,
            Some(Value::Null) if field == "lunchStartTime" => {}
            Some(_) => return Err(AppError::validation(format!("{field} must be a string"))),
            None => {}
        }
    }
    for field in ["graceTime", "lunchDuration"] {
        if let Some(value) = obj.get(field) {
            let minutes = value
                .as_i64()
                .ok_or_else(|| AppError::validation(format!("{field} must be a whole number")))?;
            check_minutes(field, minutes)?;
        }
    }
    if let Some(Value::String(name)) = obj.get("name") {
        if name.trim().is_empty() {
            return Err(AppError::validation("Name cannot be empty"));
        }
    }
    Ok(())
}

pub async fn create(pool: &MySqlPool, payload: &CreateShift) -> AppResult<Shift> {
    let mut shift = payload.validate()?;

    let result = sqlx::query(
        r#"
        INSERT INTO shifts (name, login_time, grace_time, lunch_start_time, lunch_duration, logout_time, is_active)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&shift.name)
    .bind(&shift.login_time)
    .bind(shift.grace_time)
    .bind(&shift.lunch_start_time)
    .bind(shift.lunch_duration)
    .bind(&shift.logout_time)
    .bind(shift.is_active)
    .execute(pool)
    .await?;

    shift.id = result.last_insert_id();
    info!(shift_id = shift.id, name = %shift.name, "Shift created");
    Ok(shift)
}

pub async fn update(pool: &MySqlPool, shift_id: u64, payload: &Value) -> AppResult<Shift> {
    validate_update(payload)?;
    let update = build_update_sql("shifts", payload, &SHIFT_UPDATABLE, shift_id)?;

    let mut conn = pool.acquire().await?;
    execute_update(&mut conn, update).await?;
    shift_cache::invalidate(shift_id).await;

    let shift = shift_cache::get(pool, shift_id)
        .await?
        .ok_or_else(|| AppError::not_found("Shift not found"))?;
    info!(shift_id, "Shift updated");
    Ok((*shift).clone())
}

pub async fn delete(pool: &MySqlPool, shift_id: u64) -> AppResult<()> {
    let result = sqlx::query("DELETE FROM shifts WHERE id = ?")
        .bind(shift_id)
        .execute(pool)
        .await?;
    shift_cache::invalidate(shift_id).await;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Shift not found"));
    }
    info!(shift_id, "Shift deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload() -> CreateShift {
        CreateShift {
            name: Some("General".into()),
            login_time: Some("09:00".into()),
            grace_time: Some(15),
            lunch_start_time: Some("01:00 PM".into()),
            lunch_duration: None,
            logout_time: Some("06:00 PM".into()),
            is_active: None,
        }
    }

    #[test]
    fn accepts_both_clock_formats() {
        let shift = payload().validate().unwrap();
        assert_eq!(shift.lunch_start_time.as_deref(), Some("01:00 PM"));
        assert_eq!(shift.lunch_duration, 60);
        assert!(shift.is_active);
    }

    #[test]
    fn required_fields_and_times_are_checked() {
        let missing = CreateShift {
            logout_time: None,
            ..payload()
        };
        assert!(missing.validate().is_err());

        let garbled = CreateShift {
            login_time: Some("9 o'clock".into()),
            ..payload()
        };
        assert!(matches!(garbled.validate(), Err(AppError::Validation(_))));

        let negative = CreateShift {
            grace_time: Some(-5),
            ..payload()
        };
        assert!(negative.validate().is_err());
    }

    #[test]
    fn partial_updates_validate_present_fields_only() {
        assert!(validate_update(&json!({ "graceTime": 10 })).is_ok());
        assert!(validate_update(&json!({ "lunchStartTime": null })).is_ok());
        assert!(validate_update(&json!({ "loginTime": "25:99" })).is_err());
        assert!(validate_update(&json!({ "lunchDuration": "long" })).is_err());
        assert!(validate_update(&json!({ "name": "  " })).is_err());
    }
}
