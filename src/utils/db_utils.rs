use chrono::NaiveDate;
use serde_json::Value;
use sqlx::mysql::MySqlRow;
use sqlx::{FromRow, MySqlConnection, MySqlPool};

use crate::error::AppError;

/// ===============================
/// SQL bindable value enum
/// ===============================
#[derive(Debug, PartialEq)]
pub enum SqlValue {
    String(String),
    I64(i64),
    U64(u64),
    F64(f64),
    Bool(bool),
    Date(NaiveDate),
    Null,
}

/// ===============================
/// SQL update container
/// ===============================
#[derive(Debug)]
pub struct SqlUpdate {
    pub sql: String,
    pub values: Vec<SqlValue>,
}

/// Maps an accepted JSON key to the column it updates.
pub type Updatable<'a> = (&'a str, &'a str);

/// ===============================
/// Build dynamic UPDATE SQL
/// ===============================
///
/// Only keys listed in `allowed` may appear in the payload; anything else is
/// rejected, so column names never come from the client.
pub fn build_update_sql(
    table: &str,
    payload: &Value,
    allowed: &[Updatable<'_>],
    id_value: u64,
) -> Result<SqlUpdate, AppError> {
    let obj = payload
        .as_object()
        .ok_or_else(|| AppError::validation("Payload must be a JSON object"))?;

    if obj.is_empty() {
        return Err(AppError::validation("No fields provided for update"));
    }

    let mut columns = Vec::with_capacity(obj.len());
    let mut values = Vec::with_capacity(obj.len() + 1);

    for (key, value) in obj {
        let column = allowed
            .iter()
            .find(|(json_key, _)| json_key == key)
            .map(|(_, column)| *column)
            .ok_or_else(|| AppError::validation(format!("Field '{key}' cannot be updated")))?;

        columns.push(format!("{column} = ?"));

        // Convert JSON values → SqlValue
        match value {
            Value::String(s) => match NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                Ok(d) => values.push(SqlValue::Date(d)),
                Err(_) => values.push(SqlValue::String(s.clone())),
            },
            Value::Number(n) => {
                if let Some(u) = n.as_u64() {
                    values.push(SqlValue::U64(u));
                } else if let Some(i) = n.as_i64() {
                    values.push(SqlValue::I64(i));
                } else if let Some(f) = n.as_f64() {
                    values.push(SqlValue::F64(f));
                }
            }
            Value::Bool(b) => values.push(SqlValue::Bool(*b)),
            Value::Null => values.push(SqlValue::Null),
            _ => return Err(AppError::validation("Unsupported JSON value type")),
        }
    }

    let sql = format!("UPDATE {} SET {} WHERE id = ?", table, columns.join(", "));

    // WHERE id = ?
    values.push(SqlValue::U64(id_value));

    Ok(SqlUpdate { sql, values })
}

/// ===============================
/// Execute the update
/// ===============================
pub async fn execute_update(
    conn: &mut MySqlConnection,
    update: SqlUpdate,
) -> Result<u64, sqlx::Error> {
    let mut query = sqlx::query(&update.sql);

    for value in update.values {
        query = match value {
            SqlValue::String(v) => query.bind(v),
            SqlValue::I64(v) => query.bind(v),
            SqlValue::U64(v) => query.bind(v),
            SqlValue::F64(v) => query.bind(v),
            SqlValue::Bool(v) => query.bind(v),
            SqlValue::Date(v) => query.bind(v),
            SqlValue::Null => query.bind(None::<String>),
        };
    }

    let result = query.execute(conn).await?;
    Ok(result.rows_affected())
}

/// MySQL reports unique-key violations as SQLSTATE 23000.
pub fn is_duplicate_key(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23000"))
}

/// Typed value bound into a list filter.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    U64(u64),
    Str(String),
    Date(NaiveDate),
}

/// 1-based page window; `per_page` defaults to 10 and is capped at 100.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Window {
    pub page: u64,
    pub per_page: u64,
    pub offset: u64,
}

impl Window {
    pub fn new(page: Option<u64>, per_page: Option<u64>) -> Self {
        let per_page = per_page.unwrap_or(10).clamp(1, 100);
        let page = page.unwrap_or(1).max(1);
        Self {
            page,
            per_page,
            offset: (page - 1) * per_page,
        }
    }
}

/// Dynamic `WHERE` clause for list endpoints.
#[derive(Debug)]
pub struct Filter {
    clause: String,
    args: Vec<FilterValue>,
}

impl Default for Filter {
    fn default() -> Self {
        Self {
            clause: String::from(" WHERE 1=1"),
            args: Vec::new(),
        }
    }
}

impl Filter {
    /// Appends `AND <condition>`; the condition must hold exactly one `?`.
    pub fn and(&mut self, condition: &str, value: FilterValue) -> &mut Self {
        self.clause.push_str(" AND ");
        self.clause.push_str(condition);
        self.args.push(value);
        self
    }

    pub fn sql(&self) -> &str {
        &self.clause
    }

    pub async fn count(&self, pool: &MySqlPool, table: &str) -> Result<i64, sqlx::Error> {
        let sql = format!("SELECT COUNT(*) FROM {table}{}", self.clause);
        let mut q = sqlx::query_scalar::<_, i64>(&sql);
        for arg in &self.args {
            q = match arg {
                FilterValue::U64(v) => q.bind(*v),
                FilterValue::Str(s) => q.bind(s.as_str()),
                FilterValue::Date(d) => q.bind(*d),
            };
        }
        q.fetch_one(pool).await
    }

    /// Runs `select` (everything before `WHERE`) for one page.
    pub async fn fetch_page<T>(
        &self,
        pool: &MySqlPool,
        select: &str,
        order_by: &str,
        window: Window,
    ) -> Result<Vec<T>, sqlx::Error>
    where
        T: for<'r> FromRow<'r, MySqlRow> + Send + Unpin,
    {
        let sql = format!("{select}{} ORDER BY {order_by} LIMIT ? OFFSET ?", self.clause);
        let mut q = sqlx::query_as::<_, T>(&sql);
        for arg in &self.args {
            q = match arg {
                FilterValue::U64(v) => q.bind(*v),
                FilterValue::Str(s) => q.bind(s.as_str()),
                FilterValue::Date(d) => q.bind(*d),
            };
        }
        q.bind(window.per_page)
            .bind(window.offset)
            .fetch_all(pool)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SHIFT_FIELDS: [Updatable<'static>; 3] = [
        ("name", "name"),
        ("graceTime", "grace_time"),
        ("isActive", "is_active"),
    ];

    #[test]
    fn maps_json_keys_to_columns() {
        let update = build_update_sql(
            "shifts",
            &json!({ "graceTime": 10, "name": "Night" }),
            &SHIFT_FIELDS,
            4,
        )
        .unwrap();

        assert!(update.sql.starts_with("UPDATE shifts SET "));
        assert!(update.sql.contains("grace_time = ?"));
        assert!(update.sql.ends_with("WHERE id = ?"));
        assert_eq!(update.values.len(), 3);
        assert_eq!(update.values.last(), Some(&SqlValue::U64(4)));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = build_update_sql(
            "shifts",
            &json!({ "name": "x", "id = 1; DROP TABLE shifts; --": 1 }),
            &SHIFT_FIELDS,
            1,
        );
        assert!(err.is_err());
    }

    #[test]
    fn empty_and_non_object_payloads_are_rejected() {
        assert!(build_update_sql("shifts", &json!({}), &SHIFT_FIELDS, 1).is_err());
        assert!(build_update_sql("shifts", &json!([1, 2]), &SHIFT_FIELDS, 1).is_err());
    }

    #[test]
    fn dates_and_nulls_are_typed() {
        let fields = [("dob", "dob"), ("address", "address")];
        let update =
            build_update_sql("users", &json!({ "dob": "1990-05-01", "address": null }), &fields, 2)
                .unwrap();
        assert!(update
            .values
            .contains(&SqlValue::Date(NaiveDate::from_ymd_opt(1990, 5, 1).unwrap())));
        assert!(update.values.contains(&SqlValue::Null));
    }

    #[test]
    fn window_defaults_and_caps() {
        assert_eq!(
            Window::new(None, None),
            Window {
                page: 1,
                per_page: 10,
                offset: 0
            }
        );
        let w = Window::new(Some(3), Some(500));
        assert_eq!((w.per_page, w.offset), (100, 200));
        assert_eq!(Window::new(Some(0), Some(0)).page, 1);
    }

    #[test]
    fn filter_accumulates_conditions() {
        let mut filter = Filter::default();
        filter
            .and("user_id = ?", FilterValue::U64(7))
            .and("status = ?", FilterValue::Str("Pending".into()));
        assert_eq!(filter.sql(), " WHERE 1=1 AND user_id = ? AND status = ?");
        assert_eq!(filter.args.len(), 2);
    }
}
