use serde::Deserialize;
use serde_json::{Map, Value};
use sqlx::{MySqlConnection, MySqlPool};
use tracing::info;
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;
use crate::auth::password::hash_password;
use crate::error::{AppError, AppResult};
use crate::model::role::Role;
use crate::model::user::{BLOOD_GROUPS, USER_COLUMNS, User};
use crate::utils::db_utils::{Updatable, build_update_sql, execute_update};

/// Fields HR/CEO may change on another user.
pub const USER_UPDATABLE: [Updatable<'static>; 13] = [
    ("name", "name"),
    ("email", "email"),
    ("role", "role_id"),
    ("shiftId", "shift_id"),
    ("isActive", "is_active"),
    ("designation", "designation"),
    ("joiningDate", "joining_date"),
    ("address", "address"),
    ("bloodGroup", "blood_group"),
    ("idNumber", "id_number"),
    ("phoneNumber", "phone_number"),
    ("dob", "dob"),
    ("password", "password"),
];

/// Fields a user may change on their own profile.
pub const PROFILE_UPDATABLE: [Updatable<'static>; 8] = [
    ("name", "name"),
    ("email", "email"),
    ("address", "address"),
    ("bloodGroup", "blood_group"),
    ("idNumber", "id_number"),
    ("phoneNumber", "phone_number"),
    ("dob", "dob"),
    ("password", "password"),
];

pub async fn find(pool: &MySqlPool, user_id: u64) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_email(pool: &MySqlPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?"))
        .bind(email)
        .fetch_optional(pool)
        .await
}

async fn email_taken(pool: &MySqlPool, email: &str, except: Option<u64>) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = ? AND id <> ?)")
        .bind(email)
        .bind(except.unwrap_or(0))
        .fetch_one(pool)
        .await
}

pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUser {
    #[schema(example = "Asha Raman")]
    pub name: String,
    #[schema(example = "asha@company.com")]
    pub email: String,
    #[schema(example = "s3cret!")]
    pub password: String,
    pub role: Role,
    #[schema(example = 1)]
    pub shift_id: Option<u64>,
    pub designation: Option<String>,
    pub joining_date: Option<chrono::NaiveDate>,
}

/// CEO creates HR, HR creates Employees and Interns.
pub fn check_creates(caller: &AuthUser, target: Role) -> AppResult<()> {
    caller.require_hr_or_ceo()?;
    if caller.role.can_create(target) {
        Ok(())
    } else {
        Err(AppError::forbidden(format!(
            "{} cannot create {} accounts",
            caller.role, target
        )))
    }
}

/// HR edits only Employees and Interns; the CEO edits anyone.
pub fn check_edits(caller: &AuthUser, target: Role) -> AppResult<()> {
    caller.require_hr_or_ceo()?;
    if caller.role.can_edit(target) {
        Ok(())
    } else {
        Err(AppError::forbidden(format!(
            "{} cannot update {} accounts",
            caller.role, target
        )))
    }
}

pub async fn create(pool: &MySqlPool, caller: &AuthUser, payload: &CreateUser) -> AppResult<User> {
    check_creates(caller, payload.role)?;

    let name = payload.name.trim();
    let email = normalize_email(&payload.email);
    if name.is_empty() || email.is_empty() || payload.password.is_empty() {
        return Err(AppError::validation("Name, email and password are required"));
    }
    if email_taken(pool, &email, None).await? {
        return Err(AppError::validation("User already exists"));
    }

    let hashed = hash_password(&payload.password)?;
    let result = sqlx::query(
        r#"
        INSERT INTO users (name, email, password, role_id, shift_id, designation, joining_date)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(name)
    .bind(&email)
    .bind(hashed)
    .bind(payload.role.id())
    .bind(payload.shift_id)
    .bind(&payload.designation)
    .bind(payload.joining_date)
    .execute(pool)
    .await?;

    let user_id = result.last_insert_id();
    info!(user_id, role = %payload.role, created_by = caller.user_id, "User created");

    find(pool, user_id)
        .await?
        .ok_or_else(|| AppError::Internal("inserted user not found".into()))
}

/// Rewrites wire values into their stored form: role names become ids,
/// passwords are hashed (an empty one is dropped), emails are normalised.
pub fn prepare_update(payload: &Value) -> AppResult<Value> {
    let obj = payload
        .as_object()
        .ok_or_else(|| AppError::validation("Payload must be a JSON object"))?;

    let mut out = Map::with_capacity(obj.len());
    for (key, value) in obj {
        match (key.as_str(), value) {
            ("password", Value::String(p)) if p.is_empty() => continue,
            ("password", Value::String(p)) => {
                out.insert(key.clone(), Value::String(hash_password(p)?));
            }
            ("role", Value::String(name)) => {
                let role: Role = name
                    .parse()
                    .map_err(|_| AppError::validation(format!("Unknown role '{name}'")))?;
                out.insert(key.clone(), Value::from(role.id()));
            }
            ("email", Value::String(e)) => {
                out.insert(key.clone(), Value::String(normalize_email(e)));
            }
            ("bloodGroup", Value::String(g)) if !BLOOD_GROUPS.contains(&g.as_str()) => {
                return Err(AppError::validation(format!("Invalid blood group '{g}'")));
            }
            _ => {
                out.insert(key.clone(), value.clone());
            }
        }
    }
    Ok(Value::Object(out))
}

async fn apply_update(
    conn: &mut MySqlConnection,
    user_id: u64,
    prepared: &Value,
    allowed: &[Updatable<'_>],
) -> AppResult<u64> {
    let update = build_update_sql("users", prepared, allowed, user_id)?;
    Ok(execute_update(conn, update).await?)
}

/// Partial update of another user, within the caller's reach of the hierarchy.
pub async fn update(pool: &MySqlPool, caller: &AuthUser, user_id: u64, payload: &Value) -> AppResult<User> {
    caller.require_hr_or_ceo()?;

    let target = find(pool, user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;
    let current_role = target
        .role()
        .ok_or_else(|| AppError::Internal(format!("user {user_id} has unknown role id")))?;
    check_edits(caller, current_role)?;

    let prepared = prepare_update(payload)?;
    if let Some(role_id) = prepared.get("role").and_then(Value::as_u64) {
        let new_role = u8::try_from(role_id)
            .ok()
            .and_then(Role::from_id)
            .ok_or_else(|| AppError::validation("Unknown role"))?;
        check_edits(caller, new_role)?;
    }
    if let Some(email) = prepared.get("email").and_then(Value::as_str) {
        if email_taken(pool, email, Some(user_id)).await? {
            return Err(AppError::validation("Email already in use"));
        }
    }

    let mut conn = pool.acquire().await?;
    apply_update(&mut conn, user_id, &prepared, &USER_UPDATABLE).await?;
    info!(user_id, updated_by = caller.user_id, "User updated");

    find(pool, user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))
}

pub async fn update_profile(pool: &MySqlPool, user_id: u64, payload: &Value) -> AppResult<User> {
    let prepared = prepare_update(payload)?;
    if let Some(email) = prepared.get("email").and_then(Value::as_str) {
        if email.is_empty() {
            return Err(AppError::validation("Email cannot be empty"));
        }
        if email_taken(pool, email, Some(user_id)).await? {
            return Err(AppError::validation("Email already in use"));
        }
    }

    let mut conn = pool.acquire().await?;
    apply_update(&mut conn, user_id, &prepared, &PROFILE_UPDATABLE).await?;

    find(pool, user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))
}

/// Roles visible to the caller in user listings.
pub fn visible_roles(caller: Role) -> &'static [Role] {
    match caller {
        Role::Ceo => &[Role::Ceo, Role::Hr, Role::Employee, Role::Intern],
        Role::Hr => &[Role::Employee, Role::Intern],
        Role::Employee | Role::Intern => &[],
    }
}

pub async fn list(pool: &MySqlPool, caller: &AuthUser) -> AppResult<Vec<User>> {
    caller.require_hr_or_ceo()?;

    let roles = visible_roles(caller.role);
    let placeholders = vec!["?"; roles.len()].join(", ");
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE role_id IN ({placeholders}) ORDER BY name");

    let mut q = sqlx::query_as::<_, User>(&sql);
    for role in roles {
        q = q.bind(role.id());
    }
    Ok(q.fetch_all(pool).await?)
}

pub async fn set_profile_image(pool: &MySqlPool, user_id: u64, path: Option<&str>) -> AppResult<()> {
    sqlx::query("UPDATE users SET profile_image = ? WHERE id = ?")
        .bind(path)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn caller(role: Role) -> AuthUser {
        AuthUser {
            user_id: 1,
            email: "boss@x.io".into(),
            role,
        }
    }

    #[test]
    fn ceo_creates_only_hr() {
        assert!(check_creates(&caller(Role::Ceo), Role::Hr).is_ok());
        assert!(matches!(
            check_creates(&caller(Role::Ceo), Role::Employee),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn ceo_updates_any_account() {
        let ceo = caller(Role::Ceo);
        for target in [Role::Hr, Role::Employee, Role::Intern] {
            assert!(check_edits(&ceo, target).is_ok());
        }
    }

    #[test]
    fn hr_updates_only_staff() {
        let hr = caller(Role::Hr);
        assert!(check_edits(&hr, Role::Employee).is_ok());
        assert!(check_edits(&hr, Role::Intern).is_ok());
        assert!(matches!(check_edits(&hr, Role::Hr), Err(AppError::Forbidden(_))));
        assert!(check_edits(&hr, Role::Ceo).is_err());
    }

    #[test]
    fn hr_creates_employees_and_interns() {
        let hr = caller(Role::Hr);
        assert!(check_creates(&hr, Role::Employee).is_ok());
        assert!(check_creates(&hr, Role::Intern).is_ok());
        assert!(check_creates(&hr, Role::Hr).is_err());
        assert!(check_creates(&hr, Role::Ceo).is_err());
    }

    #[test]
    fn employees_manage_nobody() {
        assert!(check_creates(&caller(Role::Employee), Role::Intern).is_err());
        assert!(check_edits(&caller(Role::Employee), Role::Intern).is_err());
        assert!(visible_roles(Role::Intern).is_empty());
    }

    #[test]
    fn hr_lists_only_staff() {
        assert_eq!(visible_roles(Role::Hr), &[Role::Employee, Role::Intern]);
        assert_eq!(visible_roles(Role::Ceo).len(), 4);
    }

    #[test]
    fn update_payload_is_normalised() {
        let prepared = prepare_update(&json!({
            "role": "Intern",
            "email": "  Asha@Company.COM ",
            "password": "",
            "name": "Asha"
        }))
        .unwrap();

        assert_eq!(prepared["role"], json!(4));
        assert_eq!(prepared["email"], json!("asha@company.com"));
        assert!(prepared.get("password").is_none());
        assert_eq!(prepared["name"], json!("Asha"));
    }

    #[test]
    fn passwords_are_hashed_before_storage() {
        let prepared = prepare_update(&json!({ "password": "hunter2" })).unwrap();
        let stored = prepared["password"].as_str().unwrap();
        assert_ne!(stored, "hunter2");
        assert!(stored.starts_with("$argon2"));
    }

    #[test]
    fn unknown_roles_and_blood_groups_are_rejected() {
        assert!(prepare_update(&json!({ "role": "Admin" })).is_err());
        assert!(prepare_update(&json!({ "bloodGroup": "C+" })).is_err());
        assert!(prepare_update(&json!({ "bloodGroup": "AB-" })).is_ok());
    }
}
