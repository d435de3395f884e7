use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::role::Role;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub password: String,
    pub role_id: u8,
    pub shift_id: Option<u64>,
    pub profile_image: Option<String>,
    pub is_active: bool,
    pub designation: Option<String>,
    pub joining_date: Option<NaiveDate>,
    pub address: Option<String>,
    pub blood_group: Option<String>,
    pub id_number: Option<String>,
    pub phone_number: Option<String>,
    pub dob: Option<NaiveDate>,
    pub last_login_at: Option<DateTime<Utc>>,
}

pub const USER_COLUMNS: &str = "id, name, email, password, role_id, shift_id, profile_image, \
     is_active, designation, joining_date, address, blood_group, id_number, phone_number, dob, \
     last_login_at";

impl User {
    pub fn role(&self) -> Option<Role> {
        Role::from_id(self.role_id)
    }
}

/// A user as returned by the API; never carries the password hash.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    #[schema(example = 7)]
    pub id: u64,
    #[schema(example = "Asha Raman")]
    pub name: String,
    #[schema(example = "asha@company.com")]
    pub email: String,
    pub role: Option<Role>,
    #[schema(example = 1, nullable = true)]
    pub shift_id: Option<u64>,
    pub profile_image: Option<String>,
    pub is_active: bool,
    pub designation: Option<String>,
    pub joining_date: Option<NaiveDate>,
    pub address: Option<String>,
    pub blood_group: Option<String>,
    pub id_number: Option<String>,
    pub phone_number: Option<String>,
    pub dob: Option<NaiveDate>,
}

impl From<User> for UserView {
    fn from(u: User) -> Self {
        let role = u.role();
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
            role,
            shift_id: u.shift_id,
            profile_image: u.profile_image,
            is_active: u.is_active,
            designation: u.designation,
            joining_date: u.joining_date,
            address: u.address,
            blood_group: u.blood_group,
            id_number: u.id_number,
            phone_number: u.phone_number,
            dob: u.dob,
        }
    }
}

pub const BLOOD_GROUPS: [&str; 8] = ["A+", "A-", "B+", "B-", "AB+", "AB-", "O+", "O-"];
