//! Attendance arithmetic. Everything here is pure: callers load state,
//! run these functions, and persist the result.

pub mod day;
pub mod lop;
pub mod mark;
pub mod summary;
pub mod time;

/// A day whose permission total goes beyond this many minutes becomes a half day.
pub const HALF_DAY_THRESHOLD_MINUTES: i64 = 180;

/// Longest single permission an employee may request.
pub const MAX_PERMISSION_MINUTES: i64 = 180;
