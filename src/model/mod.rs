pub mod attendance;
pub mod holiday;
pub mod leave_request;
pub mod permission;
pub mod role;
pub mod shift;
pub mod status;
pub mod user;
