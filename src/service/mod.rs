//! Database-backed operations behind the HTTP handlers. Workflows that touch
//! attendance rows run in one transaction and lock the row before derived
//! fields are recomputed, so concurrent writers to the same day serialise.

pub mod attendance;
pub mod holiday;
pub mod leave;
pub mod permission;
pub mod report;
pub mod shift;
pub mod user;
