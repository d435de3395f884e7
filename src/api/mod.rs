pub mod attendance;
pub mod dashboard;
pub mod holiday;
pub mod leave;
pub mod permission;
pub mod profile;
pub mod shift;
pub mod user;

use serde::Deserialize;
use utoipa::ToSchema;

use crate::model::status::RequestStatus;

/// Body of the leave/permission decision endpoints.
#[derive(Debug, Deserialize, ToSchema)]
pub struct StatusUpdate {
    #[schema(example = "Approved")]
    pub status: RequestStatus,
}
