use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

/// Daily attendance status, stored as its display name.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
pub enum AttendanceStatus {
    Present,
    Absent,
    #[serde(rename = "Half-Day")]
    #[strum(serialize = "Half-Day")]
    HalfDay,
    Holiday,
    Weekend,
    #[serde(rename = "On-Leave")]
    #[strum(serialize = "On-Leave")]
    OnLeave,
}

impl TryFrom<String> for AttendanceStatus {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Shared lifecycle of leave and permission requests.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    /// Only `Pending` may move, and only to a terminal state.
    pub fn can_transition_to(self, next: RequestStatus) -> bool {
        self == RequestStatus::Pending && next != RequestStatus::Pending
    }
}

impl TryFrom<String> for RequestStatus {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hyphenated_names_survive_storage() {
        assert_eq!(AttendanceStatus::HalfDay.as_ref(), "Half-Day");
        assert_eq!(
            AttendanceStatus::try_from("On-Leave".to_string()).unwrap(),
            AttendanceStatus::OnLeave
        );
        assert_eq!(
            serde_json::to_string(&AttendanceStatus::OnLeave).unwrap(),
            "\"On-Leave\""
        );
        assert!(AttendanceStatus::try_from("Sleeping".to_string()).is_err());
    }

    #[test]
    fn only_pending_requests_move() {
        use RequestStatus::*;
        assert!(Pending.can_transition_to(Approved));
        assert!(Pending.can_transition_to(Rejected));
        assert!(!Pending.can_transition_to(Pending));
        assert!(!Approved.can_transition_to(Rejected));
        assert!(!Rejected.can_transition_to(Approved));
    }
}
