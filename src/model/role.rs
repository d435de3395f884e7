use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
    ToSchema,
)]
pub enum Role {
    #[serde(rename = "CEO")]
    #[strum(serialize = "CEO")]
    Ceo = 1,
    #[serde(rename = "HR")]
    #[strum(serialize = "HR")]
    Hr = 2,
    Employee = 3,
    Intern = 4,
}

impl Role {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Role::Ceo),
            2 => Some(Role::Hr),
            3 => Some(Role::Employee),
            4 => Some(Role::Intern),
            _ => None,
        }
    }

    pub fn id(self) -> u8 {
        self as u8
    }

    /// HR and CEO manage workflows and see every employee's data.
    pub fn is_manager(self) -> bool {
        matches!(self, Role::Hr | Role::Ceo)
    }

    /// Roles a user of this role may create accounts for.
    pub fn can_create(self, target: Role) -> bool {
        match self {
            Role::Ceo => target == Role::Hr,
            Role::Hr => matches!(target, Role::Employee | Role::Intern),
            Role::Employee | Role::Intern => false,
        }
    }

    /// Roles a user of this role may edit. The CEO edits anyone; HR is kept
    /// to staff.
    pub fn can_edit(self, target: Role) -> bool {
        match self {
            Role::Ceo => true,
            Role::Hr => matches!(target, Role::Employee | Role::Intern),
            Role::Employee | Role::Intern => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip() {
        for role in [Role::Ceo, Role::Hr, Role::Employee, Role::Intern] {
            assert_eq!(Role::from_id(role.id()), Some(role));
        }
        assert_eq!(Role::from_id(0), None);
        assert_eq!(Role::from_id(9), None);
    }

    #[test]
    fn names_match_wire_format() {
        assert_eq!(Role::Hr.to_string(), "HR");
        assert_eq!("CEO".parse::<Role>().unwrap(), Role::Ceo);
        assert_eq!(serde_json::to_string(&Role::Intern).unwrap(), "\"Intern\"");
    }

    #[test]
    fn hierarchy_limits_who_creates_whom() {
        assert!(Role::Ceo.can_create(Role::Hr));
        assert!(!Role::Ceo.can_create(Role::Employee));
        assert!(Role::Hr.can_create(Role::Employee));
        assert!(Role::Hr.can_create(Role::Intern));
        assert!(!Role::Hr.can_create(Role::Hr));
        assert!(!Role::Employee.can_create(Role::Intern));
    }

    #[test]
    fn ceo_edits_everyone_hr_only_staff() {
        for target in [Role::Ceo, Role::Hr, Role::Employee, Role::Intern] {
            assert!(Role::Ceo.can_edit(target));
        }
        assert!(Role::Hr.can_edit(Role::Employee));
        assert!(Role::Hr.can_edit(Role::Intern));
        assert!(!Role::Hr.can_edit(Role::Hr));
        assert!(!Role::Hr.can_edit(Role::Ceo));
        assert!(!Role::Intern.can_edit(Role::Intern));
    }
}
