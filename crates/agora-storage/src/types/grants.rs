//! Group permission grants and their tri-state resolution.

use serde::{Deserialize, Serialize};

use super::{GroupId, PermissionId};

/// Stored (group, permission, value) fact.
///
/// `value == true` grants the permission, `value == false` explicitly denies it.
/// A missing row means the group has no opinion ([`GrantState::Unset`]).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionGrant {
    pub group_id: GroupId,
    pub permission_id: PermissionId,
    pub value: bool,
}

/// What a single group says about a single permission.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantState {
    Granted,
    Denied,
    Unset,
}

impl GrantState {
    /// The stored value behind this state, `None` when no row exists.
    pub fn as_value(self) -> Option<bool> {
        match self {
            GrantState::Granted => Some(true),
            GrantState::Denied => Some(false),
            GrantState::Unset => None,
        }
    }
}

impl From<bool> for GrantState {
    fn from(value: bool) -> Self {
        if value {
            GrantState::Granted
        } else {
            GrantState::Denied
        }
    }
}

impl From<Option<bool>> for GrantState {
    fn from(value: Option<bool>) -> Self {
        value.map_or(GrantState::Unset, GrantState::from)
    }
}

impl std::fmt::Display for GrantState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GrantState::Granted => write!(f, "granted"),
            GrantState::Denied => write!(f, "denied"),
            GrantState::Unset => write!(f, "unset"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_from_row_value() {
        assert_eq!(GrantState::from(true), GrantState::Granted);
        assert_eq!(GrantState::from(false), GrantState::Denied);
        assert_eq!(GrantState::from(None), GrantState::Unset);
        assert_eq!(GrantState::from(Some(false)), GrantState::Denied);
    }

    #[test]
    fn test_state_as_value() {
        assert_eq!(GrantState::Granted.as_value(), Some(true));
        assert_eq!(GrantState::Denied.as_value(), Some(false));
        assert_eq!(GrantState::Unset.as_value(), None);
    }

    #[test]
    fn test_state_display() {
        assert_eq!(GrantState::Unset.to_string(), "unset");
        assert_eq!(GrantState::Denied.to_string(), "denied");
    }
}
