//! Strongly-typed identifiers (avoid mixing raw integers arbitrarily).
//!
//! All ids are database row ids and therefore strictly positive. Anything else is
//! rejected with [`StoreError::Validation`](crate::StoreError::Validation) before a
//! backend is touched.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::StoreError;

/// User identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub i64);

/// Permission group identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupId(pub i64);

/// Permission (named capability) identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PermissionId(pub i64);

/// Row id of a user/group membership.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MembershipId(pub i64);

/// Comment identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CommentId(pub i64);

macro_rules! impl_id {
    ($($ty:ident => $label:literal),* $(,)?) => {
        $(
            impl $ty {
                /// Fails with a validation error unless the id is strictly positive.
                pub fn validate(self) -> Result<Self, StoreError> {
                    if self.0 > 0 {
                        Ok(self)
                    } else {
                        Err(StoreError::Validation(format!(
                            concat!($label, " must be positive, got {}"),
                            self.0
                        )))
                    }
                }
            }

            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}", self.0)
                }
            }
        )*
    };
}

impl_id! {
    UserId => "user id",
    GroupId => "group id",
    PermissionId => "permission id",
    MembershipId => "membership id",
    CommentId => "comment id",
}

/// Fails with a validation error if a free-form key (module, identifier, ...) is blank.
pub fn validate_key(field: &str, value: &str) -> Result<(), StoreError> {
    if value.trim().is_empty() {
        return Err(StoreError::Validation(format!("{field} must not be empty")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_ids_validate() {
        assert_eq!(GroupId(1).validate().unwrap(), GroupId(1));
        assert_eq!(PermissionId(42).validate().unwrap(), PermissionId(42));
    }

    #[test]
    fn test_non_positive_ids_are_rejected() {
        let err = GroupId(0).validate().unwrap_err();
        assert!(matches!(err, StoreError::Validation(ref m) if m.contains("group id")));

        let err = PermissionId(-3).validate().unwrap_err();
        assert!(matches!(err, StoreError::Validation(ref m) if m.contains("-3")));
    }

    #[test]
    fn test_id_display() {
        assert_eq!(UserId(7).to_string(), "7");
        assert_eq!(CommentId(12).to_string(), "12");
    }

    #[test]
    fn test_ids_order_numerically() {
        let mut ids = vec![PermissionId(11), PermissionId(2), PermissionId(10)];
        ids.sort();
        assert_eq!(ids, vec![PermissionId(2), PermissionId(10), PermissionId(11)]);
    }

    #[test]
    fn test_validate_key() {
        assert!(validate_key("module", "news").is_ok());
        assert!(matches!(
            validate_key("module", "  "),
            Err(StoreError::Validation(_))
        ));
    }
}
