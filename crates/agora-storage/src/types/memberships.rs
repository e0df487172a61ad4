//! User to permission-group membership, ranked by significance.

use serde::{Deserialize, Serialize};

use super::{GroupId, MembershipId, UserId};

/// Membership record
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub id: MembershipId,
    pub user_id: UserId,
    pub group_id: GroupId,
    /// Higher significance means the group takes precedence for this user.
    pub significance: i64,
}

/// Column a membership listing is ordered by.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipOrder {
    #[default]
    Significance,
    GroupId,
    UserId,
    Id,
}

impl MembershipOrder {
    pub fn column(self) -> &'static str {
        match self {
            MembershipOrder::Significance => "significance",
            MembershipOrder::GroupId => "group_id",
            MembershipOrder::UserId => "user_id",
            MembershipOrder::Id => "id",
        }
    }
}

impl std::str::FromStr for MembershipOrder {
    type Err = std::convert::Infallible;

    /// Unknown column names fall back to significance.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "group_id" => MembershipOrder::GroupId,
            "user_id" => MembershipOrder::UserId,
            "id" => MembershipOrder::Id,
            _ => MembershipOrder::Significance,
        })
    }
}

/// Sort direction shared by membership and comment listings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn keyword(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

impl std::str::FromStr for SortDirection {
    type Err = std::convert::Infallible;

    /// Anything other than `asc` sorts descending.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("asc") {
            Ok(SortDirection::Asc)
        } else {
            Ok(SortDirection::Desc)
        }
    }
}

/// Parameters for listing a user's groups
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MembershipQuery {
    pub order_by: MembershipOrder,
    pub direction: SortDirection,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl Default for MembershipQuery {
    fn default() -> Self {
        Self {
            order_by: MembershipOrder::Significance,
            direction: SortDirection::Desc,
            limit: None,
            offset: None,
        }
    }
}
