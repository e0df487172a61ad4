pub mod check;
pub mod grant;
pub mod member;

pub use check::{cmd_check_groups, cmd_check_user};
pub use grant::{cmd_grant_list, cmd_grant_set, cmd_grant_unset};
pub use member::{
    cmd_member_add, cmd_member_groups, cmd_member_rank, cmd_member_remove, cmd_member_users,
};

/// How listings are printed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Output {
    Text,
    Json,
}

impl Output {
    pub fn from_flag(json: bool) -> Self {
        if json {
            Output::Json
        } else {
            Output::Text
        }
    }
}
