//! Threaded comment records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{CommentId, SortDirection, UserId};

/// Comment record
///
/// Top-level comments have `answer_to == None`. Answers inherit the module and
/// identifier of the comment they reply to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub module: String,
    pub identifier: String,
    pub answer_to: Option<CommentId>,
    pub user_id: UserId,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// Parameters for posting a top-level comment
#[derive(Clone, Debug)]
pub struct NewComment {
    pub module: String,
    pub identifier: String,
    pub user_id: UserId,
    pub body: String,
}

/// Which siblings of a reference comment to select.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Position {
    /// Siblings with a smaller id.
    Before,
    /// Siblings with a larger id.
    After,
}

impl Position {
    pub fn operator(self) -> &'static str {
        match self {
            Position::Before => "<",
            Position::After => ">",
        }
    }
}

/// Ordering (by creation date) and window of a comment listing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Page {
    pub order: SortDirection,
    pub limit: u32,
    pub offset: u32,
}

impl Page {
    /// Top-level comments of a section: oldest first, 30 per page.
    pub fn comments() -> Self {
        Self {
            order: SortDirection::Asc,
            limit: 30,
            offset: 0,
        }
    }

    /// Answers to a comment: newest first, 10 per page.
    pub fn answers() -> Self {
        Self {
            order: SortDirection::Desc,
            limit: 10,
            offset: 0,
        }
    }

    /// Siblings around a reference comment: newest first, 30 per page.
    pub fn siblings() -> Self {
        Self {
            order: SortDirection::Desc,
            limit: 30,
            offset: 0,
        }
    }
}
