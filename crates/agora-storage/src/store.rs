//! The storage traits that backends implement.

use std::collections::{BTreeSet, HashMap};

use crate::types::*;
use crate::StoreError;

/// Group permission matrix: one row per (group, permission).
///
/// Absence of a row is a valid answer ([`GrantState::Unset`]), never an error.
#[cfg_attr(feature = "test-support", mockall::automock)]
#[async_trait::async_trait]
pub trait PermissionStore: Send + Sync {
    /// All grants held by a group.
    async fn grants_for(&self, group_id: GroupId) -> Result<Vec<PermissionGrant>, StoreError>;

    /// All groups with an opinion on a permission.
    async fn groups_for(
        &self,
        permission_id: PermissionId,
    ) -> Result<Vec<PermissionGrant>, StoreError>;

    /// What one group says about one permission.
    async fn lookup(
        &self,
        group_id: GroupId,
        permission_id: PermissionId,
    ) -> Result<GrantState, StoreError>;

    /// What one group says about several permissions, in a single round trip.
    /// Every requested permission is present in the result; missing rows map to `Unset`.
    async fn batch_lookup(
        &self,
        group_id: GroupId,
        permission_ids: &BTreeSet<PermissionId>,
    ) -> Result<HashMap<PermissionId, GrantState>, StoreError>;

    /// Whether a row exists for the pair.
    async fn exists(
        &self,
        group_id: GroupId,
        permission_id: PermissionId,
    ) -> Result<bool, StoreError>;

    /// Insert a new grant. Fails with `DuplicateGrant` if the pair already has a row.
    async fn insert(
        &self,
        group_id: GroupId,
        permission_id: PermissionId,
        value: bool,
    ) -> Result<(), StoreError>;

    /// Change the value of an existing grant. Fails with `NotFound` if there is none.
    async fn update(
        &self,
        group_id: GroupId,
        permission_id: PermissionId,
        value: bool,
    ) -> Result<(), StoreError>;

    /// Remove a grant. Removing an absent grant is not an error.
    async fn delete(&self, group_id: GroupId, permission_id: PermissionId)
        -> Result<(), StoreError>;
}

/// User to group membership with significance ranking.
#[cfg_attr(feature = "test-support", mockall::automock)]
#[async_trait::async_trait]
pub trait MembershipStore: Send + Sync {
    /// A user's memberships, ordered and windowed by `query`.
    async fn user_groups(
        &self,
        user_id: UserId,
        query: &MembershipQuery,
    ) -> Result<Vec<Membership>, StoreError>;

    /// A user's group ids, most significant first.
    async fn user_group_ids(&self, user_id: UserId) -> Result<Vec<GroupId>, StoreError>;

    /// Members of a group.
    async fn group_users(
        &self,
        group_id: GroupId,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> Result<Vec<Membership>, StoreError>;

    /// Significance of a membership, `None` if the user is not in the group.
    async fn membership_significance(
        &self,
        user_id: UserId,
        group_id: GroupId,
    ) -> Result<Option<i64>, StoreError>;

    /// Highest significance across the user's groups, `None` without groups.
    async fn highest_significance(&self, user_id: UserId) -> Result<Option<i64>, StoreError>;

    /// Lowest significance across the user's groups, `None` without groups.
    async fn lowest_significance(&self, user_id: UserId) -> Result<Option<i64>, StoreError>;

    /// Add a user to a group. Without an explicit significance the group ranks just
    /// below the user's current lowest one (0 for a user without groups).
    async fn add_user_to_group(
        &self,
        user_id: UserId,
        group_id: GroupId,
        significance: Option<i64>,
    ) -> Result<MembershipId, StoreError>;

    /// Remove a user from a group (idempotent).
    async fn remove_user_from_group(
        &self,
        user_id: UserId,
        group_id: GroupId,
    ) -> Result<(), StoreError>;

    /// Remove a membership row by id (idempotent).
    async fn remove_membership(&self, id: MembershipId) -> Result<(), StoreError>;

    /// Change the significance of an existing membership.
    async fn change_significance(
        &self,
        user_id: UserId,
        group_id: GroupId,
        significance: i64,
    ) -> Result<(), StoreError>;
}

/// Threaded comment storage.
#[cfg_attr(feature = "test-support", mockall::automock)]
#[async_trait::async_trait]
pub trait CommentStore: Send + Sync {
    /// Get a comment by id.
    async fn get_comment(&self, id: CommentId) -> Result<Comment, StoreError>;

    /// Whether a comment exists.
    async fn comment_exists(&self, id: CommentId) -> Result<bool, StoreError>;

    /// Number of direct answers to a comment.
    async fn answer_count(&self, id: CommentId) -> Result<u64, StoreError>;

    /// Number of comments that are not answers.
    async fn top_level_count(&self) -> Result<u64, StoreError>;

    /// Ids from the thread root down to `id` (inclusive).
    async fn path_to(&self, id: CommentId) -> Result<Vec<CommentId>, StoreError>;

    /// Top-level comments of a section.
    async fn comments(
        &self,
        module: &str,
        identifier: &str,
        page: Page,
    ) -> Result<Vec<Comment>, StoreError>;

    /// Siblings (same section and parent) before or after a reference comment.
    async fn comments_positioned(
        &self,
        id: CommentId,
        position: Position,
        page: Page,
    ) -> Result<Vec<Comment>, StoreError>;

    /// Number of siblings before or after a reference comment.
    async fn count_positioned(&self, id: CommentId, position: Position)
        -> Result<u64, StoreError>;

    /// Direct answers to a comment.
    async fn answers(&self, id: CommentId, page: Page) -> Result<Vec<Comment>, StoreError>;

    /// Post a top-level comment (returns generated ID).
    async fn post_comment(&self, comment: &NewComment) -> Result<CommentId, StoreError>;

    /// Answer an existing comment (returns generated ID).
    async fn post_answer(
        &self,
        answer_to: CommentId,
        user_id: UserId,
        body: &str,
    ) -> Result<CommentId, StoreError>;
}

/// Up/down vote ledger, one vote per user and piece of content.
#[cfg_attr(feature = "test-support", mockall::automock)]
#[async_trait::async_trait]
pub trait RatingStore: Send + Sync {
    /// The user's current vote, `None` if they have not voted.
    async fn user_rating(
        &self,
        user_id: UserId,
        module: &str,
        identifier: &str,
    ) -> Result<Option<Rating>, StoreError>;

    /// Cast, change or (with `None`) withdraw a vote. Re-casting the same vote is a no-op.
    async fn rate(
        &self,
        user_id: UserId,
        rating: Option<Rating>,
        module: &str,
        identifier: &str,
    ) -> Result<(), StoreError>;
}

/// Everything a full backend provides.
pub trait Store: PermissionStore + MembershipStore + CommentStore + RatingStore {}

impl<T> Store for T where T: PermissionStore + MembershipStore + CommentStore + RatingStore {}
