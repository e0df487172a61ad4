//! In-memory storage backend backed by concurrent hash maps.
//!
//! This implementation is suitable for:
//! - Development and testing
//! - Single-process deployments that can afford to lose state on restart
//!
//! For anything persistent, use the SQLite backend instead.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicI64, Ordering};

use agora_storage::{
    validate_key, Comment, CommentId, CommentStore, GrantState, GroupId, Membership,
    MembershipId, MembershipOrder, MembershipQuery, MembershipStore, NewComment, Page,
    PermissionGrant, PermissionId, PermissionStore, Position, Rating, RatingStore,
    SortDirection, StoreError, UserId,
};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

type RatingKey = (UserId, String, String);

/// In-memory store; every map is keyed the way the SQLite schema is constrained.
pub struct MemoryStore {
    grants: DashMap<(GroupId, PermissionId), bool>,
    memberships: DashMap<(UserId, GroupId), Membership>,
    comments: DashMap<CommentId, Comment>,
    ratings: DashMap<RatingKey, Rating>,
    next_membership_id: AtomicI64,
    next_comment_id: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            grants: DashMap::new(),
            memberships: DashMap::new(),
            comments: DashMap::new(),
            ratings: DashMap::new(),
            next_membership_id: AtomicI64::new(1),
            next_comment_id: AtomicI64::new(1),
        }
    }

    /// Seed a grant without going through the insert checks.
    pub fn with_grant(self, group_id: GroupId, permission_id: PermissionId, value: bool) -> Self {
        self.grants.insert((group_id, permission_id), value);
        self
    }

    /// Number of stored grant rows.
    pub fn grant_count(&self) -> usize {
        self.grants.len()
    }

    fn memberships_of(&self, user_id: UserId) -> Vec<Membership> {
        self.memberships
            .iter()
            .filter(|m| m.user_id == user_id)
            .map(|m| m.value().clone())
            .collect()
    }

    fn siblings(&self, reference: &Comment, position: Position) -> Vec<Comment> {
        self.comments
            .iter()
            .filter(|c| {
                c.module == reference.module
                    && c.identifier == reference.identifier
                    && c.answer_to == reference.answer_to
                    && match position {
                        Position::Before => c.id < reference.id,
                        Position::After => c.id > reference.id,
                    }
            })
            .map(|c| c.value().clone())
            .collect()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn paginate<T>(items: Vec<T>, limit: Option<u32>, offset: Option<u32>) -> Vec<T> {
    let offset = offset.unwrap_or(0) as usize;
    let limit = limit.map(|l| l as usize).unwrap_or(usize::MAX);
    items.into_iter().skip(offset).take(limit).collect()
}

fn page_comments(mut comments: Vec<Comment>, page: Page) -> Vec<Comment> {
    comments.sort_by_key(|c| (c.created_at, c.id));
    if page.order == SortDirection::Desc {
        comments.reverse();
    }
    paginate(comments, Some(page.limit), Some(page.offset))
}

// ───────────────────────────── Grants ─────────────────────────────

#[async_trait]
impl PermissionStore for MemoryStore {
    async fn grants_for(&self, group_id: GroupId) -> Result<Vec<PermissionGrant>, StoreError> {
        let group_id = group_id.validate()?;
        let mut out: Vec<PermissionGrant> = self
            .grants
            .iter()
            .filter(|e| e.key().0 == group_id)
            .map(|e| PermissionGrant {
                group_id,
                permission_id: e.key().1,
                value: *e.value(),
            })
            .collect();
        out.sort_by_key(|g| g.permission_id);
        Ok(out)
    }

    async fn groups_for(
        &self,
        permission_id: PermissionId,
    ) -> Result<Vec<PermissionGrant>, StoreError> {
        let permission_id = permission_id.validate()?;
        let mut out: Vec<PermissionGrant> = self
            .grants
            .iter()
            .filter(|e| e.key().1 == permission_id)
            .map(|e| PermissionGrant {
                group_id: e.key().0,
                permission_id,
                value: *e.value(),
            })
            .collect();
        out.sort_by_key(|g| g.group_id);
        Ok(out)
    }

    async fn lookup(
        &self,
        group_id: GroupId,
        permission_id: PermissionId,
    ) -> Result<GrantState, StoreError> {
        let key = (group_id.validate()?, permission_id.validate()?);
        Ok(GrantState::from(self.grants.get(&key).map(|v| *v)))
    }

    async fn batch_lookup(
        &self,
        group_id: GroupId,
        permission_ids: &BTreeSet<PermissionId>,
    ) -> Result<HashMap<PermissionId, GrantState>, StoreError> {
        let group_id = group_id.validate()?;
        permission_ids
            .iter()
            .map(|p| {
                let p = p.validate()?;
                let state = GrantState::from(self.grants.get(&(group_id, p)).map(|v| *v));
                Ok((p, state))
            })
            .collect()
    }

    async fn exists(
        &self,
        group_id: GroupId,
        permission_id: PermissionId,
    ) -> Result<bool, StoreError> {
        let key = (group_id.validate()?, permission_id.validate()?);
        Ok(self.grants.contains_key(&key))
    }

    async fn insert(
        &self,
        group_id: GroupId,
        permission_id: PermissionId,
        value: bool,
    ) -> Result<(), StoreError> {
        let key = (group_id.validate()?, permission_id.validate()?);
        match self.grants.entry(key) {
            Entry::Occupied(_) => Err(StoreError::DuplicateGrant {
                group: group_id,
                permission: permission_id,
            }),
            Entry::Vacant(slot) => {
                slot.insert(value);
                Ok(())
            }
        }
    }

    async fn update(
        &self,
        group_id: GroupId,
        permission_id: PermissionId,
        value: bool,
    ) -> Result<(), StoreError> {
        let key = (group_id.validate()?, permission_id.validate()?);
        match self.grants.get_mut(&key) {
            Some(mut stored) => {
                *stored = value;
                Ok(())
            }
            None => Err(StoreError::NotFound),
        }
    }

    async fn delete(
        &self,
        group_id: GroupId,
        permission_id: PermissionId,
    ) -> Result<(), StoreError> {
        let key = (group_id.validate()?, permission_id.validate()?);
        self.grants.remove(&key);
        Ok(())
    }
}

// ──────────────────────────── Memberships ────────────────────────────

#[async_trait]
impl MembershipStore for MemoryStore {
    async fn user_groups(
        &self,
        user_id: UserId,
        query: &MembershipQuery,
    ) -> Result<Vec<Membership>, StoreError> {
        let user_id = user_id.validate()?;
        let mut rows = self.memberships_of(user_id);
        rows.sort_by(|a, b| {
            let ordering = match query.order_by {
                MembershipOrder::Significance => a.significance.cmp(&b.significance),
                MembershipOrder::GroupId => a.group_id.cmp(&b.group_id),
                MembershipOrder::UserId => a.user_id.cmp(&b.user_id),
                MembershipOrder::Id => a.id.cmp(&b.id),
            };
            let ordering = match query.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            };
            ordering.then(a.id.cmp(&b.id))
        });
        Ok(paginate(rows, query.limit, query.offset))
    }

    async fn user_group_ids(&self, user_id: UserId) -> Result<Vec<GroupId>, StoreError> {
        let rows = self
            .user_groups(user_id, &MembershipQuery::default())
            .await?;
        Ok(rows.into_iter().map(|m| m.group_id).collect())
    }

    async fn group_users(
        &self,
        group_id: GroupId,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> Result<Vec<Membership>, StoreError> {
        let group_id = group_id.validate()?;
        let mut rows: Vec<Membership> = self
            .memberships
            .iter()
            .filter(|m| m.group_id == group_id)
            .map(|m| m.value().clone())
            .collect();
        rows.sort_by_key(|m| m.id);
        Ok(paginate(rows, limit, offset))
    }

    async fn membership_significance(
        &self,
        user_id: UserId,
        group_id: GroupId,
    ) -> Result<Option<i64>, StoreError> {
        let key = (user_id.validate()?, group_id.validate()?);
        Ok(self.memberships.get(&key).map(|m| m.significance))
    }

    async fn highest_significance(&self, user_id: UserId) -> Result<Option<i64>, StoreError> {
        let user_id = user_id.validate()?;
        Ok(self
            .memberships_of(user_id)
            .iter()
            .map(|m| m.significance)
            .max())
    }

    async fn lowest_significance(&self, user_id: UserId) -> Result<Option<i64>, StoreError> {
        let user_id = user_id.validate()?;
        Ok(self
            .memberships_of(user_id)
            .iter()
            .map(|m| m.significance)
            .min())
    }

    async fn add_user_to_group(
        &self,
        user_id: UserId,
        group_id: GroupId,
        significance: Option<i64>,
    ) -> Result<MembershipId, StoreError> {
        let user_id = user_id.validate()?;
        let group_id = group_id.validate()?;
        let significance = match significance {
            Some(s) => s,
            None => self
                .lowest_significance(user_id)
                .await?
                .map(|l| l - 1)
                .unwrap_or(0),
        };

        match self.memberships.entry((user_id, group_id)) {
            Entry::Occupied(_) => Err(StoreError::AlreadyExists),
            Entry::Vacant(slot) => {
                let id = MembershipId(self.next_membership_id.fetch_add(1, Ordering::SeqCst));
                slot.insert(Membership {
                    id,
                    user_id,
                    group_id,
                    significance,
                });
                Ok(id)
            }
        }
    }

    async fn remove_user_from_group(
        &self,
        user_id: UserId,
        group_id: GroupId,
    ) -> Result<(), StoreError> {
        let key = (user_id.validate()?, group_id.validate()?);
        self.memberships.remove(&key);
        Ok(())
    }

    async fn remove_membership(&self, id: MembershipId) -> Result<(), StoreError> {
        let id = id.validate()?;
        self.memberships.retain(|_, m| m.id != id);
        Ok(())
    }

    async fn change_significance(
        &self,
        user_id: UserId,
        group_id: GroupId,
        significance: i64,
    ) -> Result<(), StoreError> {
        let key = (user_id.validate()?, group_id.validate()?);
        match self.memberships.get_mut(&key) {
            Some(mut m) => {
                m.significance = significance;
                Ok(())
            }
            None => Err(StoreError::NotFound),
        }
    }
}

// ───────────────────────────── Comments ──────────────────────────────

#[async_trait]
impl CommentStore for MemoryStore {
    async fn get_comment(&self, id: CommentId) -> Result<Comment, StoreError> {
        let id = id.validate()?;
        self.comments
            .get(&id)
            .map(|c| c.value().clone())
            .ok_or(StoreError::NotFound)
    }

    async fn comment_exists(&self, id: CommentId) -> Result<bool, StoreError> {
        let id = id.validate()?;
        Ok(self.comments.contains_key(&id))
    }

    async fn answer_count(&self, id: CommentId) -> Result<u64, StoreError> {
        let id = id.validate()?;
        Ok(self
            .comments
            .iter()
            .filter(|c| c.answer_to == Some(id))
            .count() as u64)
    }

    async fn top_level_count(&self) -> Result<u64, StoreError> {
        Ok(self
            .comments
            .iter()
            .filter(|c| c.answer_to.is_none())
            .count() as u64)
    }

    async fn path_to(&self, id: CommentId) -> Result<Vec<CommentId>, StoreError> {
        let mut current = self.get_comment(id).await?;
        let mut path = vec![current.id];
        let mut seen = HashSet::from([current.id]);
        while let Some(parent) = current.answer_to {
            if !seen.insert(parent) {
                break;
            }
            path.push(parent);
            match self.comments.get(&parent) {
                Some(c) => current = c.value().clone(),
                None => break,
            }
        }
        path.reverse();
        Ok(path)
    }

    async fn comments(
        &self,
        module: &str,
        identifier: &str,
        page: Page,
    ) -> Result<Vec<Comment>, StoreError> {
        validate_key("module", module)?;
        validate_key("identifier", identifier)?;
        let rows = self
            .comments
            .iter()
            .filter(|c| c.module == module && c.identifier == identifier && c.answer_to.is_none())
            .map(|c| c.value().clone())
            .collect();
        Ok(page_comments(rows, page))
    }

    async fn comments_positioned(
        &self,
        id: CommentId,
        position: Position,
        page: Page,
    ) -> Result<Vec<Comment>, StoreError> {
        let reference = self.get_comment(id).await?;
        Ok(page_comments(self.siblings(&reference, position), page))
    }

    async fn count_positioned(
        &self,
        id: CommentId,
        position: Position,
    ) -> Result<u64, StoreError> {
        let reference = self.get_comment(id).await?;
        Ok(self.siblings(&reference, position).len() as u64)
    }

    async fn answers(&self, id: CommentId, page: Page) -> Result<Vec<Comment>, StoreError> {
        let id = id.validate()?;
        let rows = self
            .comments
            .iter()
            .filter(|c| c.answer_to == Some(id))
            .map(|c| c.value().clone())
            .collect();
        Ok(page_comments(rows, page))
    }

    async fn post_comment(&self, comment: &NewComment) -> Result<CommentId, StoreError> {
        validate_key("module", &comment.module)?;
        validate_key("identifier", &comment.identifier)?;
        validate_key("comment body", &comment.body)?;
        let user_id = comment.user_id.validate()?;

        let id = CommentId(self.next_comment_id.fetch_add(1, Ordering::SeqCst));
        self.comments.insert(
            id,
            Comment {
                id,
                module: comment.module.clone(),
                identifier: comment.identifier.clone(),
                answer_to: None,
                user_id,
                body: comment.body.clone(),
                created_at: Utc::now(),
            },
        );
        Ok(id)
    }

    async fn post_answer(
        &self,
        answer_to: CommentId,
        user_id: UserId,
        body: &str,
    ) -> Result<CommentId, StoreError> {
        validate_key("comment body", body)?;
        let user_id = user_id.validate()?;
        let parent = self.get_comment(answer_to).await?;

        let id = CommentId(self.next_comment_id.fetch_add(1, Ordering::SeqCst));
        self.comments.insert(
            id,
            Comment {
                id,
                module: parent.module,
                identifier: parent.identifier,
                answer_to: Some(parent.id),
                user_id,
                body: body.to_string(),
                created_at: Utc::now(),
            },
        );
        Ok(id)
    }
}

// ───────────────────────────── Ratings ───────────────────────────────

#[async_trait]
impl RatingStore for MemoryStore {
    async fn user_rating(
        &self,
        user_id: UserId,
        module: &str,
        identifier: &str,
    ) -> Result<Option<Rating>, StoreError> {
        let user_id = user_id.validate()?;
        validate_key("module", module)?;
        validate_key("identifier", identifier)?;
        let key = (user_id, module.to_string(), identifier.to_string());
        Ok(self.ratings.get(&key).map(|r| *r))
    }

    async fn rate(
        &self,
        user_id: UserId,
        rating: Option<Rating>,
        module: &str,
        identifier: &str,
    ) -> Result<(), StoreError> {
        let user_id = user_id.validate()?;
        validate_key("module", module)?;
        validate_key("identifier", identifier)?;
        let key = (user_id, module.to_string(), identifier.to_string());
        match rating {
            Some(rating) => {
                self.ratings.insert(key, rating);
            }
            None => {
                self.ratings.remove(&key);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn insert_then_lookup() {
        let store = MemoryStore::new();
        store.insert(GroupId(1), PermissionId(10), true).await.unwrap();
        store.insert(GroupId(1), PermissionId(11), false).await.unwrap();

        assert_eq!(
            store.lookup(GroupId(1), PermissionId(10)).await.unwrap(),
            GrantState::Granted
        );
        assert_eq!(
            store.lookup(GroupId(1), PermissionId(11)).await.unwrap(),
            GrantState::Denied
        );
        assert_eq!(
            store.lookup(GroupId(2), PermissionId(10)).await.unwrap(),
            GrantState::Unset
        );
    }

    #[tokio::test]
    async fn duplicate_insert_is_rejected() {
        let store = MemoryStore::new();
        store.insert(GroupId(1), PermissionId(10), true).await.unwrap();
        let err = store
            .insert(GroupId(1), PermissionId(10), false)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateGrant { .. }));
        assert_eq!(
            store.lookup(GroupId(1), PermissionId(10)).await.unwrap(),
            GrantState::Granted
        );
    }

    #[tokio::test]
    async fn update_missing_grant_is_not_found() {
        let store = MemoryStore::new();
        let err = store
            .update(GroupId(1), PermissionId(10), true)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = MemoryStore::new().with_grant(GroupId(1), PermissionId(10), true);
        store.delete(GroupId(1), PermissionId(10)).await.unwrap();
        store.delete(GroupId(1), PermissionId(10)).await.unwrap();
        assert!(!store.exists(GroupId(1), PermissionId(10)).await.unwrap());
        assert_eq!(store.grant_count(), 0);
    }

    #[tokio::test]
    async fn batch_lookup_marks_missing_rows_unset() {
        let store = MemoryStore::new()
            .with_grant(GroupId(1), PermissionId(10), true)
            .with_grant(GroupId(1), PermissionId(12), false);
        let wanted: BTreeSet<_> = [10, 11, 12].into_iter().map(PermissionId).collect();

        let facts = store.batch_lookup(GroupId(1), &wanted).await.unwrap();

        assert_eq!(facts.len(), 3);
        assert_eq!(facts[&PermissionId(10)], GrantState::Granted);
        assert_eq!(facts[&PermissionId(11)], GrantState::Unset);
        assert_eq!(facts[&PermissionId(12)], GrantState::Denied);
    }

    #[tokio::test]
    async fn invalid_ids_fail_validation() {
        let store = MemoryStore::new();
        let err = store
            .lookup(GroupId(0), PermissionId(1))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }

    #[tokio::test]
    async fn memberships_default_to_below_lowest_significance() {
        let store = MemoryStore::new();
        store
            .add_user_to_group(UserId(1), GroupId(10), Some(5))
            .await
            .unwrap();
        store
            .add_user_to_group(UserId(1), GroupId(11), None)
            .await
            .unwrap();

        assert_eq!(
            store
                .membership_significance(UserId(1), GroupId(11))
                .await
                .unwrap(),
            Some(4)
        );
        assert_eq!(
            store.user_group_ids(UserId(1)).await.unwrap(),
            vec![GroupId(10), GroupId(11)]
        );
    }

    #[tokio::test]
    async fn answers_inherit_section() {
        let store = MemoryStore::new();
        let root = store
            .post_comment(&NewComment {
                module: "news".into(),
                identifier: "42".into(),
                user_id: UserId(1),
                body: "first".into(),
            })
            .await
            .unwrap();
        let answer = store.post_answer(root, UserId(2), "reply").await.unwrap();
        let nested = store.post_answer(answer, UserId(1), "again").await.unwrap();

        let got = store.get_comment(nested).await.unwrap();
        assert_eq!(got.module, "news");
        assert_eq!(got.identifier, "42");
        assert_eq!(store.path_to(nested).await.unwrap(), vec![root, answer, nested]);
        assert_eq!(store.top_level_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn rating_withdrawal() {
        let store = MemoryStore::new();
        store
            .rate(UserId(1), Some(Rating::Up), "news", "42")
            .await
            .unwrap();
        assert_eq!(
            store.user_rating(UserId(1), "news", "42").await.unwrap(),
            Some(Rating::Up)
        );
        store.rate(UserId(1), None, "news", "42").await.unwrap();
        assert_eq!(store.user_rating(UserId(1), "news", "42").await.unwrap(), None);
    }
}
