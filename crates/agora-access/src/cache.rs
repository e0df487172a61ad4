//! Resolution-scoped memo of (group, permission) facts.

use std::collections::HashMap;

use agora_storage::{GrantState, GroupId, PermissionId};

/// Facts learned while resolving permissions, keyed by group then permission.
///
/// A missing entry means "not fetched yet". [`GrantState::Unset`] is a real answer
/// (the group has no opinion) and is never fetched again.
///
/// The cache is not persisted and carries no expiry: keep one per request or batch
/// of checks, and call [`PermissionCache::forget_group`] after changing a group's
/// grants if the same cache is reused afterwards.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PermissionCache {
    groups: HashMap<GroupId, HashMap<PermissionId, GrantState>>,
}

impl PermissionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, group_id: GroupId, permission_id: PermissionId) -> Option<GrantState> {
        self.groups
            .get(&group_id)
            .and_then(|facts| facts.get(&permission_id))
            .copied()
    }

    pub fn contains(&self, group_id: GroupId, permission_id: PermissionId) -> bool {
        self.get(group_id, permission_id).is_some()
    }

    pub fn record(&mut self, group_id: GroupId, permission_id: PermissionId, state: GrantState) {
        self.groups
            .entry(group_id)
            .or_default()
            .insert(permission_id, state);
    }

    /// Everything known about one group.
    pub fn group(&self, group_id: GroupId) -> Option<&HashMap<PermissionId, GrantState>> {
        self.groups.get(&group_id)
    }

    pub fn forget(&mut self, group_id: GroupId, permission_id: PermissionId) {
        if let Some(facts) = self.groups.get_mut(&group_id) {
            facts.remove(&permission_id);
            if facts.is_empty() {
                self.groups.remove(&group_id);
            }
        }
    }

    pub fn forget_group(&mut self, group_id: GroupId) {
        self.groups.remove(&group_id);
    }

    pub fn clear(&mut self) {
        self.groups.clear();
    }

    /// Total number of cached facts across all groups.
    pub fn len(&self) -> usize {
        self.groups.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FromIterator<(GroupId, PermissionId, GrantState)> for PermissionCache {
    fn from_iter<I: IntoIterator<Item = (GroupId, PermissionId, GrantState)>>(iter: I) -> Self {
        let mut cache = PermissionCache::new();
        for (group_id, permission_id, state) in iter {
            cache.record(group_id, permission_id, state);
        }
        cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_is_distinct_from_unset() {
        let mut cache = PermissionCache::new();
        assert_eq!(cache.get(GroupId(1), PermissionId(10)), None);

        cache.record(GroupId(1), PermissionId(10), GrantState::Unset);
        assert_eq!(
            cache.get(GroupId(1), PermissionId(10)),
            Some(GrantState::Unset)
        );
        assert!(cache.contains(GroupId(1), PermissionId(10)));
        assert!(!cache.contains(GroupId(2), PermissionId(10)));
    }

    #[test]
    fn test_record_overwrites() {
        let mut cache = PermissionCache::new();
        cache.record(GroupId(1), PermissionId(10), GrantState::Granted);
        cache.record(GroupId(1), PermissionId(10), GrantState::Denied);
        assert_eq!(
            cache.get(GroupId(1), PermissionId(10)),
            Some(GrantState::Denied)
        );
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_forget() {
        let mut cache: PermissionCache = [
            (GroupId(1), PermissionId(10), GrantState::Granted),
            (GroupId(1), PermissionId(11), GrantState::Unset),
            (GroupId(2), PermissionId(10), GrantState::Denied),
        ]
        .into_iter()
        .collect();
        assert_eq!(cache.len(), 3);

        cache.forget(GroupId(1), PermissionId(10));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.group(GroupId(1)).map(HashMap::len), Some(1));

        cache.forget(GroupId(1), PermissionId(11));
        assert!(cache.group(GroupId(1)).is_none());

        cache.forget_group(GroupId(2));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut cache = PermissionCache::new();
        cache.record(GroupId(1), PermissionId(10), GrantState::Granted);
        cache.clear();
        assert!(cache.is_empty());
    }
}
