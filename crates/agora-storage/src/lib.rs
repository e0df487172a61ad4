//! Storage abstraction for agora.
//!
//! Backend crates (e.g., agora-store-sqlite, agora-store-memory) implement these traits so
//! `agora-access` doesn't depend on any specific database engine or schema details.

use thiserror::Error;

mod store;
pub mod types;

pub use store::*;
pub use types::*;

/// Uniform error type for all storage backends.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found")]
    NotFound,
    #[error("already exists")]
    AlreadyExists,
    #[error("grant for group {group} and permission {permission} already exists")]
    DuplicateGrant {
        group: GroupId,
        permission: PermissionId,
    },
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("backend error: {0}")]
    Backend(String),
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeSet, HashMap};
    use std::sync::Arc;

    use super::*;

    // Tiny compile-time smoke test for trait object usage.
    struct NoopStore;

    #[async_trait::async_trait]
    impl PermissionStore for NoopStore {
        async fn grants_for(&self, _group_id: GroupId) -> Result<Vec<PermissionGrant>, StoreError> {
            Ok(vec![])
        }

        async fn groups_for(
            &self,
            _permission_id: PermissionId,
        ) -> Result<Vec<PermissionGrant>, StoreError> {
            Ok(vec![])
        }

        async fn lookup(
            &self,
            _group_id: GroupId,
            _permission_id: PermissionId,
        ) -> Result<GrantState, StoreError> {
            Ok(GrantState::Unset)
        }

        async fn batch_lookup(
            &self,
            _group_id: GroupId,
            permission_ids: &BTreeSet<PermissionId>,
        ) -> Result<HashMap<PermissionId, GrantState>, StoreError> {
            Ok(permission_ids
                .iter()
                .map(|p| (*p, GrantState::Unset))
                .collect())
        }

        async fn exists(
            &self,
            _group_id: GroupId,
            _permission_id: PermissionId,
        ) -> Result<bool, StoreError> {
            Ok(false)
        }

        async fn insert(
            &self,
            group_id: GroupId,
            permission_id: PermissionId,
            _value: bool,
        ) -> Result<(), StoreError> {
            Err(StoreError::DuplicateGrant {
                group: group_id,
                permission: permission_id,
            })
        }

        async fn update(
            &self,
            _group_id: GroupId,
            _permission_id: PermissionId,
            _value: bool,
        ) -> Result<(), StoreError> {
            Err(StoreError::NotFound)
        }

        async fn delete(
            &self,
            _group_id: GroupId,
            _permission_id: PermissionId,
        ) -> Result<(), StoreError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn trait_smoke() {
        let s: Arc<dyn PermissionStore> = Arc::new(NoopStore);

        let wanted: BTreeSet<_> = [PermissionId(1), PermissionId(2)].into_iter().collect();
        let facts = s.batch_lookup(GroupId(1), &wanted).await.unwrap();
        assert_eq!(facts.len(), 2);
        assert!(facts.values().all(|s| *s == GrantState::Unset));

        assert_eq!(
            s.lookup(GroupId(1), PermissionId(1)).await.unwrap(),
            GrantState::Unset
        );
        assert!(!s.exists(GroupId(1), PermissionId(1)).await.unwrap());
        s.delete(GroupId(1), PermissionId(1)).await.unwrap();
    }

    #[test]
    fn test_error_messages() {
        let err = StoreError::DuplicateGrant {
            group: GroupId(3),
            permission: PermissionId(9),
        };
        assert_eq!(
            err.to_string(),
            "grant for group 3 and permission 9 already exists"
        );
        assert_eq!(StoreError::NotFound.to_string(), "not found");
        assert_eq!(
            StoreError::Validation("group id must be positive, got 0".into()).to_string(),
            "invalid input: group id must be positive, got 0"
        );
    }
}
