//! Administrative changes to the group permission matrix.

use std::sync::Arc;

use agora_storage::{GrantState, GroupId, PermissionId, PermissionStore, StoreError};

use crate::error::AccessError;

/// What [`PermissionAdmin::set_group_permission`] ended up writing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SetOutcome {
    Inserted,
    Updated,
    /// The stored value already matched; nothing was written.
    Unchanged,
}

/// Sets and clears group permissions on top of a [`PermissionStore`].
pub struct PermissionAdmin<S: ?Sized> {
    store: Arc<S>,
}

impl<S: ?Sized> Clone for PermissionAdmin<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: PermissionStore + ?Sized> PermissionAdmin<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Grant (`true`) or explicitly deny (`false`) a permission for a group.
    ///
    /// Reads the current state first and only writes when it differs. A concurrent
    /// writer can change the row between the read and the write; losing that race
    /// is recovered by switching between insert and update once.
    pub async fn set_group_permission(
        &self,
        group_id: GroupId,
        permission_id: PermissionId,
        value: bool,
    ) -> Result<SetOutcome, AccessError> {
        let group_id = group_id.validate().map_err(AccessError::from_validation)?;
        let permission_id = permission_id
            .validate()
            .map_err(AccessError::from_validation)?;

        let current = self.store.lookup(group_id, permission_id).await?;
        let outcome = match current {
            GrantState::Unset => match self.store.insert(group_id, permission_id, value).await {
                Ok(()) => SetOutcome::Inserted,
                Err(StoreError::DuplicateGrant { .. }) => {
                    tracing::warn!(
                        group_id = %group_id,
                        permission_id = %permission_id,
                        "grant appeared concurrently, retrying as update"
                    );
                    self.store.update(group_id, permission_id, value).await?;
                    SetOutcome::Updated
                }
                Err(e) => return Err(e.into()),
            },
            state if state.as_value() == Some(value) => SetOutcome::Unchanged,
            _ => match self.store.update(group_id, permission_id, value).await {
                Ok(()) => SetOutcome::Updated,
                Err(StoreError::NotFound) => {
                    tracing::warn!(
                        group_id = %group_id,
                        permission_id = %permission_id,
                        "grant vanished concurrently, retrying as insert"
                    );
                    self.store.insert(group_id, permission_id, value).await?;
                    SetOutcome::Inserted
                }
                Err(e) => return Err(e.into()),
            },
        };

        if outcome != SetOutcome::Unchanged {
            tracing::info!(
                group_id = %group_id,
                permission_id = %permission_id,
                value,
                ?outcome,
                "group permission set"
            );
        }
        Ok(outcome)
    }

    /// Remove a group's grant or denial, leaving the permission unset (idempotent).
    pub async fn remove_group_permission(
        &self,
        group_id: GroupId,
        permission_id: PermissionId,
    ) -> Result<(), AccessError> {
        let group_id = group_id.validate().map_err(AccessError::from_validation)?;
        let permission_id = permission_id
            .validate()
            .map_err(AccessError::from_validation)?;

        self.store.delete(group_id, permission_id).await?;
        tracing::info!(
            group_id = %group_id,
            permission_id = %permission_id,
            "group permission removed"
        );
        Ok(())
    }
}
