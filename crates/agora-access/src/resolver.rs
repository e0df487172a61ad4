//! Group-set permission resolution.
//!
//! Groups are processed in the order given, so callers control precedence (usually
//! most significant group first). For each group the still-open permissions are
//! split into cached and unknown facts, unknown facts are fetched with a single
//! batch lookup, and then:
//!
//! - an explicit denial of any open permission ends resolution with
//!   [`ResolutionResult::Denied`]; later groups are never consulted,
//! - granted permissions are closed and never looked at again,
//! - unset permissions carry over to the next group.
//!
//! Resolution stops as soon as nothing is left open. Permissions no group has an
//! opinion on are not granted.

use std::collections::BTreeSet;
use std::sync::Arc;

use agora_storage::{GrantState, GroupId, PermissionId, PermissionStore};

use crate::cache::PermissionCache;
use crate::error::AccessError;

/// Outcome of a resolution call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResolutionResult {
    /// Every requested permission is granted by at least one group.
    Satisfied,
    /// A permission was explicitly denied, or no group granted it.
    Denied,
    /// Permissions no processed group granted or denied (legacy form only).
    Residual(BTreeSet<PermissionId>),
}

impl ResolutionResult {
    pub fn is_satisfied(&self) -> bool {
        matches!(self, ResolutionResult::Satisfied)
    }
}

/// How a walk over the group set ended.
enum Walk {
    Satisfied,
    Denied,
    Exhausted(BTreeSet<PermissionId>),
}

/// Resolves permission requests against a [`PermissionStore`].
pub struct PermissionResolver<S: ?Sized> {
    store: Arc<S>,
}

impl<S: ?Sized> Clone for PermissionResolver<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: PermissionStore + ?Sized> PermissionResolver<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Whether the combined group set grants every requested permission.
    ///
    /// Never returns [`ResolutionResult::Residual`]: permissions left unset by all
    /// groups make the request [`ResolutionResult::Denied`].
    pub async fn resolve(
        &self,
        groups: &[GroupId],
        permissions: &BTreeSet<PermissionId>,
        cache: &mut PermissionCache,
    ) -> Result<ResolutionResult, AccessError> {
        match self.walk(groups, permissions, cache).await? {
            Walk::Satisfied => Ok(ResolutionResult::Satisfied),
            Walk::Denied => Ok(ResolutionResult::Denied),
            Walk::Exhausted(open) => {
                tracing::debug!(
                    groups = groups.len(),
                    unresolved = ?open,
                    "no group granted the remaining permissions"
                );
                Ok(ResolutionResult::Denied)
            }
        }
    }

    /// Like [`resolve`](Self::resolve), but reports the permissions nobody had an
    /// opinion on as [`ResolutionResult::Residual`] instead of denying them.
    pub async fn resolve_residual(
        &self,
        groups: &[GroupId],
        permissions: &BTreeSet<PermissionId>,
        cache: &mut PermissionCache,
    ) -> Result<ResolutionResult, AccessError> {
        match self.walk(groups, permissions, cache).await? {
            Walk::Satisfied => Ok(ResolutionResult::Satisfied),
            Walk::Denied => Ok(ResolutionResult::Denied),
            Walk::Exhausted(open) => Ok(ResolutionResult::Residual(open)),
        }
    }

    /// Single-group form of [`resolve`](Self::resolve).
    pub async fn resolve_group(
        &self,
        group_id: GroupId,
        permissions: &BTreeSet<PermissionId>,
        cache: &mut PermissionCache,
    ) -> Result<ResolutionResult, AccessError> {
        self.resolve(&[group_id], permissions, cache).await
    }

    async fn walk(
        &self,
        groups: &[GroupId],
        permissions: &BTreeSet<PermissionId>,
        cache: &mut PermissionCache,
    ) -> Result<Walk, AccessError> {
        validate(groups, permissions)?;

        let mut open = permissions.clone();
        if open.is_empty() {
            return Ok(Walk::Satisfied);
        }

        for &group_id in groups {
            let mut unknown = BTreeSet::new();
            for &permission_id in &open {
                match cache.get(group_id, permission_id) {
                    Some(GrantState::Denied) => {
                        tracing::debug!(
                            group_id = %group_id,
                            permission_id = %permission_id,
                            "denied from cache"
                        );
                        return Ok(Walk::Denied);
                    }
                    Some(_) => {}
                    None => {
                        unknown.insert(permission_id);
                    }
                }
            }

            if !unknown.is_empty() {
                tracing::debug!(
                    group_id = %group_id,
                    cached = open.len() - unknown.len(),
                    fetching = unknown.len(),
                    "fetching permission facts"
                );
                let facts = self.store.batch_lookup(group_id, &unknown).await?;
                for &permission_id in &unknown {
                    let state = facts
                        .get(&permission_id)
                        .copied()
                        .unwrap_or(GrantState::Unset);
                    cache.record(group_id, permission_id, state);
                }
            }

            let mut denied = None;
            open.retain(|&permission_id| match cache.get(group_id, permission_id) {
                Some(GrantState::Granted) => false,
                Some(GrantState::Denied) => {
                    denied.get_or_insert(permission_id);
                    true
                }
                _ => true,
            });

            if let Some(permission_id) = denied {
                tracing::debug!(
                    group_id = %group_id,
                    permission_id = %permission_id,
                    "permission explicitly denied"
                );
                return Ok(Walk::Denied);
            }
            if open.is_empty() {
                tracing::debug!(group_id = %group_id, "all permissions granted");
                return Ok(Walk::Satisfied);
            }
        }

        Ok(Walk::Exhausted(open))
    }
}

fn validate(groups: &[GroupId], permissions: &BTreeSet<PermissionId>) -> Result<(), AccessError> {
    for group_id in groups {
        group_id.validate().map_err(AccessError::from_validation)?;
    }
    for permission_id in permissions {
        permission_id
            .validate()
            .map_err(AccessError::from_validation)?;
    }
    Ok(())
}
