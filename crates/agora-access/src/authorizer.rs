use std::collections::BTreeSet;
use std::sync::Arc;

use agora_storage::{GroupId, MembershipStore, PermissionId, PermissionStore, UserId};

use crate::cache::PermissionCache;
use crate::error::AccessError;
use crate::resolver::{PermissionResolver, ResolutionResult};

/// Checks a user's permissions through their group memberships.
///
/// Groups are resolved most significant first, so a denial in a higher-ranked group
/// wins over grants from lower-ranked ones.
pub struct Authorizer<S: ?Sized> {
    store: Arc<S>,
    resolver: PermissionResolver<S>,
}

impl<S: PermissionStore + MembershipStore + ?Sized> Authorizer<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            resolver: PermissionResolver::new(Arc::clone(&store)),
            store,
        }
    }

    pub fn resolver(&self) -> &PermissionResolver<S> {
        &self.resolver
    }

    pub async fn check_user(
        &self,
        user_id: UserId,
        permissions: &BTreeSet<PermissionId>,
        cache: &mut PermissionCache,
    ) -> Result<ResolutionResult, AccessError> {
        let groups = self.groups_of(user_id).await?;
        self.resolver.resolve(&groups, permissions, cache).await
    }

    /// Residual form of [`check_user`](Self::check_user): permissions none of the
    /// user's groups has an opinion on come back as [`ResolutionResult::Residual`].
    pub async fn check_user_residual(
        &self,
        user_id: UserId,
        permissions: &BTreeSet<PermissionId>,
        cache: &mut PermissionCache,
    ) -> Result<ResolutionResult, AccessError> {
        let groups = self.groups_of(user_id).await?;
        self.resolver
            .resolve_residual(&groups, permissions, cache)
            .await
    }

    async fn groups_of(&self, user_id: UserId) -> Result<Vec<GroupId>, AccessError> {
        let user_id = user_id.validate().map_err(AccessError::from_validation)?;
        let groups = self.store.user_group_ids(user_id).await?;
        tracing::debug!(user_id = %user_id, groups = groups.len(), "checking user permissions");
        Ok(groups)
    }

    pub async fn user_has_permissions(
        &self,
        user_id: UserId,
        permissions: &BTreeSet<PermissionId>,
        cache: &mut PermissionCache,
    ) -> Result<bool, AccessError> {
        Ok(self
            .check_user(user_id, permissions, cache)
            .await?
            .is_satisfied())
    }
}
