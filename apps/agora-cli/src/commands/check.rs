use std::collections::BTreeSet;
use std::io::Write;
use std::sync::Arc;

use agora_access::{Authorizer, PermissionCache, PermissionResolver, ResolutionResult};
use agora_storage::{GroupId, MembershipStore, PermissionId, PermissionStore, UserId};

/// Resolve through a user's memberships. Returns whether access is granted.
pub async fn cmd_check_user<S: PermissionStore + MembershipStore + ?Sized>(
    store: Arc<S>,
    out: &mut impl Write,
    user: i64,
    permissions: &[i64],
    residual: bool,
) -> Result<bool, Box<dyn std::error::Error>> {
    let authorizer = Authorizer::new(store);
    let permissions = permission_set(permissions);
    let mut cache = PermissionCache::new();
    let result = if residual {
        authorizer
            .check_user_residual(UserId(user), &permissions, &mut cache)
            .await?
    } else {
        authorizer
            .check_user(UserId(user), &permissions, &mut cache)
            .await?
    };
    report(out, &result)?;
    Ok(result.is_satisfied())
}

/// Resolve against an explicit group list, first group first.
pub async fn cmd_check_groups<S: PermissionStore + ?Sized>(
    store: Arc<S>,
    out: &mut impl Write,
    groups: &[i64],
    permissions: &[i64],
    residual: bool,
) -> Result<bool, Box<dyn std::error::Error>> {
    let resolver = PermissionResolver::new(store);
    let groups: Vec<GroupId> = groups.iter().copied().map(GroupId).collect();
    let permissions = permission_set(permissions);
    let mut cache = PermissionCache::new();

    let result = if residual {
        resolver
            .resolve_residual(&groups, &permissions, &mut cache)
            .await?
    } else {
        resolver.resolve(&groups, &permissions, &mut cache).await?
    };
    report(out, &result)?;
    Ok(result.is_satisfied())
}

fn permission_set(permissions: &[i64]) -> BTreeSet<PermissionId> {
    permissions.iter().copied().map(PermissionId).collect()
}

fn report(out: &mut impl Write, result: &ResolutionResult) -> std::io::Result<()> {
    match result {
        ResolutionResult::Satisfied => writeln!(out, "satisfied"),
        ResolutionResult::Denied => writeln!(out, "denied"),
        ResolutionResult::Residual(open) => {
            let ids: Vec<String> = open.iter().map(ToString::to_string).collect();
            writeln!(out, "unresolved: {}", ids.join(", "))
        }
    }
}
