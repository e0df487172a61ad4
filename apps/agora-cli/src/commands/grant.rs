use std::io::Write;
use std::sync::Arc;

use agora_access::{PermissionAdmin, SetOutcome};
use agora_storage::{GroupId, PermissionGrant, PermissionId, PermissionStore};

use super::Output;

pub async fn cmd_grant_set<S: PermissionStore + ?Sized>(
    store: Arc<S>,
    out: &mut impl Write,
    group: i64,
    permission: i64,
    deny: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let admin = PermissionAdmin::new(store);
    let value = !deny;
    let outcome = admin
        .set_group_permission(GroupId(group), PermissionId(permission), value)
        .await?;

    let state = if value { "granted" } else { "denied" };
    match outcome {
        SetOutcome::Unchanged => {
            writeln!(out, "Permission {permission} is already {state} for group {group}")?
        }
        SetOutcome::Inserted | SetOutcome::Updated => {
            writeln!(out, "Permission {permission} {state} for group {group}")?
        }
    }
    Ok(())
}

pub async fn cmd_grant_unset<S: PermissionStore + ?Sized>(
    store: Arc<S>,
    out: &mut impl Write,
    group: i64,
    permission: i64,
) -> Result<(), Box<dyn std::error::Error>> {
    let admin = PermissionAdmin::new(store);
    admin
        .remove_group_permission(GroupId(group), PermissionId(permission))
        .await?;
    writeln!(out, "Permission {permission} unset for group {group}")?;
    Ok(())
}

pub async fn cmd_grant_list<S: PermissionStore + ?Sized>(
    store: Arc<S>,
    out: &mut impl Write,
    output: Output,
    group: Option<i64>,
    permission: Option<i64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let grants = match (group, permission) {
        (Some(group), _) => store.grants_for(GroupId(group)).await?,
        (None, Some(permission)) => store.groups_for(PermissionId(permission)).await?,
        (None, None) => return Err("Either --group or --permission is required".into()),
    };

    if output == Output::Json {
        writeln!(out, "{}", serde_json::to_string_pretty(&grants)?)?;
        return Ok(());
    }

    if grants.is_empty() {
        writeln!(out, "No grants found")?;
        return Ok(());
    }

    writeln!(out, "Grants:")?;
    for PermissionGrant {
        group_id,
        permission_id,
        value,
    } in grants
    {
        let state = if value { "granted" } else { "denied" };
        writeln!(out, "  group {group_id}  permission {permission_id}  {state}")?;
    }
    Ok(())
}
