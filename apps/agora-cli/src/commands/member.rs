use std::io::Write;
use std::sync::Arc;

use agora_storage::{
    GroupId, Membership, MembershipOrder, MembershipQuery, MembershipStore, SortDirection, UserId,
};

use super::Output;

pub async fn cmd_member_add<S: MembershipStore + ?Sized>(
    store: Arc<S>,
    out: &mut impl Write,
    user: i64,
    group: i64,
    significance: Option<i64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let (user_id, group_id) = (UserId(user), GroupId(group));
    let id = store
        .add_user_to_group(user_id, group_id, significance)
        .await?;
    let significance = store
        .membership_significance(user_id, group_id)
        .await?
        .ok_or("membership vanished after insert")?;
    tracing::info!(user_id = %user_id, group_id = %group_id, significance, "membership added");

    writeln!(out, "Added user {user} to group {group}")?;
    writeln!(out, "  Membership: {id}")?;
    writeln!(out, "  Significance: {significance}")?;
    Ok(())
}

pub async fn cmd_member_remove<S: MembershipStore + ?Sized>(
    store: Arc<S>,
    out: &mut impl Write,
    user: i64,
    group: i64,
) -> Result<(), Box<dyn std::error::Error>> {
    store
        .remove_user_from_group(UserId(user), GroupId(group))
        .await?;
    writeln!(out, "Removed user {user} from group {group}")?;
    Ok(())
}

pub async fn cmd_member_rank<S: MembershipStore + ?Sized>(
    store: Arc<S>,
    out: &mut impl Write,
    user: i64,
    group: i64,
    significance: i64,
) -> Result<(), Box<dyn std::error::Error>> {
    store
        .change_significance(UserId(user), GroupId(group), significance)
        .await?;
    writeln!(
        out,
        "Group {group} now has significance {significance} for user {user}"
    )?;
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub async fn cmd_member_groups<S: MembershipStore + ?Sized>(
    store: Arc<S>,
    out: &mut impl Write,
    output: Output,
    user: i64,
    order_by: MembershipOrder,
    direction: SortDirection,
    limit: Option<u32>,
    offset: Option<u32>,
) -> Result<(), Box<dyn std::error::Error>> {
    let query = MembershipQuery {
        order_by,
        direction,
        limit,
        offset,
    };
    let memberships = store.user_groups(UserId(user), &query).await?;
    print_memberships(out, output, &memberships, "groups")
}

pub async fn cmd_member_users<S: MembershipStore + ?Sized>(
    store: Arc<S>,
    out: &mut impl Write,
    output: Output,
    group: i64,
    limit: Option<u32>,
    offset: Option<u32>,
) -> Result<(), Box<dyn std::error::Error>> {
    let memberships = store.group_users(GroupId(group), limit, offset).await?;
    print_memberships(out, output, &memberships, "members")
}

fn print_memberships(
    out: &mut impl Write,
    output: Output,
    memberships: &[Membership],
    noun: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    if output == Output::Json {
        writeln!(out, "{}", serde_json::to_string_pretty(memberships)?)?;
        return Ok(());
    }
    if memberships.is_empty() {
        writeln!(out, "No {noun} found")?;
        return Ok(());
    }
    for m in memberships {
        writeln!(
            out,
            "  user {}  group {}  significance {}",
            m.user_id, m.group_id, m.significance
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_store_memory::MemoryStore;

    #[tokio::test]
    async fn test_add_rank_and_list() {
        let store = Arc::new(MemoryStore::new());
        let mut out = Vec::new();

        cmd_member_add(store.clone(), &mut out, 7, 1, None).await.unwrap();
        cmd_member_add(store.clone(), &mut out, 7, 2, None).await.unwrap();
        cmd_member_rank(store.clone(), &mut out, 7, 2, 5).await.unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Significance: 0"));
        assert!(text.contains("Significance: -1"));
        assert_eq!(
            store.user_group_ids(UserId(7)).await.unwrap(),
            vec![GroupId(2), GroupId(1)]
        );

        let mut out = Vec::new();
        cmd_member_groups(
            store.clone(),
            &mut out,
            Output::Json,
            7,
            MembershipOrder::GroupId,
            SortDirection::Asc,
            None,
            None,
        )
        .await
        .unwrap();
        let listed: Vec<Membership> = serde_json::from_slice(&out).unwrap();
        let groups: Vec<_> = listed.iter().map(|m| m.group_id).collect();
        assert_eq!(groups, vec![GroupId(1), GroupId(2)]);
    }

    #[tokio::test]
    async fn test_duplicate_add_fails_and_remove_is_idempotent() {
        let store = Arc::new(MemoryStore::new());
        let mut out = Vec::new();

        cmd_member_add(store.clone(), &mut out, 1, 1, Some(3)).await.unwrap();
        assert!(cmd_member_add(store.clone(), &mut out, 1, 1, None).await.is_err());

        cmd_member_remove(store.clone(), &mut out, 1, 1).await.unwrap();
        cmd_member_remove(store.clone(), &mut out, 1, 1).await.unwrap();

        let mut out = Vec::new();
        cmd_member_users(store, &mut out, Output::Text, 1, None, None)
            .await
            .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "No members found\n");
    }

    #[tokio::test]
    async fn test_rank_requires_membership() {
        let store = Arc::new(MemoryStore::new());
        let mut out = Vec::new();
        assert!(cmd_member_rank(store, &mut out, 1, 1, 2).await.is_err());
    }
}
