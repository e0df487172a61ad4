use std::collections::BTreeSet;

use agora_storage::{
    CommentId, CommentStore, GrantState, GroupId, MembershipOrder, MembershipQuery,
    MembershipStore, NewComment, Page, PermissionId, PermissionStore, Position, Rating,
    RatingStore, SortDirection, StoreError, UserId,
};
use agora_store_sqlite::SqliteStore;

fn new_comment(module: &str, identifier: &str, body: &str) -> NewComment {
    NewComment {
        module: module.to_string(),
        identifier: identifier.to_string(),
        user_id: UserId(1),
        body: body.to_string(),
    }
}

#[tokio::test]
async fn grant_lifecycle() {
    let s = SqliteStore::open_in_memory().await.unwrap();
    let (g, p) = (GroupId(1), PermissionId(10));

    assert_eq!(s.lookup(g, p).await.unwrap(), GrantState::Unset);
    assert!(!s.exists(g, p).await.unwrap());

    s.insert(g, p, true).await.unwrap();
    assert_eq!(s.lookup(g, p).await.unwrap(), GrantState::Granted);
    assert!(s.exists(g, p).await.unwrap());

    s.update(g, p, false).await.unwrap();
    assert_eq!(s.lookup(g, p).await.unwrap(), GrantState::Denied);

    s.delete(g, p).await.unwrap();
    assert_eq!(s.lookup(g, p).await.unwrap(), GrantState::Unset);

    // Deleting an absent row is fine.
    s.delete(g, p).await.unwrap();
}

#[tokio::test]
async fn duplicate_insert_reports_the_pair() {
    let s = SqliteStore::open_in_memory().await.unwrap();
    s.insert(GroupId(2), PermissionId(20), true).await.unwrap();

    let err = s
        .insert(GroupId(2), PermissionId(20), false)
        .await
        .unwrap_err();
    match err {
        StoreError::DuplicateGrant { group, permission } => {
            assert_eq!(group, GroupId(2));
            assert_eq!(permission, PermissionId(20));
        }
        other => panic!("expected DuplicateGrant, got {other:?}"),
    }
    // The first value survives.
    assert_eq!(
        s.lookup(GroupId(2), PermissionId(20)).await.unwrap(),
        GrantState::Granted
    );
}

#[tokio::test]
async fn update_without_row_is_not_found() {
    let s = SqliteStore::open_in_memory().await.unwrap();
    let err = s
        .update(GroupId(1), PermissionId(1), true)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound));
}

#[tokio::test]
async fn batch_lookup_covers_every_requested_permission() {
    let s = SqliteStore::open_in_memory().await.unwrap();
    s.insert(GroupId(1), PermissionId(10), true).await.unwrap();
    s.insert(GroupId(1), PermissionId(11), false).await.unwrap();
    s.insert(GroupId(2), PermissionId(12), true).await.unwrap();

    let wanted: BTreeSet<_> = [10, 11, 12].into_iter().map(PermissionId).collect();
    let facts = s.batch_lookup(GroupId(1), &wanted).await.unwrap();

    assert_eq!(facts.len(), 3);
    assert_eq!(facts[&PermissionId(10)], GrantState::Granted);
    assert_eq!(facts[&PermissionId(11)], GrantState::Denied);
    assert_eq!(facts[&PermissionId(12)], GrantState::Unset);

    let empty = s.batch_lookup(GroupId(1), &BTreeSet::new()).await.unwrap();
    assert!(empty.is_empty());
}

#[tokio::test]
async fn batch_lookup_handles_sets_beyond_the_variable_limit() {
    let s = SqliteStore::open_in_memory().await.unwrap();
    s.insert(GroupId(1), PermissionId(1), true).await.unwrap();
    s.insert(GroupId(1), PermissionId(901), false).await.unwrap();
    s.insert(GroupId(1), PermissionId(39_999), true).await.unwrap();

    let wanted: BTreeSet<_> = (1..=40_000).map(PermissionId).collect();
    let facts = s.batch_lookup(GroupId(1), &wanted).await.unwrap();

    assert_eq!(facts.len(), 40_000);
    assert_eq!(facts[&PermissionId(1)], GrantState::Granted);
    assert_eq!(facts[&PermissionId(901)], GrantState::Denied);
    assert_eq!(facts[&PermissionId(39_999)], GrantState::Granted);
    assert_eq!(
        facts
            .values()
            .filter(|state| **state == GrantState::Unset)
            .count(),
        39_997
    );
}

#[tokio::test]
async fn grant_listings() {
    let s = SqliteStore::open_in_memory().await.unwrap();
    s.insert(GroupId(1), PermissionId(10), true).await.unwrap();
    s.insert(GroupId(1), PermissionId(11), false).await.unwrap();
    s.insert(GroupId(2), PermissionId(10), false).await.unwrap();

    let by_group = s.grants_for(GroupId(1)).await.unwrap();
    assert_eq!(by_group.len(), 2);
    assert!(by_group.iter().all(|g| g.group_id == GroupId(1)));

    let by_permission = s.groups_for(PermissionId(10)).await.unwrap();
    let groups: Vec<_> = by_permission.iter().map(|g| g.group_id).collect();
    assert_eq!(groups, vec![GroupId(1), GroupId(2)]);
}

#[tokio::test]
async fn invalid_ids_are_rejected() {
    let s = SqliteStore::open_in_memory().await.unwrap();
    let err = s.lookup(GroupId(0), PermissionId(1)).await.unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
    let err = s
        .insert(GroupId(1), PermissionId(-4), true)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
}

#[tokio::test]
async fn memberships_and_significance() {
    let s = SqliteStore::open_in_memory().await.unwrap();
    let user = UserId(7);

    assert_eq!(s.lowest_significance(user).await.unwrap(), None);

    // First membership defaults to 0, later ones go below the lowest.
    s.add_user_to_group(user, GroupId(1), None).await.unwrap();
    s.add_user_to_group(user, GroupId(2), None).await.unwrap();
    s.add_user_to_group(user, GroupId(3), Some(10)).await.unwrap();

    assert_eq!(
        s.membership_significance(user, GroupId(1)).await.unwrap(),
        Some(0)
    );
    assert_eq!(
        s.membership_significance(user, GroupId(2)).await.unwrap(),
        Some(-1)
    );
    assert_eq!(s.highest_significance(user).await.unwrap(), Some(10));
    assert_eq!(s.lowest_significance(user).await.unwrap(), Some(-1));

    assert_eq!(
        s.user_group_ids(user).await.unwrap(),
        vec![GroupId(3), GroupId(1), GroupId(2)]
    );

    let by_group = s
        .user_groups(
            user,
            &MembershipQuery {
                order_by: MembershipOrder::GroupId,
                direction: SortDirection::Asc,
                limit: Some(2),
                offset: Some(1),
            },
        )
        .await
        .unwrap();
    let ids: Vec<_> = by_group.iter().map(|m| m.group_id).collect();
    assert_eq!(ids, vec![GroupId(2), GroupId(3)]);

    let err = s
        .add_user_to_group(user, GroupId(1), None)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::AlreadyExists));

    s.change_significance(user, GroupId(2), 20).await.unwrap();
    assert_eq!(s.user_group_ids(user).await.unwrap()[0], GroupId(2));

    let err = s
        .change_significance(user, GroupId(99), 1)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound));

    s.remove_user_from_group(user, GroupId(3)).await.unwrap();
    assert_eq!(s.membership_significance(user, GroupId(3)).await.unwrap(), None);
}

#[tokio::test]
async fn group_members_and_membership_removal() {
    let s = SqliteStore::open_in_memory().await.unwrap();
    let first = s.add_user_to_group(UserId(1), GroupId(5), None).await.unwrap();
    s.add_user_to_group(UserId(2), GroupId(5), None).await.unwrap();
    s.add_user_to_group(UserId(3), GroupId(6), None).await.unwrap();

    let members = s.group_users(GroupId(5), None, None).await.unwrap();
    let users: Vec<_> = members.iter().map(|m| m.user_id).collect();
    assert_eq!(users, vec![UserId(1), UserId(2)]);

    s.remove_membership(first).await.unwrap();
    let members = s.group_users(GroupId(5), None, None).await.unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].user_id, UserId(2));
}

#[tokio::test]
async fn comment_threads() {
    let s = SqliteStore::open_in_memory().await.unwrap();

    let first = s
        .post_comment(&new_comment("news", "42", "first"))
        .await
        .unwrap();
    let second = s
        .post_comment(&new_comment("news", "42", "second"))
        .await
        .unwrap();
    let third = s
        .post_comment(&new_comment("news", "42", "third"))
        .await
        .unwrap();
    s.post_comment(&new_comment("news", "43", "elsewhere"))
        .await
        .unwrap();

    let answer = s.post_answer(second, UserId(2), "reply").await.unwrap();
    let nested = s.post_answer(answer, UserId(3), "reply to reply").await.unwrap();

    let stored = s.get_comment(answer).await.unwrap();
    assert_eq!(stored.module, "news");
    assert_eq!(stored.identifier, "42");
    assert_eq!(stored.answer_to, Some(second));

    assert!(s.comment_exists(nested).await.unwrap());
    assert!(!s.comment_exists(CommentId(999)).await.unwrap());
    assert_eq!(s.top_level_count().await.unwrap(), 4);
    assert_eq!(s.answer_count(second).await.unwrap(), 1);
    assert_eq!(s.path_to(nested).await.unwrap(), vec![second, answer, nested]);
    assert_eq!(s.path_to(first).await.unwrap(), vec![first]);
    assert!(matches!(
        s.path_to(CommentId(999)).await.unwrap_err(),
        StoreError::NotFound
    ));

    let top: Vec<_> = s
        .comments("news", "42", Page::comments())
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.id)
        .collect();
    assert_eq!(top, vec![first, second, third]);

    let before: Vec<_> = s
        .comments_positioned(third, Position::Before, Page::siblings())
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.id)
        .collect();
    assert_eq!(before, vec![second, first]);
    assert_eq!(
        s.count_positioned(first, Position::After).await.unwrap(),
        2
    );
    assert_eq!(s.count_positioned(answer, Position::After).await.unwrap(), 0);

    let answers = s.answers(answer, Page::answers()).await.unwrap();
    assert_eq!(answers.len(), 1);
    assert_eq!(answers[0].body, "reply to reply");
}

#[tokio::test]
async fn comments_reject_blank_fields_and_missing_parents() {
    let s = SqliteStore::open_in_memory().await.unwrap();
    let err = s
        .post_comment(&new_comment("news", "42", "   "))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));

    let err = s
        .post_answer(CommentId(5), UserId(1), "orphan")
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound));
}

#[tokio::test]
async fn ratings_can_change_and_be_withdrawn() {
    let s = SqliteStore::open_in_memory().await.unwrap();
    let user = UserId(4);

    assert_eq!(s.user_rating(user, "news", "42").await.unwrap(), None);

    s.rate(user, Some(Rating::Up), "news", "42").await.unwrap();
    s.rate(user, Some(Rating::Up), "news", "42").await.unwrap();
    assert_eq!(
        s.user_rating(user, "news", "42").await.unwrap(),
        Some(Rating::Up)
    );

    s.rate(user, Some(Rating::Down), "news", "42").await.unwrap();
    assert_eq!(
        s.user_rating(user, "news", "42").await.unwrap(),
        Some(Rating::Down)
    );

    s.rate(user, None, "news", "42").await.unwrap();
    assert_eq!(s.user_rating(user, "news", "42").await.unwrap(), None);
}

#[tokio::test]
async fn file_database_persists_across_reopen() {
    let dir = std::env::temp_dir().join(format!("agora-smoke-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let url = format!("sqlite://{}", dir.join("agora.db").to_string_lossy());

    {
        let s = SqliteStore::open(&url).await.unwrap();
        s.insert(GroupId(1), PermissionId(1), true).await.unwrap();
    }
    let s = SqliteStore::open(&url).await.unwrap();
    assert_eq!(
        s.lookup(GroupId(1), PermissionId(1)).await.unwrap(),
        GrantState::Granted
    );

    drop(s);
    std::fs::remove_dir_all(&dir).unwrap();
}
