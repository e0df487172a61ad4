use std::collections::{BTreeSet, HashMap, HashSet};
use std::str::FromStr;

use agora_storage::{
    validate_key, Comment, CommentId, CommentStore, GrantState, GroupId, Membership,
    MembershipId, MembershipQuery, MembershipStore, NewComment, Page, PermissionGrant,
    PermissionId, PermissionStore, Position, Rating, RatingStore, StoreError, UserId,
};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Default pool size for file-backed databases.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Permission ids bound per `IN (...)` query; older SQLite builds cap a
/// statement at 999 variables and the group id takes one.
const BATCH_LOOKUP_CHUNK: usize = 900;

pub struct SqliteStore {
    pool: SqlitePool,
}

fn backend(e: sqlx::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false)
}

impl SqliteStore {
    /// `~/.agora/agora.db` (creates dir with 0700 perms on unix)
    pub async fn open_default() -> Result<Self, StoreError> {
        let dir = dirs::home_dir()
            .ok_or_else(|| StoreError::Backend("no home dir".into()))?
            .join(".agora");
        std::fs::create_dir_all(&dir).map_err(|e| StoreError::Backend(e.to_string()))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&dir, std::fs::Permissions::from_mode(0o700))
                .map_err(|e| StoreError::Backend(e.to_string()))?;
        }
        let path = dir.join("agora.db");
        let url = format!("sqlite://{}", path.to_string_lossy());
        Self::open(&url).await
    }

    pub async fn open_in_memory() -> Result<Self, StoreError> {
        // Every connection to `:memory:` is its own database, so keep exactly one.
        Self::open_with("sqlite::memory:", 1).await
    }

    pub async fn open(url: &str) -> Result<Self, StoreError> {
        Self::open_with(url, DEFAULT_MAX_CONNECTIONS).await
    }

    pub async fn open_with(url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(backend)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await
            .map_err(backend)?;

        MIGRATOR
            .run(&pool)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        tracing::debug!(url, max_connections, "sqlite store opened");
        Ok(Self { pool })
    }
}

// ───────────────────────────── Grants ─────────────────────────────

#[async_trait::async_trait]
impl PermissionStore for SqliteStore {
    async fn grants_for(&self, group_id: GroupId) -> Result<Vec<PermissionGrant>, StoreError> {
        let group_id = group_id.validate()?;
        let rows = sqlx::query_as::<_, (i64, i64, i64)>(
            "SELECT group_id, permission_id, value FROM group_permissions
             WHERE group_id = ? ORDER BY permission_id",
        )
        .bind(group_id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;
        Ok(rows.into_iter().map(grant_from_row).collect())
    }

    async fn groups_for(
        &self,
        permission_id: PermissionId,
    ) -> Result<Vec<PermissionGrant>, StoreError> {
        let permission_id = permission_id.validate()?;
        let rows = sqlx::query_as::<_, (i64, i64, i64)>(
            "SELECT group_id, permission_id, value FROM group_permissions
             WHERE permission_id = ? ORDER BY group_id",
        )
        .bind(permission_id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;
        Ok(rows.into_iter().map(grant_from_row).collect())
    }

    async fn lookup(
        &self,
        group_id: GroupId,
        permission_id: PermissionId,
    ) -> Result<GrantState, StoreError> {
        let group_id = group_id.validate()?;
        let permission_id = permission_id.validate()?;
        let row = sqlx::query_scalar::<_, i64>(
            "SELECT value FROM group_permissions WHERE group_id = ? AND permission_id = ?",
        )
        .bind(group_id.0)
        .bind(permission_id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;
        Ok(GrantState::from(row.map(|v| v != 0)))
    }

    async fn batch_lookup(
        &self,
        group_id: GroupId,
        permission_ids: &BTreeSet<PermissionId>,
    ) -> Result<HashMap<PermissionId, GrantState>, StoreError> {
        let group_id = group_id.validate()?;
        for p in permission_ids {
            p.validate()?;
        }
        if permission_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let ids: Vec<i64> = permission_ids.iter().map(|p| p.0).collect();
        let mut rows: Vec<(i64, i64)> = Vec::new();
        for chunk in ids.chunks(BATCH_LOOKUP_CHUNK) {
            let mut qb = QueryBuilder::<Sqlite>::new(
                "SELECT permission_id, value FROM group_permissions WHERE group_id = ",
            );
            qb.push_bind(group_id.0);
            qb.push(" AND permission_id IN (");
            let mut separated = qb.separated(", ");
            for id in chunk {
                separated.push_bind(*id);
            }
            separated.push_unseparated(")");

            let chunk_rows: Vec<(i64, i64)> = qb
                .build_query_as()
                .fetch_all(&self.pool)
                .await
                .map_err(backend)?;
            rows.extend(chunk_rows);
        }

        let mut out: HashMap<PermissionId, GrantState> = permission_ids
            .iter()
            .map(|p| (*p, GrantState::Unset))
            .collect();
        for (permission_id, value) in rows {
            out.insert(PermissionId(permission_id), GrantState::from(value != 0));
        }
        Ok(out)
    }

    async fn exists(
        &self,
        group_id: GroupId,
        permission_id: PermissionId,
    ) -> Result<bool, StoreError> {
        Ok(self.lookup(group_id, permission_id).await? != GrantState::Unset)
    }

    async fn insert(
        &self,
        group_id: GroupId,
        permission_id: PermissionId,
        value: bool,
    ) -> Result<(), StoreError> {
        let group_id = group_id.validate()?;
        let permission_id = permission_id.validate()?;
        sqlx::query("INSERT INTO group_permissions(group_id, permission_id, value) VALUES(?, ?, ?)")
            .bind(group_id.0)
            .bind(permission_id.0)
            .bind(i64::from(value))
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    StoreError::DuplicateGrant {
                        group: group_id,
                        permission: permission_id,
                    }
                } else {
                    backend(e)
                }
            })?;
        Ok(())
    }

    async fn update(
        &self,
        group_id: GroupId,
        permission_id: PermissionId,
        value: bool,
    ) -> Result<(), StoreError> {
        let group_id = group_id.validate()?;
        let permission_id = permission_id.validate()?;
        let result = sqlx::query(
            "UPDATE group_permissions SET value = ? WHERE group_id = ? AND permission_id = ?",
        )
        .bind(i64::from(value))
        .bind(group_id.0)
        .bind(permission_id.0)
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete(
        &self,
        group_id: GroupId,
        permission_id: PermissionId,
    ) -> Result<(), StoreError> {
        let group_id = group_id.validate()?;
        let permission_id = permission_id.validate()?;
        sqlx::query("DELETE FROM group_permissions WHERE group_id = ? AND permission_id = ?")
            .bind(group_id.0)
            .bind(permission_id.0)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(())
    }
}

fn grant_from_row((group_id, permission_id, value): (i64, i64, i64)) -> PermissionGrant {
    PermissionGrant {
        group_id: GroupId(group_id),
        permission_id: PermissionId(permission_id),
        value: value != 0,
    }
}

// ──────────────────────────── Memberships ────────────────────────────

type MembershipRow = (i64, i64, i64, i64);

fn membership_from_row((id, user_id, group_id, significance): MembershipRow) -> Membership {
    Membership {
        id: MembershipId(id),
        user_id: UserId(user_id),
        group_id: GroupId(group_id),
        significance,
    }
}

/// SQLite only accepts OFFSET after a LIMIT; -1 means "no limit".
fn limit_offset(limit: Option<u32>, offset: Option<u32>) -> (i64, i64) {
    (
        limit.map(i64::from).unwrap_or(-1),
        offset.map(i64::from).unwrap_or(0),
    )
}

#[async_trait::async_trait]
impl MembershipStore for SqliteStore {
    async fn user_groups(
        &self,
        user_id: UserId,
        query: &MembershipQuery,
    ) -> Result<Vec<Membership>, StoreError> {
        let user_id = user_id.validate()?;
        // Column and direction come from closed enums, never from caller text.
        let sql = format!(
            "SELECT id, user_id, group_id, significance FROM user_groups
             WHERE user_id = ? ORDER BY {} {}, id ASC LIMIT ? OFFSET ?",
            query.order_by.column(),
            query.direction.keyword()
        );
        let (limit, offset) = limit_offset(query.limit, query.offset);
        let rows = sqlx::query_as::<_, MembershipRow>(&sql)
            .bind(user_id.0)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?;
        Ok(rows.into_iter().map(membership_from_row).collect())
    }

    async fn user_group_ids(&self, user_id: UserId) -> Result<Vec<GroupId>, StoreError> {
        let user_id = user_id.validate()?;
        let rows = sqlx::query_scalar::<_, i64>(
            "SELECT group_id FROM user_groups WHERE user_id = ?
             ORDER BY significance DESC, id ASC",
        )
        .bind(user_id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;
        Ok(rows.into_iter().map(GroupId).collect())
    }

    async fn group_users(
        &self,
        group_id: GroupId,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> Result<Vec<Membership>, StoreError> {
        let group_id = group_id.validate()?;
        let (limit, offset) = limit_offset(limit, offset);
        let rows = sqlx::query_as::<_, MembershipRow>(
            "SELECT id, user_id, group_id, significance FROM user_groups
             WHERE group_id = ? ORDER BY id LIMIT ? OFFSET ?",
        )
        .bind(group_id.0)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;
        Ok(rows.into_iter().map(membership_from_row).collect())
    }

    async fn membership_significance(
        &self,
        user_id: UserId,
        group_id: GroupId,
    ) -> Result<Option<i64>, StoreError> {
        let user_id = user_id.validate()?;
        let group_id = group_id.validate()?;
        sqlx::query_scalar::<_, i64>(
            "SELECT significance FROM user_groups WHERE user_id = ? AND group_id = ?",
        )
        .bind(user_id.0)
        .bind(group_id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)
    }

    async fn highest_significance(&self, user_id: UserId) -> Result<Option<i64>, StoreError> {
        let user_id = user_id.validate()?;
        sqlx::query_scalar::<_, Option<i64>>(
            "SELECT MAX(significance) FROM user_groups WHERE user_id = ?",
        )
        .bind(user_id.0)
        .fetch_one(&self.pool)
        .await
        .map_err(backend)
    }

    async fn lowest_significance(&self, user_id: UserId) -> Result<Option<i64>, StoreError> {
        let user_id = user_id.validate()?;
        sqlx::query_scalar::<_, Option<i64>>(
            "SELECT MIN(significance) FROM user_groups WHERE user_id = ?",
        )
        .bind(user_id.0)
        .fetch_one(&self.pool)
        .await
        .map_err(backend)
    }

    async fn add_user_to_group(
        &self,
        user_id: UserId,
        group_id: GroupId,
        significance: Option<i64>,
    ) -> Result<MembershipId, StoreError> {
        let user_id = user_id.validate()?;
        let group_id = group_id.validate()?;

        let mut tx = self.pool.begin().await.map_err(backend)?;

        let significance = match significance {
            Some(s) => s,
            None => {
                let lowest = sqlx::query_scalar::<_, Option<i64>>(
                    "SELECT MIN(significance) FROM user_groups WHERE user_id = ?",
                )
                .bind(user_id.0)
                .fetch_one(&mut *tx)
                .await
                .map_err(backend)?;
                lowest.map(|l| l - 1).unwrap_or(0)
            }
        };

        let result = sqlx::query(
            "INSERT INTO user_groups(user_id, group_id, significance) VALUES(?, ?, ?)",
        )
        .bind(user_id.0)
        .bind(group_id.0)
        .bind(significance)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::AlreadyExists
            } else {
                backend(e)
            }
        })?;

        tx.commit().await.map_err(backend)?;
        Ok(MembershipId(result.last_insert_rowid()))
    }

    async fn remove_user_from_group(
        &self,
        user_id: UserId,
        group_id: GroupId,
    ) -> Result<(), StoreError> {
        let user_id = user_id.validate()?;
        let group_id = group_id.validate()?;
        sqlx::query("DELETE FROM user_groups WHERE user_id = ? AND group_id = ?")
            .bind(user_id.0)
            .bind(group_id.0)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn remove_membership(&self, id: MembershipId) -> Result<(), StoreError> {
        let id = id.validate()?;
        sqlx::query("DELETE FROM user_groups WHERE id = ?")
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn change_significance(
        &self,
        user_id: UserId,
        group_id: GroupId,
        significance: i64,
    ) -> Result<(), StoreError> {
        let user_id = user_id.validate()?;
        let group_id = group_id.validate()?;
        let result = sqlx::query(
            "UPDATE user_groups SET significance = ? WHERE user_id = ? AND group_id = ?",
        )
        .bind(significance)
        .bind(user_id.0)
        .bind(group_id.0)
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

// ───────────────────────────── Comments ──────────────────────────────

#[derive(sqlx::FromRow)]
struct CommentRow {
    id: i64,
    module: String,
    identifier: String,
    answer_to: Option<i64>,
    user_id: i64,
    body: String,
    created_at: DateTime<Utc>,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Comment {
            id: CommentId(row.id),
            module: row.module,
            identifier: row.identifier,
            answer_to: row.answer_to.map(CommentId),
            user_id: UserId(row.user_id),
            body: row.body,
            created_at: row.created_at,
        }
    }
}

const COMMENT_COLUMNS: &str = "id, module, identifier, answer_to, user_id, body, created_at";

fn validate_body(body: &str) -> Result<(), StoreError> {
    validate_key("comment body", body)
}

#[async_trait::async_trait]
impl CommentStore for SqliteStore {
    async fn get_comment(&self, id: CommentId) -> Result<Comment, StoreError> {
        let id = id.validate()?;
        let sql = format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE id = ?");
        let row = sqlx::query_as::<_, CommentRow>(&sql)
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;
        row.map(Comment::from).ok_or(StoreError::NotFound)
    }

    async fn comment_exists(&self, id: CommentId) -> Result<bool, StoreError> {
        let id = id.validate()?;
        let row = sqlx::query_scalar::<_, i64>("SELECT id FROM comments WHERE id = ?")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;
        Ok(row.is_some())
    }

    async fn answer_count(&self, id: CommentId) -> Result<u64, StoreError> {
        let id = id.validate()?;
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM comments WHERE answer_to = ?")
            .bind(id.0)
            .fetch_one(&self.pool)
            .await
            .map_err(backend)?;
        Ok(count as u64)
    }

    async fn top_level_count(&self) -> Result<u64, StoreError> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM comments WHERE answer_to IS NULL")
                .fetch_one(&self.pool)
                .await
                .map_err(backend)?;
        Ok(count as u64)
    }

    async fn path_to(&self, id: CommentId) -> Result<Vec<CommentId>, StoreError> {
        let id = id.validate()?;
        let mut path = vec![id];
        let mut seen = HashSet::from([id]);
        let mut current = id;
        loop {
            let parent = sqlx::query_scalar::<_, Option<i64>>(
                "SELECT answer_to FROM comments WHERE id = ?",
            )
            .bind(current.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;

            match parent {
                None if current == id => return Err(StoreError::NotFound),
                Some(Some(parent)) if seen.insert(CommentId(parent)) => {
                    current = CommentId(parent);
                    path.push(current);
                }
                _ => break,
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
        let sql = format!(
            "SELECT {COMMENT_COLUMNS} FROM comments
             WHERE module = ? AND identifier = ? AND answer_to IS NULL
             ORDER BY created_at {dir}, id {dir} LIMIT ? OFFSET ?",
            dir = page.order.keyword()
        );
        let rows = sqlx::query_as::<_, CommentRow>(&sql)
            .bind(module)
            .bind(identifier)
            .bind(i64::from(page.limit))
            .bind(i64::from(page.offset))
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?;
        Ok(rows.into_iter().map(Comment::from).collect())
    }

    async fn comments_positioned(
        &self,
        id: CommentId,
        position: Position,
        page: Page,
    ) -> Result<Vec<Comment>, StoreError> {
        let reference = self.get_comment(id).await?;
        let sql = format!(
            "SELECT {COMMENT_COLUMNS} FROM comments
             WHERE id {op} ? AND module = ? AND identifier = ? AND answer_to IS ?
             ORDER BY created_at {dir}, id {dir} LIMIT ? OFFSET ?",
            op = position.operator(),
            dir = page.order.keyword()
        );
        let rows = sqlx::query_as::<_, CommentRow>(&sql)
            .bind(reference.id.0)
            .bind(&reference.module)
            .bind(&reference.identifier)
            .bind(reference.answer_to.map(|a| a.0))
            .bind(i64::from(page.limit))
            .bind(i64::from(page.offset))
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?;
        Ok(rows.into_iter().map(Comment::from).collect())
    }

    async fn count_positioned(
        &self,
        id: CommentId,
        position: Position,
    ) -> Result<u64, StoreError> {
        let reference = self.get_comment(id).await?;
        let sql = format!(
            "SELECT COUNT(*) FROM comments
             WHERE id {} ? AND module = ? AND identifier = ? AND answer_to IS ?",
            position.operator()
        );
        let count = sqlx::query_scalar::<_, i64>(&sql)
            .bind(reference.id.0)
            .bind(&reference.module)
            .bind(&reference.identifier)
            .bind(reference.answer_to.map(|a| a.0))
            .fetch_one(&self.pool)
            .await
            .map_err(backend)?;
        Ok(count as u64)
    }

    async fn answers(&self, id: CommentId, page: Page) -> Result<Vec<Comment>, StoreError> {
        let id = id.validate()?;
        let sql = format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE answer_to = ?
             ORDER BY created_at {dir}, id {dir} LIMIT ? OFFSET ?",
            dir = page.order.keyword()
        );
        let rows = sqlx::query_as::<_, CommentRow>(&sql)
            .bind(id.0)
            .bind(i64::from(page.limit))
            .bind(i64::from(page.offset))
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?;
        Ok(rows.into_iter().map(Comment::from).collect())
    }

    async fn post_comment(&self, comment: &NewComment) -> Result<CommentId, StoreError> {
        validate_key("module", &comment.module)?;
        validate_key("identifier", &comment.identifier)?;
        validate_body(&comment.body)?;
        let user_id = comment.user_id.validate()?;

        let result = sqlx::query(
            "INSERT INTO comments(module, identifier, answer_to, user_id, body, created_at)
             VALUES(?, ?, NULL, ?, ?, ?)",
        )
        .bind(&comment.module)
        .bind(&comment.identifier)
        .bind(user_id.0)
        .bind(&comment.body)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(backend)?;
        Ok(CommentId(result.last_insert_rowid()))
    }

    async fn post_answer(
        &self,
        answer_to: CommentId,
        user_id: UserId,
        body: &str,
    ) -> Result<CommentId, StoreError> {
        validate_body(body)?;
        let user_id = user_id.validate()?;
        let parent = self.get_comment(answer_to).await?;

        let result = sqlx::query(
            "INSERT INTO comments(module, identifier, answer_to, user_id, body, created_at)
             VALUES(?, ?, ?, ?, ?, ?)",
        )
        .bind(&parent.module)
        .bind(&parent.identifier)
        .bind(parent.id.0)
        .bind(user_id.0)
        .bind(body)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(backend)?;
        Ok(CommentId(result.last_insert_rowid()))
    }
}

// ───────────────────────────── Ratings ───────────────────────────────

#[async_trait::async_trait]
impl RatingStore for SqliteStore {
    async fn user_rating(
        &self,
        user_id: UserId,
        module: &str,
        identifier: &str,
    ) -> Result<Option<Rating>, StoreError> {
        let user_id = user_id.validate()?;
        validate_key("module", module)?;
        validate_key("identifier", identifier)?;
        let row = sqlx::query_scalar::<_, i64>(
            "SELECT rating FROM ratings WHERE user_id = ? AND module = ? AND identifier = ?",
        )
        .bind(user_id.0)
        .bind(module)
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;
        Ok(row.map(Rating::from_stored))
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

        match rating {
            None => {
                sqlx::query(
                    "DELETE FROM ratings WHERE user_id = ? AND module = ? AND identifier = ?",
                )
                .bind(user_id.0)
                .bind(module)
                .bind(identifier)
                .execute(&self.pool)
                .await
                .map_err(backend)?;
            }
            Some(rating) => {
                // Unchanged votes match neither branch and leave the row untouched.
                sqlx::query(
                    "INSERT INTO ratings(user_id, module, identifier, rating, created_at)
                     VALUES(?, ?, ?, ?, ?)
                     ON CONFLICT(user_id, module, identifier)
                     DO UPDATE SET rating = excluded.rating WHERE rating <> excluded.rating",
                )
                .bind(user_id.0)
                .bind(module)
                .bind(identifier)
                .bind(rating.as_stored())
                .bind(Utc::now())
                .execute(&self.pool)
                .await
                .map_err(backend)?;
            }
        }
        Ok(())
    }
}
