use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::{Branch, BranchSharingInfo, Note, User};
use crate::database::store::{Store, StoreResult};

const USER_COLUMNS: &str = "id, email, my_branches, shared_branches_info, created_at, updated_at";
const BRANCH_COLUMNS: &str = "id, latest_note, shared_users_info, created_at, updated_at";
const NOTE_COLUMNS: &str = "id, created_by, created_at, updated_at";
const SHARING_COLUMNS: &str = "id, branch_id, user_id, has_permission, created_at";

/// Postgres-backed store; id lists live in `UUID[]` columns and are only
/// ever modified with `array_append`
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn health_check(&self) -> StoreResult<()> {
        DatabaseManager::health_check(&self.pool).await
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_branch_author(&self, branch_id: Uuid) -> StoreResult<Option<User>> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE my_branches @> ARRAY[$1]::uuid[] LIMIT 1"
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(branch_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_branch(&self, id: Uuid) -> StoreResult<Option<Branch>> {
        let sql = format!("SELECT {BRANCH_COLUMNS} FROM branches WHERE id = $1");
        let branch = sqlx::query_as::<_, Branch>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(branch)
    }

    async fn find_note(&self, id: Uuid) -> StoreResult<Option<Note>> {
        let sql = format!("SELECT {NOTE_COLUMNS} FROM notes WHERE id = $1");
        let note = sqlx::query_as::<_, Note>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(note)
    }

    async fn find_sharing_info(&self, id: Uuid) -> StoreResult<Option<BranchSharingInfo>> {
        let sql = format!("SELECT {SHARING_COLUMNS} FROM branch_sharing_infos WHERE id = $1");
        let info = sqlx::query_as::<_, BranchSharingInfo>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(info)
    }

    async fn create_branch(&self, user_id: Uuid) -> StoreResult<(Branch, User)> {
        let branch = Branch::new();
        let mut tx = self.pool.begin().await?;

        // Appending first locks the user row and tells us whether it exists
        let sql = format!(
            "UPDATE users SET my_branches = array_append(my_branches, $2), updated_at = now() \
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(user_id)
            .bind(branch.id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("user {}", user_id)))?;

        sqlx::query(
            "INSERT INTO branches (id, latest_note, created_at, updated_at) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(branch.id)
        .bind(branch.latest_note)
        .bind(branch.created_at)
        .bind(branch.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((branch, user))
    }

    async fn create_sharing_info(
        &self,
        branch_id: Uuid,
        user_id: Uuid,
        has_permission: bool,
    ) -> StoreResult<BranchSharingInfo> {
        let info = BranchSharingInfo::new(branch_id, user_id, has_permission);
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO branch_sharing_infos (id, branch_id, user_id, has_permission, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(info.id)
        .bind(info.branch_id)
        .bind(info.user_id)
        .bind(info.has_permission)
        .bind(info.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| DatabaseError::from_write(e, "branch already shared with user"))?;

        let branch_rows = sqlx::query(
            "UPDATE branches \
             SET shared_users_info = array_append(shared_users_info, $2), updated_at = now() \
             WHERE id = $1",
        )
        .bind(branch_id)
        .bind(info.id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
        if branch_rows == 0 {
            return Err(DatabaseError::NotFound(format!("branch {}", branch_id)));
        }

        let user_rows = sqlx::query(
            "UPDATE users \
             SET shared_branches_info = array_append(shared_branches_info, $2), \
             updated_at = now() \
             WHERE id = $1",
        )
        .bind(user_id)
        .bind(info.id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
        if user_rows == 0 {
            return Err(DatabaseError::NotFound(format!("user {}", user_id)));
        }

        tx.commit().await?;
        Ok(info)
    }
}
