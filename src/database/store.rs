use async_trait::async_trait;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{Branch, BranchSharingInfo, Note, User};

pub type StoreResult<T> = Result<T, DatabaseError>;

/// Document store behind the branch and user handlers.
///
/// Lookups return `Ok(None)` for unknown ids. The two write operations are
/// atomic: either every document they touch is updated or none is.
#[async_trait]
pub trait Store: Send + Sync {
    async fn health_check(&self) -> StoreResult<()>;

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// The user whose `my_branches` contains `branch_id`
    async fn find_branch_author(&self, branch_id: Uuid) -> StoreResult<Option<User>>;

    async fn find_branch(&self, id: Uuid) -> StoreResult<Option<Branch>>;

    async fn find_note(&self, id: Uuid) -> StoreResult<Option<Note>>;

    async fn find_sharing_info(&self, id: Uuid) -> StoreResult<Option<BranchSharingInfo>>;

    /// Insert an empty branch and append its id to the user's `my_branches`.
    ///
    /// Fails with `NotFound` when the user does not exist, in which case no
    /// branch is stored.
    async fn create_branch(&self, user_id: Uuid) -> StoreResult<(Branch, User)>;

    /// Insert a sharing grant and append its id to both the branch's
    /// `shared_users_info` and the recipient's `shared_branches_info`.
    ///
    /// Fails with `NotFound` if either side is missing and with `Conflict`
    /// if the recipient already holds a grant on the branch.
    async fn create_sharing_info(
        &self,
        branch_id: Uuid,
        user_id: Uuid,
        has_permission: bool,
    ) -> StoreResult<BranchSharingInfo>;
}
