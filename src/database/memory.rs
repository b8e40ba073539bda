use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{Branch, BranchSharingInfo, Note, User};
use crate::database::store::{Store, StoreResult};

#[derive(Debug, Default)]
struct Collections {
    users: HashMap<Uuid, User>,
    branches: HashMap<Uuid, Branch>,
    notes: HashMap<Uuid, Note>,
    sharing_infos: HashMap<Uuid, BranchSharingInfo>,
}

/// In-process store used for local runs and tests.
///
/// Every write holds the single write lock for its whole duration, which
/// gives the same all-or-nothing behavior as the Postgres transactions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_user(&self, user: User) -> User {
        self.inner.write().await.users.insert(user.id, user.clone());
        user
    }

    pub async fn insert_note(&self, note: Note) -> Note {
        self.inner.write().await.notes.insert(note.id, note.clone());
        note
    }

    /// Point a branch at its most recently updated note
    pub async fn set_latest_note(&self, branch_id: Uuid, note_id: Uuid) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        let branch = inner
            .branches
            .get_mut(&branch_id)
            .ok_or_else(|| DatabaseError::NotFound(format!("branch {}", branch_id)))?;
        branch.latest_note = Some(note_id);
        branch.updated_at = Utc::now();
        Ok(())
    }

    pub async fn sharing_infos(&self) -> Vec<BranchSharingInfo> {
        self.inner.read().await.sharing_infos.values().cloned().collect()
    }

    pub async fn branch_count(&self) -> usize {
        self.inner.read().await.branches.len()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_branch_author(&self, branch_id: Uuid) -> StoreResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().find(|u| u.owns_branch(branch_id)).cloned())
    }

    async fn find_branch(&self, id: Uuid) -> StoreResult<Option<Branch>> {
        Ok(self.inner.read().await.branches.get(&id).cloned())
    }

    async fn find_note(&self, id: Uuid) -> StoreResult<Option<Note>> {
        Ok(self.inner.read().await.notes.get(&id).cloned())
    }

    async fn find_sharing_info(&self, id: Uuid) -> StoreResult<Option<BranchSharingInfo>> {
        Ok(self.inner.read().await.sharing_infos.get(&id).cloned())
    }

    async fn create_branch(&self, user_id: Uuid) -> StoreResult<(Branch, User)> {
        let mut inner = self.inner.write().await;
        let branch = Branch::new();

        let user = inner
            .users
            .get_mut(&user_id)
            .ok_or_else(|| DatabaseError::NotFound(format!("user {}", user_id)))?;
        user.my_branches.push(branch.id);
        user.updated_at = Utc::now();
        let user = user.clone();

        inner.branches.insert(branch.id, branch.clone());
        Ok((branch, user))
    }

    async fn create_sharing_info(
        &self,
        branch_id: Uuid,
        user_id: Uuid,
        has_permission: bool,
    ) -> StoreResult<BranchSharingInfo> {
        let mut inner = self.inner.write().await;

        if !inner.branches.contains_key(&branch_id) {
            return Err(DatabaseError::NotFound(format!("branch {}", branch_id)));
        }
        if !inner.users.contains_key(&user_id) {
            return Err(DatabaseError::NotFound(format!("user {}", user_id)));
        }
        if inner
            .sharing_infos
            .values()
            .any(|info| info.branch_id == branch_id && info.user_id == user_id)
        {
            return Err(DatabaseError::Conflict("branch already shared with user".to_string()));
        }

        let info = BranchSharingInfo::new(branch_id, user_id, has_permission);
        let now = Utc::now();

        if let Some(branch) = inner.branches.get_mut(&branch_id) {
            branch.shared_users_info.push(info.id);
            branch.updated_at = now;
        }
        if let Some(user) = inner.users.get_mut(&user_id) {
            user.shared_branches_info.push(info.id);
            user.updated_at = now;
        }
        inner.sharing_infos.insert(info.id, info.clone());

        Ok(info)
    }
}
