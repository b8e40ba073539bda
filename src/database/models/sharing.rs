use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Grant giving `user_id` access to `branch_id`; `has_permission` marks write access
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct BranchSharingInfo {
    pub id: Uuid,
    pub branch_id: Uuid,
    pub user_id: Uuid,
    pub has_permission: bool,
    pub created_at: DateTime<Utc>,
}

impl BranchSharingInfo {
    pub fn new(branch_id: Uuid, user_id: Uuid, has_permission: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            branch_id,
            user_id,
            has_permission,
            created_at: Utc::now(),
        }
    }
}
