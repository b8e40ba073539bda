use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    /// Owned branch ids, in creation order
    pub my_branches: Vec<Uuid>,
    /// Sharing grant ids received from other users, in grant order
    pub shared_branches_info: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(email: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            my_branches: Vec::new(),
            shared_branches_info: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn owns_branch(&self, branch_id: Uuid) -> bool {
        self.my_branches.contains(&branch_id)
    }
}
