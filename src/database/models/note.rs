use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Note {
    pub id: Uuid,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Note {
    pub fn new(created_by: Uuid, updated_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_by,
            created_at: updated_at,
            updated_at,
        }
    }
}
