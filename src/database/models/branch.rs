use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::note::Note;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Branch {
    pub id: Uuid,
    pub latest_note: Option<Uuid>,
    pub shared_users_info: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Branch {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            latest_note: None,
            shared_users_info: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_shared(&self) -> bool {
        !self.shared_users_info.is_empty()
    }

    /// Swap the `latest_note` id for the note document itself
    pub fn populate(self, latest_note: Option<Note>) -> PopulatedBranch {
        PopulatedBranch {
            id: self.id,
            latest_note,
            shared_users_info: self.shared_users_info,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Branch as returned by the listing endpoints, with its latest note inlined
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulatedBranch {
    pub id: Uuid,
    pub latest_note: Option<Note>,
    pub shared_users_info: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PopulatedBranch {
    pub fn note_updated_at(&self) -> Option<DateTime<Utc>> {
        self.latest_note.as_ref().map(|note| note.updated_at)
    }
}
