use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Note record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct Note {
    pub id: String, // upsert key
    pub title: String,
    pub content: String,
    pub date: i64, // caller-supplied timestamp
    pub owners: Vec<String>,
    pub color: String,
}

impl Note {
    /// Builds a note, generating an id when none is given and dropping repeated owners.
    pub fn new(
        id: Option<String>,
        title: String,
        content: String,
        date: i64,
        owners: Vec<String>,
        color: String,
    ) -> Self {
        let mut unique: Vec<String> = Vec::with_capacity(owners.len());
        for owner in owners {
            if !unique.contains(&owner) {
                unique.push(owner);
            }
        }
        Self {
            id: id
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            title,
            content,
            date,
            owners: unique,
            color,
        }
    }

    pub fn is_owned_by(&self, username: &str) -> bool {
        self.owners.iter().any(|o| o == username)
    }
}
