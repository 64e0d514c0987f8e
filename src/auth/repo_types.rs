use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::password::SaltedHash;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,         // unique user ID
    pub username: String, // email-shaped login name
    #[serde(skip_serializing)]
    #[sqlx(rename = "password")]
    pub password_hash: String, // salted digest, not exposed in JSON
    #[serde(skip_serializing)]
    pub salt: String,
}

impl User {
    pub fn new(username: impl Into<String>, salted: SaltedHash) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            password_hash: salted.hash,
            salt: salted.salt,
        }
    }

    pub fn salted_hash(&self) -> SaltedHash {
        SaltedHash {
            hash: self.password_hash.clone(),
            salt: self.salt.clone(),
        }
    }
}
