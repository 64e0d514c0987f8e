use std::collections::HashMap;

use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::RwLock;

use crate::auth::repo_types::User;

/// Credential store: owns every `User` record.
#[async_trait]
pub trait UserRepo: Send + Sync {
    /// `false` when the username is already taken; no partial state is left behind.
    async fn insert_user(&self, user: &User) -> anyhow::Result<bool>;
    async fn get_user_by_username(&self, username: &str) -> anyhow::Result<Option<User>>;
    async fn user_exists(&self, username: &str) -> anyhow::Result<bool>;
}

#[derive(Clone)]
pub struct PgUserRepo {
    db: PgPool,
}

impl PgUserRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepo for PgUserRepo {
    async fn insert_user(&self, user: &User) -> anyhow::Result<bool> {
        // Uniqueness is the table's UNIQUE(username), so concurrent signups cannot both land.
        let result = sqlx::query(
            r#"
            INSERT INTO users (id, username, password, salt)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (username) DO NOTHING
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.salt)
        .execute(&self.db)
        .await
        .context("insert user")?;
        Ok(result.rows_affected() == 1)
    }

    async fn get_user_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password, salt
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.db)
        .await
        .context("find user by username")?;
        Ok(user)
    }

    async fn user_exists(&self, username: &str) -> anyhow::Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"SELECT EXISTS (SELECT 1 FROM users WHERE username = $1)"#,
        )
        .bind(username)
        .fetch_one(&self.db)
        .await
        .context("check user exists")?;
        Ok(exists)
    }
}

/// Process-local credential store keyed by username.
#[derive(Default)]
pub struct MemoryUserRepo {
    users: RwLock<HashMap<String, User>>,
}

impl MemoryUserRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepo for MemoryUserRepo {
    async fn insert_user(&self, user: &User) -> anyhow::Result<bool> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.username) {
            return Ok(false);
        }
        users.insert(user.username.clone(), user.clone());
        Ok(true)
    }

    async fn get_user_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        Ok(self.users.read().await.get(username).cloned())
    }

    async fn user_exists(&self, username: &str) -> anyhow::Result<bool> {
        Ok(self.users.read().await.contains_key(username))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::auth::password::SaltedHash;

    fn user(name: &str) -> User {
        User::new(
            name,
            SaltedHash {
                hash: "hash".into(),
                salt: "salt".into(),
            },
        )
    }

    #[tokio::test]
    async fn duplicate_username_is_not_acknowledged() {
        let repo = MemoryUserRepo::new();
        let first = user("u1@test.com");
        assert!(repo.insert_user(&first).await.unwrap());
        assert!(!repo.insert_user(&user("u1@test.com")).await.unwrap());

        let stored = repo.get_user_by_username("u1@test.com").await.unwrap().unwrap();
        assert_eq!(stored.id, first.id);
    }

    #[tokio::test]
    async fn concurrent_signups_for_one_name_insert_once() {
        let repo = Arc::new(MemoryUserRepo::new());
        let mut handles = Vec::new();
        for _ in 0..16 {
            let repo = repo.clone();
            handles.push(tokio::spawn(async move {
                repo.insert_user(&user("race@test.com")).await.unwrap()
            }));
        }
        let mut wins = 0;
        for h in handles {
            if h.await.unwrap() {
                wins += 1;
            }
        }
        assert_eq!(wins, 1);
    }

    #[tokio::test]
    async fn lookup_is_exact_and_case_sensitive() {
        let repo = MemoryUserRepo::new();
        repo.insert_user(&user("Alice@test.com")).await.unwrap();

        assert!(repo.user_exists("Alice@test.com").await.unwrap());
        assert!(!repo.user_exists("alice@test.com").await.unwrap());
        assert!(repo.get_user_by_username("alice@test.com").await.unwrap().is_none());
    }
}
