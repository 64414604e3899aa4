//! # User Repository
//!
//! Account records in the `users` table. Passwords are stored as given;
//! nothing in Stockroom authenticates against them.

use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use stockroom_core::{NewUser, User};

#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Creates a user with a fresh UUID v4.
    ///
    /// ## Errors
    /// * `DbError::UniqueViolation` - username already taken
    /// * `DbError::Validation` - blank username or password
    pub async fn create_user(&self, input: NewUser) -> DbResult<User> {
        let input = input.validate()?;
        let id = Uuid::new_v4().to_string();

        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (id, username, password) VALUES (?1, ?2, ?3) \
             RETURNING id, username, password",
        )
        .bind(&id)
        .bind(&input.username)
        .bind(&input.password)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("username", &input.username),
            other => other,
        })?;

        info!(id = %user.id, username = %user.username, "User created");
        Ok(user)
    }

    pub async fn get_user(&self, id: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password FROM users WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    /// Exact, case-sensitive username match.
    pub async fn get_user_by_username(&self, username: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password FROM users WHERE username = ?1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn repo() -> UserRepository {
        Database::new(DbConfig::in_memory()).await.unwrap().users()
    }

    fn new_user(username: &str) -> NewUser {
        NewUser {
            username: username.into(),
            password: "s3cret".into(),
        }
    }

    #[tokio::test]
    async fn test_create_and_get_user() {
        let repo = repo().await;
        let user = repo.create_user(new_user("ana")).await.unwrap();

        assert!(Uuid::parse_str(&user.id).is_ok());
        assert_eq!(user.password, "s3cret");

        let by_id = repo.get_user(&user.id).await.unwrap().unwrap();
        assert_eq!(by_id, user);

        let by_name = repo.get_user_by_username("ana").await.unwrap().unwrap();
        assert_eq!(by_name.id, user.id);
    }

    #[tokio::test]
    async fn test_duplicate_username() {
        let repo = repo().await;
        repo.create_user(new_user("luis")).await.unwrap();

        let err = repo.create_user(new_user("luis")).await.unwrap_err();
        match err {
            DbError::UniqueViolation { field, value } => {
                assert_eq!(field, "username");
                assert_eq!(value, "luis");
            }
            other => panic!("expected UniqueViolation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_user() {
        let repo = repo().await;
        assert!(repo.get_user("nope").await.unwrap().is_none());
        assert!(repo.get_user_by_username("nadie").await.unwrap().is_none());
    }
}
