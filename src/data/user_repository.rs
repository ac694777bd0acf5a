use crate::domain::error::DomainError;
use crate::domain::repository::UserRepository;
use crate::domain::user::{User, UserProfile};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::{debug, instrument, trace};

#[derive(Debug, FromRow)]
struct UserRow {
    id: String,
    name: String,
    email: String,
    password: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(r: UserRow) -> Self {
        Self {
            id: r.id,
            name: r.name,
            email: r.email,
            password: r.password,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct ProfileRow {
    id: String,
    name: String,
    email: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProfileRow> for UserProfile {
    fn from(r: ProfileRow) -> Self {
        Self {
            id: r.id,
            name: r.name,
            email: r.email,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// Maps engine errors raised by INSERT/UPDATE onto domain errors.
/// `email` is the only unique column besides the generated primary key.
fn map_write_error(err: sqlx::Error) -> anyhow::Error {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            debug!(error = %db_err, "Unique constraint violated");
            DomainError::EmailTaken.into()
        }
        _ => err.into(),
    }
}

#[derive(Clone)]
pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    #[instrument(skip(self))]
    async fn find_all(&self) -> Result<Vec<UserProfile>> {
        trace!("Selecting all users");
        let rows = sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT id, name, email, created_at, updated_at
            FROM users
            ORDER BY created_at ASC, rowid ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        debug!(count = rows.len(), "Users loaded");
        Ok(rows.into_iter().map(UserProfile::from).collect())
    }

    #[instrument(skip(self), fields(user_id = id))]
    async fn find_profile_by_id(&self, id: &str) -> Result<Option<UserProfile>> {
        trace!(user_id = id, "Selecting user profile by ID");
        let row = sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT id, name, email, created_at, updated_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        if row.is_none() {
            trace!(user_id = id, "User not found in storage");
        }
        Ok(row.map(UserProfile::from))
    }

    #[instrument(skip(self), fields(user_id = id))]
    async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        trace!(user_id = id, "Selecting user by ID");
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email, password, created_at, updated_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }

    #[instrument(skip(self, user), fields(user_id = %user.id, email = %user.email))]
    async fn create(&self, user: &User) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;
        debug!(user_id = %user.id, email = %user.email, "User inserted");
        Ok(())
    }

    #[instrument(skip(self, user), fields(user_id = %user.id, email = %user.email))]
    async fn save(&self, user: &User) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET name = ?, email = ?, password = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password)
        .bind(user.updated_at)
        .bind(&user.id)
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        // deleted between lookup and write
        if result.rows_affected() == 0 {
            return Err(DomainError::UserNotFound.into());
        }
        debug!(user_id = %user.id, "User updated");
        Ok(())
    }

    #[instrument(skip(self), fields(user_id = id))]
    async fn delete(&self, id: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        let affected = result.rows_affected();
        debug!(user_id = id, affected, "Delete executed");
        Ok(affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::database::connect_in_memory;
    use chrono::{Duration, SubsecRound};

    async fn repo() -> SqliteUserRepository {
        SqliteUserRepository::new(connect_in_memory().await.unwrap())
    }

    fn user(id: &str, email: &str) -> User {
        let now = Utc::now().trunc_subsecs(3);
        User {
            id: id.to_string(),
            name: format!("User {}", id),
            email: email.to_string(),
            password: "hash".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_create_and_find_by_id() {
        let repo = repo().await;
        let u = user("user-1", "test@example.com");

        repo.create(&u).await.unwrap();

        let found = repo.find_by_id("user-1").await.unwrap().unwrap();
        assert_eq!(found, u);
    }

    #[tokio::test]
    async fn test_find_profile_by_id_omits_password() {
        let repo = repo().await;
        let u = user("user-2", "alice@example.com");
        repo.create(&u).await.unwrap();

        let profile = repo.find_profile_by_id("user-2").await.unwrap().unwrap();
        assert_eq!(profile, UserProfile::from(u));
    }

    #[tokio::test]
    async fn test_find_by_id_returns_none_for_nonexistent_id() {
        let repo = repo().await;

        assert!(repo.find_by_id("missing").await.unwrap().is_none());
        assert!(repo.find_profile_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_maps_to_email_taken() {
        let repo = repo().await;
        repo.create(&user("user-3", "dup@example.com")).await.unwrap();

        let err = repo
            .create(&user("user-4", "dup@example.com"))
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<DomainError>(),
            Some(DomainError::EmailTaken)
        ));
    }

    #[tokio::test]
    async fn test_email_uniqueness_is_case_sensitive() {
        let repo = repo().await;
        repo.create(&user("user-5", "Test@Example.com")).await.unwrap();

        assert!(repo.create(&user("user-6", "test@example.com")).await.is_ok());
    }

    #[tokio::test]
    async fn test_find_all_is_ordered_by_creation() {
        let repo = repo().await;
        let mut older = user("user-b", "b@example.com");
        older.created_at = Utc::now() - Duration::seconds(10);
        let newer = user("user-a", "a@example.com");

        repo.create(&newer).await.unwrap();
        repo.create(&older).await.unwrap();

        let all = repo.find_all().await.unwrap();
        let ids: Vec<_> = all.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["user-b", "user-a"]);
    }

    #[tokio::test]
    async fn test_save_overwrites_mutable_fields() {
        let repo = repo().await;
        let mut u = user("user-7", "first@example.com");
        repo.create(&u).await.unwrap();

        u.name = "Renamed".to_string();
        u.email = "second@example.com".to_string();
        u.updated_at = u.updated_at + Duration::seconds(5);
        repo.save(&u).await.unwrap();

        let found = repo.find_by_id("user-7").await.unwrap().unwrap();
        assert_eq!(found.name, "Renamed");
        assert_eq!(found.email, "second@example.com");
        assert_eq!(found.created_at, u.created_at);
        assert_eq!(found.updated_at, u.updated_at);
    }

    #[tokio::test]
    async fn test_save_to_taken_email_maps_to_email_taken() {
        let repo = repo().await;
        repo.create(&user("user-8", "one@example.com")).await.unwrap();
        let mut other = user("user-9", "two@example.com");
        repo.create(&other).await.unwrap();

        other.email = "one@example.com".to_string();
        let err = repo.save(&other).await.unwrap_err();

        assert!(matches!(
            err.downcast_ref::<DomainError>(),
            Some(DomainError::EmailTaken)
        ));
    }

    #[tokio::test]
    async fn test_save_missing_row_is_not_found() {
        let repo = repo().await;

        let err = repo.save(&user("ghost", "ghost@example.com")).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DomainError>(),
            Some(DomainError::UserNotFound)
        ));
    }

    #[tokio::test]
    async fn test_delete_reports_affected_rows() {
        let repo = repo().await;
        repo.create(&user("user-10", "del@example.com")).await.unwrap();

        assert_eq!(repo.delete("user-10").await.unwrap(), 1);
        assert_eq!(repo.delete("user-10").await.unwrap(), 0);
        assert!(repo.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_closed_pool_surfaces_storage_error() {
        let repo = repo().await;
        repo.pool().close().await;

        let err = repo.find_all().await.unwrap_err();
        assert!(err.downcast_ref::<DomainError>().is_none());
        assert!(err.downcast_ref::<sqlx::Error>().is_some());
    }
}
