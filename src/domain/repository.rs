use crate::domain::user::{User, UserProfile};
use anyhow::Result;
use async_trait::async_trait;

/// Persistence seam for users.
///
/// Implementations report a unique-email violation as
/// [`DomainError::EmailTaken`](crate::domain::error::DomainError::EmailTaken)
/// wrapped in the returned `anyhow::Error`; any other storage failure is
/// propagated as-is.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// All users, password excluded, oldest first.
    async fn find_all(&self) -> Result<Vec<UserProfile>>;
    async fn find_profile_by_id(&self, id: &str) -> Result<Option<UserProfile>>;
    /// Full record including the stored password, used for merges.
    async fn find_by_id(&self, id: &str) -> Result<Option<User>>;
    async fn create(&self, user: &User) -> Result<()>;
    /// Overwrites the mutable columns of an existing row.
    async fn save(&self, user: &User) -> Result<()>;
    /// Returns the number of rows removed.
    async fn delete(&self, id: &str) -> Result<u64>;
}
