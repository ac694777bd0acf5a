use crate::domain::error::DomainError;
use crate::domain::repository::UserRepository;
use crate::domain::user::{CreateUser, UpdateUser, User, UserProfile};
use crate::infrastructure::security::hash_password;
use anyhow::Result;
use chrono::{DateTime, SubsecRound, Utc};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, trace, warn};
use uuid::Uuid;

pub struct UserService<R: UserRepository> {
    repository: Arc<R>,
}

// Stored and returned timestamps are kept at millisecond precision.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

fn required(field: &str, value: Option<String>) -> Result<String> {
    value.ok_or_else(|| {
        warn!(field, "Required field missing");
        DomainError::Validation(format!("{} is required", field)).into()
    })
}

fn hash(password: &str) -> Result<String> {
    hash_password(password).map_err(|e| {
        error!(error = %e, "Failed to hash password");
        DomainError::Internal(format!("Failed to hash password: {}", e)).into()
    })
}

impl<R: UserRepository> UserService<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    #[instrument(skip(self))]
    pub async fn list_users(&self) -> Result<Vec<UserProfile>> {
        let users = self.repository.find_all().await?;
        debug!(count = users.len(), "Listed users");
        Ok(users)
    }

    #[instrument(skip(self), fields(user_id = id))]
    pub async fn get_user(&self, id: &str) -> Result<UserProfile> {
        self.repository
            .find_profile_by_id(id)
            .await?
            .ok_or_else(|| DomainError::UserNotFound.into())
    }

    #[instrument(skip(self, req))]
    pub async fn create_user(&self, req: CreateUser) -> Result<UserProfile> {
        trace!("Starting user creation");
        let name = required("name", req.name)?;
        let email = required("email", req.email)?;
        let password = hash(&required("password", req.password)?)?;

        let created_at = now();
        let user = User {
            id: Uuid::new_v4().to_string(),
            name,
            email,
            password,
            created_at,
            updated_at: created_at,
        };

        self.repository.create(&user).await?;
        info!(user_id = %user.id, email = %user.email, "User created");
        Ok(user.into())
    }

    /// Overwrites only the fields present in `req`; `updated_at` is always
    /// refreshed.
    #[instrument(skip(self, req), fields(user_id = id))]
    pub async fn update_user(&self, id: &str, req: UpdateUser) -> Result<UserProfile> {
        let mut user = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or(DomainError::UserNotFound)?;

        if req.is_empty() {
            trace!(user_id = id, "Update carries no fields");
        }
        if let Some(name) = req.name {
            user.name = name;
        }
        if let Some(email) = req.email {
            user.email = email;
        }
        if let Some(password) = req.password {
            user.password = hash(&password)?;
        }
        user.updated_at = now().max(user.created_at);

        self.repository.save(&user).await?;
        info!(user_id = %user.id, email = %user.email, "User updated");
        Ok(user.into())
    }

    #[instrument(skip(self), fields(user_id = id))]
    pub async fn delete_user(&self, id: &str) -> Result<()> {
        let affected = self.repository.delete(id).await?;
        if affected == 0 {
            return Err(DomainError::UserNotFound.into());
        }
        info!(user_id = id, "User deleted");
        Ok(())
    }
}
