use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stored user record. Deliberately not `Serialize`: the password must never
/// leave the service, responses go through [`UserProfile`].
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public projection of a user returned by every endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

// Fields are optional so that a missing field is reported by the service
// (500 "Error creating user") rather than rejected as malformed JSON.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CreateUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl UpdateUser {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.password.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        let now = Utc::now();
        User {
            id: "user-1".to_string(),
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            password: "secret".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_profile_serializes_without_password() {
        let profile = UserProfile::from(sample_user());
        let json = serde_json::to_value(&profile).unwrap();

        assert_eq!(json["id"], "user-1");
        assert_eq!(json["name"], "Alice");
        assert_eq!(json["email"], "alice@example.com");
        assert!(json.get("createdAt").is_some());
        assert!(json.get("updatedAt").is_some());
        assert!(json.get("password").is_none());
        assert!(json.get("created_at").is_none());
    }

    #[test]
    fn test_update_user_null_fields_are_absent() {
        let update: UpdateUser =
            serde_json::from_str(r#"{"name": null, "email": "new@example.com"}"#).unwrap();

        assert!(update.name.is_none());
        assert_eq!(update.email.as_deref(), Some("new@example.com"));
        assert!(update.password.is_none());
        assert!(!update.is_empty());
    }

    #[test]
    fn test_update_user_empty_body() {
        let update: UpdateUser = serde_json::from_str("{}").unwrap();
        assert!(update.is_empty());
    }

    #[test]
    fn test_create_user_missing_fields_deserialize() {
        let create: CreateUser = serde_json::from_str(r#"{"name": "Bob"}"#).unwrap();
        assert_eq!(create.name.as_deref(), Some("Bob"));
        assert!(create.email.is_none());
        assert!(create.password.is_none());
    }
}
