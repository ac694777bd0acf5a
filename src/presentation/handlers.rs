use crate::application::user_service::UserService;
use crate::data::user_repository::SqliteUserRepository;
use crate::domain::error::DomainError;
use crate::domain::user::{CreateUser, UpdateUser};
use actix_web::{HttpRequest, HttpResponse, ResponseError, error::JsonPayloadError, web};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, instrument, warn};

pub const FETCH_USERS_FAILED: &str = "Error fetching users";
pub const FETCH_USER_FAILED: &str = "Error fetching user";
pub const CREATE_USER_FAILED: &str = "Error creating user";
pub const UPDATE_USER_FAILED: &str = "Error updating user";
pub const DELETE_USER_FAILED: &str = "Error deleting user";

pub struct AppState {
    pub service: UserService<SqliteUserRepository>,
}

/// Body of every non-2xx response and of the delete confirmation.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error: None,
        }
    }
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("User not found")]
    UserNotFound,
    #[error("Email already exists")]
    EmailTaken,
    #[error("Invalid JSON payload: {0}")]
    InvalidJson(String),
    #[error("Route not found")]
    RouteNotFound,
    #[error("{message}: {error}")]
    Internal { message: &'static str, error: String },
}

impl ApiError {
    /// Classifies a service error; anything that is not a not-found or
    /// uniqueness failure becomes a 500 carrying `message` and the cause.
    pub fn from_service(err: anyhow::Error, message: &'static str) -> Self {
        match err.downcast_ref::<DomainError>() {
            Some(DomainError::UserNotFound) => ApiError::UserNotFound,
            Some(DomainError::EmailTaken) => ApiError::EmailTaken,
            Some(DomainError::Validation(_)) | Some(DomainError::Internal(_)) | None => {
                ApiError::Internal {
                    message,
                    error: err.to_string(),
                }
            }
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        match self {
            ApiError::UserNotFound => actix_web::http::StatusCode::NOT_FOUND,
            ApiError::EmailTaken => actix_web::http::StatusCode::BAD_REQUEST,
            ApiError::InvalidJson(_) => actix_web::http::StatusCode::BAD_REQUEST,
            ApiError::RouteNotFound => actix_web::http::StatusCode::NOT_FOUND,
            ApiError::Internal { .. } => actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        let body = match self {
            ApiError::UserNotFound => MessageResponse::new("User not found"),
            ApiError::EmailTaken => MessageResponse::new("Email already exists"),
            ApiError::InvalidJson(detail) => MessageResponse {
                message: "Invalid JSON payload".to_string(),
                error: Some(detail.clone()),
            },
            ApiError::RouteNotFound => MessageResponse::new("Route not found"),
            ApiError::Internal { message, error } => MessageResponse {
                message: (*message).to_string(),
                error: Some(error.clone()),
            },
        };

        if status.is_server_error() {
            error!(error = %self, status = %status, "Request failed");
        } else {
            warn!(error = %self, status = %status, "Request rejected");
        }

        HttpResponse::build(status).json(body)
    }
}

/// JSON extractor settings: parse failures answer 400 in the API's error shape.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err: JsonPayloadError, _req: &HttpRequest| {
        ApiError::InvalidJson(err.to_string()).into()
    })
}

// Handlers

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    timestamp: String,
}

#[instrument]
pub async fn health_check() -> HttpResponse {
    info!("Health check requested");
    let response = HealthResponse {
        status: "ok".to_string(),
        timestamp: Utc::now().to_rfc3339(),
    };
    HttpResponse::Ok().json(response)
}

#[instrument(skip(state))]
pub async fn list_users(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let users = state
        .service
        .list_users()
        .await
        .map_err(|e| ApiError::from_service(e, FETCH_USERS_FAILED))?;
    info!(count = users.len(), "Users listed");
    Ok(HttpResponse::Ok().json(users))
}

#[instrument(skip(state), fields(user_id = %*path))]
pub async fn get_user(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let user_id = path.into_inner();
    let user = state
        .service
        .get_user(&user_id)
        .await
        .map_err(|e| ApiError::from_service(e, FETCH_USER_FAILED))?;
    Ok(HttpResponse::Ok().json(user))
}

#[instrument(skip(state, req), fields(user_id))]
pub async fn create_user(
    state: web::Data<AppState>,
    req: web::Json<CreateUser>,
) -> Result<HttpResponse, ApiError> {
    info!(email = ?req.email, "Creating new user");
    let user = state
        .service
        .create_user(req.into_inner())
        .await
        .map_err(|e| ApiError::from_service(e, CREATE_USER_FAILED))?;
    tracing::Span::current().record("user_id", user.id.as_str());
    info!(user_id = %user.id, email = %user.email, "User created successfully");
    Ok(HttpResponse::Created().json(user))
}

#[instrument(skip(state, req), fields(user_id = %*path))]
pub async fn update_user(
    state: web::Data<AppState>,
    path: web::Path<String>,
    req: web::Json<UpdateUser>,
) -> Result<HttpResponse, ApiError> {
    let user_id = path.into_inner();
    info!(
        user_id = %user_id,
        has_name = req.name.is_some(),
        has_email = req.email.is_some(),
        has_password = req.password.is_some(),
        "Updating user"
    );
    let user = state
        .service
        .update_user(&user_id, req.into_inner())
        .await
        .map_err(|e| ApiError::from_service(e, UPDATE_USER_FAILED))?;
    info!(user_id = %user.id, "User updated successfully");
    Ok(HttpResponse::Ok().json(user))
}

#[instrument(skip(state), fields(user_id = %*path))]
pub async fn delete_user(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let user_id = path.into_inner();
    state
        .service
        .delete_user(&user_id)
        .await
        .map_err(|e| ApiError::from_service(e, DELETE_USER_FAILED))?;
    info!(user_id = %user_id, "User deleted successfully");
    Ok(HttpResponse::Ok().json(MessageResponse::new("User deleted successfully")))
}

pub async fn route_not_found(req: HttpRequest) -> Result<HttpResponse, ApiError> {
    warn!(method = %req.method(), path = %req.path(), "No route matched");
    Err(ApiError::RouteNotFound)
}
