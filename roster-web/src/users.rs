//! User directory: identity lifecycle and capability mask management

pub mod handlers;
pub mod service;
pub mod store;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use roster_core::{ErrorContext, RosterError};
use serde::{Deserialize, Serialize};
use self::store::UserRecord;

/// User creation request
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub password: String,
    #[serde(default)]
    pub permissions: Vec<String>,
}

/// Capability mask update request.
///
/// A non-empty `set` replaces the mask entirely and the add/remove lists are
/// ignored; otherwise `add` is granted first and `remove` revoked against the
/// post-grant mask.
#[derive(Debug, Deserialize)]
pub struct UpdatePermissionsRequest {
    #[serde(default)]
    pub set: Vec<String>,
    #[serde(default)]
    pub add: Vec<String>,
    #[serde(default)]
    pub remove: Vec<String>,
}

/// Public user information.
///
/// Capabilities are rendered as the canonical permission name list; the raw
/// mask never appears on the wire.
#[derive(Debug, Serialize, Clone)]
pub struct UserInfo {
    pub id: String,
    pub name: String,
    pub permissions: Vec<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl UserInfo {
    pub fn from_record(record: &UserRecord) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            permissions: roster_authz::canonicalize(record.permissions)
                .into_iter()
                .map(|name| name.to_string())
                .collect(),
            created_at: record.created_at,
        }
    }
}

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> Result<String, RosterError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| RosterError::Credential {
            message: format!("Failed to hash password: {}", e),
            context: ErrorContext::new("users").with_operation("hash_password"),
        })
}

/// Verify a password against a stored hash. Pass/fail only; a malformed hash
/// fails closed.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(hash) else {
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Responder wrapper for service errors
#[derive(Debug)]
pub struct ApiError(pub RosterError);

impl From<RosterError> for ApiError {
    fn from(err: RosterError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.0.log();

        let (status, error_code) = match &self.0 {
            RosterError::Validation { .. } => (StatusCode::BAD_REQUEST, "validation_failed"),
            RosterError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
            RosterError::Conflict { .. } => (StatusCode::CONFLICT, "conflict"),
            RosterError::Credential { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "credential_error")
            }
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        let body = Json(serde_json::json!({
            "error": error_code,
            "message": self.0.to_string(),
        }));

        (status, body).into_response()
    }
}
