//! Account registration and login commands

use super::CommandError;
use crate::file_storage::users::{self, UserRecord};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Input for registering a new account
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterInput {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Input for logging in
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Sanitized user view returned to clients (no password hash, no raw
/// push endpoint)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: String,
    pub name: String,
    pub email: String,
    /// Whether a push subscription is currently registered
    pub has_subscription: bool,
    /// Just the domain of the push endpoint (for diagnostics)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint_domain: Option<String>,
    pub created_at: String,
}

impl From<UserRecord> for UserInfo {
    fn from(user: UserRecord) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            has_subscription: user.subscription.is_some(),
            endpoint_domain: user.subscription.as_ref().map(|s| s.endpoint_domain()),
            created_at: user.created_at,
        }
    }
}

/// Register a new user account
pub fn register(data_dir: &Path, input: RegisterInput) -> Result<UserInfo, CommandError> {
    let name = input.name.trim();
    let email = input.email.trim();

    if name.is_empty() || email.is_empty() || input.password.is_empty() {
        return Err(CommandError::Invalid(
            "Name, email and password are required".to_string(),
        ));
    }

    if users::find_user_by_email(data_dir, email)?.is_some() {
        return Err(CommandError::Invalid(
            "Email is already registered".to_string(),
        ));
    }

    let password_hash = bcrypt::hash(&input.password, bcrypt::DEFAULT_COST)
        .map_err(|e| CommandError::Internal(format!("Failed to hash password: {}", e)))?;

    let user = UserRecord::new(name, email, password_hash);
    users::save_user(data_dir, user.clone())?;

    log::info!("Registered user {}", user.id);
    Ok(user.into())
}

/// Verify credentials and return the account
pub fn login(data_dir: &Path, input: LoginInput) -> Result<UserInfo, CommandError> {
    let user = users::find_user_by_email(data_dir, input.email.trim())?
        .ok_or_else(|| CommandError::NotFound("User not found".to_string()))?;

    let matches = bcrypt::verify(&input.password, &user.password_hash)
        .map_err(|e| CommandError::Internal(format!("Failed to verify password: {}", e)))?;

    if !matches {
        return Err(CommandError::Invalid("Incorrect password".to_string()));
    }

    Ok(user.into())
}

/// List all registered users
pub fn list_users(data_dir: &Path) -> Result<Vec<UserInfo>, CommandError> {
    let users = users::get_users(data_dir)?;
    Ok(users.into_iter().map(UserInfo::from).collect())
}
