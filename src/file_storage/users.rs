//! Storage for user accounts and their push subscriptions
//!
//! Users are stored in `<data_dir>/users.json`. Each user holds at most
//! one push subscription; it is set when the browser registers, read on
//! every dispatch, and cleared exactly when a delivery reports the
//! subscription expired. Nothing else deletes it.

use super::{read_json, write_json, FileResult};
use crate::push::PushSubscription;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// A registered user account
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    /// Unique identifier for this user
    pub id: String,
    /// Display name
    pub name: String,
    /// Login email, unique across users
    pub email: String,
    /// bcrypt hash of the password
    pub password_hash: String,
    /// Current push subscription, if the browser registered one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription: Option<PushSubscription>,
    /// When the account was created
    pub created_at: String,
}

impl UserRecord {
    /// Create a new user record with a fresh id and no subscription
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            subscription: None,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Storage format for the users file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct UsersFile {
    /// Map of user ID to record
    users: HashMap<String, UserRecord>,
}

/// Get the path to the users file
fn get_users_path(data_dir: &Path) -> PathBuf {
    data_dir.join("users.json")
}

/// Load the users file, returning an empty store if it doesn't exist
fn load_users(data_dir: &Path) -> FileResult<UsersFile> {
    let path = get_users_path(data_dir);
    if !path.exists() {
        return Ok(UsersFile::default());
    }
    read_json(&path)
}

/// Save the users file
fn save_users(data_dir: &Path, data: &UsersFile) -> FileResult<()> {
    write_json(&get_users_path(data_dir), data)
}

/// Save a user record, replacing any record with the same id
pub fn save_user(data_dir: &Path, user: UserRecord) -> FileResult<()> {
    let mut data = load_users(data_dir)?;
    data.users.insert(user.id.clone(), user);
    save_users(data_dir, &data)?;
    log::info!("Saved user (total: {})", data.users.len());
    Ok(())
}

/// Get a user by id
pub fn find_user(data_dir: &Path, user_id: &str) -> FileResult<Option<UserRecord>> {
    let data = load_users(data_dir)?;
    Ok(data.users.get(user_id).cloned())
}

/// Get a user by login email
pub fn find_user_by_email(data_dir: &Path, email: &str) -> FileResult<Option<UserRecord>> {
    let data = load_users(data_dir)?;
    Ok(data.users.values().find(|u| u.email == email).cloned())
}

/// Get all users, oldest account first
pub fn get_users(data_dir: &Path) -> FileResult<Vec<UserRecord>> {
    let data = load_users(data_dir)?;
    let mut users: Vec<UserRecord> = data.users.into_values().collect();
    users.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.email.cmp(&b.email)));
    Ok(users)
}

/// Store (or replace) a user's push subscription.
///
/// Returns false if the user does not exist. If another user already holds
/// a subscription with the same endpoint, that stale entry is cleared so a
/// browser re-registering under a different account doesn't get notified
/// twice.
pub fn set_subscription(
    data_dir: &Path,
    user_id: &str,
    subscription: PushSubscription,
) -> FileResult<bool> {
    let mut data = load_users(data_dir)?;

    if !data.users.contains_key(user_id) {
        return Ok(false);
    }

    for (id, user) in data.users.iter_mut() {
        if id != user_id
            && user
                .subscription
                .as_ref()
                .is_some_and(|s| s.endpoint == subscription.endpoint)
        {
            log::info!("Clearing stale subscription with the same endpoint from user {}", id);
            user.subscription = None;
        }
    }

    if let Some(user) = data.users.get_mut(user_id) {
        user.subscription = Some(subscription);
    }

    save_users(data_dir, &data)?;
    log::debug!("Updated subscription for user {}", user_id);
    Ok(true)
}

/// Get a user's current push subscription
pub fn get_subscription(data_dir: &Path, user_id: &str) -> FileResult<Option<PushSubscription>> {
    let data = load_users(data_dir)?;
    Ok(data
        .users
        .get(user_id)
        .and_then(|u| u.subscription.clone()))
}

/// Invalidate a user's push subscription.
///
/// Returns true if a subscription was actually removed.
pub fn clear_subscription(data_dir: &Path, user_id: &str) -> FileResult<bool> {
    let mut data = load_users(data_dir)?;

    let removed = match data.users.get_mut(user_id) {
        Some(user) => user.subscription.take().is_some(),
        None => false,
    };

    if removed {
        save_users(data_dir, &data)?;
        log::info!("Removed push subscription for user {}", user_id);
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_user(email: &str) -> UserRecord {
        UserRecord::new("Test User", email, "$2b$10$hash")
    }

    #[test]
    fn test_users_file_default() {
        let file = UsersFile::default();
        assert!(file.users.is_empty());
    }

    #[test]
    fn test_save_and_find_user() {
        let dir = tempfile::tempdir().unwrap();
        let user = create_test_user("a@example.com");
        let user_id = user.id.clone();

        save_user(dir.path(), user).unwrap();

        let found = find_user(dir.path(), &user_id).unwrap().unwrap();
        assert_eq!(found.email, "a@example.com");
        assert!(found.subscription.is_none());

        let by_email = find_user_by_email(dir.path(), "a@example.com")
            .unwrap()
            .unwrap();
        assert_eq!(by_email.id, user_id);

        assert!(find_user_by_email(dir.path(), "missing@example.com")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_subscription_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let user = create_test_user("a@example.com");
        let user_id = user.id.clone();
        save_user(dir.path(), user).unwrap();

        // No subscription yet
        assert!(get_subscription(dir.path(), &user_id).unwrap().is_none());

        // Register one
        let sub = PushSubscription::new("https://push.example/ep1", "k1", "a1");
        assert!(set_subscription(dir.path(), &user_id, sub.clone()).unwrap());
        assert_eq!(get_subscription(dir.path(), &user_id).unwrap(), Some(sub));

        // Invalidate it (what the caller does after an Expired outcome)
        assert!(clear_subscription(dir.path(), &user_id).unwrap());
        assert!(get_subscription(dir.path(), &user_id).unwrap().is_none());

        // Clearing again is a no-op
        assert!(!clear_subscription(dir.path(), &user_id).unwrap());
    }

    #[test]
    fn test_set_subscription_unknown_user() {
        let dir = tempfile::tempdir().unwrap();
        let sub = PushSubscription::new("https://push.example/ep1", "k1", "a1");
        assert!(!set_subscription(dir.path(), "nope", sub).unwrap());
    }

    #[test]
    fn test_same_endpoint_moves_between_users() {
        let dir = tempfile::tempdir().unwrap();
        let first = create_test_user("a@example.com");
        let second = create_test_user("b@example.com");
        let first_id = first.id.clone();
        let second_id = second.id.clone();
        save_user(dir.path(), first).unwrap();
        save_user(dir.path(), second).unwrap();

        let sub = PushSubscription::new("https://push.example/ep1", "k1", "a1");
        set_subscription(dir.path(), &first_id, sub.clone()).unwrap();
        set_subscription(dir.path(), &second_id, sub.clone()).unwrap();

        assert!(get_subscription(dir.path(), &first_id).unwrap().is_none());
        assert_eq!(
            get_subscription(dir.path(), &second_id).unwrap(),
            Some(sub)
        );
    }

    #[test]
    fn test_get_users_sorted_by_creation() {
        let dir = tempfile::tempdir().unwrap();
        let mut first = create_test_user("a@example.com");
        first.created_at = "2026-01-01T00:00:00Z".to_string();
        let mut second = create_test_user("b@example.com");
        second.created_at = "2026-01-02T00:00:00Z".to_string();
        save_user(dir.path(), second).unwrap();
        save_user(dir.path(), first).unwrap();

        let users = get_users(dir.path()).unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].email, "a@example.com");
        assert_eq!(users[1].email, "b@example.com");
    }
}
