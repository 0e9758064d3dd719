//! VAPID (Voluntary Application Server Identification) identity management
//!
//! VAPID keys authenticate the server when sending push notifications.
//! The key pair is loaded from a JSON key file (or generated once and
//! persisted there) and combined with the operator contact URI into a
//! single immutable identity shared by all dispatch calls.

use crate::file_storage::{atomic_write, ensure_dir, read_json};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Startup configuration errors.
///
/// Fatal: the process must not begin accepting dispatch calls without a
/// valid identity.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("VAPID key file not found: {0}")]
    MissingKeyFile(PathBuf),

    #[error("failed to read VAPID key file {path}: {reason}")]
    UnreadableKeyFile { path: PathBuf, reason: String },

    #[error("VAPID {0} must be present and non-empty")]
    MissingField(&'static str),

    #[error("failed to persist VAPID keys: {0}")]
    PersistFailed(String),
}

/// Stored key pair, the shape of `vapid_keys.json`.
///
/// `createdAt` is optional so key files provisioned by other tooling
/// (bare publicKey/privateKey pairs) load unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VapidKeyFile {
    /// The public key (shared with clients) - base64url encoded
    public_key: String,
    /// The private key (kept secret on server) - base64url encoded
    private_key: String,
    /// When the keys were generated
    #[serde(default)]
    created_at: String,
}

/// The push-service application identity used to sign every outbound push.
///
/// Loaded exactly once at process start and never mutated; dispatch calls
/// share it read-only.
#[derive(Debug, Clone)]
pub struct VapidIdentity {
    contact_uri: String,
    public_key: String,
    private_key: String,
}

impl VapidIdentity {
    /// Build an identity from its parts, enforcing the non-empty invariant.
    pub fn from_parts(
        contact_uri: impl Into<String>,
        public_key: impl Into<String>,
        private_key: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let identity = Self {
            contact_uri: contact_uri.into(),
            public_key: public_key.into(),
            private_key: private_key.into(),
        };
        if identity.contact_uri.trim().is_empty() {
            return Err(ConfigError::MissingField("contact URI"));
        }
        if identity.public_key.trim().is_empty() {
            return Err(ConfigError::MissingField("public key"));
        }
        if identity.private_key.trim().is_empty() {
            return Err(ConfigError::MissingField("private key"));
        }
        Ok(identity)
    }

    /// Load the identity from an existing key file.
    ///
    /// Fails if the file is missing, unreadable, or either key is empty.
    pub fn load(path: &Path, contact_uri: &str) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::MissingKeyFile(path.to_path_buf()));
        }
        let keys: VapidKeyFile =
            read_json(path).map_err(|reason| ConfigError::UnreadableKeyFile {
                path: path.to_path_buf(),
                reason,
            })?;
        Self::from_parts(contact_uri, keys.public_key, keys.private_key)
    }

    /// Load the identity, generating and persisting a fresh key pair if the
    /// key file does not exist yet.
    pub fn load_or_generate(path: &Path, contact_uri: &str) -> Result<Self, ConfigError> {
        if path.exists() {
            log::debug!("Loaded existing VAPID keys from {}", path.display());
            return Self::load(path, contact_uri);
        }

        log::info!("Generating new VAPID keys at {}", path.display());
        let keys = generate_vapid_keys();
        save_vapid_keys(path, &keys)?;
        Self::from_parts(contact_uri, keys.public_key, keys.private_key)
    }

    /// Contact URI carried as the JWT `sub` claim (e.g. a mailto: address)
    pub fn contact_uri(&self) -> &str {
        &self.contact_uri
    }

    /// Base64url-encoded public key, shared with subscribing clients
    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    /// Base64url-encoded private key used for signing
    pub(crate) fn private_key(&self) -> &str {
        &self.private_key
    }
}

/// Generate a new VAPID key pair using the P-256 curve
fn generate_vapid_keys() -> VapidKeyFile {
    use p256::ecdsa::SigningKey;
    use rand::rngs::OsRng;

    let signing_key = SigningKey::random(&mut OsRng);

    // Private key: 32 bytes for P-256
    let private_key = URL_SAFE_NO_PAD.encode(signing_key.to_bytes());

    // Public key: uncompressed point, 65 bytes
    let verifying_key = signing_key.verifying_key();
    let public_key_bytes = verifying_key.to_encoded_point(false);
    let public_key = URL_SAFE_NO_PAD.encode(public_key_bytes.as_bytes());

    VapidKeyFile {
        public_key,
        private_key,
        created_at: chrono::Utc::now().to_rfc3339(),
    }
}

/// Persist a key pair to the key file
fn save_vapid_keys(path: &Path, keys: &VapidKeyFile) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent).map_err(ConfigError::PersistFailed)?;
    }
    let content =
        serde_json::to_string_pretty(keys).map_err(|e| ConfigError::PersistFailed(e.to_string()))?;
    atomic_write(path, &content).map_err(ConfigError::PersistFailed)
}
