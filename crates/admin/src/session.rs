//! Signed-in session persisted in a local key-value store.
//!
//! The session lives under a single key, [`SESSION_KEY`], as a JSON object
//! `{authenticated, token, role, userId, name, email, expiresAt}`.
//! `expiresAt` is epoch milliseconds, set to login time plus one hour. A
//! session within [`EXPIRY_MARGIN_MS`] of its expiry is treated as expired and
//! removed from storage.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use schoolsoft_core::{Role, UserId};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::api::LoginResponse;

/// Storage key holding the session object.
pub const SESSION_KEY: &str = "authObject";

/// Session lifetime from login.
pub const SESSION_LIFETIME_MS: i64 = 60 * 60 * 1000;

/// Sessions closer than this to `expiresAt` count as expired.
pub const EXPIRY_MARGIN_MS: i64 = 10_000;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Storage lock poisoned")]
    Poisoned,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Not signed in")]
    NotSignedIn,

    #[error("Session expired, please sign in again")]
    Expired,
}

/// String key-value storage.
pub trait KeyValueStore: Send + Sync {
    /// Read a value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backing store cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backing store cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a value. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backing store cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// In-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }
}

/// Store backed by a single JSON object file.
///
/// Every operation re-reads the file so several processes see each other's
/// writes. A missing file is an empty store.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Stage the new contents next to the store, then rename over it.
    fn save(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let mut staged = NamedTempFile::new_in(dir)?;
        staged.write_all(serde_json::to_string_pretty(entries)?.as_bytes())?;
        staged.as_file().sync_all()?;
        staged.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.lock.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().map_err(|_| StorageError::Poisoned)?;
        let mut entries = self.load()?;
        entries.insert(key.to_string(), value.to_string());
        self.save(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().map_err(|_| StorageError::Poisoned)?;
        let mut entries = self.load()?;
        if entries.remove(key).is_some() {
            self.save(&entries)?;
        }
        Ok(())
    }
}

/// Wire shape of the stored session.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredSession {
    authenticated: bool,
    token: String,
    #[serde(default)]
    role: Option<Role>,
    user_id: UserId,
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    expires_at: i64,
}

/// The signed-in staff member.
#[derive(Clone)]
pub struct Session {
    pub token: SecretString,
    pub role: Option<Role>,
    pub user_id: UserId,
    pub name: String,
    pub email: String,
    /// Epoch milliseconds.
    pub expires_at: i64,
}

impl Session {
    /// Whether the session must be discarded at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at - now.timestamp_millis() < EXPIRY_MARGIN_MS
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Some(Role::Admin)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"[REDACTED]")
            .field("role", &self.role)
            .field("user_id", &self.user_id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl From<StoredSession> for Session {
    fn from(stored: StoredSession) -> Self {
        Self {
            token: SecretString::from(stored.token),
            role: stored.role,
            user_id: stored.user_id,
            name: stored.name,
            email: stored.email,
            expires_at: stored.expires_at,
        }
    }
}

/// Read access to the session plus its two writes, sign-in and sign-out.
#[derive(Clone)]
pub struct SessionContext {
    store: Arc<dyn KeyValueStore>,
}

impl SessionContext {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Persist a fresh session from a login response.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the session cannot be written.
    pub fn sign_in(
        &self,
        response: LoginResponse,
        now: DateTime<Utc>,
    ) -> Result<Session, SessionError> {
        let stored = StoredSession {
            authenticated: true,
            token: response.token,
            role: response.role,
            user_id: response.user_id,
            name: response.name,
            email: response.email,
            expires_at: now.timestamp_millis() + SESSION_LIFETIME_MS,
        };
        let raw = serde_json::to_string(&stored).map_err(StorageError::from)?;
        self.store.set(SESSION_KEY, &raw)?;

        tracing::info!(user_id = %stored.user_id, "Signed in");
        Ok(stored.into())
    }

    /// Remove the stored session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if storage cannot be written.
    pub fn sign_out(&self) -> Result<(), SessionError> {
        self.store.remove(SESSION_KEY)?;
        Ok(())
    }

    /// The stored session regardless of expiry.
    ///
    /// A stored value that does not parse, or whose `authenticated` flag is
    /// false, is removed and reported as no session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if storage cannot be read.
    pub fn read(&self) -> Result<Option<Session>, SessionError> {
        let Some(raw) = self.store.get(SESSION_KEY)? else {
            return Ok(None);
        };

        match serde_json::from_str::<StoredSession>(&raw) {
            Ok(stored) if stored.authenticated => Ok(Some(stored.into())),
            Ok(_) => {
                self.store.remove(SESSION_KEY)?;
                Ok(None)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Discarding unreadable session");
                self.store.remove(SESSION_KEY)?;
                Ok(None)
            }
        }
    }

    /// The session if it is still valid at `now`.
    ///
    /// An expired session is cleared from storage.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotSignedIn` with no session,
    /// `SessionError::Expired` when it has expired, or a storage error.
    pub fn require_active(&self, now: DateTime<Utc>) -> Result<Session, SessionError> {
        let session = self.read()?.ok_or(SessionError::NotSignedIn)?;
        if session.is_expired_at(now) {
            tracing::info!(user_id = %session.user_id, "Session expired");
            self.sign_out()?;
            return Err(SessionError::Expired);
        }
        Ok(session)
    }

    /// Whether a valid session exists at `now`.
    #[must_use]
    pub fn is_authenticated(&self, now: DateTime<Utc>) -> bool {
        self.require_active(now).is_ok()
    }

    /// The bearer token of a valid session, if any.
    #[must_use]
    pub fn token(&self, now: DateTime<Utc>) -> Option<SecretString> {
        self.require_active(now).ok().map(|s| s.token)
    }
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext").finish_non_exhaustive()
    }
}
