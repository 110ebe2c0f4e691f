//! Credential persistence
//!
//! Session credentials live under four fixed keys in a [`CredentialStore`].
//! The store is shared by every clone of the client, so a token written after
//! a refresh is visible to all in-flight callers.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;

#[cfg(not(target_arch = "wasm32"))]
use std::collections::BTreeMap;
#[cfg(not(target_arch = "wasm32"))]
use std::path::{Path, PathBuf};
#[cfg(not(target_arch = "wasm32"))]
use std::sync::Mutex;

/// Key of the short-lived session credential
pub const ACCESS_TOKEN_KEY: &str = "accessToken";
/// Key of the credential used to mint new access tokens
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";
/// Key of the optional admin marker returned by login
pub const ADMIN_TOKEN_KEY: &str = "adminToken";
/// Key of the static application credential
pub const API_TOKEN_KEY: &str = "apiToken";

/// Every key owned by a session; cleared together
pub const SESSION_KEYS: [&str; 4] = [
    ACCESS_TOKEN_KEY,
    REFRESH_TOKEN_KEY,
    ADMIN_TOKEN_KEY,
    API_TOKEN_KEY,
];

/// Credential storage errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage encoding failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// String key-value storage for session credentials
pub trait CredentialStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Access/refresh token pair as exchanged with the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Process-lifetime store
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}

/// JSON file store that survives process restarts
///
/// Every mutation rewrites the whole file through a temporary sibling and a
/// rename, so a crash never leaves a half-written session behind.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
}

#[cfg(not(target_arch = "wasm32"))]
impl FileStore {
    /// Open the store, reading existing credentials if the file exists
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let values = match std::fs::read(&path) {
            Ok(bytes) if bytes.is_empty() => BTreeMap::new(),
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    /// Location of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, values: &BTreeMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(values)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl CredentialStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        let mut next = values.clone();
        next.insert(key.to_string(), value.to_string());
        self.persist(&next)?;
        *values = next;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        if !values.contains_key(key) {
            return Ok(());
        }
        let mut next = values.clone();
        next.remove(key);
        self.persist(&next)?;
        *values = next;
        Ok(())
    }
}

/// `window.localStorage`, scoped to the page origin
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserStore;

#[cfg(target_arch = "wasm32")]
impl CredentialStore for BrowserStore {
    fn get(&self, key: &str) -> Option<String> {
        use gloo::storage::{LocalStorage, Storage};
        LocalStorage::raw().get_item(key).ok().flatten()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        use gloo::storage::{LocalStorage, Storage};
        LocalStorage::raw()
            .set_item(key, value)
            .map_err(|e| StoreError::Unavailable(format!("{e:?}")))
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        use gloo::storage::{LocalStorage, Storage};
        LocalStorage::raw()
            .remove_item(key)
            .map_err(|e| StoreError::Unavailable(format!("{e:?}")))
    }
}

/// Typed view over a [`CredentialStore`]
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<dyn CredentialStore>,
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore")
            .field("has_api_token", &self.api_token().is_some())
            .field("has_access_token", &self.access_token().is_some())
            .field("has_refresh_token", &self.refresh_token().is_some())
            .finish()
    }
}

impl SessionStore {
    pub fn new(inner: Arc<dyn CredentialStore>) -> Self {
        Self { inner }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    fn non_empty(&self, key: &str) -> Option<String> {
        self.inner.get(key).filter(|value| !value.is_empty())
    }

    pub fn api_token(&self) -> Option<String> {
        self.non_empty(API_TOKEN_KEY)
    }

    pub fn access_token(&self) -> Option<String> {
        self.non_empty(ACCESS_TOKEN_KEY)
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.non_empty(REFRESH_TOKEN_KEY)
    }

    pub fn admin_token(&self) -> Option<String> {
        self.non_empty(ADMIN_TOKEN_KEY)
    }

    pub fn set_api_token(&self, token: &str) -> Result<(), StoreError> {
        self.inner.set(API_TOKEN_KEY, token)
    }

    /// Both session tokens, if a session is stored
    pub fn token_pair(&self) -> Option<TokenPair> {
        Some(TokenPair {
            access_token: self.access_token()?,
            refresh_token: self.refresh_token()?,
        })
    }

    pub fn store_tokens(&self, pair: &TokenPair) -> Result<(), StoreError> {
        self.inner.set(ACCESS_TOKEN_KEY, &pair.access_token)?;
        self.inner.set(REFRESH_TOKEN_KEY, &pair.refresh_token)
    }

    /// Persist a fresh login; a missing admin token removes any stale one
    pub fn store_login(&self, pair: &TokenPair, admin_token: Option<&str>) -> Result<(), StoreError> {
        self.store_tokens(pair)?;
        match admin_token {
            Some(token) => self.inner.set(ADMIN_TOKEN_KEY, token),
            None => self.inner.remove(ADMIN_TOKEN_KEY),
        }
    }

    /// Remove every session key
    ///
    /// All keys are attempted even if one fails; the first failure is returned.
    pub fn clear(&self) -> Result<(), StoreError> {
        let mut first_error = None;
        for key in SESSION_KEYS {
            if let Err(e) = self.inner.remove(key) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(access: &str, refresh: &str) -> TokenPair {
        TokenPair {
            access_token: access.into(),
            refresh_token: refresh.into(),
        }
    }

    #[test]
    fn token_pair_round_trip() {
        let store = SessionStore::in_memory();
        assert_eq!(store.token_pair(), None);

        let tokens = pair("access-1", "refresh-1");
        store.store_tokens(&tokens).unwrap();
        assert_eq!(store.token_pair(), Some(tokens));
    }

    #[test]
    fn token_pair_requires_both_tokens() {
        let memory = Arc::new(MemoryStore::new());
        memory.set(ACCESS_TOKEN_KEY, "access-only").unwrap();
        let store = SessionStore::new(memory);
        assert_eq!(store.access_token().as_deref(), Some("access-only"));
        assert_eq!(store.token_pair(), None);
    }

    #[test]
    fn empty_values_read_as_absent() {
        let memory = Arc::new(MemoryStore::new());
        memory.set(API_TOKEN_KEY, "").unwrap();
        let store = SessionStore::new(memory);
        assert_eq!(store.api_token(), None);
    }

    #[test]
    fn clear_removes_all_four_keys() {
        let memory = Arc::new(MemoryStore::new());
        let store = SessionStore::new(memory.clone());
        store.set_api_token("app").unwrap();
        store.store_login(&pair("a", "r"), Some("admin")).unwrap();
        assert_eq!(store.admin_token().as_deref(), Some("admin"));

        store.clear().unwrap();
        for key in SESSION_KEYS {
            assert_eq!(memory.get(key), None, "{key} should be cleared");
        }
    }

    #[test]
    fn login_without_admin_token_drops_stale_one() {
        let store = SessionStore::in_memory();
        store.store_login(&pair("a1", "r1"), Some("admin")).unwrap();
        store.store_login(&pair("a2", "r2"), None).unwrap();
        assert_eq!(store.admin_token(), None);
        assert_eq!(store.access_token().as_deref(), Some("a2"));
    }

    #[test]
    fn token_pair_uses_camel_case_on_the_wire() {
        let json = serde_json::to_value(pair("a", "r")).unwrap();
        assert_eq!(json, serde_json::json!({"accessToken": "a", "refreshToken": "r"}));
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        let store = SessionStore::new(Arc::new(FileStore::open(&path).unwrap()));
        store.set_api_token("app").unwrap();
        store.store_tokens(&pair("access", "refresh")).unwrap();

        let reopened = SessionStore::new(Arc::new(FileStore::open(&path).unwrap()));
        assert_eq!(reopened.api_token().as_deref(), Some("app"));
        assert_eq!(reopened.token_pair(), Some(pair("access", "refresh")));

        reopened.clear().unwrap();
        let after_clear = FileStore::open(&path).unwrap();
        assert_eq!(after_clear.get(ACCESS_TOKEN_KEY), None);
        assert_eq!(after_clear.get(API_TOKEN_KEY), None);
    }

    #[test]
    fn failed_file_write_leaves_store_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let parent = dir.path().join("sessions");
        let store = FileStore::open(parent.join("session.json")).unwrap();
        store.set(ACCESS_TOKEN_KEY, "kept").unwrap();

        // A regular file where the parent directory should be makes every write fail.
        std::fs::remove_dir_all(&parent).unwrap();
        std::fs::write(&parent, b"").unwrap();

        assert!(matches!(
            store.set(ACCESS_TOKEN_KEY, "lost"),
            Err(StoreError::Io(_))
        ));
        assert!(store.set(REFRESH_TOKEN_KEY, "lost").is_err());
        assert!(store.remove(ACCESS_TOKEN_KEY).is_err());

        assert_eq!(store.get(ACCESS_TOKEN_KEY).as_deref(), Some("kept"));
        assert_eq!(store.get(REFRESH_TOKEN_KEY), None);
    }

    #[test]
    fn file_store_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, b"not json").unwrap();
        assert!(matches!(
            FileStore::open(&path),
            Err(StoreError::Serialization(_))
        ));
    }
}
