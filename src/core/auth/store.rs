//! Key/value persistence for the session
//!
//! The session lives in three independent entries (`access_token`, `refresh_token`,
//! `user`) that are always written and cleared together. Backends:
//! - [`MemoryStore`] - process-local, used in tests and ephemeral clients
//! - [`FileStore`] - JSON file on disk (native builds)
//! - [`LocalStorageStore`] - browser `localStorage` (web builds)

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::models::{Session, UserProfile};

/// Storage key for the access token
pub const ACCESS_TOKEN_KEY: &str = "access_token";
/// Storage key for the refresh token
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";
/// Storage key for the serialized user profile
pub const USER_KEY: &str = "user";

const SESSION_KEYS: [&str; 3] = [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_KEY];

/// Session store error types
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Stored data is not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Persistence capability injected into the session manager
pub trait SessionStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Remove every session entry
    fn clear(&self) -> Result<(), StoreError> {
        for key in SESSION_KEYS {
            self.remove(key)?;
        }
        Ok(())
    }
}

impl<S: SessionStore + ?Sized> SessionStore for Arc<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key)
    }

    fn clear(&self) -> Result<(), StoreError> {
        (**self).clear()
    }
}

/// Persist all three session entries. On failure the entries written so far are
/// rolled back so the store never holds half a session.
pub(crate) fn write_session<S: SessionStore + ?Sized>(
    store: &S,
    session: &Session,
) -> Result<(), StoreError> {
    let user_json = serde_json::to_string(&session.user)?;

    let result = store
        .set(ACCESS_TOKEN_KEY, &session.access_token)
        .and_then(|_| store.set(REFRESH_TOKEN_KEY, &session.refresh_token))
        .and_then(|_| store.set(USER_KEY, &user_json));

    if result.is_err() {
        if let Err(e) = store.clear() {
            tracing::warn!("Failed to roll back partial session write: {}", e);
        }
    }
    result
}

/// Load a persisted session. Returns `Ok(None)` unless all three entries are
/// present and well-formed.
pub(crate) fn read_session<S: SessionStore + ?Sized>(
    store: &S,
) -> Result<Option<Session>, StoreError> {
    let access = store.get(ACCESS_TOKEN_KEY)?.filter(|t| !t.is_empty());
    let refresh = store.get(REFRESH_TOKEN_KEY)?.filter(|t| !t.is_empty());
    let user_json = store.get(USER_KEY)?;

    let (Some(access_token), Some(refresh_token), Some(user_json)) = (access, refresh, user_json)
    else {
        return Ok(None);
    };

    match serde_json::from_str::<UserProfile>(&user_json) {
        Ok(user) => Ok(Some(Session {
            access_token,
            refresh_token,
            user,
        })),
        Err(e) => {
            tracing::warn!("Discarding malformed persisted user profile: {}", e);
            Ok(None)
        }
    }
}

/// In-memory store
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries currently held
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // A poisoned map is still a valid map
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.lock().remove(key);
        Ok(())
    }
}

/// Write `contents` to a fresh file readable only by the owner
#[cfg(all(feature = "native", unix))]
fn write_private(path: &std::path::Path, contents: &[u8]) -> std::io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;

    // A leftover temp file would keep its old mode
    match std::fs::remove_file(path) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => return Err(e),
        _ => {}
    }

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(contents)?;
    file.sync_all()
}

#[cfg(all(feature = "native", not(unix)))]
fn write_private(path: &std::path::Path, contents: &[u8]) -> std::io::Result<()> {
    std::fs::write(path, contents)
}

/// JSON-file store. Every write rewrites the whole file through a temporary
/// sibling and a rename.
#[cfg(feature = "native")]
#[derive(Debug)]
pub struct FileStore {
    path: std::path::PathBuf,
    guard: Mutex<()>,
}

#[cfg(feature = "native")]
impl FileStore {
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    fn load(&self) -> Result<HashMap<String, String>, StoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) if contents.trim().is_empty() => Ok(HashMap::new()),
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, entries: &HashMap<String, String>) -> Result<(), StoreError> {
        if entries.is_empty() {
            return match std::fs::remove_file(&self.path) {
                Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
                _ => Ok(()),
            };
        }

        let tmp = self.path.with_extension("tmp");
        write_private(&tmp, &serde_json::to_vec_pretty(entries)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn update<F>(&self, apply: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut HashMap<String, String>),
    {
        let _guard = self.guard.lock().unwrap_or_else(|e| e.into_inner());
        let mut entries = self.load()?;
        apply(&mut entries);
        self.save(&entries)
    }
}

#[cfg(feature = "native")]
impl SessionStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let _guard = self.guard.lock().unwrap_or_else(|e| e.into_inner());
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.update(|entries| {
            entries.remove(key);
        })
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.update(|entries| {
            for key in SESSION_KEYS {
                entries.remove(key);
            }
        })
    }
}

/// Browser `localStorage` store
#[cfg(feature = "web")]
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalStorageStore;

#[cfg(feature = "web")]
impl LocalStorageStore {
    fn storage() -> Result<web_sys::Storage, StoreError> {
        let window = web_sys::window()
            .ok_or_else(|| StoreError::Unavailable("No window available".to_string()))?;
        window
            .local_storage()
            .map_err(|e| StoreError::Unavailable(format!("{:?}", e)))?
            .ok_or_else(|| StoreError::Unavailable("localStorage not available".to_string()))
    }
}

#[cfg(feature = "web")]
impl SessionStore for LocalStorageStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Self::storage()?
            .get_item(key)
            .map_err(|e| StoreError::Unavailable(format!("{:?}", e)))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        Self::storage()?
            .set_item(key, value)
            .map_err(|e| StoreError::Unavailable(format!("{:?}", e)))
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        Self::storage()?
            .remove_item(key)
            .map_err(|e| StoreError::Unavailable(format!("{:?}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::auth::models::Role;

    fn sample_session() -> Session {
        Session {
            access_token: "tok1".to_string(),
            refresh_token: "ref1".to_string(),
            user: UserProfile::new(1, "A B", Role::Student),
        }
    }

    /// Store whose writes start failing after a number of successful `set` calls
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        allowed_sets: Mutex<usize>,
        fail_clear: bool,
    }

    impl SessionStore for FlakyStore {
        fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
            let mut allowed = self.allowed_sets.lock().unwrap();
            if *allowed == 0 {
                return Err(StoreError::Unavailable("disk full".to_string()));
            }
            *allowed -= 1;
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<(), StoreError> {
            self.inner.remove(key)
        }

        fn clear(&self) -> Result<(), StoreError> {
            if self.fail_clear {
                return Err(StoreError::Unavailable("read-only".to_string()));
            }
            self.inner.clear()
        }
    }

    #[test]
    fn test_memory_store_basic_operations() {
        let store = MemoryStore::new();
        assert!(store.get("missing").unwrap().is_none());

        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));

        store.remove("k").unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_write_then_read_session() {
        let store = MemoryStore::new();
        write_session(&store, &sample_session()).unwrap();

        assert_eq!(store.len(), 3);
        assert_eq!(read_session(&store).unwrap(), Some(sample_session()));
    }

    #[test]
    fn test_clear_removes_only_session_keys() {
        let store = MemoryStore::new();
        store.set("theme", "dark").unwrap();
        write_session(&store, &sample_session()).unwrap();

        store.clear().unwrap();

        assert_eq!(store.len(), 1);
        assert!(read_session(&store).unwrap().is_none());
    }

    #[test]
    fn test_partial_session_is_not_loaded() {
        let store = MemoryStore::new();
        store.set(ACCESS_TOKEN_KEY, "tok1").unwrap();
        store
            .set(USER_KEY, r#"{"id":1,"full_name":"A B","role":"STUDENT"}"#)
            .unwrap();

        assert!(read_session(&store).unwrap().is_none());
    }

    #[test]
    fn test_malformed_user_is_not_loaded() {
        let store = MemoryStore::new();
        store.set(ACCESS_TOKEN_KEY, "tok1").unwrap();
        store.set(REFRESH_TOKEN_KEY, "ref1").unwrap();
        store.set(USER_KEY, "{not json").unwrap();

        assert!(read_session(&store).unwrap().is_none());
    }

    #[test]
    fn test_empty_token_is_not_loaded() {
        let store = MemoryStore::new();
        write_session(&store, &sample_session()).unwrap();
        store.set(ACCESS_TOKEN_KEY, "").unwrap();

        assert!(read_session(&store).unwrap().is_none());
    }

    #[test]
    fn test_failed_write_rolls_back() {
        let store = FlakyStore {
            allowed_sets: Mutex::new(2),
            ..Default::default()
        };

        let result = write_session(&store, &sample_session());

        assert!(matches!(result, Err(StoreError::Unavailable(_))));
        assert!(store.inner.is_empty());
    }

    #[test]
    fn test_failed_rollback_keeps_original_error() {
        let store = FlakyStore {
            allowed_sets: Mutex::new(1),
            fail_clear: true,
            ..Default::default()
        };

        let result = write_session(&store, &sample_session());

        match result {
            Err(StoreError::Unavailable(message)) => assert_eq!(message, "disk full"),
            other => panic!("unexpected result: {:?}", other),
        }
        // Rollback failed, so the partial entry is still there and is not a session
        assert_eq!(store.inner.len(), 1);
        assert!(read_session(&store).unwrap().is_none());
    }

    #[test]
    fn test_arc_store_shares_entries() {
        let store = Arc::new(MemoryStore::new());
        let handle = Arc::clone(&store);

        handle.set(ACCESS_TOKEN_KEY, "tok1").unwrap();
        assert_eq!(store.get(ACCESS_TOKEN_KEY).unwrap().as_deref(), Some("tok1"));
    }

    #[cfg(feature = "native")]
    #[test]
    fn test_file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let store = FileStore::new(&path);
        write_session(&store, &sample_session()).unwrap();
        assert!(path.exists());

        let reopened = FileStore::new(&path);
        assert_eq!(read_session(&reopened).unwrap(), Some(sample_session()));
    }

    #[cfg(all(feature = "native", unix))]
    #[test]
    fn test_file_store_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(path.with_extension("tmp"), "stale").unwrap();
        std::fs::set_permissions(path.with_extension("tmp"), std::fs::Permissions::from_mode(0o644)).unwrap();

        let store = FileStore::new(&path);
        write_session(&store, &sample_session()).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert!(!path.with_extension("tmp").exists());
    }

    #[cfg(feature = "native")]
    #[test]
    fn test_file_store_clear_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let store = FileStore::new(&path);
        write_session(&store, &sample_session()).unwrap();
        store.clear().unwrap();

        assert!(!path.exists());
        assert!(store.get(ACCESS_TOKEN_KEY).unwrap().is_none());
    }

    #[cfg(feature = "native")]
    #[test]
    fn test_file_store_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("absent.json"));

        assert!(store.get(USER_KEY).unwrap().is_none());
        assert!(read_session(&store).unwrap().is_none());
    }

    #[cfg(feature = "native")]
    #[test]
    fn test_file_store_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "garbage").unwrap();

        let store = FileStore::new(&path);
        assert!(matches!(
            store.get(ACCESS_TOKEN_KEY),
            Err(StoreError::Serialization(_))
        ));
    }
}
