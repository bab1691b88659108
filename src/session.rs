//! Session store: the one piece of shared state in the portal.
//!
//! The store holds a three-valued status and the cached credential, and
//! persists both through a [`SessionStorage`] port on every mutation so a
//! reload sees the latest status without a round trip. It never touches the
//! network.
//!
//! Writes are crate-private: only the auth client calls `login`/`logout`.
//! Everything else shares an `Arc<SessionStore<_>>` and reads.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use crate::config::PortalConfig;
use crate::error::Error;
use crate::types::Credential;

/// Fixed storage key the session document lives under.
pub const STORAGE_KEY: &str = "user-storage";

/// Login status as seen by readers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Storage has not been read yet.
    Unknown,
    LoggedIn,
    LoggedOut,
}

/// Durable key/value storage for the session document.
///
/// Swap in [`MemoryStorage`] for tests, [`FileStorage`] for a real profile.
pub trait SessionStorage: Send + Sync + 'static {
    /// Read the raw document stored under `key`.
    fn load(&self, key: &str) -> Result<Option<String>, Error>;

    /// Replace the document stored under `key`.
    fn save(&self, key: &str, value: &str) -> Result<(), Error>;

    /// Remove the document stored under `key`. Missing keys are not an error.
    fn clear(&self, key: &str) -> Result<(), Error>;
}

/// In-memory storage. Clones share the same entries, which is how tests
/// simulate a reload: build a second store over a clone.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemoryStorage {
    fn load(&self, key: &str) -> Result<Option<String>, Error> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<(), Error> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn clear(&self, key: &str) -> Result<(), Error> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}

/// One JSON file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Storage rooted at [`PortalConfig::storage_dir`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when no storage directory is configured.
    pub fn from_config(config: &PortalConfig) -> Result<Self, Error> {
        config
            .storage_dir()
            .map(Self::new)
            .ok_or_else(|| Error::Config("SESSION_STORAGE_DIR is not set".into()))
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl SessionStorage for FileStorage {
    fn load(&self, key: &str) -> Result<Option<String>, Error> {
        match std::fs::read_to_string(self.path(key)) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Storage(format!("read {key}: {e}"))),
        }
    }

    fn save(&self, key: &str, value: &str) -> Result<(), Error> {
        std::fs::create_dir_all(&self.dir)
            .map_err(|e| Error::Storage(format!("create {}: {e}", self.dir.display())))?;
        std::fs::write(self.path(key), value)
            .map_err(|e| Error::Storage(format!("write {key}: {e}")))
    }

    fn clear(&self, key: &str) -> Result<(), Error> {
        match std::fs::remove_file(self.path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Storage(format!("remove {key}: {e}"))),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedState {
    is_logged_in: bool,
    #[serde(default)]
    credential: Option<Credential>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PersistedDocument {
    state: PersistedState,
    #[serde(default)]
    version: u32,
}

struct SessionState {
    status: SessionStatus,
    credential: Option<Credential>,
}

/// Session context passed explicitly to everything that branches on login state.
pub struct SessionStore<S> {
    storage: S,
    key: String,
    state: RwLock<SessionState>,
}

impl<S: SessionStorage> SessionStore<S> {
    /// New store in the `Unknown` state. Call [`hydrate`](Self::hydrate) to read storage.
    #[must_use]
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            key: STORAGE_KEY.to_string(),
            state: RwLock::new(SessionState {
                status: SessionStatus::Unknown,
                credential: None,
            }),
        }
    }

    /// Override the storage key (default: [`STORAGE_KEY`]).
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// New store, already hydrated.
    #[must_use]
    pub fn open(storage: S) -> Self {
        let store = Self::new(storage);
        store.hydrate();
        store
    }

    /// Read the persisted document and settle the status.
    ///
    /// Missing, unreadable or corrupt documents settle as `LoggedOut`.
    pub fn hydrate(&self) -> SessionStatus {
        let persisted = match self.storage.load(&self.key) {
            Ok(Some(raw)) => match serde_json::from_str::<PersistedDocument>(&raw) {
                Ok(doc) => doc.state,
                Err(e) => {
                    tracing::warn!(key = %self.key, error = %e, "Discarding corrupt session document");
                    PersistedState::default()
                }
            },
            Ok(None) => PersistedState::default(),
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "Session storage unreadable");
                PersistedState::default()
            }
        };

        let status = if persisted.is_logged_in {
            SessionStatus::LoggedIn
        } else {
            SessionStatus::LoggedOut
        };

        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.status = status;
        state.credential = persisted.credential.filter(|_| persisted.is_logged_in);
        status
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .status
    }

    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.status() == SessionStatus::LoggedIn
    }

    /// Cached credential, if the last login captured one.
    #[must_use]
    pub fn credential(&self) -> Option<Credential> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .credential
            .clone()
    }

    /// Persists first; a failed write leaves the in-memory state unchanged.
    pub(crate) fn login(&self, credential: Option<Credential>) -> Result<(), Error> {
        let doc = PersistedDocument {
            state: PersistedState {
                is_logged_in: true,
                credential: credential.clone(),
            },
            version: 0,
        };
        self.persist(&doc)?;

        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.status = SessionStatus::LoggedIn;
        state.credential = credential;
        Ok(())
    }

    pub(crate) fn logout(&self) -> Result<(), Error> {
        self.persist(&PersistedDocument::default())?;

        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.status = SessionStatus::LoggedOut;
        state.credential = None;
        Ok(())
    }

    fn persist(&self, doc: &PersistedDocument) -> Result<(), Error> {
        let raw = serde_json::to_string(doc).map_err(|e| Error::Storage(e.to_string()))?;
        self.storage.save(&self.key, &raw)
    }
}
