use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use crate::error::ConsoleError;

/// Durable key holding the end-user bearer token.
pub const USER_TOKEN_KEY: &str = "token";
/// Durable key holding the admin bearer token.
pub const ADMIN_TOKEN_KEY: &str = "admin_token";
/// Transient key holding a chat question typed before the user logged in.
pub const PENDING_QUESTION_KEY: &str = "pending_question";

// 1. KeyValueStore Contract
/// KeyValueStore
///
/// The abstract contract for client-side storage. `FileStore` plays the role of durable
/// browser storage (survives restarts) and `MemoryStore` the tab-scoped one.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str) -> Result<(), ConsoleError>;

    fn remove(&self, key: &str) -> Result<(), ConsoleError>;
}

/// StoreState
///
/// The shared handle type for a storage backend.
pub type StoreState = Arc<dyn KeyValueStore>;

// 2. The Durable Implementation
/// FileStore
///
/// Persists all keys as one JSON object. Every mutation rewrites the file so a crash never
/// leaves a half-applied update behind the in-memory view.
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// open
    ///
    /// Loads the store from `path`. A missing file is an empty store; an unreadable or
    /// malformed one is an error.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ConsoleError> {
        let path = path.as_ref().to_path_buf();
        let entries = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            if raw.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&raw)?
            }
        } else {
            BTreeMap::new()
        };

        tracing::debug!(path = %path.display(), keys = entries.len(), "token store opened");

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<(), ConsoleError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, serde_json::to_string_pretty(entries)?)?;
        Ok(())
    }

    fn mutate<F>(&self, apply: F) -> Result<(), ConsoleError>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let mut next = entries.clone();
        apply(&mut next);
        self.flush(&next)?;
        *entries = next;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ConsoleError> {
        self.mutate(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<(), ConsoleError> {
        if self.get(key).is_none() {
            return Ok(());
        }
        self.mutate(|entries| {
            entries.remove(key);
        })
    }
}

// 3. The In-Memory Implementation
/// MemoryStore
///
/// Process-lifetime storage. Backs tab-scoped data and stands in for `FileStore` in tests.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: Mutex::new(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ConsoleError> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), ConsoleError> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(key);
        Ok(())
    }
}

/// PendingQuestion
///
/// A single chat question remembered across the login redirect. Consumed at most once.
#[derive(Clone)]
pub struct PendingQuestion {
    store: StoreState,
}

impl PendingQuestion {
    pub fn new(store: StoreState) -> Self {
        Self { store }
    }

    /// Remembers `question`, replacing any earlier one. Blank input is ignored.
    pub fn stash(&self, question: &str) -> Result<(), ConsoleError> {
        let question = question.trim();
        if question.is_empty() {
            return Ok(());
        }
        self.store.set(PENDING_QUESTION_KEY, question)
    }

    pub fn peek(&self) -> Option<String> {
        self.store.get(PENDING_QUESTION_KEY)
    }

    /// Reads and deletes the pending question. If the delete fails the question is dropped
    /// rather than handed out twice.
    pub fn take(&self) -> Option<String> {
        let question = self.store.get(PENDING_QUESTION_KEY)?;
        match self.store.remove(PENDING_QUESTION_KEY) {
            Ok(()) => Some(question),
            Err(e) => {
                tracing::warn!("failed to clear pending question: {}", e);
                None
            }
        }
    }
}
