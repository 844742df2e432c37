use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::error::KeyStoreError;
use crate::models::KeyFile;

/// Where the key list and rotation cursor are checkpointed.
pub trait KeyPersistence: Send + Sync {
    /// `Ok(None)` when nothing has been stored yet.
    fn load(&self) -> Result<Option<KeyFile>, KeyStoreError>;
    fn save(&self, state: &KeyFile) -> Result<(), KeyStoreError>;
    fn describe(&self) -> String;
}

pub struct FileKeyPersistence {
    path: PathBuf,
}

impl FileKeyPersistence {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileKeyPersistence { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KeyPersistence for FileKeyPersistence {
    fn load(&self) -> Result<Option<KeyFile>, KeyStoreError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn save(&self, state: &KeyFile) -> Result<(), KeyStoreError> {
        let json = serde_json::to_string_pretty(state)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// In-process backend. Clones share the same slot, so a fresh store built
/// from a clone sees what an earlier store saved.
#[derive(Clone, Default)]
pub struct MemoryKeyPersistence {
    slot: Arc<Mutex<Option<KeyFile>>>,
}

impl MemoryKeyPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: KeyFile) -> Self {
        MemoryKeyPersistence {
            slot: Arc::new(Mutex::new(Some(state))),
        }
    }

    pub fn snapshot(&self) -> Option<KeyFile> {
        self.slot.lock().ok().and_then(|slot| slot.clone())
    }
}

impl KeyPersistence for MemoryKeyPersistence {
    fn load(&self) -> Result<Option<KeyFile>, KeyStoreError> {
        let slot = self.slot.lock().map_err(|_| KeyStoreError::Poisoned)?;
        Ok(slot.clone())
    }

    fn save(&self, state: &KeyFile) -> Result<(), KeyStoreError> {
        let mut slot = self.slot.lock().map_err(|_| KeyStoreError::Poisoned)?;
        *slot = Some(state.clone());
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

/// Ordered pool of API keys with a round-robin cursor.
pub struct CredentialStore {
    keys: Vec<String>,
    current_index: usize,
    backend: Option<Box<dyn KeyPersistence>>,
}

impl CredentialStore {
    /// Build a store over `backend` and restore its checkpoint.
    pub fn new(backend: Box<dyn KeyPersistence>) -> Self {
        let mut store = CredentialStore {
            keys: Vec::new(),
            current_index: 0,
            backend: Some(backend),
        };
        store.load();
        store
    }

    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self::new(Box::new(FileKeyPersistence::new(path)))
    }

    /// A store that never touches durable storage.
    pub fn transient(keys: Vec<String>) -> Self {
        let mut store = CredentialStore {
            keys: Vec::new(),
            current_index: 0,
            backend: None,
        };
        store.replace_all(keys);
        store
    }

    /// Keys pasted as one blob, e.g. the `YOUTUBE_API_KEYS` variable.
    pub fn from_env_value(value: &str) -> Self {
        Self::transient(parse_key_input(value))
    }

    pub fn load(&mut self) {
        let Some(backend) = &self.backend else {
            return;
        };

        match backend.load() {
            Ok(Some(state)) => {
                self.keys = state.api_keys;
                self.current_index = state.current_index;
                if !self.keys.is_empty() && self.current_index >= self.keys.len() {
                    warn!(
                        "Stored key index {} out of range for {} keys, resetting to 0",
                        self.current_index,
                        self.keys.len()
                    );
                    self.current_index = 0;
                }
                info!("Loaded {} API keys from {}", self.keys.len(), backend.describe());
            }
            Ok(None) => {
                warn!("Key file not found: {}", backend.describe());
            }
            Err(e) => {
                error!("Failed to load API keys from {}: {e}", backend.describe());
                self.keys.clear();
                self.current_index = 0;
            }
        }
    }

    pub fn save(&self) {
        let Some(backend) = &self.backend else {
            return;
        };

        let state = KeyFile {
            api_keys: self.keys.clone(),
            current_index: self.current_index,
        };
        if let Err(e) = backend.save(&state) {
            error!("Failed to save API keys to {}: {e}", backend.describe());
        }
    }

    /// Active key, or `""` when the pool is empty.
    pub fn current(&self) -> &str {
        self.keys
            .get(self.current_index)
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Advance one position, wrapping at the end, and checkpoint the cursor.
    pub fn rotate(&mut self) -> &str {
        if self.keys.is_empty() {
            return "";
        }

        self.current_index = (self.current_index + 1) % self.keys.len();
        self.save();
        info!("Rotated to API key index: {}", self.current_index);
        self.current()
    }

    pub fn replace_all(&mut self, new_keys: Vec<String>) {
        self.keys = new_keys
            .into_iter()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();
        self.current_index = 0;
        self.save();
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn is_persistent(&self) -> bool {
        self.backend.is_some()
    }
}

/// Format sanity check only; whether a key works is only known by using it.
pub fn validate_key(key: &str) -> bool {
    key.trim().len() > 20
}

/// Split pasted keys on newlines or commas, dropping blanks.
pub fn parse_key_input(input: &str) -> Vec<String> {
    input
        .split(['\n', '\r', ','])
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn keys(list: &[&str]) -> Vec<String> {
        list.iter().map(|k| k.to_string()).collect()
    }

    #[test]
    fn rotation_is_round_robin() {
        let mut store = CredentialStore::transient(keys(&["A", "B", "C"]));
        assert_eq!(store.current(), "A");
        assert_eq!(store.rotate(), "B");
        assert_eq!(store.rotate(), "C");
        assert_eq!(store.rotate(), "A");
    }

    #[test]
    fn n_rotations_return_to_start() {
        for n in 1..6 {
            let pool: Vec<String> = (0..n).map(|i| format!("key-{i}")).collect();
            let mut store = CredentialStore::transient(pool);
            store.rotate();
            let start = store.current().to_string();
            for _ in 0..n {
                store.rotate();
            }
            assert_eq!(store.current(), start);
        }
    }

    #[test]
    fn empty_store_yields_sentinel() {
        let mut store = CredentialStore::transient(Vec::new());
        assert_eq!(store.current(), "");
        assert_eq!(store.rotate(), "");
        assert_eq!(store.current_index(), 0);
    }

    #[test]
    fn replace_all_trims_and_keeps_duplicates() {
        let mut store = CredentialStore::transient(keys(&["A"]));
        store.rotate();
        store.replace_all(keys(&[" X ", "", "  ", "X", "Y"]));
        assert_eq!(store.keys(), &keys(&["X", "X", "Y"])[..]);
        assert_eq!(store.current_index(), 0);
    }

    #[test]
    fn rotation_is_checkpointed_before_returning() {
        let backend = MemoryKeyPersistence::with_state(KeyFile {
            api_keys: keys(&["A", "B"]),
            current_index: 0,
        });
        let mut store = CredentialStore::new(Box::new(backend.clone()));
        store.rotate();
        assert_eq!(backend.snapshot().unwrap().current_index, 1);
    }

    #[test]
    fn out_of_range_cursor_is_clamped() {
        let backend = MemoryKeyPersistence::with_state(KeyFile {
            api_keys: keys(&["A", "B"]),
            current_index: 7,
        });
        let store = CredentialStore::new(Box::new(backend));
        assert_eq!(store.current_index(), 0);
        assert_eq!(store.current(), "A");
    }

    #[test]
    fn file_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("api_keys.json");

        let mut store = CredentialStore::from_file(&path);
        assert!(store.is_empty());
        store.replace_all(keys(&["A", "B", "C"]));
        store.rotate();
        store.rotate();

        let reloaded = CredentialStore::from_file(&path);
        assert_eq!(reloaded.keys(), store.keys());
        assert_eq!(reloaded.current_index(), 2);
        assert_eq!(reloaded.current(), "C");
    }

    #[test]
    fn file_format_matches_checkpoint_shape() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("api_keys.json");
        let mut store = CredentialStore::from_file(&path);
        store.replace_all(keys(&["A", "B"]));
        store.rotate();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw, serde_json::json!({"api_keys": ["A", "B"], "current_index": 1}));
    }

    #[test]
    fn malformed_file_leaves_store_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("api_keys.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = CredentialStore::from_file(&path);
        assert!(store.is_empty());
        assert_eq!(store.current(), "");
    }

    #[test]
    fn env_supplied_store_is_transient() {
        let mut store = CredentialStore::from_env_value("A,B\nC");
        assert!(!store.is_persistent());
        assert_eq!(store.rotate(), "B");
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn key_input_parsing_and_validation() {
        assert_eq!(parse_key_input(" A \n\nB, C ,"), keys(&["A", "B", "C"]));
        assert!(validate_key("AIzaSyA-0123456789abcdefghij"));
        assert!(!validate_key("short"));
    }
}
