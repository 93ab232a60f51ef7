//! Session-scoped durable key/value storage.
//!
//! Holds small JSON documents that must survive a full page reload but not
//! the end of the session. Every caller treats failures here as best-effort:
//! they are logged and swallowed, never surfaced.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde_json::Value;
use thiserror::Error;

use crate::cache::lock::{rw_read, rw_write};

const SOURCE: &str = "infra::session_store";

#[derive(Debug, Error)]
pub enum SessionStoreError {
    #[error("session storage is unavailable")]
    Unavailable,
    #[error("session storage quota exceeded: {needed} bytes needed, {quota} allowed")]
    QuotaExceeded { needed: usize, quota: usize },
    #[error("session storage serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("session storage io error: {0}")]
    Io(#[from] std::io::Error),
}

pub trait SessionStore: Send + Sync {
    /// Read the document stored under `key`, `None` when absent.
    fn read_json(&self, key: &str) -> Result<Option<Value>, SessionStoreError>;

    /// Replace the document stored under `key`.
    fn write_json(&self, key: &str, value: &Value) -> Result<(), SessionStoreError>;
}

/// Process-local session store, optionally bounded by a byte quota.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    items: RwLock<HashMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            items: RwLock::new(HashMap::new()),
            quota_bytes: Some(quota_bytes),
        }
    }

    /// Store raw text under `key`, bypassing serialization.
    pub fn insert_raw(&self, key: &str, raw: &str) {
        rw_write(&self.items, SOURCE, "insert_raw").insert(key.to_string(), raw.to_string());
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        rw_read(&self.items, SOURCE, "raw").get(key).cloned()
    }
}

impl SessionStore for MemorySessionStore {
    fn read_json(&self, key: &str) -> Result<Option<Value>, SessionStoreError> {
        let items = rw_read(&self.items, SOURCE, "read_json");
        items
            .get(key)
            .map(|raw| serde_json::from_str(raw))
            .transpose()
            .map_err(SessionStoreError::from)
    }

    fn write_json(&self, key: &str, value: &Value) -> Result<(), SessionStoreError> {
        let raw = serde_json::to_string(value)?;
        let mut items = rw_write(&self.items, SOURCE, "write_json");

        if let Some(quota) = self.quota_bytes {
            let others: usize = items
                .iter()
                .filter(|(existing, _)| existing.as_str() != key)
                .map(|(existing, text)| existing.len() + text.len())
                .sum();
            let needed = others + key.len() + raw.len();
            if needed > quota {
                return Err(SessionStoreError::QuotaExceeded { needed, quota });
            }
        }

        items.insert(key.to_string(), raw);
        Ok(())
    }
}

/// Session store backed by one JSON file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    root: PathBuf,
}

impl FileSessionStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// ASCII alphanumerics and `-` pass through; every other byte becomes
    /// `_xx` (lowercase hex), so distinct keys never share a file.
    fn path_for(&self, key: &str) -> PathBuf {
        let mut file_name = String::with_capacity(key.len());
        for byte in key.bytes() {
            if byte.is_ascii_alphanumeric() || byte == b'-' {
                file_name.push(char::from(byte));
            } else {
                file_name.push_str(&format!("_{byte:02x}"));
            }
        }
        self.root.join(format!("{file_name}.json"))
    }
}

impl SessionStore for FileSessionStore {
    fn read_json(&self, key: &str) -> Result<Option<Value>, SessionStoreError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn write_json(&self, key: &str, value: &Value) -> Result<(), SessionStoreError> {
        if !self.root.is_dir() {
            return Err(SessionStoreError::Unavailable);
        }
        let raw = serde_json::to_string(value)?;
        fs::write(self.path_for(key), raw)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn memory_store_roundtrips_documents() {
        let store = MemorySessionStore::new();
        assert!(store.read_json("k").expect("readable").is_none());

        store.write_json("k", &json!({ "/": 10 })).expect("write");
        assert_eq!(store.read_json("k").expect("readable"), Some(json!({ "/": 10 })));
    }

    #[test]
    fn memory_store_reports_corrupt_documents() {
        let store = MemorySessionStore::new();
        store.insert_raw("k", "{not json");
        assert!(matches!(
            store.read_json("k"),
            Err(SessionStoreError::Serialization(_))
        ));
    }

    #[test]
    fn memory_store_enforces_quota() {
        let store = MemorySessionStore::with_quota(16);
        let err = store
            .write_json("k", &json!({ "/a/very/long/route": 1000 }))
            .expect_err("over quota");
        assert!(matches!(err, SessionStoreError::QuotaExceeded { quota: 16, .. }));
        assert!(store.raw("k").is_none());
    }

    #[test]
    fn file_store_writes_one_file_per_key() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileSessionStore::new(dir.path());

        store
            .write_json("peja-route-scroll-v1", &json!({ "/": 42 }))
            .expect("write");
        assert!(dir.path().join("peja-route-scroll-v1.json").exists());
        assert_eq!(
            store.read_json("peja-route-scroll-v1").expect("read"),
            Some(json!({ "/": 42 }))
        );
        assert!(store.read_json("missing").expect("read").is_none());
    }

    #[test]
    fn file_store_keeps_similar_keys_apart() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileSessionStore::new(dir.path());

        store.write_json("a:b", &json!(1)).expect("write");
        store.write_json("a_b", &json!(2)).expect("write");
        store.write_json("a_3ab", &json!(3)).expect("write");

        assert_eq!(store.read_json("a:b").expect("read"), Some(json!(1)));
        assert_eq!(store.read_json("a_b").expect("read"), Some(json!(2)));
        assert_eq!(store.read_json("a_3ab").expect("read"), Some(json!(3)));
        assert!(dir.path().join("a_3ab.json").exists());
    }

    #[test]
    fn file_store_without_directory_is_unavailable() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileSessionStore::new(dir.path().join("gone"));
        assert!(matches!(
            store.write_json("k", &json!({})),
            Err(SessionStoreError::Unavailable)
        ));
    }
}
