//! Session artifact store: the single preview slot shared with panels.
//!
//! The slot lives in session-scoped storage under two fixed keys, so a
//! panel that opens after the selection finished still finds the preview.
//! Only the orchestrator writes it; panels read it when they mount.

use crate::capture::PreviewArtifact;
use crate::protocol::PreviewKind;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub const PREVIEW_TYPE_KEY: &str = "preview_type";
pub const PREVIEW_DATA_KEY: &str = "preview_data_url";

const PREVIEW_KEYS: [&str; 2] = [PREVIEW_TYPE_KEY, PREVIEW_DATA_KEY];

/// Key/value storage that lives as long as the browsing session.
pub trait SessionStorage {
    fn get(&self, keys: &[&str]) -> Result<HashMap<String, Value>, StoreError>;
    fn set(&self, entries: HashMap<String, Value>) -> Result<(), StoreError>;
    fn remove(&self, keys: &[&str]) -> Result<(), StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Session storage lock poisoned")]
    Poisoned,

    #[error("Session storage failed: {0}")]
    Backend(String),
}

/// In-process session storage.
#[derive(Default)]
pub struct MemorySessionStorage {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemorySessionStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStorage for MemorySessionStorage {
    fn get(&self, keys: &[&str]) -> Result<HashMap<String, Value>, StoreError> {
        let guard = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(keys
            .iter()
            .filter_map(|k| guard.get(*k).map(|v| (k.to_string(), v.clone())))
            .collect())
    }

    fn set(&self, entries: HashMap<String, Value>) -> Result<(), StoreError> {
        let mut guard = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        guard.extend(entries);
        Ok(())
    }

    fn remove(&self, keys: &[&str]) -> Result<(), StoreError> {
        let mut guard = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        for key in keys {
            guard.remove(*key);
        }
        Ok(())
    }
}

/// What a panel gets back from the slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPreview {
    pub kind: PreviewKind,
    pub data_url: String,
}

/// Typed view of the preview slot on top of any [`SessionStorage`].
pub struct ArtifactStore<S> {
    storage: Arc<S>,
}

impl<S> Clone for ArtifactStore<S> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
        }
    }
}

impl<S: SessionStorage> ArtifactStore<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Replace whatever is in the slot with `artifact`.
    pub fn commit(&self, artifact: &PreviewArtifact) -> Result<(), StoreError> {
        let entries = HashMap::from([
            (
                PREVIEW_TYPE_KEY.to_string(),
                Value::String(artifact.kind.as_str().to_string()),
            ),
            (
                PREVIEW_DATA_KEY.to_string(),
                Value::String(artifact.encoded_data.clone()),
            ),
        ]);
        self.storage.set(entries)?;
        log::info!(
            "[STORE] Preview committed ({}x{}, {} chars)",
            artifact.width,
            artifact.height,
            artifact.encoded_data.len()
        );
        Ok(())
    }

    /// Current preview, if both keys are present and well-formed.
    pub fn load(&self) -> Result<Option<StoredPreview>, StoreError> {
        let entries = self.storage.get(&PREVIEW_KEYS)?;

        let kind = entries
            .get(PREVIEW_TYPE_KEY)
            .cloned()
            .and_then(|v| serde_json::from_value::<PreviewKind>(v).ok());
        let data_url = entries
            .get(PREVIEW_DATA_KEY)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty());

        Ok(match (kind, data_url) {
            (Some(kind), Some(data_url)) => Some(StoredPreview {
                kind,
                data_url: data_url.to_string(),
            }),
            _ => None,
        })
    }

    pub fn clear(&self) -> Result<(), StoreError> {
        self.storage.remove(&PREVIEW_KEYS)?;
        log::debug!("[STORE] Preview cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> ArtifactStore<MemorySessionStorage> {
        ArtifactStore::new(Arc::new(MemorySessionStorage::new()))
    }

    fn artifact(data: &str) -> PreviewArtifact {
        PreviewArtifact::image(format!("data:image/png;base64,{}", data), 40, 20)
    }

    #[test]
    fn empty_slot_loads_none() {
        assert_eq!(store().load().unwrap(), None);
    }

    #[test]
    fn commit_writes_fixed_key_pair() {
        let store = store();
        store.commit(&artifact("AAAA")).unwrap();

        let raw = store.storage().get(&PREVIEW_KEYS).unwrap();
        assert_eq!(raw[PREVIEW_TYPE_KEY], "image");
        assert_eq!(raw[PREVIEW_DATA_KEY], "data:image/png;base64,AAAA");
        assert_eq!(store.storage().len(), 2);
    }

    #[test]
    fn later_commit_supersedes_earlier() {
        let store = store();
        store.commit(&artifact("FIRST")).unwrap();
        store.commit(&artifact("SECOND")).unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.kind, PreviewKind::Image);
        assert_eq!(loaded.data_url, "data:image/png;base64,SECOND");
    }

    #[test]
    fn clear_empties_the_slot() {
        let store = store();
        store.commit(&artifact("AAAA")).unwrap();
        store.clear().unwrap();

        assert_eq!(store.load().unwrap(), None);
        assert!(store.storage().is_empty());

        // clearing an empty slot is fine
        store.clear().unwrap();
    }

    #[test]
    fn clones_share_the_same_slot() {
        let writer = store();
        let reader = writer.clone();
        writer.commit(&artifact("SHARED")).unwrap();
        assert!(reader.load().unwrap().is_some());
    }

    #[test]
    fn unknown_preview_type_is_ignored() {
        let store = store();
        store
            .storage()
            .set(HashMap::from([
                (PREVIEW_TYPE_KEY.to_string(), Value::from("pdf")),
                (PREVIEW_DATA_KEY.to_string(), Value::from("blob:xyz")),
            ]))
            .unwrap();
        assert_eq!(store.load().unwrap(), None);
    }
}
