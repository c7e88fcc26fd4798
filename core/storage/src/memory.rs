//! In-memory document store for testing.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use crate::provider::DocumentStore;
use notionsync_common::{DocumentPath, Error, Result};

#[derive(Debug, Default)]
struct State {
    documents: BTreeMap<DocumentPath, String>,
    fail_writes: bool,
}

/// In-memory document store.
///
/// Clones share the same documents, so a test can hand one clone to the
/// engine and inspect the other afterwards.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<State>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document, builder style.
    pub fn with_document(self, path: &str, text: impl Into<String>) -> Result<Self> {
        let path = DocumentPath::parse(path)?;
        self.write_state().documents.insert(path, text.into());
        Ok(self)
    }

    /// Make every subsequent write fail.
    pub fn fail_writes(&self) {
        self.write_state().fail_writes = true;
    }

    /// Current text of a document.
    pub fn get(&self, path: &str) -> Option<String> {
        let path = DocumentPath::parse(path).ok()?;
        self.read_state().documents.get(&path).cloned()
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn read(&self, path: &DocumentPath) -> Result<String> {
        self.read_state()
            .documents
            .get(path)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("File not found: {}", path)))
    }

    async fn write(&self, path: &DocumentPath, text: &str) -> Result<()> {
        let mut state = self.write_state();
        if state.fail_writes {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only store",
            )));
        }
        state.documents.insert(path.clone(), text.to_string());
        Ok(())
    }

    async fn exists(&self, path: &DocumentPath) -> Result<bool> {
        Ok(self.read_state().documents.contains_key(path))
    }

    async fn list_markdown(&self) -> Result<Vec<DocumentPath>> {
        Ok(self
            .read_state()
            .documents
            .keys()
            .filter(|p| p.is_markdown())
            .cloned()
            .collect())
    }
}
