//! Document store trait definition.

use async_trait::async_trait;

use notionsync_common::{DocumentPath, Result};

/// Access to the markdown documents of a vault.
///
/// All operations are async. Paths are vault-relative; implementations map
/// them onto their own backing storage.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Get the store name (e.g., "local", "memory").
    fn name(&self) -> &str;

    /// Read the raw text of a document.
    ///
    /// # Errors
    /// - Document not found
    /// - I/O errors or invalid UTF-8
    async fn read(&self, path: &DocumentPath) -> Result<String>;

    /// Overwrite (or create) a document with `text`.
    ///
    /// # Postconditions
    /// - A subsequent `read` returns exactly `text`
    ///
    /// # Errors
    /// - Parent directory not found
    /// - I/O errors
    async fn write(&self, path: &DocumentPath, text: &str) -> Result<()>;

    /// Check if a document exists.
    async fn exists(&self, path: &DocumentPath) -> Result<bool>;

    /// Every markdown document in the vault, sorted by path.
    async fn list_markdown(&self) -> Result<Vec<DocumentPath>>;
}
