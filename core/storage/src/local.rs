//! Local filesystem document store.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use crate::provider::DocumentStore;
use notionsync_common::{DocumentPath, Error, Result};

/// Local filesystem document store.
///
/// Serves the markdown files below a vault directory.
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    /// Open the vault rooted at `root`.
    ///
    /// # Errors
    /// - Root does not exist or is not a directory
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();

        if !root.is_dir() {
            return Err(Error::NotFound(format!(
                "Vault directory not found: {}",
                root.display()
            )));
        }

        Ok(Self { root })
    }

    /// Vault root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Convert a DocumentPath to a filesystem path.
    fn to_fs_path(&self, path: &DocumentPath) -> PathBuf {
        let mut fs_path = self.root.clone();
        for component in path.components() {
            fs_path.push(component);
        }
        fs_path
    }

    /// Walk `dir`, collecting markdown files. Hidden entries (vault settings,
    /// VCS metadata, trash) are skipped.
    async fn collect(&self, dir: PathBuf, prefix: DocumentPath, out: &mut Vec<DocumentPath>) -> Result<()> {
        let mut pending = vec![(dir, prefix)];

        while let Some((dir, prefix)) = pending.pop() {
            let mut entries = fs::read_dir(&dir).await?;

            while let Some(entry) = entries.next_entry().await? {
                let name = entry.file_name().to_string_lossy().to_string();
                if name.starts_with('.') {
                    continue;
                }

                let child = prefix.join(&name)?;
                let file_type = entry.file_type().await?;

                if file_type.is_dir() {
                    pending.push((entry.path(), child));
                } else if file_type.is_file() && child.is_markdown() {
                    out.push(child);
                }
            }
        }

        Ok(())
    }
}

#[async_trait]
impl DocumentStore for LocalStore {
    fn name(&self) -> &str {
        "local"
    }

    async fn read(&self, path: &DocumentPath) -> Result<String> {
        let fs_path = self.to_fs_path(path);

        if !fs_path.exists() {
            return Err(Error::NotFound(format!("File not found: {}", path)));
        }

        if fs_path.is_dir() {
            return Err(Error::InvalidInput("Cannot read a directory".to_string()));
        }

        let bytes = fs::read(&fs_path).await?;
        String::from_utf8(bytes)
            .map_err(|_| Error::InvalidInput(format!("File is not valid UTF-8: {}", path)))
    }

    async fn write(&self, path: &DocumentPath, text: &str) -> Result<()> {
        let fs_path = self.to_fs_path(path);

        if let Some(parent) = fs_path.parent() {
            if !parent.exists() {
                return Err(Error::NotFound("Parent directory not found".to_string()));
            }
        }

        debug!("Writing {} bytes to {}", text.len(), path);
        fs::write(&fs_path, text).await?;
        Ok(())
    }

    async fn exists(&self, path: &DocumentPath) -> Result<bool> {
        Ok(self.to_fs_path(path).is_file())
    }

    async fn list_markdown(&self) -> Result<Vec<DocumentPath>> {
        let mut documents = Vec::new();
        self.collect(self.root.clone(), DocumentPath::root(), &mut documents)
            .await?;
        documents.sort();
        Ok(documents)
    }
}
