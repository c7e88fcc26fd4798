//! Core sync engine that turns documents into remote pages.

use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use notionsync_common::{DocumentPath, Error, Result};
use notionsync_notion::{CmarkConverter, ConvertOptions, MarkdownConverter, NotionApi};
use notionsync_storage::DocumentStore;

use crate::clipboard::{Clipboard, NoClipboard};
use crate::config::SyncConfig;
use crate::frontmatter::{self, vanity_url, write_sync_metadata};
use crate::lifecycle::{PageDraft, PageLifecycle};
use crate::notice::{Notice, Notifier, TracingNotifier};
use crate::pacer::Pacer;
use crate::properties::{extract_tags, map_properties};
use crate::report::{render_report, report_path, ErrorRecord};

/// Selection of a folder run.
#[derive(Debug, Clone)]
pub struct FolderSync {
    /// Only documents below this folder are synced. The root selects all.
    pub prefix: DocumentPath,
    /// Upper bound on files processed; 0 means no limit.
    pub max_files: usize,
}

/// Result of syncing one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSyncReport {
    pub path: DocumentPath,
    pub page_id: String,
    /// Link written to the document, after the vanity rewrite.
    pub url: String,
    /// Page deleted in favor of the new one.
    pub replaced: Option<String>,
    pub appended_chunks: usize,
}

/// Result of a folder run.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub synced: Vec<FileSyncReport>,
    pub errors: Vec<ErrorRecord>,
    /// Report document written for the errors, if any.
    pub report: Option<DocumentPath>,
}

impl BatchReport {
    pub fn attempted(&self) -> usize {
        self.synced.len() + self.errors.len()
    }
}

/// Main sync engine.
///
/// Collaborators are shared behind `Arc` so [`SyncEngine::with_database`]
/// can cheaply derive an engine aimed at another destination.
pub struct SyncEngine {
    api: Arc<dyn NotionApi>,
    store: Arc<dyn DocumentStore>,
    converter: Arc<dyn MarkdownConverter>,
    clipboard: Arc<dyn Clipboard>,
    notifier: Arc<dyn Notifier>,
    config: SyncConfig,
}

impl SyncEngine {
    /// Create an engine with the default converter, no clipboard and
    /// notices sent to the log.
    pub fn new(config: SyncConfig, api: Arc<dyn NotionApi>, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            api,
            store,
            converter: Arc::new(CmarkConverter),
            clipboard: Arc::new(NoClipboard),
            notifier: Arc::new(TracingNotifier),
            config,
        }
    }

    pub fn with_converter(mut self, converter: Arc<dyn MarkdownConverter>) -> Self {
        self.converter = converter;
        self
    }

    pub fn with_clipboard(mut self, clipboard: Arc<dyn Clipboard>) -> Self {
        self.clipboard = clipboard;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Engine writing to another database, leaving this one untouched.
    pub fn with_database(&self, database_id: impl Into<String>) -> Self {
        Self {
            api: self.api.clone(),
            store: self.store.clone(),
            converter: self.converter.clone(),
            clipboard: self.clipboard.clone(),
            notifier: self.notifier.clone(),
            config: self.config.with_database(database_id),
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Sync one document.
    ///
    /// On success the document carries the new `notionID` and `link`. Every
    /// outcome is also announced to the notifier.
    ///
    /// # Errors
    /// - `Error::StructuralLimitExceeded` for content nested too deeply
    /// - `Error::RemoteSyncFailed` if the page could not be created
    /// - `Error::AppendFailed` / `Error::MetadataWriteFailed` when the page
    ///   exists but the sync is incomplete
    pub async fn sync_file(&self, path: &DocumentPath) -> Result<FileSyncReport> {
        let title = path.stem().unwrap_or("Untitled").to_string();

        let result = self.sync_document(path, &title).await;
        match &result {
            Ok(report) => {
                info!("Synced {} to {}", path, report.page_id);
                self.notifier.notify(Notice::SyncSuccess { title });
            }
            // Already announced with a more specific notice.
            Err(e) if e.is_partial_success() => {}
            Err(e) => {
                error!("Failed to sync {}: {}", path, e);
                self.notifier.notify(Notice::SyncFail {
                    title,
                    reason: e.to_string(),
                });
            }
        }
        result
    }

    async fn sync_document(&self, path: &DocumentPath, title: &str) -> Result<FileSyncReport> {
        let raw = self.store.read(path).await?;
        let document = frontmatter::parse(&raw)?;

        let tags = if self.config.allow_tags {
            match extract_tags(&document.front_matter) {
                Ok(tags) => tags,
                Err(e) => {
                    warn!("Ignoring tags of {}: {}", path, e);
                    self.notifier.notify(Notice::SetTagsFail {
                        title: title.to_string(),
                    });
                    None
                }
            }
        } else {
            None
        };

        let content = self
            .converter
            .convert(&document.body, ConvertOptions { truncate: false });
        debug!("Converted {} into {} top-level blocks", path, content.len());

        let draft = PageDraft {
            title: title.to_string(),
            tags,
            content,
            properties: map_properties(&document.front_matter),
            existing_id: document.notion_id().map(str::to_string),
        };

        let outcome = PageLifecycle::new(self.api.as_ref(), &self.config)
            .sync(draft)
            .await?;

        let vanity = self.config.vanity_id.as_deref();
        let url = vanity_url(&outcome.page.url, vanity);

        // The page exists from here on, so the document must point at it
        // even when the overflow append failed.
        let write_error = match write_sync_metadata(&raw, &outcome.page.id, &outcome.page.url, vanity) {
            Ok(updated) => self.store.write(path, &updated).await.err(),
            Err(e) => Some(e),
        };

        if let Err(e) = self.clipboard.copy(&url).await {
            debug!("Clipboard copy failed: {}", e);
            self.notifier.notify(Notice::ClipboardFail {
                reason: e.to_string(),
            });
        }

        if let Some(e) = &outcome.append_error {
            self.notifier.notify(Notice::AppendIncomplete {
                title: title.to_string(),
                reason: e.to_string(),
            });
        }

        if let Some(e) = write_error {
            let reason = e.to_string();
            error!("Synced {} but could not update it: {}", path, reason);
            self.notifier.notify(Notice::WriteFail {
                path: path.to_string(),
                reason: reason.clone(),
            });
            // The error record must still say the page content is incomplete.
            let reason = match &outcome.append_error {
                Some(append) => format!("{}; {}", reason, append),
                None => reason,
            };
            return Err(Error::MetadataWriteFailed {
                path: path.to_string(),
                reason,
            });
        }

        if let Some(e) = outcome.append_error {
            return Err(e);
        }

        Ok(FileSyncReport {
            path: path.clone(),
            page_id: outcome.page.id,
            url,
            replaced: outcome.replaced,
            appended_chunks: outcome.appended_chunks,
        })
    }

    /// Sync every markdown document below a folder, one at a time.
    ///
    /// Failures are recorded per file and never stop the run. When any file
    /// failed, a report document listing them is written to the vault root.
    ///
    /// # Errors
    /// - Only if the documents cannot be listed
    pub async fn sync_folder(&self, selection: FolderSync) -> Result<BatchReport> {
        let start = Instant::now();
        let report_doc = report_path()?;

        let mut files: Vec<DocumentPath> = self
            .store
            .list_markdown()
            .await?
            .into_iter()
            .filter(|p| p.starts_with(&selection.prefix) && *p != report_doc)
            .collect();
        if selection.max_files > 0 {
            files.truncate(selection.max_files);
        }

        info!(
            "Syncing {} files from '{}' to database {}",
            files.len(),
            selection.prefix,
            self.config.database_id
        );

        let mut batch = BatchReport::default();
        let mut pacer = Pacer::new(self.config.request_interval);

        for path in files {
            pacer.wait().await;
            match self.sync_file(&path).await {
                Ok(report) => batch.synced.push(report),
                Err(e) => batch.errors.push(ErrorRecord::new(path, e.to_string())),
            }
        }

        if !batch.errors.is_empty() {
            let text = render_report(&batch.errors);
            match self.store.write(&report_doc, &text).await {
                Ok(()) => batch.report = Some(report_doc),
                Err(e) => {
                    error!("Could not write error report: {}", e);
                    self.notifier.notify(Notice::WriteFail {
                        path: report_doc.to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            "Folder sync completed in {:?}: {} synced, {} failed",
            start.elapsed(),
            batch.synced.len(),
            batch.errors.len()
        );

        Ok(batch)
    }
}
