//! User-visible notices.

use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

/// Something the user should be told about a sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// The token or destination database is not configured.
    SettingsMissing,
    SyncSuccess { title: String },
    SyncFail { title: String, reason: String },
    /// Front-matter tags could not be read; the page is synced without them.
    SetTagsFail { title: String },
    ClipboardFail { reason: String },
    /// The page exists but part of its content did not arrive.
    AppendIncomplete { title: String, reason: String },
    /// The page was synced but the document could not be updated.
    WriteFail { path: String, reason: String },
}

impl Notice {
    /// Stable identifier of the notice kind.
    pub fn key(&self) -> &'static str {
        match self {
            Notice::SettingsMissing => "settings-missing",
            Notice::SyncSuccess { .. } => "sync-success",
            Notice::SyncFail { .. } => "sync-fail",
            Notice::SetTagsFail { .. } => "set-tags-fail",
            Notice::ClipboardFail { .. } => "clipboard-fail",
            Notice::AppendIncomplete { .. } => "append-incomplete",
            Notice::WriteFail { .. } => "write-fail",
        }
    }

    pub fn is_error(&self) -> bool {
        !matches!(self, Notice::SyncSuccess { .. })
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::SettingsMissing => write!(
                f,
                "Please set up the notion API and database id in the settings."
            ),
            Notice::SyncSuccess { title } => write!(f, "Sync to notion success: {}", title),
            Notice::SyncFail { title, reason } => {
                write!(f, "Sync to notion fail: {} ({})", title, reason)
            }
            Notice::SetTagsFail { title } => write!(
                f,
                "Set tags fail for {}, please check the frontmatter of the file or turn off allowTags.",
                title
            ),
            Notice::ClipboardFail { reason } => write!(f, "Could not copy link: {}", reason),
            Notice::AppendIncomplete { title, reason } => write!(
                f,
                "Sync to notion incomplete: {} was created but some content is missing ({})",
                title, reason
            ),
            Notice::WriteFail { path, reason } => {
                write!(f, "Write file error {}: {}", path, reason)
            }
        }
    }
}

/// Sink for notices.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Sends notices to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        if notice.is_error() {
            warn!(kind = notice.key(), "{}", notice);
        } else {
            info!(kind = notice.key(), "{}", notice);
        }
    }
}

/// Keeps notices in memory.
#[derive(Debug, Default, Clone)]
pub struct MemoryNotifier {
    notices: Arc<Mutex<Vec<Notice>>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn keys(&self) -> Vec<&'static str> {
        self.notices().iter().map(Notice::key).collect()
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, notice: Notice) {
        self.notices
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(notice);
    }
}
