//! notionsync sync engine.
//!
//! This module turns markdown documents into pages of a remote database:
//! - Structural limit checks and splitting of oversized content
//! - Front matter to page property mapping
//! - Page creation, replacement and overflow appends
//! - Sync metadata write-back into the document
//! - Single-file and paced folder runs with an error report

pub mod clipboard;
pub mod config;
pub mod engine;
pub mod frontmatter;
pub mod lifecycle;
pub mod limits;
pub mod notice;
pub mod pacer;
pub mod properties;
pub mod report;

// Re-export main types
pub use clipboard::{Clipboard, CommandClipboard, MemoryClipboard, NoClipboard};
pub use config::{Settings, SyncConfig};
pub use engine::{BatchReport, FileSyncReport, FolderSync, SyncEngine};
pub use frontmatter::{parse, vanity_url, write_sync_metadata, Document};
pub use lifecycle::{PageDraft, PageLifecycle, PageOutcome, UpdateStrategy};
pub use limits::{measure, validate, Limits, MAX_BLOCKS_PER_REQUEST, MAX_NESTING_DEPTH};
pub use notice::{MemoryNotifier, Notice, Notifier, TracingNotifier};
pub use pacer::Pacer;
pub use properties::{extract_tags, map_properties};
pub use report::{render_report, ErrorRecord, REPORT_TITLE};
