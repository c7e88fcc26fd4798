//! Error records of a batch run and the report document built from them.

use chrono::{DateTime, Utc};
use serde::Serialize;

use notionsync_common::{DocumentPath, Result};

/// Title of the report document, also used as its file stem.
pub const REPORT_TITLE: &str = "Notion export error report";

/// A file that did not fully sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorRecord {
    pub path: DocumentPath,
    pub reason: String,
    pub occurred_at: DateTime<Utc>,
}

impl ErrorRecord {
    pub fn new(path: DocumentPath, reason: impl Into<String>) -> Self {
        Self {
            path,
            reason: reason.into(),
            occurred_at: Utc::now(),
        }
    }
}

/// Location of the report in the vault root.
pub fn report_path() -> Result<DocumentPath> {
    DocumentPath::from_components(vec![format!("{}.md", REPORT_TITLE)])
}

/// Markdown listing one `[[path]] - reason` line per record.
pub fn render_report(records: &[ErrorRecord]) -> String {
    let mut out = format!("# {}\n\n", REPORT_TITLE);
    for record in records {
        // Reasons may span lines; keep one record per line.
        let reason = record.reason.replace(['\r', '\n'], " ");
        out.push_str(&format!("[[{}]] - {}\n", record.path, reason));
    }
    out
}
