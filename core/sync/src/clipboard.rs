//! Copying page links to the system clipboard.

use async_trait::async_trait;
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use notionsync_common::{Error, Result};

/// Destination for copied links. Failures never abort a sync.
#[async_trait]
pub trait Clipboard: Send + Sync {
    async fn copy(&self, text: &str) -> Result<()>;
}

/// Clipboard that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoClipboard;

#[async_trait]
impl Clipboard for NoClipboard {
    async fn copy(&self, _text: &str) -> Result<()> {
        Ok(())
    }
}

/// Clipboard backed by the platform's copy utility, fed through stdin.
#[derive(Debug, Clone)]
pub struct CommandClipboard {
    program: String,
    args: Vec<String>,
}

impl CommandClipboard {
    pub fn new(program: impl Into<String>, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// The usual copy utility of the current platform.
    pub fn system() -> Self {
        if cfg!(target_os = "macos") {
            Self::new("pbcopy", &[])
        } else if cfg!(target_os = "windows") {
            Self::new("clip", &[])
        } else if std::env::var_os("WAYLAND_DISPLAY").is_some() {
            Self::new("wl-copy", &[])
        } else {
            Self::new("xclip", &["-selection", "clipboard"])
        }
    }
}

#[async_trait]
impl Clipboard for CommandClipboard {
    async fn copy(&self, text: &str) -> Result<()> {
        debug!("Copying {} bytes with {}", text.len(), self.program);

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| Error::ClipboardFailed(format!("{}: {}", self.program, e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(text.as_bytes())
                .await
                .map_err(|e| Error::ClipboardFailed(e.to_string()))?;
        }

        let status = child
            .wait()
            .await
            .map_err(|e| Error::ClipboardFailed(e.to_string()))?;
        if !status.success() {
            return Err(Error::ClipboardFailed(format!(
                "{} exited with {}",
                self.program, status
            )));
        }
        Ok(())
    }
}

/// Clipboard that remembers what was copied.
#[derive(Debug, Default, Clone)]
pub struct MemoryClipboard {
    copied: Arc<Mutex<Vec<String>>>,
    fail: bool,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// A clipboard whose every copy fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn copied(&self) -> Vec<String> {
        self.copied
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl Clipboard for MemoryClipboard {
    async fn copy(&self, text: &str) -> Result<()> {
        if self.fail {
            return Err(Error::ClipboardFailed("clipboard unavailable".to_string()));
        }
        self.copied
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(text.to_string());
        Ok(())
    }
}
