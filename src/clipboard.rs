//! System clipboard access and the font-record payloads exchanged through it.

use std::path::PathBuf;

use arboard::Clipboard;

use crate::error::ClipboardError;
use crate::font_info::FontRecord;
use crate::paths;

/// Lazily opened handle to the system clipboard. Opening is retried on every
/// call until it succeeds.
#[derive(Default)]
pub struct SystemClipboard {
    inner: Option<Clipboard>,
}

impl std::fmt::Debug for SystemClipboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemClipboard")
            .field("open", &self.inner.is_some())
            .finish()
    }
}

impl SystemClipboard {
    pub fn new() -> Self {
        let inner = Clipboard::new()
            .inspect_err(|e| tracing::warn!("Failed to initialize clipboard support: {e}"))
            .ok();
        Self { inner }
    }

    fn handle(&mut self) -> Result<&mut Clipboard, ClipboardError> {
        if self.inner.is_none() {
            self.inner = Some(Clipboard::new()?);
        }
        self.inner.as_mut().ok_or(ClipboardError::Empty)
    }

    pub fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        self.handle()?.set_text(text.to_string())?;
        tracing::debug!("Copied {} chars to clipboard", text.len());
        Ok(())
    }

    pub fn get_text(&mut self) -> Result<String, ClipboardError> {
        Ok(self.handle()?.get_text()?)
    }
}

/// What a paste into a category found on the clipboard.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// A font record copied as JSON.
    Record(FontRecord),
    /// A bare font path.
    Path(PathBuf),
}

impl Payload {
    /// Interpret clipboard text as a JSON font record or, failing that, a path.
    pub fn parse(text: &str) -> Result<Self, ClipboardError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ClipboardError::Empty);
        }
        if text.starts_with('{') {
            if let Ok(record) = serde_json::from_str::<FontRecord>(text) {
                if !record.font_path.as_os_str().is_empty() {
                    return Ok(Payload::Record(record));
                }
            }
        }
        Ok(Payload::Path(paths::expand(text)))
    }

    pub fn font_path(&self) -> PathBuf {
        match self {
            Payload::Record(r) => paths::expand(&r.font_path),
            Payload::Path(p) => p.clone(),
        }
    }
}

/// Pretty JSON for copying a record to the clipboard.
pub fn record_json(record: &FontRecord) -> Result<String, ClipboardError> {
    Ok(record.to_json()?)
}
