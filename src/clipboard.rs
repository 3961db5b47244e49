use arboard::Clipboard;

use crate::errors::{QvError, Result};

/// Somewhere text can be copied to.
pub trait ClipboardSink {
    fn set_text(&mut self, text: &str) -> Result<()>;
}

/// The system clipboard.
pub struct SystemClipboard;

impl ClipboardSink for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<()> {
        write_text_to_clipboard(text)
    }
}

pub fn write_text_to_clipboard(text: &str) -> Result<()> {
    let mut cb = Clipboard::new().map_err(|e| QvError::Clipboard(e.to_string()))?;
    cb.set_text(text).map_err(|e| QvError::Clipboard(e.to_string()))
}
