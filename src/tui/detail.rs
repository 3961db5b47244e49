use std::time::{Duration, Instant};

use crate::client::Snippet;
use crate::clipboard::ClipboardSink;
use crate::errors::Result;

/// Lines shown before a body needs expanding.
pub const COLLAPSED_LINES: usize = 10;
pub const CONTINUATION: &str = "-- ...";
pub const COPIED_FLASH: Duration = Duration::from_secs(2);

/// Read-only view of one snippet.
pub struct DetailView {
    pub snippet: Snippet,
    expanded: bool,
    copied_at: Option<Instant>,
    pub scroll: u16,
}

impl DetailView {
    pub fn new(snippet: Snippet) -> Self {
        Self {
            snippet,
            expanded: false,
            copied_at: None,
            scroll: 0,
        }
    }

    /// Lines split on `\n`, so a trailing newline counts as one more
    /// empty line.
    pub fn line_count(&self) -> usize {
        self.snippet.content.split('\n').count()
    }

    pub fn is_long(&self) -> bool {
        self.line_count() > COLLAPSED_LINES
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    /// The body as shown: truncated with a continuation marker while a
    /// long body is collapsed.
    pub fn display_body(&self) -> Vec<&str> {
        let mut lines: Vec<&str> = self.snippet.content.split('\n').collect();
        if self.is_long() && !self.expanded {
            lines.truncate(COLLAPSED_LINES);
            lines.push(CONTINUATION);
        }
        lines
    }

    pub fn toggle_expanded(&mut self) {
        if self.is_long() {
            self.expanded = !self.expanded;
            self.scroll = 0;
        }
    }

    /// Label for the expand toggle, or `None` when the body is short.
    pub fn expand_label(&self) -> Option<String> {
        if !self.is_long() {
            return None;
        }
        Some(if self.expanded {
            "Show less".to_string()
        } else {
            format!("Show all ({} lines)", self.line_count())
        })
    }

    /// Copies the full body, whatever is currently displayed.
    pub fn copy(&mut self, sink: &mut impl ClipboardSink, now: Instant) -> Result<()> {
        sink.set_text(&self.snippet.content)?;
        self.copied_at = Some(now);
        Ok(())
    }

    pub fn is_copied(&self, now: Instant) -> bool {
        self.copied_at
            .is_some_and(|at| now.saturating_duration_since(at) < COPIED_FLASH)
    }

    pub fn created_label(&self) -> String {
        self.snippet.created_at.format("%d %b %Y, %H:%M").to_string()
    }
}
