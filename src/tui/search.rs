use std::time::{Duration, Instant};

use crate::client::Snippet;

pub const MAX_SUGGESTIONS: usize = 8;

/// Time between losing focus and hiding the suggestions, so a click on a
/// suggestion still lands.
pub const BLUR_DISMISS_DELAY: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestionKind {
    Title,
    Tag,
    Author,
}

impl SuggestionKind {
    pub fn label(&self) -> &'static str {
        match self {
            SuggestionKind::Title => "Snippet",
            SuggestionKind::Tag => "Tag",
            SuggestionKind::Author => "Author",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub kind: SuggestionKind,
    pub text: String,
}

impl Suggestion {
    /// The search term that activating this suggestion produces.
    pub fn term(&self) -> String {
        match self.kind {
            SuggestionKind::Title => self.text.clone(),
            SuggestionKind::Tag => format!("#{}", self.text),
            SuggestionKind::Author => format!("@{}", self.text),
        }
    }
}

/// Titles, then distinct tags, then distinct authors containing `term`.
pub fn suggestions(snippets: &[Snippet], term: &str) -> Vec<Suggestion> {
    if term.is_empty() {
        return Vec::new();
    }
    let needle = term.to_lowercase();
    let matches = |s: &str| s.to_lowercase().contains(&needle);

    let mut out: Vec<Suggestion> = snippets
        .iter()
        .filter(|s| matches(&s.title))
        .map(|s| Suggestion {
            kind: SuggestionKind::Title,
            text: s.title.clone(),
        })
        .collect();

    let mut seen_tags: Vec<&str> = Vec::new();
    for tag in snippets.iter().flat_map(|s| &s.tags) {
        if !seen_tags.contains(&tag.as_str()) {
            seen_tags.push(tag);
        }
    }
    out.extend(seen_tags.into_iter().filter(|t| matches(t)).map(|t| Suggestion {
        kind: SuggestionKind::Tag,
        text: t.to_string(),
    }));

    let mut seen_authors: Vec<&str> = Vec::new();
    for author in snippets.iter().filter_map(|s| s.author.as_deref()) {
        if !author.is_empty() && !seen_authors.contains(&author) {
            seen_authors.push(author);
        }
    }
    out.extend(seen_authors.into_iter().filter(|a| matches(a)).map(|a| Suggestion {
        kind: SuggestionKind::Author,
        text: a.to_string(),
    }));

    out.truncate(MAX_SUGGESTIONS);
    out
}

/// Splits `text` into `(fragment, is_match)` pieces around case-insensitive
/// occurrences of `term`.
pub fn highlight(text: &str, term: &str) -> Vec<(String, bool)> {
    let lower = text.to_lowercase();
    let needle = term.to_lowercase();
    // Byte offsets are only shared when lowercasing keeps every length.
    if needle.is_empty() || lower.len() != text.len() {
        return vec![(text.to_string(), false)];
    }

    let mut parts = Vec::new();
    let mut pos = 0;
    while let Some(found) = lower[pos..].find(&needle) {
        let start = pos + found;
        let end = start + needle.len();
        if start > pos {
            parts.push((text[pos..start].to_string(), false));
        }
        parts.push((text[start..end].to_string(), true));
        pos = end;
    }
    if pos < text.len() {
        parts.push((text[pos..].to_string(), false));
    }
    parts
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKey {
    Down,
    Up,
    Enter,
    Escape,
}

#[derive(Debug, PartialEq, Eq)]
pub enum SearchOutcome {
    Ignored,
    Moved,
    /// A suggestion was picked; this is the new search term.
    Activated(String),
    /// The list was dismissed and focus released.
    Dismissed,
}

/// Suggestion list state of the search input.
#[derive(Debug, Default)]
pub struct SearchBox {
    suggestions: Vec<Suggestion>,
    selected: Option<usize>,
    visible: bool,
    focused: bool,
    hide_at: Option<Instant>,
}

impl SearchBox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn suggestions(&self) -> &[Suggestion] {
        &self.suggestions
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    /// Recomputes the suggestions for a new term or snippet set.
    pub fn update(&mut self, snippets: &[Snippet], term: &str) {
        self.suggestions = suggestions(snippets, term);
        self.visible = !self.suggestions.is_empty();
        self.selected = None;
    }

    /// Recomputes after the snippet set changed without reopening the list.
    pub fn refresh(&mut self, snippets: &[Snippet], term: &str) {
        self.suggestions = suggestions(snippets, term);
        self.selected = None;
        if self.suggestions.is_empty() {
            self.visible = false;
        }
    }

    pub fn focus(&mut self, term: &str) {
        self.focused = true;
        self.hide_at = None;
        if !term.is_empty() && !self.suggestions.is_empty() {
            self.visible = true;
        }
    }

    pub fn blur(&mut self, now: Instant) {
        self.focused = false;
        self.hide_at = Some(now + BLUR_DISMISS_DELAY);
    }

    /// Applies a pending blur once its delay has passed.
    pub fn tick(&mut self, now: Instant) {
        if let Some(at) = self.hide_at
            && now >= at
        {
            self.visible = false;
            self.hide_at = None;
        }
    }

    pub fn dismiss(&mut self) {
        self.visible = false;
        self.selected = None;
    }

    pub fn handle_key(&mut self, key: SearchKey) -> SearchOutcome {
        if !self.visible || self.suggestions.is_empty() {
            return SearchOutcome::Ignored;
        }
        let last = self.suggestions.len() - 1;
        match key {
            SearchKey::Down => {
                self.selected = match self.selected {
                    Some(i) if i < last => Some(i + 1),
                    _ => Some(0),
                };
                SearchOutcome::Moved
            }
            SearchKey::Up => {
                self.selected = match self.selected {
                    Some(i) if i > 0 => Some(i - 1),
                    _ => Some(last),
                };
                SearchOutcome::Moved
            }
            SearchKey::Enter => match self.selected {
                Some(i) => self.activate(i),
                None => SearchOutcome::Ignored,
            },
            SearchKey::Escape => {
                self.dismiss();
                self.focused = false;
                SearchOutcome::Dismissed
            }
        }
    }

    pub fn activate(&mut self, index: usize) -> SearchOutcome {
        let Some(suggestion) = self.suggestions.get(index) else {
            return SearchOutcome::Ignored;
        };
        let term = suggestion.term();
        self.dismiss();
        self.focused = true;
        SearchOutcome::Activated(term)
    }
}
