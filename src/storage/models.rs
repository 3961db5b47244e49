use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct Snippet {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub body: String,
    pub author: Option<String>,
    pub favorite: bool,
    pub created_at: DateTime<Utc>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct NewSnippet {
    pub title: String,
    pub description: Option<String>,
    pub body: String,
    pub author: Option<String>,
    pub tags: Vec<String>,
}

#[derive(Debug, Default)]
pub struct SnippetQuery {
    pub search: Option<String>,
}

impl SnippetQuery {
    pub fn search(term: impl Into<String>) -> Self {
        Self {
            search: Some(term.into()),
        }
    }

    /// The search term, if there is a non-empty one.
    pub fn term(&self) -> Option<&str> {
        self.search.as_deref().filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Serialize)]
pub struct StorageStats {
    pub snippets: i64,
    pub tags: i64,
    pub links: i64,
    pub oldest: Option<DateTime<Utc>>,
    pub newest: Option<DateTime<Utc>>,
}
