//! Client side of the service: the shape the UI works with, the HTTP gateway,
//! and the local fallback cache.

pub mod cache;
pub mod gateway;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::wire::{CreateSnippetDto, SnippetDto};
use crate::errors::{QvError, Result};

pub use gateway::{Gateway, SnippetGateway};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snippet {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub author: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub favorite: bool,
}

impl From<SnippetDto> for Snippet {
    fn from(dto: SnippetDto) -> Self {
        Self {
            id: dto.id,
            title: dto.title,
            content: dto.sql,
            description: dto.description,
            tags: dto.tags,
            author: dto.author,
            created_at: dto.created_at,
            favorite: dto.favorite,
        }
    }
}

/// A snippet the user wants to create.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Draft {
    pub title: String,
    pub description: Option<String>,
    pub sql: String,
    pub tags: Vec<String>,
    pub author: Option<String>,
}

impl Draft {
    /// Builds a draft from raw form input. Every field is trimmed, empty
    /// optional fields become absent, and tags are split on commas.
    pub fn parse(
        title: &str,
        description: &str,
        sql: &str,
        tags: &str,
        author: &str,
    ) -> Result<Draft> {
        let title = title.trim();
        let sql = sql.trim();
        if title.is_empty() || sql.is_empty() {
            return Err(QvError::InvalidInput(
                "Title and SQL are required".to_string(),
            ));
        }
        Ok(Draft {
            title: title.to_string(),
            description: non_empty(description),
            sql: sql.to_string(),
            tags: split_tags(tags),
            author: non_empty(author),
        })
    }

    pub fn into_snippet(self, id: i64, created_at: DateTime<Utc>) -> Snippet {
        Snippet {
            id,
            title: self.title,
            content: self.sql,
            description: self.description,
            tags: self.tags,
            author: self.author,
            created_at,
            favorite: false,
        }
    }

    pub fn to_request(&self) -> CreateSnippetDto {
        CreateSnippetDto {
            title: Some(self.title.clone()),
            description: self.description.clone(),
            sql: Some(self.sql.clone()),
            tags: Some(self.tags.clone()),
            author: self.author.clone(),
        }
    }
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

/// Comma separated tag input; empty segments are dropped.
pub fn split_tags(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

/// Where a gateway result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Service,
    /// The service was unreachable; this is the local copy and may be stale.
    LocalCache,
}

#[derive(Debug, Clone)]
pub struct Fetched<T> {
    pub value: T,
    pub source: Source,
}

impl<T> Fetched<T> {
    pub fn service(value: T) -> Self {
        Self {
            value,
            source: Source::Service,
        }
    }

    pub fn cached(value: T) -> Self {
        Self {
            value,
            source: Source::LocalCache,
        }
    }

    pub fn is_stale(&self) -> bool {
        self.source == Source::LocalCache
    }
}
