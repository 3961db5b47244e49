pub mod models;
pub mod schema;
pub mod sqlite;

use crate::errors::Result;
use models::{NewSnippet, Snippet, SnippetQuery, StorageStats};

pub trait SnippetStorage {
    fn insert(&self, snippet: NewSnippet) -> Result<Snippet>;
    fn get_by_id(&self, id: i64) -> Result<Snippet>;
    fn list(&self, query: SnippetQuery) -> Result<Vec<Snippet>>;
    fn list_tags(&self) -> Result<Vec<String>>;
    fn ping(&self) -> Result<i64>;
    fn stats(&self) -> Result<StorageStats>;
}
