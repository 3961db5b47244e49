use std::fs;
use std::path::PathBuf;

use chrono::Utc;

use super::{Draft, Snippet};
use crate::errors::{QvError, Result};

/// Snippets created while the service was unreachable, kept in a JSON file.
/// Nothing here is ever sent back to the service.
pub struct LocalCache {
    path: PathBuf,
}

impl LocalCache {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn load(&self) -> Result<Vec<Snippet>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                serde_json::from_str(&contents).map_err(|e| QvError::Cache(e.to_string()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(QvError::Cache(e.to_string())),
        }
    }

    /// Stores a draft locally, numbered by the current time in milliseconds.
    pub fn save_draft(&self, draft: Draft) -> Result<Snippet> {
        let now = Utc::now();
        let snippet = draft.into_snippet(now.timestamp_millis(), now);
        let mut snippets = self.load()?;
        snippets.push(snippet.clone());
        self.write(&snippets)?;
        Ok(snippet)
    }

    fn write(&self, snippets: &[Snippet]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| QvError::Cache(e.to_string()))?;
        }
        let json = serde_json::to_string(snippets).map_err(|e| QvError::Cache(e.to_string()))?;
        fs::write(&self.path, json).map_err(|e| QvError::Cache(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn draft(title: &str) -> Draft {
        Draft::parse(title, "", "SELECT 1", "a", "").unwrap()
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let cache = LocalCache::new(dir.path().join("cache.json"));
        assert!(cache.load().unwrap().is_empty());
    }

    #[test]
    fn test_save_draft_appends() {
        let dir = TempDir::new().unwrap();
        let cache = LocalCache::new(dir.path().join("sub/cache.json"));
        let first = cache.save_draft(draft("first")).unwrap();
        cache.save_draft(draft("second")).unwrap();

        let loaded = cache.load().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0], first);
        assert_eq!(loaded[1].title, "second");
        assert_eq!(loaded[1].tags, vec!["a"]);
        assert!(!loaded[1].favorite);
    }

    #[test]
    fn test_local_id_is_millisecond_timestamp() {
        let dir = TempDir::new().unwrap();
        let cache = LocalCache::new(dir.path().join("cache.json"));
        let before = Utc::now().timestamp_millis();
        let snippet = cache.save_draft(draft("t")).unwrap();
        assert!(snippet.id >= before);
        assert_eq!(snippet.id, snippet.created_at.timestamp_millis());
    }

    #[test]
    fn test_corrupt_file_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.json");
        fs::write(&path, "not json").unwrap();
        let cache = LocalCache::new(path);
        assert!(matches!(cache.load(), Err(QvError::Cache(_))));
    }
}
