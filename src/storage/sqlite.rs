use chrono::Utc;
use rusqlite::functions::FunctionFlags;
use rusqlite::{Connection, Row, params};

use super::SnippetStorage;
use super::models::{NewSnippet, Snippet, SnippetQuery, StorageStats};
use super::schema;
use crate::errors::{QvError, Result};

/// Separator for aggregated tag names. Tag names may contain commas.
const TAG_SEPARATOR: char = '\u{1f}';

const BASE_SELECT: &str = "
    SELECT s.id, s.title, s.description, s.sql_code, s.author,
           s.favorite, s.created_at,
           GROUP_CONCAT(t.name, char(31)) AS tags
    FROM snippets s
    LEFT JOIN snippet_tags st ON st.snippet_id = s.id
    LEFT JOIN tags t ON t.id = st.tag_id
";

pub struct SqliteStorage {
    conn: Connection,
}

fn row_to_snippet(row: &Row) -> rusqlite::Result<Snippet> {
    let favorite_int: i32 = row.get(5)?;
    let tags_str: Option<String> = row.get(7)?;
    let tags = match tags_str {
        Some(s) => s.split(TAG_SEPARATOR).map(String::from).collect(),
        None => Vec::new(),
    };
    Ok(Snippet {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        body: row.get(3)?,
        author: row.get(4)?,
        favorite: favorite_int != 0,
        created_at: row.get(6)?,
        tags,
    })
}

/// SQL name of the Unicode lowercasing function. SQLite's own `lower()` and
/// `LIKE` only fold ASCII.
const FOLD_FN: &str = "unicode_lower";

fn register_fold(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        FOLD_FN,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| Ok(ctx.get::<Option<String>>(0)?.map(|s| s.to_lowercase())),
    )
}

/// Lowercased `%term%` with LIKE wildcards in the term matched literally.
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

impl SqliteStorage {
    pub fn new(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        register_fold(&conn)?;
        conn.execute(schema::CREATE_SNIPPETS_TABLE, [])?;
        conn.execute(schema::CREATE_TAGS_TABLE, [])?;
        conn.execute(schema::CREATE_SNIPPET_TAGS_TABLE, [])?;
        conn.execute(schema::CREATE_INDEX_CREATED_AT, [])?;
        conn.execute(schema::CREATE_INDEX_TAG_ID, [])?;
        Ok(Self { conn })
    }

    pub fn open(path: &std::path::Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        Self::new(Connection::open(path)?)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::new(conn)
    }

    #[cfg(test)]
    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}

impl SnippetStorage for SqliteStorage {
    fn insert(&self, snippet: NewSnippet) -> Result<Snippet> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO snippets (title, description, sql_code, author, favorite, created_at)
             VALUES (?, ?, ?, ?, 0, ?)",
            params![
                snippet.title,
                snippet.description,
                snippet.body,
                snippet.author,
                Utc::now(),
            ],
        )?;
        let id = tx.last_insert_rowid();

        for tag in &snippet.tags {
            tx.execute("INSERT OR IGNORE INTO tags (name) VALUES (?)", params![tag])?;
            let tag_id: i64 =
                tx.query_row("SELECT id FROM tags WHERE name = ?", params![tag], |row| {
                    row.get(0)
                })?;
            tx.execute(
                "INSERT OR IGNORE INTO snippet_tags (snippet_id, tag_id) VALUES (?, ?)",
                params![id, tag_id],
            )?;
        }
        tx.commit()?;

        self.get_by_id(id)
    }

    fn get_by_id(&self, id: i64) -> Result<Snippet> {
        let sql = format!("{} WHERE s.id = ? GROUP BY s.id", BASE_SELECT);
        self.conn
            .query_row(&sql, params![id], row_to_snippet)
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => {
                    QvError::NotFound(format!("Snippet with id {} not found", id))
                }
                other => QvError::Storage(other),
            })
    }

    fn list(&self, query: SnippetQuery) -> Result<Vec<Snippet>> {
        let order = "GROUP BY s.id ORDER BY s.created_at DESC, s.id DESC";
        let snippets = match query.term() {
            Some(term) => {
                let sql = format!(
                    "{base} WHERE {fold}(s.title) LIKE ?1 ESCAPE '\\' \
                     OR {fold}(s.sql_code) LIKE ?1 ESCAPE '\\' {order}",
                    base = BASE_SELECT,
                    fold = FOLD_FN,
                );
                let mut stmt = self.conn.prepare(&sql)?;
                let rows = stmt
                    .query_map(params![like_pattern(term)], row_to_snippet)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                rows
            }
            None => {
                let sql = format!("{} {}", BASE_SELECT, order);
                let mut stmt = self.conn.prepare(&sql)?;
                let rows = stmt
                    .query_map([], row_to_snippet)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                rows
            }
        };
        Ok(snippets)
    }

    fn list_tags(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT name FROM tags ORDER BY name")?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(names)
    }

    fn ping(&self) -> Result<i64> {
        Ok(self.conn.query_row("SELECT 1 AS test", [], |row| row.get(0))?)
    }

    fn stats(&self) -> Result<StorageStats> {
        self.conn
            .query_row(
                "SELECT
                    (SELECT COUNT(*) FROM snippets),
                    (SELECT COUNT(*) FROM tags),
                    (SELECT COUNT(*) FROM snippet_tags),
                    (SELECT MIN(created_at) FROM snippets),
                    (SELECT MAX(created_at) FROM snippets)",
                [],
                |row| {
                    Ok(StorageStats {
                        snippets: row.get(0)?,
                        tags: row.get(1)?,
                        links: row.get(2)?,
                        oldest: row.get(3)?,
                        newest: row.get(4)?,
                    })
                },
            )
            .map_err(QvError::Storage)
    }
}
