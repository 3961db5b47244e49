//! JSON bodies of the HTTP surface. Field names on the wire are the ones the
//! client has always spoken (`titulo`, `sql_codigo`, ...); the Rust side uses
//! English names and renames at the serde boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::models::{NewSnippet, Snippet};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnippetDto {
    pub id: i64,
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "descripcion")]
    pub description: Option<String>,
    #[serde(rename = "sql_codigo")]
    pub sql: String,
    #[serde(rename = "fecha_creacion")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "favorito", default)]
    pub favorite: bool,
    #[serde(rename = "autor")]
    pub author: Option<String>,
    #[serde(rename = "etiquetas", default)]
    pub tags: Vec<String>,
}

impl From<Snippet> for SnippetDto {
    fn from(s: Snippet) -> Self {
        Self {
            id: s.id,
            title: s.title,
            description: s.description,
            sql: s.body,
            created_at: s.created_at,
            favorite: s.favorite,
            author: s.author,
            tags: s.tags,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateSnippetDto {
    #[serde(rename = "titulo")]
    pub title: Option<String>,
    #[serde(rename = "descripcion", default)]
    pub description: Option<String>,
    #[serde(rename = "sql_codigo")]
    pub sql: Option<String>,
    #[serde(rename = "etiquetas", default)]
    pub tags: Option<Vec<String>>,
    #[serde(rename = "autor", default)]
    pub author: Option<String>,
}

impl CreateSnippetDto {
    /// Checks the required fields are present and not blank. Empty optional
    /// strings are stored as absent.
    pub fn into_new_snippet(self) -> Result<NewSnippet, &'static str> {
        let title = self
            .title
            .filter(|t| !t.trim().is_empty())
            .ok_or("titulo is required")?;
        let body = self
            .sql
            .filter(|s| !s.trim().is_empty())
            .ok_or("sql_codigo is required")?;
        Ok(NewSnippet {
            title,
            description: self.description.filter(|d| !d.is_empty()),
            body,
            author: self.author.filter(|a| !a.is_empty()),
            tags: self.tags.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedDto {
    pub id: i64,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDto {
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthDto {
    pub status: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub data: Option<serde_json::Value>,
}

impl HealthDto {
    pub fn is_ok(&self) -> bool {
        self.status == "OK"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snippet_dto_field_names() {
        let dto = SnippetDto {
            id: 7,
            title: "T".to_string(),
            description: None,
            sql: "S".to_string(),
            created_at: Utc::now(),
            favorite: false,
            author: Some("Ana".to_string()),
            tags: vec!["A".to_string()],
        };
        let value = serde_json::to_value(&dto).unwrap();
        let obj = value.as_object().unwrap();
        for key in [
            "id",
            "titulo",
            "descripcion",
            "sql_codigo",
            "fecha_creacion",
            "favorito",
            "autor",
            "etiquetas",
        ] {
            assert!(obj.contains_key(key), "missing {key}");
        }
        assert_eq!(obj["favorito"], serde_json::json!(false));
    }

    #[test]
    fn test_create_minimal_body() {
        let dto: CreateSnippetDto =
            serde_json::from_str(r#"{"titulo": "T", "sql_codigo": "S"}"#).unwrap();
        let new = dto.into_new_snippet().unwrap();
        assert_eq!(new.title, "T");
        assert_eq!(new.body, "S");
        assert!(new.tags.is_empty());
        assert!(new.description.is_none());
    }

    #[test]
    fn test_create_missing_title_rejected() {
        let dto: CreateSnippetDto = serde_json::from_str(r#"{"sql_codigo": "S"}"#).unwrap();
        assert_eq!(dto.into_new_snippet().unwrap_err(), "titulo is required");
    }

    #[test]
    fn test_create_blank_sql_rejected() {
        let dto: CreateSnippetDto =
            serde_json::from_str(r#"{"titulo": "T", "sql_codigo": "   "}"#).unwrap();
        assert_eq!(dto.into_new_snippet().unwrap_err(), "sql_codigo is required");
    }

    #[test]
    fn test_create_empty_optionals_become_none() {
        let dto: CreateSnippetDto = serde_json::from_str(
            r#"{"titulo": "T", "sql_codigo": "S", "descripcion": "", "autor": "", "etiquetas": null}"#,
        )
        .unwrap();
        let new = dto.into_new_snippet().unwrap();
        assert!(new.description.is_none());
        assert!(new.author.is_none());
        assert!(new.tags.is_empty());
    }
}
