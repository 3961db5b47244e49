use chrono::Utc;
use tracing::{debug, warn};

use super::cache::LocalCache;
use super::{Draft, Fetched, Snippet};
use crate::api::wire::{CreatedDto, HealthDto, SnippetDto};
use crate::errors::{QvError, Result};

/// What the UI needs from the service.
pub trait SnippetGateway {
    fn load_all(&self) -> Result<Fetched<Vec<Snippet>>>;
    fn create(&self, draft: Draft) -> Result<Fetched<Snippet>>;
}

pub struct Gateway {
    agent: ureq::Agent,
    base_url: String,
    cache: LocalCache,
}

fn transport_error(e: ureq::Error) -> QvError {
    match e {
        ureq::Error::Status(code, _) => QvError::Gateway(format!("HTTP error! status: {code}")),
        other => QvError::Gateway(other.to_string()),
    }
}

fn decode_error(e: std::io::Error) -> QvError {
    QvError::Gateway(format!("invalid response body: {e}"))
}

impl Gateway {
    pub fn new(base_url: impl Into<String>, cache: LocalCache) -> Self {
        Self {
            agent: ureq::Agent::new(),
            base_url: base_url.into(),
            cache,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    fn fetch_snippets(&self, search: Option<&str>) -> Result<Vec<Snippet>> {
        let mut request = self.agent.get(&self.url("consultas"));
        if let Some(term) = search {
            request = request.query("search", term);
        }
        let dtos: Vec<SnippetDto> = request
            .call()
            .map_err(transport_error)?
            .into_json()
            .map_err(decode_error)?;
        Ok(dtos.into_iter().map(Snippet::from).collect())
    }

    /// Server-side search over title and body. Unlike [`Gateway::search`],
    /// a failure is returned to the caller.
    pub fn try_search(&self, term: &str) -> Result<Vec<Snippet>> {
        self.fetch_snippets(Some(term))
    }

    /// Server-side search over title and body. Failures yield no results.
    pub fn search(&self, term: &str) -> Vec<Snippet> {
        match self.try_search(term) {
            Ok(snippets) => snippets,
            Err(e) => {
                warn!(%e, term, "search failed");
                Vec::new()
            }
        }
    }

    pub fn list_tags(&self) -> Result<Vec<String>> {
        self.agent
            .get(&self.url("etiquetas"))
            .call()
            .map_err(transport_error)?
            .into_json()
            .map_err(decode_error)
    }

    /// Liveness of the service and its store. A reachable service with a
    /// broken store still answers, with status `ERROR`.
    pub fn health(&self) -> Result<HealthDto> {
        match self.agent.get(&self.url("test")).call() {
            Ok(response) => response.into_json().map_err(decode_error),
            Err(ureq::Error::Status(_, response)) => response.into_json().map_err(decode_error),
            Err(e) => Err(transport_error(e)),
        }
    }

    fn post_snippet(&self, draft: &Draft) -> Result<CreatedDto> {
        self.agent
            .post(&self.url("consultas"))
            .send_json(draft.to_request())
            .map_err(transport_error)?
            .into_json()
            .map_err(decode_error)
    }
}

impl SnippetGateway for Gateway {
    /// Every snippet from the service, or the local cache when the service
    /// cannot be reached.
    fn load_all(&self) -> Result<Fetched<Vec<Snippet>>> {
        match self.fetch_snippets(None) {
            Ok(snippets) => {
                debug!(count = snippets.len(), "loaded snippets from service");
                Ok(Fetched::service(snippets))
            }
            Err(e) => {
                warn!(%e, "service unavailable, using local cache");
                Ok(Fetched::cached(self.cache.load()?))
            }
        }
    }

    /// Creates the snippet on the service, or only in the local cache when
    /// the service cannot be reached.
    fn create(&self, draft: Draft) -> Result<Fetched<Snippet>> {
        match self.post_snippet(&draft) {
            Ok(created) => {
                debug!(id = created.id, "created snippet on service");
                Ok(Fetched::service(draft.into_snippet(created.id, Utc::now())))
            }
            Err(e) => {
                warn!(%e, "service unavailable, saving snippet locally");
                Ok(Fetched::cached(self.cache.save_draft(draft)?))
            }
        }
    }
}
