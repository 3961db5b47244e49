pub mod wire;

use std::future::Future;
use std::sync::{Arc, Mutex};

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::config::ServerConfig;
use crate::errors::{QvError, Result};
use crate::storage::SnippetStorage;
use crate::storage::models::SnippetQuery;
use crate::storage::sqlite::SqliteStorage;
use wire::{CreateSnippetDto, CreatedDto, ErrorDto, HealthDto, SnippetDto};

const GENERIC_ERROR: &str = "Internal server error";
const BAD_BODY: &str = "Request body must be a JSON snippet";

/// The one store handle of the process. Handlers borrow it per request.
#[derive(Clone)]
pub struct AppState {
    storage: Arc<Mutex<SqliteStorage>>,
}

impl AppState {
    pub fn new(storage: SqliteStorage) -> Self {
        Self {
            storage: Arc::new(Mutex::new(storage)),
        }
    }

    /// Leaves the store lock poisoned so every request fails.
    #[cfg(test)]
    pub(crate) fn poison(&self) {
        let storage = self.storage.clone();
        let _ = std::thread::spawn(move || {
            let _guard = storage.lock();
            panic!("store worker crashed");
        })
        .join();
    }

    /// Runs `f` against the store on the blocking pool.
    async fn with_storage<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&SqliteStorage) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let storage = self.storage.clone();
        tokio::task::spawn_blocking(move || {
            let guard = storage
                .lock()
                .map_err(|_| QvError::Server("storage lock poisoned".to_string()))?;
            f(&guard)
        })
        .await
        .map_err(|e| QvError::Server(format!("storage worker join error: {e}")))?
    }
}

#[derive(Debug, Deserialize)]
struct ListParams {
    search: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/consultas", get(list_snippets).post(create_snippet))
        .route("/api/etiquetas", get(list_tags))
        .route("/api/test", get(health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn json_error(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorDto {
            error: message.into(),
        }),
    )
        .into_response()
}

async fn list_snippets(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Response {
    let query = SnippetQuery {
        search: params.search,
    };
    match state.with_storage(move |s| s.list(query)).await {
        Ok(snippets) => {
            let body: Vec<SnippetDto> = snippets.into_iter().map(SnippetDto::from).collect();
            Json(body).into_response()
        }
        Err(e) => {
            error!(%e, "failed to list snippets");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, GENERIC_ERROR)
        }
    }
}

async fn create_snippet(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CreateSnippetDto>, JsonRejection>,
) -> Response {
    let body = match payload {
        Ok(Json(body)) => body,
        Err(rejection) => {
            warn!(%rejection, "rejected create body");
            return json_error(StatusCode::BAD_REQUEST, BAD_BODY);
        }
    };
    let new = match body.into_new_snippet() {
        Ok(new) => new,
        Err(reason) => {
            warn!(reason, "rejected create request");
            return json_error(StatusCode::BAD_REQUEST, reason);
        }
    };
    let tag_count = new.tags.len();

    match state.with_storage(move |s| s.insert(new)).await {
        Ok(snippet) => {
            info!(id = snippet.id, tags = tag_count, "created snippet");
            (
                StatusCode::CREATED,
                Json(CreatedDto {
                    id: snippet.id,
                    message: "Snippet created".to_string(),
                }),
            )
                .into_response()
        }
        Err(e) => {
            error!(%e, "failed to create snippet");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, GENERIC_ERROR)
        }
    }
}

async fn list_tags(State(state): State<AppState>) -> Response {
    match state.with_storage(|s| s.list_tags()).await {
        Ok(tags) => Json(tags).into_response(),
        Err(e) => {
            error!(%e, "failed to list tags");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, GENERIC_ERROR)
        }
    }
}

async fn health(State(state): State<AppState>) -> Response {
    match state.with_storage(|s| s.ping()).await {
        Ok(value) => Json(HealthDto {
            status: "OK".to_string(),
            message: "Database connection OK".to_string(),
            data: Some(serde_json::json!([{ "test": value }])),
        })
        .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(HealthDto {
                status: "ERROR".to_string(),
                message: e.to_string(),
                data: None,
            }),
        )
            .into_response(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(%e, "could not listen for ctrl-c, running until killed");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

/// Serves the API on an already bound listener until `shutdown` resolves.
pub async fn serve_listener<S>(listener: TcpListener, state: AppState, shutdown: S) -> Result<()>
where
    S: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| QvError::Server(e.to_string()))
}

/// Opens the store, binds, and serves until ctrl-c. The store is closed
/// when this returns.
pub async fn serve(config: ServerConfig) -> Result<()> {
    let storage = SqliteStorage::open(&config.db_path)?;
    info!(db = %config.db_path.display(), "connected to store");

    let addr = config.addr();
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| QvError::Server(format!("failed to bind {addr}: {e}")))?;
    info!(%addr, "query service listening");
    info!("API available at http://localhost:{}/api", config.port);
    info!("health check at http://localhost:{}/api/test", config.port);

    serve_listener(listener, AppState::new(storage), shutdown_signal()).await?;
    info!("query service stopped");
    Ok(())
}
