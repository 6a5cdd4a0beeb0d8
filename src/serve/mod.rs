//! Read-only HTTP interface over the mirrored catalog.
//!
//! The database is a single connection behind a mutex; every query and every
//! image resize runs on the blocking pool.

pub mod images;

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::config::Config;
use crate::db::query::{
    truthy, FilterOptions, LibraryStats, Page, PhotoDetail, PhotoQuery, Suggestion,
};
use crate::db::{Database, Photo, Store};

pub use images::ThumbnailRenderer;

#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    #[error("Photo not found")]
    NotFound,

    #[error("Error generating thumbnail: {0}")]
    Image(#[from] image::ImageError),

    #[error("Error serving photo: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ServeError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServeError::NotFound => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
        (status, self.to_string()).into_response()
    }
}

#[derive(Clone)]
pub struct AppState {
    db: Arc<Mutex<Database>>,
    thumbnails: ThumbnailRenderer,
    page_size: usize,
}

impl AppState {
    pub fn new(db: Database, config: &Config) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            thumbnails: ThumbnailRenderer::new(&config.thumbnails),
            page_size: config.server.page_size.max(1) as usize,
        }
    }

    /// Run `f` against the database on the blocking pool.
    async fn with_store<T, F>(&self, f: F) -> Result<T, ServeError>
    where
        F: FnOnce(Store<'_>) -> anyhow::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = Arc::clone(&self.db);
        let result = tokio::task::spawn_blocking(move || {
            let db = db
                .lock()
                .map_err(|_| anyhow::anyhow!("database lock poisoned"))?;
            f(db.store())
        })
        .await
        .map_err(|e| ServeError::Internal(e.into()))?;

        Ok(result?)
    }

    async fn photo(&self, id: i64) -> Result<Photo, ServeError> {
        self.with_store(move |store| store.get_photo(id))
            .await?
            .ok_or(ServeError::NotFound)
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/photos", get(list_photos))
        .route("/api/photos/:id", get(photo_detail))
        .route("/api/filters", get(filter_options))
        .route("/api/stats", get(library_stats))
        .route("/api/search", get(search))
        .route("/photo/:id/thumbnail", get(thumbnail))
        .route("/photo/:id/full", get(full_image))
        .with_state(state)
}

// ============================================================================
// JSON endpoints
// ============================================================================

async fn list_photos(
    State(state): State<AppState>,
    Query(query): Query<PhotoQuery>,
) -> Result<Json<Page<Photo>>, ServeError> {
    let page_size = state.page_size;
    let page = state
        .with_store(move |store| store.list_photos(&query, page_size))
        .await?;
    Ok(Json(page))
}

async fn photo_detail(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<PhotoDetail>, ServeError> {
    state
        .with_store(move |store| store.photo_detail(id))
        .await?
        .map(Json)
        .ok_or(ServeError::NotFound)
}

async fn filter_options(State(state): State<AppState>) -> Result<Json<FilterOptions>, ServeError> {
    let options = state.with_store(|store| store.filter_options()).await?;
    Ok(Json(options))
}

async fn library_stats(State(state): State<AppState>) -> Result<Json<LibraryStats>, ServeError> {
    let stats = state.with_store(|store| store.library_stats()).await?;
    Ok(Json(stats))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SearchParams {
    q: String,
}

#[derive(Debug, Serialize)]
struct SearchResponse {
    suggestions: Vec<Suggestion>,
}

async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ServeError> {
    let suggestions = state
        .with_store(move |store| store.autocomplete(&params.q))
        .await?;
    Ok(Json(SearchResponse { suggestions }))
}

// ============================================================================
// Images
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ThumbnailParams {
    size: Option<u32>,
}

/// A file on disk for a stored path, or `None` when it is blank or missing.
fn existing_file(path: &str) -> Option<PathBuf> {
    let path = PathBuf::from(path);
    (!path.as_os_str().is_empty() && path.is_file()).then_some(path)
}

async fn thumbnail(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(params): Query<ThumbnailParams>,
) -> Result<Response, ServeError> {
    let photo = state.photo(id).await?;
    let original = existing_file(&photo.fields.path).ok_or(ServeError::NotFound)?;

    let renderer = state.thumbnails.clone();
    let size = renderer.size_for(params.size);
    let bytes = tokio::task::spawn_blocking(move || renderer.render(&original, size))
        .await
        .map_err(|e| ServeError::Internal(e.into()))??;

    Ok(([(header::CONTENT_TYPE, "image/jpeg")], bytes).into_response())
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FullParams {
    #[serde(deserialize_with = "truthy")]
    edited: bool,
}

async fn full_image(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(params): Query<FullParams>,
) -> Result<Response, ServeError> {
    let photo = state.photo(id).await?;

    let fields = &photo.fields;
    let stored = if params.edited && !fields.path_edited.is_empty() {
        &fields.path_edited
    } else {
        &fields.path
    };
    let path = existing_file(stored).ok_or(ServeError::NotFound)?;

    let bytes = tokio::fs::read(&path).await?;

    let content_type = HeaderValue::from_str(&images::content_type(&path))
        .unwrap_or(HeaderValue::from_static("application/octet-stream"));
    let disposition = HeaderValue::from_str(&format!("inline; filename=\"{}\"", fields.filename))
        .unwrap_or(HeaderValue::from_static("inline"));

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}
