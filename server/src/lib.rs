use anyhow::Result;
use axum::{extract::{Query, State}, http::{HeaderMap, StatusCode}, routing::{get, post}, Json, Router};
use docindex::source::{dedup_locations, load_records_from};
use docindex::{checked_limit, Category, Index, IndexBuilder, IndexConfig, Record, SearchError, SearchOptions, DEFAULT_LIMIT};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

const MAX_K: usize = 100;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Search index file or directory the index is (re)built from.
    pub source: PathBuf,
    pub index: IndexConfig,
    pub keep_first_duplicate: bool,
    pub admin_token: Option<String>,
    /// Comma-separated list of allowed origins; any origin when unset.
    pub cors_allow_origin: Option<String>,
}

impl ServerConfig {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            index: IndexConfig::default(),
            keep_first_duplicate: false,
            admin_token: None,
            cors_allow_origin: None,
        }
    }
}

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    pub k: Option<i64>,
    pub category: Option<String>,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_ms: u128,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<SearchHit>,
}

#[derive(Serialize)]
pub struct SearchHit {
    pub location: String,
    pub page: String,
    pub title: String,
    pub text: String,
    pub category: Category,
    pub score: f32,
}

#[derive(Deserialize)]
pub struct DocParams {
    pub location: String,
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    /// Swapped wholesale on reload; readers clone the inner Arc and search without holding the lock.
    pub index: Arc<RwLock<Arc<Index>>>,
}

impl AppState {
    pub fn current(&self) -> Arc<Index> { self.index.read().clone() }
}

/// Load the record source and build a fresh index.
pub fn load_index(config: &ServerConfig) -> Result<Index> {
    let mut records = load_records_from(&config.source)?;
    if config.keep_first_duplicate {
        let (kept, dropped) = dedup_locations(records);
        for location in &dropped {
            tracing::warn!(location = %location, "dropping record with duplicate location");
        }
        records = kept;
    }
    let index = IndexBuilder::new(config.index.clone()).build(&records)?;
    tracing::info!(num_docs = index.len(), num_terms = index.num_terms(), "index loaded");
    Ok(index)
}

pub fn build_app(config: ServerConfig) -> Result<Router> {
    let index = load_index(&config)?;
    let cors = cors_layer(config.cors_allow_origin.as_deref());
    let app_state = AppState { config: Arc::new(config), index: Arc::new(RwLock::new(Arc::new(index))) };

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/doc", get(doc_handler))
        .route("/index/reload", post(reload_handler))
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);
    Ok(app)
}

fn cors_layer(allow_origin: Option<&str>) -> CorsLayer {
    let origins: Vec<_> = allow_origin
        .unwrap_or_default()
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();
    if origins.is_empty() {
        CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
    } else {
        CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
    }
}

pub async fn search_handler(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Result<Json<SearchResponse>, (StatusCode, String)> {
    let start = std::time::Instant::now();
    let k = match params.k {
        Some(raw) => checked_limit(raw).map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?,
        None => DEFAULT_LIMIT,
    };
    let category = params
        .category
        .as_deref()
        .map(str::parse::<Category>)
        .transpose()
        .map_err(|e| (StatusCode::BAD_REQUEST, e))?;

    let index = state.current();
    let hits = index.search_with(&params.q, &SearchOptions { limit: k.min(MAX_K), category });
    let results = hits
        .results
        .iter()
        .map(|h| SearchHit {
            location: h.record.location.clone(),
            page: h.record.page.clone(),
            title: h.record.title.clone(),
            text: h.record.text.clone(),
            category: h.record.category,
            score: h.score,
        })
        .collect();

    let elapsed = start.elapsed();
    Ok(Json(SearchResponse { query: params.q, took_ms: elapsed.as_millis(), took_s: elapsed.as_secs_f64(), total_hits: hits.total_hits, results }))
}

pub async fn doc_handler(State(state): State<AppState>, Query(params): Query<DocParams>) -> Result<Json<Record>, (StatusCode, String)> {
    match state.current().get(&params.location) {
        Some(record) => Ok(Json(record.clone())),
        None => Err((StatusCode::NOT_FOUND, format!("no record at location {:?}", params.location))),
    }
}

/// Rebuild the index from the configured source and swap it in. On failure the
/// previous index keeps serving.
async fn reload_handler(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    authorize(&state, &headers)?;
    let config = state.config.clone();
    let built = tokio::task::spawn_blocking(move || load_index(&config))
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    let index = match built {
        Ok(index) => index,
        Err(err) => {
            tracing::warn!(error = %format!("{err:#}"), "index reload failed");
            let status = match err.downcast_ref::<SearchError>() {
                Some(SearchError::DuplicateKey { .. }) => StatusCode::UNPROCESSABLE_ENTITY,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            return Err((status, format!("{err:#}")));
        }
    };
    let num_docs = index.len();
    *state.index.write() = Arc::new(index);
    tracing::info!(num_docs, "index reloaded");
    Ok(Json(serde_json::json!({ "num_docs": num_docs })))
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), (StatusCode, String)> {
    let required = match &state.config.admin_token {
        Some(t) => t,
        None => return Err((StatusCode::UNAUTHORIZED, "ADMIN_TOKEN not set".into())),
    };
    let provided = headers.get("X-ADMIN-TOKEN").and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err((StatusCode::UNAUTHORIZED, "invalid admin token".into()))
    }
}
