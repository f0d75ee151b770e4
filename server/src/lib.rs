use anyhow::Result;
use axum::{extract::{Path, Query, State}, http::StatusCode, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use sift_core::tokenizer::{MultiWordExpressions, Tokenizer, TokenizerKind};
use sift_core::{
    DocId, Index, IndexStatistics, Posting, Ranker, ScorerConfig, SharedIndex, Stopwords,
};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default = "default_k")]
    pub k: usize,
    /// Relevance model name; the server default when absent.
    #[serde(default)]
    pub scorer: Option<String>,
}
fn default_k() -> usize { 10 }

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub scorer: &'static str,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<SearchHit>,
}

#[derive(Serialize)]
pub struct SearchHit {
    pub rank: usize,
    pub doc_id: DocId,
    pub score: f64,
}

#[derive(Serialize)]
pub struct TermResponse {
    pub term: String,
    pub document_frequency: u32,
    pub total_term_frequency: u64,
    pub postings: Vec<Posting>,
}

/// How queries are tokenized and scored. Must match how the index was built.
#[derive(Clone, Default)]
pub struct ServerOptions {
    pub tokenizer: TokenizerKind,
    pub multiword: Option<PathBuf>,
    pub stopwords: Option<Stopwords>,
    pub default_scorer: ScorerConfig,
}

#[derive(Clone)]
pub struct AppState {
    pub index: SharedIndex,
    pub tokenizer: Arc<dyn Tokenizer>,
    pub stopwords: Option<Arc<Stopwords>>,
    pub default_scorer: ScorerConfig,
}

impl AppState {
    fn ranker(&self, config: ScorerConfig) -> Ranker {
        let ranker = Ranker::new(self.tokenizer.clone(), config.build());
        match &self.stopwords {
            Some(stopwords) => ranker.with_stopwords(stopwords.clone()),
            None => ranker,
        }
    }
}

pub fn build_app(index_dir: String, options: ServerOptions) -> Result<Router> {
    // Load the whole index at startup
    let index = Index::load(&index_dir)?;
    let expressions = match &options.multiword {
        Some(path) => MultiWordExpressions::from_file(path)?,
        None => MultiWordExpressions::default(),
    };
    let app_state = AppState {
        index: SharedIndex::new(index),
        tokenizer: Arc::from(options.tokenizer.build(expressions)),
        stopwords: options.stopwords.map(Arc::new),
        default_scorer: options.default_scorer,
    };
    Ok(router(app_state))
}

pub fn router(app_state: AppState) -> Router {
    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/stats", get(stats_handler))
        .route("/doc/:doc_id", get(doc_handler))
        .route("/term/:term", get(term_handler))
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

fn error_response(err: sift_core::Error) -> (StatusCode, String) {
    let status = match &err {
        sift_core::Error::Configuration(_) => StatusCode::BAD_REQUEST,
        sift_core::Error::DegenerateInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!(error = %err, "search failed");
    }
    (status, err.to_string())
}

pub async fn search_handler(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Result<Json<SearchResponse>, (StatusCode, String)> {
    let start = std::time::Instant::now();
    let config: ScorerConfig = match &params.scorer {
        Some(name) => name.parse().map_err(error_response)?,
        None => state.default_scorer,
    };
    let ranker = state.ranker(config);
    let ranked = state.index.query(&ranker, &params.q).map_err(error_response)?;

    let total_hits = ranked.len();
    let k = params.k.clamp(1, 100);
    let results = ranked
        .into_iter()
        .take(k)
        .enumerate()
        .map(|(i, r)| SearchHit { rank: i + 1, doc_id: r.doc_id, score: r.score })
        .collect();

    let elapsed = start.elapsed();
    Ok(Json(SearchResponse {
        query: params.q,
        scorer: ranker.scorer().name(),
        took_s: elapsed.as_secs_f64(),
        total_hits,
        results,
    }))
}

pub async fn stats_handler(State(state): State<AppState>) -> Json<IndexStatistics> {
    Json(state.index.statistics())
}

pub async fn doc_handler(State(state): State<AppState>, Path(doc_id): Path<DocId>) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    match state.index.read().doc_metadata(doc_id) {
        Some(meta) => Ok(Json(serde_json::json!({
            "doc_id": doc_id,
            "length": meta.length,
            "unique_tokens": meta.unique_tokens,
        }))),
        None => Err((StatusCode::NOT_FOUND, format!("document {doc_id} not indexed"))),
    }
}

pub async fn term_handler(State(state): State<AppState>, Path(term): Path<String>) -> Json<TermResponse> {
    let index = state.index.read();
    let stats = index.term_metadata(&term);
    let postings = index.postings(&term);
    Json(TermResponse {
        term,
        document_frequency: stats.document_frequency,
        total_term_frequency: stats.total_term_frequency,
        postings,
    })
}
