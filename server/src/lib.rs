use axum::{extract::{Query, State}, http::StatusCode, response::{IntoResponse, Response}, routing::{get, post}, Json, Router};
use reco_core::persist::{load_snapshot, SnapshotPaths};
use reco_core::{Engine, EngineHandle, Readiness, ScoredItem, Status};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer, AllowOrigin};
use tower_http::trace::TraceLayer;

pub const MAX_K: usize = 100;
pub const NO_RESULTS: &str = "No results found, try another topic.";
pub const GREETING: &str = "Hi! I recommend online courses.\n\nType any topic (e.g., 'Python', 'Data Science') and I'll recommend courses for you.";
pub const FAILURE_REPLY: &str = "Sorry, recommendations are unavailable right now. Please try again later.";

/// Where the engine is built from at startup.
#[derive(Debug, Clone)]
pub enum EngineSource {
    Corpus(String),
    Snapshot(String),
}

#[derive(Clone)]
pub struct AppState {
    pub engine: EngineHandle,
    pub top_k: usize,
}

#[derive(Deserialize)]
pub struct RecommendParams {
    #[serde(default)]
    pub q: String,
    pub k: Option<usize>,
}

#[derive(Deserialize)]
pub struct TrendingParams {
    pub k: Option<usize>,
}

#[derive(Serialize)]
pub struct RecommendResponse {
    pub query: String,
    pub took_s: f64,
    pub results: Vec<Hit>,
}

#[derive(Serialize)]
pub struct Hit {
    pub title: String,
    pub organization: String,
    pub certificate_type: String,
    pub rating: f64,
    pub difficulty: String,
    pub students_enrolled: f64,
    pub score: f64,
}

impl From<ScoredItem> for Hit {
    fn from(s: ScoredItem) -> Self {
        Hit {
            title: s.item.title,
            organization: s.item.organization,
            certificate_type: s.item.certificate_type,
            rating: s.item.rating,
            difficulty: s.item.difficulty,
            students_enrolled: s.item.students_enrolled,
            score: s.score,
        }
    }
}

/// Minimal shape of an inbound chat update.
#[derive(Deserialize)]
pub struct Update {
    pub message: Option<Message>,
}

#[derive(Deserialize)]
pub struct Message {
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Deserialize)]
pub struct Chat {
    pub id: i64,
}

/// Reply sent back in the webhook response body.
#[derive(Serialize)]
pub struct SendMessage {
    pub method: &'static str,
    pub chat_id: i64,
    pub text: String,
}

type ApiError = (StatusCode, Json<serde_json::Value>);

pub fn build_app(engine: EngineHandle, top_k: usize) -> Router {
    let state = AppState { engine, top_k: top_k.clamp(1, MAX_K) };

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
        .route("/", get(|| async { "Course recommender is alive" }))
        .route("/health", get(|| async { "ok" }))
        .route("/ready", get(ready_handler))
        .route("/recommend", get(recommend_handler))
        .route("/trending", get(trending_handler))
        .route("/webhook", post(webhook_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Build the engine on a blocking task and flip the handle when done.
pub fn spawn_build(handle: EngineHandle, source: EngineSource) -> tokio::task::JoinHandle<()> {
    tokio::task::spawn_blocking(move || {
        let outcome = match &source {
            EngineSource::Corpus(path) => Engine::from_path(path).map_err(|e| e.to_string()),
            EngineSource::Snapshot(dir) => load_snapshot(&SnapshotPaths::new(dir))
                .map(|(engine, _)| engine)
                .map_err(|e| format!("{e:#}")),
        };
        if outcome.is_ok() {
            tracing::info!(?source, "engine ready");
        }
        handle.complete(outcome);
    })
}

fn engine_or_status(state: &AppState) -> Result<Arc<Engine>, ApiError> {
    match state.engine.readiness() {
        Readiness::Ready(engine) => Ok(engine),
        Readiness::NotReady => Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({ "error": "engine is still loading" })),
        )),
        Readiness::Failed(msg) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": format!("engine failed to load: {msg}") })),
        )),
    }
}

fn clamp_k(k: Option<usize>, default: usize) -> usize {
    k.unwrap_or(default).clamp(1, MAX_K)
}

pub async fn ready_handler(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let status = state.engine.status();
    let code = if status == Status::Ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (code, Json(serde_json::json!({ "status": status.as_str() })))
}

pub async fn recommend_handler(State(state): State<AppState>, Query(params): Query<RecommendParams>) -> Result<Json<RecommendResponse>, ApiError> {
    let engine = engine_or_status(&state)?;
    let start = std::time::Instant::now();
    let k = clamp_k(params.k, state.top_k);
    let results = engine.rank(&params.q, k).into_iter().map(Hit::from).collect();
    Ok(Json(RecommendResponse { query: params.q, took_s: start.elapsed().as_secs_f64(), results }))
}

pub async fn trending_handler(State(state): State<AppState>, Query(params): Query<TrendingParams>) -> Result<Json<RecommendResponse>, ApiError> {
    let engine = engine_or_status(&state)?;
    let start = std::time::Instant::now();
    let k = clamp_k(params.k, state.top_k);
    let results = engine.rank_trending(k).into_iter().map(Hit::from).collect();
    Ok(Json(RecommendResponse { query: String::new(), took_s: start.elapsed().as_secs_f64(), results }))
}

pub async fn webhook_handler(State(state): State<AppState>, body: String) -> Result<Response, ApiError> {
    let update: Update = serde_json::from_str(&body).map_err(|e| {
        tracing::warn!(error = %e, "malformed webhook update");
        (StatusCode::BAD_REQUEST, Json(serde_json::json!({ "error": "malformed update" })))
    })?;

    let Some(message) = update.message else {
        return Ok(Json(serde_json::json!({ "ok": true })).into_response());
    };
    let text = message.text.as_deref().unwrap_or("").trim();
    if text.is_empty() {
        return Ok(Json(serde_json::json!({ "ok": true })).into_response());
    }

    let reply = match command_name(text).as_deref() {
        Some("start") => GREETING.to_string(),
        Some(_) => return Ok(Json(serde_json::json!({ "ok": true })).into_response()),
        None => match state.engine.get() {
            Some(engine) => format_reply(&engine.recommend(text, state.top_k)),
            None => FAILURE_REPLY.to_string(),
        },
    };
    let send = SendMessage { method: "sendMessage", chat_id: message.chat.id, text: reply };
    Ok(Json(send).into_response())
}

/// Command name of a `/cmd` or `/cmd@BotName` message, lower-cased; `None` for plain text.
fn command_name(text: &str) -> Option<String> {
    let rest = text.strip_prefix('/')?;
    let word = rest.split_whitespace().next().unwrap_or("");
    let name = word.split('@').next().unwrap_or("");
    Some(name.to_lowercase())
}

/// Render results as a chat message, one block per course.
pub fn format_reply(items: &[reco_core::CatalogItem]) -> String {
    if items.is_empty() {
        return NO_RESULTS.to_string();
    }
    items
        .iter()
        .map(|c| {
            let org = if c.organization.is_empty() { "N/A" } else { &c.organization };
            format!("📘 {}\n🏫 {} | ⭐ {:.1}", c.title, org, c.rating)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
