use crate::error::ServiceError;
use crate::orchestrator::{ExtractRequest, parse_url};
use crate::state::AppState;
use axum::extract::State;
use axum::http::{HeaderValue, Method, header::CONTENT_TYPE};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::{Stream, StreamExt};
use lucid_common::{FinalResult, ServerConfig};
use std::convert::Infallible;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub fn router(state: AppState, server: &ServerConfig) -> Router {
    Router::new()
        .route("/extract_structured", post(extract_structured))
        .route("/extract_structured_stream", post(extract_structured_stream))
        .route("/health", get(health))
        .layer(cors_layer(&server.allow_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Any origin when none are configured.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow = if origins.is_empty() || origins.iter().any(|o| o == "*") {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(
            origins
                .iter()
                .filter_map(|o| HeaderValue::from_str(o).ok()),
        )
    };
    CorsLayer::new()
        .allow_origin(allow)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE])
}

async fn health() -> &'static str {
    "ok"
}

async fn extract_structured(
    State(state): State<AppState>,
    Json(request): Json<ExtractRequest>,
) -> Result<Json<FinalResult>, ServiceError> {
    parse_url(&request.url)?;
    let cancel = state.shutdown.child_token();
    // handler dropped on disconnect
    let _guard = cancel.clone().drop_guard();
    state.orchestrator.handle(request, &cancel).await.map(Json)
}

async fn extract_structured_stream(
    State(state): State<AppState>,
    Json(request): Json<ExtractRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ServiceError> {
    parse_url(&request.url)?;
    let cancel = state.shutdown.child_token();
    let events = state
        .orchestrator
        .clone()
        .stream(request, cancel)
        .filter_map(|event| async move {
            // serde_json leaves non-ASCII unescaped
            serde_json::to_string(&event)
                .ok()
                .map(|json| Ok(Event::default().data(json)))
        });
    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}
