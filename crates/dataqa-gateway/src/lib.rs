//! DataQA gateway: HTTP surface over the Session Orchestrator.
//!
//! Every request is one render pass. The session is picked from the `dataqa_session`
//! cookie; a fresh id is issued (and set) when the cookie is missing or malformed.

pub mod view;

use axum::{
    body::Body,
    extract::{ConnectInfo, Form, Path, State},
    http::{header, HeaderMap, HeaderValue, Request},
    middleware::Next,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use dataqa_core::{Interaction, Orchestrator, SessionId};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;

pub const SESSION_COOKIE: &str = "dataqa_session";

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
}

impl AppState {
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AskForm {
    #[serde(default)]
    pub question: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/preset/:index", post(preset_handler))
        .route("/ask", post(ask_handler))
        .route("/health", get(health))
        .route("/api/v1/status", get(status_handler))
        .with_state(state)
        .layer(axum::middleware::from_fn(log_traffic))
}

async fn log_traffic(
    connect_info: Option<ConnectInfo<SocketAddr>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let peer = connect_info
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "-".to_string());
    tracing::info!(
        peer = %peer,
        method = %request.method(),
        path = request.uri().path(),
        "request"
    );
    next.run(request).await
}

async fn health() -> &'static str {
    "OK"
}

async fn index_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    render(&state, &headers, Interaction::View).await
}

async fn preset_handler(
    State(state): State<AppState>,
    Path(index): Path<usize>,
    headers: HeaderMap,
) -> Response {
    render(&state, &headers, Interaction::Preset(index)).await
}

async fn ask_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<AskForm>,
) -> Response {
    render(&state, &headers, Interaction::Question(form.question)).await
}

async fn status_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    let config = state.orchestrator.config();
    Json(serde_json::json!({
        "app": "dataqa-gateway",
        "version": dataqa_core::version(),
        "model": config.model,
        "data_path": config.data_path.display().to_string(),
        "agent_configured": config.has_api_key(),
        "sessions": state.orchestrator.sessions().len(),
    }))
}

async fn render(state: &AppState, headers: &HeaderMap, interaction: Interaction) -> Response {
    let (session_id, issued) = match session_from_headers(headers) {
        Some(id) => (id, false),
        None => (SessionId::new(), true),
    };

    let page = state.orchestrator.render(&session_id, interaction).await;
    let html = Html(view::render_page(&page));

    if !issued {
        return html.into_response();
    }

    let cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax",
        SESSION_COOKIE, session_id
    );
    match HeaderValue::from_str(&cookie) {
        Ok(value) => ([(header::SET_COOKIE, value)], html).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "could not build session cookie");
            html.into_response()
        }
    }
}

/// Session id from the `Cookie` header, if present and well formed.
pub fn session_from_headers(headers: &HeaderMap) -> Option<SessionId> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| SessionId::parse(value))
}
