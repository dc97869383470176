use axum::{
    Json, Router,
    body::{Body, Bytes},
    extract::{DefaultBodyLimit, Path, Query, Request, State},
    http::{HeaderValue, StatusCode, header},
    middleware::Next,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use tracing::info;

use crate::AppState;
use crate::config::AppConfig;
use crate::conversation::Conversation;
use crate::llm::{LlmSettings, Optimizer};
use crate::normalized::sse_event;
use crate::rate_limit::rate_limit_middleware;
use crate::render::{Section, render_html, split_sections};
use crate::ui;

/// Start the server with the provided configuration.
pub async fn start_server(config: Arc<AppConfig>) -> anyhow::Result<()> {
    let settings = LlmSettings::from_config(&config.llm);
    info!(
        name: "llm.config.loaded",
        base_url = %settings.base_url,
        model = %settings.model,
        provider = ?settings.provider,
        has_api_key = settings.api_key.is_some(),
        "LLM configuration loaded"
    );
    if settings.api_key.is_none() {
        tracing::warn!("No API key configured; upstream requests will be unauthenticated");
    }

    let optimizer = Optimizer::new(settings, config.generation.clone());
    let state = AppState::new(Arc::clone(&config), optimizer);

    spawn_session_sweeper(&state);

    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        name: "server.started",
        address = %addr,
        "Server started"
    );

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

/// Periodically drop conversations that have been idle too long.
fn spawn_session_sweeper(state: &AppState) {
    let conversations = state.conversations.clone();
    let idle_timeout = Duration::from_secs(state.config.session.idle_timeout_secs);
    let every = Duration::from_secs(state.config.session.sweep_interval_secs.max(1));

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = conversations.cleanup_expired_with_timeout(idle_timeout);
            if removed > 0 {
                info!(removed, remaining = conversations.len(), "Expired conversations removed");
            }
        }
    });
}

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    let generation = Router::new()
        .route("/generate", get(generate))
        .route("/generate_complete", post(generate_complete))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ));

    let timeout_duration = if state.config.resilience.timeout_disabled {
        Duration::from_secs(365 * 24 * 60 * 60)
    } else {
        Duration::from_secs(state.config.resilience.request_timeout_secs)
    };

    Router::new()
        .route("/", get(index_handler))
        .route("/chat", get(chat_handler))
        .merge(generation)
        .route("/api/render", post(api_render))
        .route("/api/sessions", get(api_list_sessions).post(api_create_session))
        .route(
            "/api/sessions/{id}",
            get(api_get_session).delete(api_delete_session),
        )
        .route("/api/sessions/{id}/messages", get(api_get_messages))
        .route("/api/sessions/{id}/reset", post(api_reset_session))
        .layer(DefaultBodyLimit::max(1024 * 1024))
        // The timeout bounds time-to-headers; streamed bodies are not cut off.
        .layer(axum::middleware::from_fn(
            move |req: Request, next: Next| async move {
                match tokio::time::timeout(timeout_duration, next.run(req)).await {
                    Ok(res) => res,
                    Err(_) => (StatusCode::REQUEST_TIMEOUT, "Request timed out").into_response(),
                }
            },
        ))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ─────────────────────────────────────────────────────────────────────────────
// HTML Page Handlers
// ─────────────────────────────────────────────────────────────────────────────

async fn index_handler() -> impl IntoResponse {
    Html(ui::landing::page())
}

async fn chat_handler() -> impl IntoResponse {
    Html(ui::chat::page())
}

// ─────────────────────────────────────────────────────────────────────────────
// Generation Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// Query parameters for `/generate`.
#[derive(Debug, Deserialize)]
struct GenerateQuery {
    #[serde(default)]
    prompt: String,
    /// Only a case-insensitive `"true"` counts.
    #[serde(default)]
    is_followup: Option<String>,
    #[serde(default)]
    session_id: Option<String>,
}

fn parse_followup(raw: Option<&str>) -> bool {
    raw.is_some_and(|v| v.eq_ignore_ascii_case("true"))
}

/// GET /generate - Stream one optimization turn as SSE.
async fn generate(State(state): State<AppState>, Query(query): Query<GenerateQuery>) -> Response {
    let is_followup = parse_followup(query.is_followup.as_deref());
    let conversation = state.conversations.resolve(query.session_id.as_deref());

    tracing::info!(
        session_id = %conversation.id(),
        is_followup,
        prompt_length = query.prompt.len(),
        "Received generate request"
    );

    let sse_stream = state
        .optimizer
        .stream_turn(conversation, &query.prompt, is_followup)
        .map(|payload| Ok::<String, std::convert::Infallible>(sse_event(&payload)));

    build_sse_response(Body::from_stream(sse_stream))
}

/// Request body for `/generate_complete`. Missing fields default.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CompleteRequest {
    prompt: String,
    is_followup: bool,
    session_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct CompleteResponse {
    response: String,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

/// POST /generate_complete - Run one turn and return the whole reply.
async fn generate_complete(State(state): State<AppState>, body: Bytes) -> Response {
    let req: CompleteRequest = if body.iter().all(u8::is_ascii_whitespace) {
        CompleteRequest::default()
    } else {
        match serde_json::from_slice::<Option<CompleteRequest>>(&body) {
            Ok(req) => req.unwrap_or_default(),
            Err(e) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(ErrorResponse {
                        error: format!("Invalid JSON body: {e}"),
                    }),
                )
                    .into_response();
            }
        }
    };

    let conversation = state.conversations.resolve(req.session_id.as_deref());
    tracing::info!(
        session_id = %conversation.id(),
        is_followup = req.is_followup,
        prompt_length = req.prompt.len(),
        "Received generate_complete request"
    );

    match state
        .optimizer
        .complete_turn(&conversation, &req.prompt, req.is_followup)
        .await
    {
        Ok(response) => Json(CompleteResponse { response }).into_response(),
        Err(e) => (
            StatusCode::BAD_GATEWAY,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response(),
    }
}

fn build_sse_response(body: Body) -> Response {
    let mut resp = Response::new(body);
    let h = resp.headers_mut();
    h.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/event-stream"));
    h.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    h.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    h.insert("X-Accel-Buffering", HeaderValue::from_static("no"));
    resp
}

// ─────────────────────────────────────────────────────────────────────────────
// Rendering
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RenderRequest {
    content: String,
}

#[derive(Debug, Serialize)]
struct RenderResponse {
    html: String,
    sections: Vec<Section>,
}

/// POST /api/render - Render a message for the chat view.
async fn api_render(Json(req): Json<RenderRequest>) -> Json<RenderResponse> {
    Json(RenderResponse {
        html: render_html(&req.content),
        sections: split_sections(&req.content),
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Session Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// Session info for listing.
#[derive(Debug, Serialize)]
struct SessionInfo {
    id: String,
    message_count: usize,
    created_at: DateTime<Utc>,
    last_activity: DateTime<Utc>,
}

impl From<&Conversation> for SessionInfo {
    fn from(c: &Conversation) -> Self {
        Self {
            id: c.id().to_string(),
            message_count: c.message_count(),
            created_at: c.created_at(),
            last_activity: c.last_activity(),
        }
    }
}

/// GET /api/sessions - List all sessions.
async fn api_list_sessions(State(state): State<AppState>) -> Json<Vec<SessionInfo>> {
    let mut sessions: Vec<SessionInfo> = state
        .conversations
        .list_ids()
        .iter()
        .filter_map(|id| state.conversations.get(id))
        .map(|c| SessionInfo::from(&c))
        .collect();
    sessions.sort_by(|a, b| b.last_activity.cmp(&a.last_activity));

    Json(sessions)
}

/// POST /api/sessions - Create a new session.
async fn api_create_session(State(state): State<AppState>) -> (StatusCode, Json<SessionInfo>) {
    let conversation = state.conversations.create();
    tracing::debug!(session_id = %conversation.id(), "Session created");
    (StatusCode::CREATED, Json(SessionInfo::from(&conversation)))
}

/// GET /api/sessions/{id} - Get session details.
async fn api_get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionInfo>, StatusCode> {
    state
        .conversations
        .get(&id)
        .map(|c| Json(SessionInfo::from(&c)))
        .ok_or(StatusCode::NOT_FOUND)
}

/// DELETE /api/sessions/{id} - Delete a session. The default one is reset.
async fn api_delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> StatusCode {
    match state.conversations.remove(&id) {
        Some(_) => StatusCode::NO_CONTENT,
        None => StatusCode::NOT_FOUND,
    }
}

/// POST /api/sessions/{id}/reset - Drop the history but keep the session.
async fn api_reset_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> StatusCode {
    match state.conversations.get(&id) {
        Some(conversation) => {
            conversation.reset();
            StatusCode::NO_CONTENT
        }
        None => StatusCode::NOT_FOUND,
    }
}

/// Message DTO for API responses.
#[derive(Debug, Serialize)]
struct MessageDto {
    role: &'static str,
    content: String,
    sections: Vec<Section>,
    html: String,
}

/// GET /api/sessions/{id}/messages - Get the visible history of a session.
async fn api_get_messages(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<MessageDto>>, StatusCode> {
    let conversation = state.conversations.get(&id).ok_or(StatusCode::NOT_FOUND)?;
    let messages = conversation
        .transcript()
        .into_iter()
        .map(|m| MessageDto {
            role: m.role.display_name(),
            sections: split_sections(&m.content),
            html: render_html(&m.content),
            content: m.content,
        })
        .collect();
    Ok(Json(messages))
}
