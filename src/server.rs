use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, signal};
use tower_http::cors::{Any, CorsLayer};

use crate::error::QueryError;
use crate::rag::RagEngine;

const NO_QUESTION: &str = "No question provided";

/// Shared state for all HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<RagEngine>,
    /// Answer downstream failures with 502 instead of 200
    pub strict_errors: bool,
}

impl AppState {
    pub fn new(engine: Arc<RagEngine>, strict_errors: bool) -> Self {
        AppState {
            engine,
            strict_errors,
        }
    }
}

/// Request payload for `/api/chat`
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub question: Option<String>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(ErrorBody { error: message })).into_response()
}

/// Build the router for `POST /api/chat` and `GET /api/health` with
/// permissive CORS on every route
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/chat", post(chat))
        .route("/api/health", get(health))
        .layer(cors)
        .with_state(state)
}

/// Serve `router` until Ctrl+C
pub async fn serve(listener: TcpListener, router: Router) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("Listening on http://{}", addr);
    }
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

/// Handler: POST /api/chat
async fn chat(
    State(state): State<AppState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let question = match body {
        Ok(Json(ChatRequest {
            question: Some(question),
        })) if !question.trim().is_empty() => question,
        Ok(_) => return error_response(StatusCode::BAD_REQUEST, NO_QUESTION),
        Err(rejection) => {
            debug!("Rejected chat body: {}", rejection);
            return error_response(StatusCode::BAD_REQUEST, NO_QUESTION);
        }
    };

    match state.engine.answer(&question).await {
        Ok(answer) => (StatusCode::OK, Json(answer)).into_response(),
        Err(QueryError::Validation) => error_response(StatusCode::BAD_REQUEST, NO_QUESTION),
        Err(e) => {
            warn!("Failed to answer question: {}", e);
            let status = if state.strict_errors {
                StatusCode::BAD_GATEWAY
            } else {
                StatusCode::OK
            };
            error_response(status, &e.to_string())
        }
    }
}

/// Handler: GET /api/health
async fn health() -> Json<HealthBody> {
    Json(HealthBody { status: "healthy" })
}
