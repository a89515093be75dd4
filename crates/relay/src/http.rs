//! HTTP surface of the relay.

use std::convert::Infallible;

use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{Method, StatusCode, header};
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chat_relay_protocol::{
    ChatRequest, CompletionFailure, CompletionReply, HealthStatus,
};
use futures_util::{Stream, StreamExt};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::RelayError;
use crate::relay::Relay;

/// Largest request body accepted by the chat routes.
pub const MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

/// Builds the router serving the health, chat and streaming chat routes.
pub fn router(relay: Relay) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::CACHE_CONTROL]);

    Router::new()
        .route("/api/health", get(health))
        .route("/api/chat", post(chat))
        .route("/api/chat/stream", post(chat_stream))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(relay)
}

// GET /api/health
async fn health(State(relay): State<Relay>) -> Json<HealthStatus> {
    Json(relay.health())
}

// POST /api/chat
async fn chat(
    State(relay): State<Relay>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let req = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return failure(invalid_request(rejection)),
    };
    info!("chat request with {} messages", req.messages.len());
    debug!("received messages: {:?}", req.messages);

    match relay.complete(req.messages).await {
        Ok(response) => Json(CompletionReply {
            success: true,
            response,
        })
        .into_response(),
        Err(err) => {
            error!("completion failed: {err}");
            failure(err)
        }
    }
}

fn failure(err: RelayError) -> Response {
    let body = CompletionFailure {
        success: false,
        error: err.to_string(),
        message: err.category().user_message().to_owned(),
        status: err.status(),
    };
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}

fn invalid_request(rejection: JsonRejection) -> RelayError {
    warn!("unreadable chat request: {rejection}");
    RelayError::InvalidRequest(rejection.body_text())
}

// POST /api/chat/stream
async fn chat_stream(
    State(relay): State<Relay>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let events = match payload {
        Ok(Json(req)) => {
            info!(
                "streaming chat request with {} messages",
                req.messages.len()
            );
            debug!("received messages: {:?}", req.messages);
            relay.stream(req.messages).boxed()
        }
        Err(rejection) => {
            Relay::stream_failure(invalid_request(rejection)).boxed()
        }
    };

    let events = events.map(|event| {
        // Every frame is a single `data:` line carrying the JSON event.
        let data = serde_json::to_string(&event).unwrap_or_default();
        Ok(Event::default().data(data))
    });
    Sse::new(events)
}
