use std::{net::SocketAddr, sync::Arc};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use axum::{
    Json,
    Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use axum_server::Handle;
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

use crate::Error;
use crate::platforms::slack::SlackEnvelope;
use crate::platforms::slack::signature::{verify_signature, SIGNATURE_HEADER, TIMESTAMP_HEADER};
use crate::services::RelayService;

/// Shared state for the events route. Read-only after startup.
#[derive(Clone)]
pub struct EventServerState {
    pub relay: Arc<RelayService>,
    pub signing_secret: Arc<str>,
}

impl EventServerState {
    pub fn new(relay: Arc<RelayService>, signing_secret: impl Into<String>) -> Self {
        Self {
            relay,
            signing_secret: Arc::from(signing_secret.into()),
        }
    }
}

pub fn router(state: EventServerState) -> Router {
    Router::new()
        .route("/slack/events", post(handle_slack_event))
        .route("/health", get(|| async { "ok" }))
        .with_state(state)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}

/// Binds the events endpoint and serves it in the background. Sending on
/// the returned channel starts a graceful shutdown. Fails if the address
/// cannot be bound.
pub async fn start_event_server(
    addr: SocketAddr,
    state: EventServerState,
) -> Result<(JoinHandle<()>, oneshot::Sender<()>), Error> {
    let app = router(state);

    let listener = std::net::TcpListener::bind(addr)
        .map_err(|source| Error::Bind { addr, source })?;
    let local_addr = listener.local_addr().unwrap_or(addr);

    let (shutdown_send, shutdown_recv) = oneshot::channel::<()>();
    info!("Slack events endpoint listening on http://{}/slack/events", local_addr);

    let handle = Handle::new();
    let handle_clone = handle.clone();

    tokio::spawn(async move {
        let _ = shutdown_recv.await;
        handle_clone.graceful_shutdown(None);
    });

    let server = axum_server::from_tcp(listener)
        .handle(handle)
        .serve(app.into_make_service());

    let join = tokio::spawn(async move {
        if let Err(e) = server.await {
            error!("Event server error: {}", e);
        }
        info!("Event server shut down.");
    });

    Ok((join, shutdown_send))
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

async fn handle_slack_event(
    State(state): State<EventServerState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let (Some(timestamp), Some(signature)) = (
        header(&headers, TIMESTAMP_HEADER),
        header(&headers, SIGNATURE_HEADER),
    ) else {
        warn!("Rejecting request without Slack signature headers");
        return (StatusCode::UNAUTHORIZED, "missing signature headers").into_response();
    };

    let now = chrono::Utc::now().timestamp();
    if let Err(e) = verify_signature(&state.signing_secret, timestamp, &body, signature, now) {
        warn!("Rejecting unsigned or stale request: {}", e);
        return (StatusCode::UNAUTHORIZED, "invalid signature").into_response();
    }

    debug!("Slack payload: {}", String::from_utf8_lossy(&body));
    let envelope = match serde_json::from_slice::<SlackEnvelope>(&body) {
        Ok(envelope) => envelope,
        Err(e) => {
            warn!("Malformed Slack payload: {}", e);
            return (StatusCode::BAD_REQUEST, format!("malformed payload: {}", e)).into_response();
        }
    };

    match envelope {
        SlackEnvelope::UrlVerification { challenge } => {
            info!("Answering url_verification challenge");
            Json(json!({ "challenge": challenge })).into_response()
        }
        SlackEnvelope::EventCallback(callback) => {
            // Slack expects an ack within three seconds; the reply is posted later.
            let relay = state.relay.clone();
            tokio::spawn(async move {
                if let Err(e) = relay.handle_callback(&callback).await {
                    error!("Failed to handle Slack event: {}", e);
                }
            });
            StatusCode::OK.into_response()
        }
        SlackEnvelope::Unsupported => {
            debug!("Ignoring unsupported envelope type");
            StatusCode::OK.into_response()
        }
    }
}
