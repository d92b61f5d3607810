//! HTTP entry point for chat-service callbacks.
//!
//! Only POST on the configured path is processed. Every request, whatever
//! happens internally, is answered with an empty `200 OK`: the chat service
//! never sees our failures, operators find them in the logs.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::{Method, StatusCode},
    routing::any,
    Router,
};
use tracing::{debug, error, info, warn};

use crate::audit::{AuditSink, CsvAuditLog};
use crate::config::{normalize_path, BotConfig};
use crate::dispatch::Dispatcher;
use crate::message::InboundMessage;
use crate::outbound::GroupMeClient;
use crate::triggers::TriggerRegistry;

/// What happened to one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Bot-authored or undecodable; nothing logged, nothing sent.
    Filtered,
    /// Logged, but no trigger produced a reply.
    Logged,
    /// Logged and the reply was posted.
    Replied(String),
}

/// Shared state for the webhook handler.
pub struct AppState {
    audit: Arc<dyn AuditSink>,
    dispatcher: Dispatcher,
}

impl AppState {
    pub fn new(audit: Arc<dyn AuditSink>, dispatcher: Dispatcher) -> Self {
        Self { audit, dispatcher }
    }

    /// Filter, audit, then dispatch. An audit failure stops processing
    /// before any reply is sent.
    pub async fn process(&self, msg: &InboundMessage) -> Result<Outcome> {
        if msg.is_from_bot() {
            debug!("Ignoring bot message from {}", msg.sender_id);
            return Ok(Outcome::Filtered);
        }

        info!("{}: {} [Type: {}]", msg.name, msg.text, msg.sender_type);

        self.audit
            .append(&msg.sender_id, &msg.text, &msg.name)
            .await
            .context("Failed to log message")?;

        Ok(match self.dispatcher.dispatch(msg).await? {
            Some(reply) => Outcome::Replied(reply),
            None => Outcome::Logged,
        })
    }
}

async fn handle_webhook(
    State(state): State<Arc<AppState>>,
    method: Method,
    body: Result<Bytes, BytesRejection>,
) -> StatusCode {
    if method != Method::POST {
        return StatusCode::OK;
    }

    // An unreadable body (e.g. over the size limit) is dropped like a
    // malformed one; the caller still gets an empty 200.
    let msg = match body {
        Ok(body) => InboundMessage::decode(&body),
        Err(e) => {
            warn!("Couldn't read the request body: {}", e);
            InboundMessage::undecodable()
        }
    };
    if let Err(e) = state.process(&msg).await {
        error!("Failed to handle message {:?}: {:#}", msg.id, e);
    }
    StatusCode::OK
}

async fn ignore() -> StatusCode {
    StatusCode::OK
}

/// Build the webhook router. `path` accepts every method; everything else
/// falls through to an empty response.
pub fn router(path: &str, state: Arc<AppState>) -> Router {
    Router::new()
        .route(&normalize_path(path), any(handle_webhook))
        .fallback(ignore)
        .with_state(state)
}

/// Wire the production collaborators and serve until Ctrl-C.
pub async fn serve(config: Arc<BotConfig>, registry: TriggerRegistry) -> Result<()> {
    info!("Loaded {} triggers", registry.len());

    let outbound = Arc::new(GroupMeClient::from_config(&config));
    let dispatcher = Dispatcher::new(Arc::new(registry), outbound);
    let audit = Arc::new(CsvAuditLog::new(config.logfile.clone()));
    let state = Arc::new(AppState::new(audit, dispatcher));

    let app = router(&config.path, state);

    let addr = config.server_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    info!("Webhook listening on http://{}{}", addr, config.path);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await
        .context("Server error")?;

    Ok(())
}
