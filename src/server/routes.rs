//! HTTP route handlers for the recent-chats API.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::conversations::{ConversationEntry, RawChange, SubscriptionError};

use super::state::AppState;

/// Create the API router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/conversations", get(list_conversations))
        .route("/api/changes", post(ingest_changes))
        .route("/api/changes/error", post(report_subscription_error))
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "recent-chats",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Conversation list response.
#[derive(Debug, Serialize)]
pub struct ConversationsResponse {
    /// Local user id.
    pub local_user: String,
    /// Number of conversations.
    pub count: usize,
    /// Conversations, most recent first.
    pub conversations: Vec<ConversationEntry>,
}

/// Return the latest ordered list.
async fn list_conversations(State(state): State<Arc<AppState>>) -> Json<ConversationsResponse> {
    let conversations = state.snapshots.borrow().clone();
    Json(ConversationsResponse {
        local_user: state.local_user.to_string(),
        count: conversations.len(),
        conversations,
    })
}

/// Batch of raw changes forwarded from a store listener.
#[derive(Debug, Deserialize)]
pub struct ChangesRequest {
    /// Changes in delivery order.
    pub changes: Vec<RawChange>,
}

/// Listener failure forwarded from a store listener.
#[derive(Debug, Deserialize)]
pub struct SubscriptionErrorRequest {
    /// Error description.
    pub message: String,
}

/// Acknowledgement for a queued delivery.
#[derive(Debug, Serialize)]
pub struct IngestResponse {
    /// Number of changes queued.
    pub queued: usize,
}

/// Queue a change batch for the merger.
async fn ingest_changes(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChangesRequest>,
) -> Result<(StatusCode, Json<IngestResponse>), (StatusCode, String)> {
    let queued = request.changes.len();
    state
        .feed
        .deliver(Ok(request.changes))
        .await
        .map_err(|e| (StatusCode::SERVICE_UNAVAILABLE, format!("Feed error: {e}")))?;

    Ok((StatusCode::ACCEPTED, Json(IngestResponse { queued })))
}

/// Queue a listener failure in place of a batch.
async fn report_subscription_error(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SubscriptionErrorRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    state
        .feed
        .deliver(Err(SubscriptionError::Listener(request.message)))
        .await
        .map_err(|e| (StatusCode::SERVICE_UNAVAILABLE, format!("Feed error: {e}")))?;

    Ok(StatusCode::ACCEPTED)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::conversations::{
        ConversationFeed, ConversationMerger, PairMatching, UserId, WatchSink,
    };

    fn spawn_state() -> (Arc<AppState>, tokio::task::JoinHandle<ConversationMerger>) {
        let local_user = UserId::new("me").expect("id");
        let (sink, snapshots) = WatchSink::channel();
        let merger =
            ConversationMerger::new(local_user.clone(), PairMatching::Directional, Box::new(sink));
        let (feed, handle) = ConversationFeed::new(merger, 8).expect("feed");
        let task = feed.spawn();
        (AppState::new(handle, snapshots, local_user), task)
    }

    fn changes(raw: serde_json::Value) -> ChangesRequest {
        serde_json::from_value(raw).expect("request body")
    }

    #[tokio::test]
    async fn test_ingest_then_list() {
        let (state, _task) = spawn_state();
        let mut updates = state.snapshots.clone();

        let (status, Json(ack)) = ingest_changes(
            State(Arc::clone(&state)),
            Json(changes(json!({
                "changes": [
                    { "type": "added", "document": {
                        "senderId": "me", "receiverId": "bob",
                        "receiverName": "Bob", "lastMessage": "hi", "timestamp": 100 } },
                    { "type": "added", "document": {
                        "senderId": "carol", "receiverId": "me",
                        "senderName": "Carol", "lastMessage": "yo", "timestamp": 200 } }
                ]
            }))),
        )
        .await
        .expect("accepted");
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(ack.queued, 2);

        updates.changed().await.expect("snapshot");

        let Json(response) = list_conversations(State(state)).await;
        assert_eq!(response.local_user, "me");
        assert_eq!(response.count, 2);
        assert_eq!(
            response.conversations[0].counterpart_name.as_deref(),
            Some("Carol")
        );
        assert_eq!(
            response.conversations[1].counterpart_name.as_deref(),
            Some("Bob")
        );
    }

    #[tokio::test]
    async fn test_subscription_error_is_accepted() {
        let (state, _task) = spawn_state();

        let status = report_subscription_error(
            State(Arc::clone(&state)),
            Json(SubscriptionErrorRequest {
                message: "listen stream reset".to_string(),
            }),
        )
        .await
        .expect("accepted");

        assert_eq!(status, StatusCode::ACCEPTED);
        let Json(response) = list_conversations(State(state)).await;
        assert_eq!(response.count, 0);
    }

    #[tokio::test]
    async fn test_ingest_after_shutdown_is_unavailable() {
        let (state, task) = spawn_state();
        state.feed.shutdown();
        let _ = task.await.expect("feed task");

        let err = ingest_changes(State(state), Json(changes(json!({ "changes": [] }))))
            .await
            .expect_err("feed closed");
        assert_eq!(err.0, StatusCode::SERVICE_UNAVAILABLE);
    }
}
