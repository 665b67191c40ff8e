//! Routes for the notification delivery subsystem.
//!
//! Every route here is scoped to the authenticated caller: the stream
//! only carries their events, the capability token only opens their
//! channel, and the accounting endpoints only answer for them.

use std::convert::Infallible;

use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use axum::routing::{get, post};
use axum::{Json, Router, extract::State};
use futures::Stream;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use murmur_bus::NotificationStream;
use murmur_relay::CapabilityToken;

use crate::auth::AuthenticatedUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Response for `GET /unread-count`.
#[derive(Serialize)]
pub struct UnreadCountResponse {
    /// Number of unread notifications for the caller.
    pub unread: i64,
}

/// Response for `GET /presence`.
#[derive(Serialize)]
pub struct PresenceResponse {
    /// Whether the caller is attached to their notification channel.
    pub online: bool,
}

/// Response for `POST /read`.
#[derive(Serialize)]
pub struct MarkReadResponse {
    /// Notifications flipped from unread to read.
    pub marked: u64,
}

/// GET /stream — live SSE feed of the caller's notification events.
///
/// The response ends without error when the client disconnects or the
/// process shuts down; dropping the response stream unregisters the
/// underlying subscription.
async fn stream(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
) -> Result<Sse<impl Stream<Item = Result<SseEvent, Infallible>>>, ApiError> {
    let stream = state.notifier.open_stream(user_id, CancellationToken::new())?;
    tracing::debug!(%user_id, "notification stream opened");
    Ok(Sse::new(sse_events(stream)).keep_alive(KeepAlive::default()))
}

fn sse_events(stream: NotificationStream) -> impl Stream<Item = Result<SseEvent, Infallible>> {
    futures::stream::unfold(stream, |mut stream| async move {
        match stream.next().await {
            Ok(event) => {
                let sse = SseEvent::default()
                    .event(event.event_type())
                    .json_data(&event)
                    .ok()?;
                Some((Ok(sse), stream))
            }
            // Cancelled or bus closed: end the response gracefully.
            Err(_) => None,
        }
    })
}

/// POST /channel-token — mints a capability token for the caller's own
/// relay channel. The channel is derived from the verified identity;
/// there is no way to name another user's channel.
async fn channel_token(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
) -> Json<CapabilityToken> {
    Json(state.authorizer.issue_token(user_id))
}

/// GET /unread-count — persisted unread count for the caller.
async fn unread_count(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
) -> Result<Json<UnreadCountResponse>, ApiError> {
    let unread = state.accounting.unread_count(user_id).await?;
    Ok(Json(UnreadCountResponse { unread }))
}

/// GET /presence — whether the caller is online per relay presence.
async fn presence(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
) -> Json<PresenceResponse> {
    let online = state.accounting.is_online(user_id).await;
    Json(PresenceResponse { online })
}

/// POST /read — marks all of the caller's notifications read.
async fn mark_read(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
) -> Result<Json<MarkReadResponse>, ApiError> {
    let marked = state.accounting.mark_all_read(user_id).await?;
    Ok(Json(MarkReadResponse { marked }))
}

/// Returns the router for the notification context.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/stream", get(stream))
        .route("/channel-token", post(channel_token))
        .route("/unread-count", get(unread_count))
        .route("/presence", get(presence))
        .route("/read", post(mark_read))
}
