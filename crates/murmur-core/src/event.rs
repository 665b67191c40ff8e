//! Notification event model.
//!
//! A [`NotificationEvent`] is created once when a write commits, handed to
//! the bus by value, and broadcast as independent copies. Consumers never
//! share mutable state through it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock::Clock;

/// The kind of domain action a notification describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Someone liked the recipient's post or comment.
    LikeAdded,
    /// Someone removed a previous like.
    LikeRemoved,
    /// Someone commented on the recipient's post.
    CommentAdded,
}

/// Event type identifier for [`NotificationKind::LikeAdded`].
pub const LIKE_ADDED_EVENT_TYPE: &str = "notification.like_added";

/// Event type identifier for [`NotificationKind::LikeRemoved`].
pub const LIKE_REMOVED_EVENT_TYPE: &str = "notification.like_removed";

/// Event type identifier for [`NotificationKind::CommentAdded`].
pub const COMMENT_ADDED_EVENT_TYPE: &str = "notification.comment_added";

/// Kind-specific display fields carried alongside the identifiers.
///
/// The store hands these over fully resolved; the delivery subsystem does
/// no joins of its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventPayload {
    /// Display name of the user who performed the action.
    pub actor_display_name: String,
    /// Avatar URL of the acting user, if they have one.
    pub actor_avatar_url: Option<String>,
    /// Title of the post or comment the action targeted.
    pub resource_title: String,
    /// Comment body, present only for [`NotificationKind::CommentAdded`].
    pub comment_text: Option<String>,
}

/// An immutable record of a like/comment action destined for one recipient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationEvent {
    /// What happened.
    pub kind: NotificationKind,
    /// Owner of the affected resource; the only user this event is for.
    pub recipient_id: Uuid,
    /// User who performed the action.
    pub actor_id: Uuid,
    /// The post or comment the action targeted.
    pub resource_id: Uuid,
    /// Resolved display fields for rendering.
    pub payload: EventPayload,
    /// Timestamp assigned at emission.
    pub occurred_at: DateTime<Utc>,
}

impl NotificationEvent {
    /// Creates a `LikeAdded` event, stamping `occurred_at` from `clock`.
    #[must_use]
    pub fn like_added(
        recipient_id: Uuid,
        actor_id: Uuid,
        resource_id: Uuid,
        payload: EventPayload,
        clock: &dyn Clock,
    ) -> Self {
        Self::new(
            NotificationKind::LikeAdded,
            recipient_id,
            actor_id,
            resource_id,
            payload,
            clock,
        )
    }

    /// Creates a `LikeRemoved` event, stamping `occurred_at` from `clock`.
    #[must_use]
    pub fn like_removed(
        recipient_id: Uuid,
        actor_id: Uuid,
        resource_id: Uuid,
        payload: EventPayload,
        clock: &dyn Clock,
    ) -> Self {
        Self::new(
            NotificationKind::LikeRemoved,
            recipient_id,
            actor_id,
            resource_id,
            payload,
            clock,
        )
    }

    /// Creates a `CommentAdded` event, stamping `occurred_at` from `clock`.
    #[must_use]
    pub fn comment_added(
        recipient_id: Uuid,
        actor_id: Uuid,
        resource_id: Uuid,
        payload: EventPayload,
        clock: &dyn Clock,
    ) -> Self {
        Self::new(
            NotificationKind::CommentAdded,
            recipient_id,
            actor_id,
            resource_id,
            payload,
            clock,
        )
    }

    fn new(
        kind: NotificationKind,
        recipient_id: Uuid,
        actor_id: Uuid,
        resource_id: Uuid,
        payload: EventPayload,
        clock: &dyn Clock,
    ) -> Self {
        Self {
            kind,
            recipient_id,
            actor_id,
            resource_id,
            payload,
            occurred_at: clock.now(),
        }
    }

    /// Returns the event type name (used for serialization routing).
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self.kind {
            NotificationKind::LikeAdded => LIKE_ADDED_EVENT_TYPE,
            NotificationKind::LikeRemoved => LIKE_REMOVED_EVENT_TYPE,
            NotificationKind::CommentAdded => COMMENT_ADDED_EVENT_TYPE,
        }
    }

    /// Serializes the event into the wire shape published to the relay.
    #[must_use]
    pub fn to_wire(&self) -> serde_json::Value {
        // Serialization of derived Serialize types to Value is infallible.
        serde_json::to_value(self).expect("NotificationEvent serialization is infallible")
    }
}
