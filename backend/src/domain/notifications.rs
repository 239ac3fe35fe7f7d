//! Push notification payloads and the event announcer.
//!
//! The relay accepts a JSON payload of the shape
//! `{ to?, notification: { title, body, image? }, data }`; omitting `to`
//! broadcasts to every registered device.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::catalogue::Club;
use crate::domain::events::Event;
use crate::domain::ports::PushRelay;

/// Visible portion of a push message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushNotification {
    /// Notification title line.
    pub title: String,
    /// Notification body text.
    pub body: String,
    /// Optional image URL shown alongside the text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Full relay payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushMessage {
    /// Target device token; omitted to broadcast.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    /// Visible notification content.
    pub notification: PushNotification,
    /// Opaque key/value payload handed to the client.
    #[serde(default)]
    pub data: BTreeMap<String, String>,
}

impl PushMessage {
    /// Build a broadcast message reaching all registered devices.
    pub fn broadcast(notification: PushNotification) -> Self {
        Self {
            to: None,
            notification,
            data: BTreeMap::new(),
        }
    }

    /// Build a message targeting a single device token.
    pub fn direct(to: impl Into<String>, notification: PushNotification) -> Self {
        Self {
            to: Some(to.into()),
            notification,
            data: BTreeMap::new(),
        }
    }

    /// Attach one data entry.
    #[must_use]
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }
}

/// Broadcasts event announcements through the push relay.
///
/// Announcements are fire-and-forget: a relay failure is logged and never
/// fails the user-visible action that triggered it.
#[derive(Clone)]
pub struct EventAnnouncer {
    relay: Arc<dyn PushRelay>,
}

impl EventAnnouncer {
    /// Create an announcer over the given relay port.
    pub fn new(relay: Arc<dyn PushRelay>) -> Self {
        Self { relay }
    }

    /// Announce a freshly created event to all devices.
    pub async fn announce_event(&self, event: &Event, club: &Club) {
        let message = PushMessage::broadcast(PushNotification {
            title: format!("{} announced a new event", club.name()),
            body: event.name().to_string(),
            image: None,
        })
        .with_data("eventId", event.id().as_ref())
        .with_data("clubId", event.club_id().as_ref())
        .with_data("categoryId", event.category_id().as_ref());

        if let Err(error) = self.relay.send(&message).await {
            warn!(event_id = %event.id(), error = %error, "event announcement failed");
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use serde_json::json;

    #[test]
    fn broadcast_messages_omit_the_target_field() {
        let message = PushMessage::broadcast(PushNotification {
            title: "t".to_owned(),
            body: "b".to_owned(),
            image: None,
        })
        .with_data("eventId", "E1");
        let value = serde_json::to_value(&message).expect("message should serialise");
        assert_eq!(
            value,
            json!({
                "notification": { "title": "t", "body": "b" },
                "data": { "eventId": "E1" }
            })
        );
    }

    #[test]
    fn direct_messages_carry_the_device_token() {
        let message = PushMessage::direct(
            "device-token",
            PushNotification {
                title: "t".to_owned(),
                body: "b".to_owned(),
                image: Some("https://cdn.clubhub.example/banner.png".to_owned()),
            },
        );
        let value = serde_json::to_value(&message).expect("message should serialise");
        assert_eq!(value["to"], "device-token");
        assert_eq!(
            value["notification"]["image"],
            "https://cdn.clubhub.example/banner.png"
        );
    }
}
