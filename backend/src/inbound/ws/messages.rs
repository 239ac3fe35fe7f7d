//! WebSocket frame contracts.

use serde::{Deserialize, Serialize};

use crate::domain::{Document, Error, RemoteState};

/// Frames a client may send.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientFrame {
    /// Subscribe to a document path such as `Categories/{id}`.
    ///
    /// A new subscription replaces the previous one; its listener is
    /// released first.
    Subscribe {
        /// Document path to observe.
        path: String,
    },
    /// Release the active subscription, if any.
    Unsubscribe,
}

/// Frames the server sends.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerFrame {
    /// Observable state for the subscribed path.
    State {
        /// Subscribed document path.
        path: String,
        /// Current phase and value.
        state: RemoteState<Option<Document>>,
    },
    /// The active subscription was released.
    Unsubscribed,
    /// A client frame could not be honoured.
    Error {
        /// Failure description.
        error: Error,
    },
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use serde_json::json;

    #[test]
    fn subscribe_frames_parse() {
        let frame: ClientFrame =
            serde_json::from_value(json!({ "type": "subscribe", "path": "Categories/c1" }))
                .expect("frame should parse");
        assert_eq!(
            frame,
            ClientFrame::Subscribe {
                path: "Categories/c1".to_owned()
            }
        );
    }

    #[test]
    fn state_frames_tag_their_type_and_phase() {
        let frame = ServerFrame::State {
            path: "Categories/c1".to_owned(),
            state: RemoteState::Loading,
        };
        let value = serde_json::to_value(&frame).expect("frame should serialise");
        assert_eq!(value["type"], "state");
        assert_eq!(value["state"]["phase"], "loading");
    }
}
