//! Four-state observable wrapper for remote-backed values.
//!
//! Projections and their WebSocket frames distinguish not-yet-started,
//! in-flight, value, and error as a first-class sum type rather than
//! signalling expected failures through panics or sentinel values.

use serde::{Deserialize, Serialize};

use crate::domain::error::Error;

/// Lifecycle of a remotely sourced value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "phase", content = "value", rename_all = "camelCase")]
pub enum RemoteState<T> {
    /// Nothing requested yet.
    Idle,
    /// A request is in flight.
    Loading,
    /// The value arrived.
    Ready(T),
    /// The request failed terminally.
    Failed(Error),
}

impl<T> RemoteState<T> {
    /// Whether the state holds a value.
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    /// Borrow the value, if present.
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Ready(value) => Some(value),
            _ => None,
        }
    }

    /// Map the carried value while preserving the other states.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> RemoteState<U> {
        match self {
            Self::Idle => RemoteState::Idle,
            Self::Loading => RemoteState::Loading,
            Self::Ready(value) => RemoteState::Ready(f(value)),
            Self::Failed(error) => RemoteState::Failed(error),
        }
    }
}

impl<T> From<Result<T, Error>> for RemoteState<T> {
    fn from(result: Result<T, Error>) -> Self {
        match result {
            Ok(value) => Self::Ready(value),
            Err(error) => Self::Failed(error),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;

    #[test]
    fn states_tag_their_phase_on_the_wire() {
        let ready: RemoteState<u32> = RemoteState::Ready(7);
        let value = serde_json::to_value(&ready).expect("state should serialise");
        assert_eq!(value["phase"], "ready");
        assert_eq!(value["value"], 7);

        let idle: RemoteState<u32> = RemoteState::Idle;
        let value = serde_json::to_value(&idle).expect("state should serialise");
        assert_eq!(value["phase"], "idle");
        assert!(value.get("value").is_none());
    }

    #[test]
    fn map_preserves_non_value_states() {
        let failed: RemoteState<u32> = RemoteState::Failed(Error::not_found("gone"));
        assert!(matches!(failed.map(|n| n + 1), RemoteState::Failed(_)));
        assert_eq!(RemoteState::Ready(2).map(|n| n * 2).value(), Some(&4));
    }
}
