//! Push relay adapters.

mod http_relay;

pub use http_relay::{HttpPushRelay, HttpPushRelayIdentity};
