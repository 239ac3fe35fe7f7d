//! Port abstraction for the push-notification relay.

use async_trait::async_trait;
use tracing::debug;

use crate::domain::notifications::PushMessage;

use super::define_port_error;

define_port_error! {
    /// Failures raised by push relay adapters.
    pub enum PushRelayError {
        /// The relay could not be reached.
        Transport { message: String } => "push relay transport failure: {message}",
        /// The relay did not answer within the configured deadline.
        Timeout { message: String } => "push relay timed out: {message}",
        /// The relay throttled the sender.
        RateLimited { message: String } => "push relay rate limited: {message}",
        /// The relay rejected the payload.
        InvalidRequest { message: String } => "push relay rejected the message: {message}",
    }
}

/// Port for delivering push notifications.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PushRelay: Send + Sync {
    /// Deliver one message; broadcast when `message.to` is absent.
    async fn send(&self, message: &PushMessage) -> Result<(), PushRelayError>;
}

/// Fixture implementation that records nothing and always succeeds.
///
/// Use it in composition roots and tests where delivery is not under test.
#[derive(Debug, Default)]
pub struct NoOpPushRelay;

#[async_trait]
impl PushRelay for NoOpPushRelay {
    async fn send(&self, message: &PushMessage) -> Result<(), PushRelayError> {
        debug!(
            title = %message.notification.title,
            broadcast = message.to.is_none(),
            "push delivery skipped by no-op relay"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::notifications::PushNotification;

    #[tokio::test]
    async fn no_op_relay_accepts_messages() {
        let relay = NoOpPushRelay;
        let message = PushMessage::broadcast(PushNotification {
            title: "t".to_owned(),
            body: "b".to_owned(),
            image: None,
        });
        relay
            .send(&message)
            .await
            .expect("no-op relay should accept messages");
    }
}
