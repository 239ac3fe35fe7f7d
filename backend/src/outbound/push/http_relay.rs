//! Reqwest-backed push relay adapter.
//!
//! This adapter owns transport details only: payload serialisation, timeout
//! and HTTP error mapping. The relay's JSON contract is defined by the
//! domain's [`PushMessage`] type.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};

use crate::domain::notifications::PushMessage;
use crate::domain::ports::{PushRelay, PushRelayError};

const DEFAULT_USER_AGENT: &str = "clubhub-backend-push-relay/0.1";
const DEFAULT_CONTACT: &str = "ops@clubhub.invalid";

/// Outbound identity settings for relay requests.
pub struct HttpPushRelayIdentity {
    /// HTTP user-agent sent to the relay.
    pub user_agent: String,
    /// Contact header value sent to the relay.
    pub contact: String,
}

impl Default for HttpPushRelayIdentity {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            contact: DEFAULT_CONTACT.to_owned(),
        }
    }
}

/// Push relay adapter performing HTTP POST requests against one endpoint.
pub struct HttpPushRelay {
    client: Client,
    endpoint: Url,
    user_agent: String,
    contact: String,
}

impl HttpPushRelay {
    /// Build an adapter using a reqwest client with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        Self::with_identity(endpoint, timeout, HttpPushRelayIdentity::default())
    }

    /// Build an adapter with explicit outbound identity.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn with_identity(
        endpoint: Url,
        timeout: Duration,
        identity: HttpPushRelayIdentity,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint,
            user_agent: identity.user_agent,
            contact: identity.contact,
        })
    }
}

#[async_trait]
impl PushRelay for HttpPushRelay {
    async fn send(&self, message: &PushMessage) -> Result<(), PushRelayError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .header(reqwest::header::USER_AGENT, self.user_agent.as_str())
            .header("Contact", self.contact.as_str())
            .json(message)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.bytes().await.unwrap_or_default();
        Err(map_status_error(status, body.as_ref()))
    }
}

fn map_transport_error(error: reqwest::Error) -> PushRelayError {
    if error.is_timeout() {
        PushRelayError::timeout(error.to_string())
    } else {
        PushRelayError::transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> PushRelayError {
    let body_preview = body_preview(body);
    let message = if body_preview.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {}", status.as_u16(), body_preview)
    };

    match status {
        StatusCode::TOO_MANY_REQUESTS => PushRelayError::rate_limited(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            PushRelayError::timeout(message)
        }
        _ if status.is_client_error() => PushRelayError::invalid_request(message),
        _ => PushRelayError::transport(message),
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
