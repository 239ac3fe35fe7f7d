//! WebSocket inbound adapter streaming projection updates.
//!
//! Responsibilities:
//! - validate upgrade requests (origin allow-list)
//! - run the per-connection session loop with heartbeats
//! - bridge one projection subscription per connection into frames
//!
//! Subscriptions are torn down deterministically: replacing a subscription
//! releases the previous listener, and closing the connection releases the
//! active one.

use std::time::{Duration, Instant};

use actix_web::web::{self, Payload};
use actix_web::{
    HttpRequest, HttpResponse, get,
    http::header::{HeaderValue, ORIGIN},
};
use actix_ws::{AggregatedMessage, AggregatedMessageStream, Session};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};
use url::Url;

use crate::domain::ports::WatchHandle;
use crate::domain::{DocPath, Error, ProjectionSubscription, RemoteState};
use crate::inbound::http::state::HttpState;

pub mod messages;

use messages::{ClientFrame, ServerFrame};

/// Time between heartbeats to the client.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
/// Maximum allowed time between messages from the client before considering it disconnected.
const CLIENT_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_FRAME_BYTES: usize = 64 * 1024;
const FRAME_BUFFER: usize = 16;

/// Handle WebSocket upgrade for the `/ws` endpoint.
#[get("/ws")]
pub async fn ws_entry(
    state: web::Data<HttpState>,
    req: HttpRequest,
    stream: Payload,
) -> actix_web::Result<HttpResponse> {
    let mut origin_iter = req.headers().get_all(ORIGIN);
    let origin_header = origin_iter.next().ok_or_else(|| {
        error!("Missing Origin header on WebSocket upgrade");
        actix_web::error::ErrorForbidden("Origin not allowed")
    })?;
    if origin_iter.next().is_some() {
        error!("Multiple Origin headers on WebSocket upgrade");
        return Err(actix_web::error::ErrorBadRequest("Invalid Origin header"));
    }

    validate_origin(origin_header)?;

    let (response, session, message_stream) = actix_ws::handle(&req, stream)?;
    let message_stream = message_stream
        .aggregate_continuations()
        .max_continuation_size(MAX_FRAME_BYTES);
    actix_web::rt::spawn(run_session(session, message_stream, state));
    Ok(response)
}

/// Live projection bridged into the connection's frame channel.
struct ActiveSubscription {
    watch_handle: WatchHandle,
    forwarder: JoinHandle<()>,
}

impl ActiveSubscription {
    /// Move the subscription into a forwarder task feeding `frames`.
    fn spawn(
        path: String,
        mut subscription: ProjectionSubscription,
        frames: mpsc::Sender<ServerFrame>,
    ) -> Self {
        let watch_handle = subscription.watch_handle();
        let forwarder = tokio::spawn(async move {
            while let Some(update) = subscription.next().await {
                let frame = ServerFrame::State {
                    path: path.clone(),
                    state: update,
                };
                if frames.send(frame).await.is_err() {
                    break;
                }
            }
        });
        Self {
            watch_handle,
            forwarder,
        }
    }

    /// Release the store listener and stop forwarding. Idempotent.
    fn release(&self) {
        self.watch_handle.cancel();
        self.forwarder.abort();
    }
}

async fn run_session(
    mut session: Session,
    mut stream: AggregatedMessageStream,
    state: web::Data<HttpState>,
) {
    let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
    let mut last_heartbeat = Instant::now();
    let (frame_tx, mut frame_rx) = mpsc::channel::<ServerFrame>(FRAME_BUFFER);
    let mut active: Option<ActiveSubscription> = None;

    loop {
        tokio::select! {
            _ = heartbeat.tick() => {
                if Instant::now().duration_since(last_heartbeat) > CLIENT_TIMEOUT {
                    debug!("WebSocket heartbeat timeout; closing connection");
                    break;
                }
                if session.ping(b"").await.is_err() {
                    break;
                }
            }
            frame = frame_rx.recv() => {
                // The sender half lives in this function, so the channel
                // never closes before the loop ends.
                let Some(frame) = frame else { break };
                if send_frame(&mut session, &frame).await.is_err() {
                    break;
                }
            }
            message = stream.recv() => {
                match message {
                    Some(Ok(message)) => {
                        last_heartbeat = Instant::now();
                        if handle_message(&mut session, &state, &mut active, &frame_tx, message)
                            .await
                            .is_err()
                        {
                            break;
                        }
                    }
                    Some(Err(protocol_error)) => {
                        warn!(error = %protocol_error, "WebSocket protocol error");
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    if let Some(subscription) = active {
        subscription.release();
    }
    let _ = session.close(None).await;
}

/// Ok to continue, Err to drop the connection.
async fn handle_message(
    session: &mut Session,
    state: &web::Data<HttpState>,
    active: &mut Option<ActiveSubscription>,
    frames: &mpsc::Sender<ServerFrame>,
    message: AggregatedMessage,
) -> Result<(), ()> {
    match message {
        AggregatedMessage::Ping(payload) => session.pong(&payload).await.map_err(|_| ()),
        AggregatedMessage::Pong(_) | AggregatedMessage::Binary(_) => Ok(()),
        AggregatedMessage::Close(_) => Err(()),
        AggregatedMessage::Text(text) => {
            let frame = match serde_json::from_str::<ClientFrame>(&text) {
                Ok(frame) => frame,
                Err(parse_error) => {
                    let error = Error::invalid_request(format!("unparseable frame: {parse_error}"));
                    return send_frame(session, &ServerFrame::Error { error }).await;
                }
            };
            handle_frame(session, state, active, frames, frame).await
        }
    }
}

async fn handle_frame(
    session: &mut Session,
    state: &web::Data<HttpState>,
    active: &mut Option<ActiveSubscription>,
    frames: &mpsc::Sender<ServerFrame>,
    frame: ClientFrame,
) -> Result<(), ()> {
    match frame {
        ClientFrame::Subscribe { path } => {
            let parsed = match DocPath::parse(&path) {
                Ok(parsed) => parsed,
                Err(path_error) => {
                    let error = Error::invalid_request(path_error.to_string());
                    return send_frame(session, &ServerFrame::Error { error }).await;
                }
            };

            send_frame(
                session,
                &ServerFrame::State {
                    path: path.clone(),
                    state: RemoteState::Loading,
                },
            )
            .await?;

            // Replacing an active subscription releases its listener first.
            if let Some(previous) = active.take() {
                previous.release();
            }
            match state.projection.subscribe(&parsed).await {
                Ok(subscription) => {
                    let snapshot = subscription.current().clone();
                    send_frame(
                        session,
                        &ServerFrame::State {
                            path: path.clone(),
                            state: snapshot,
                        },
                    )
                    .await?;
                    *active = Some(ActiveSubscription::spawn(
                        path,
                        subscription,
                        frames.clone(),
                    ));
                    Ok(())
                }
                Err(error) => {
                    send_frame(
                        session,
                        &ServerFrame::State {
                            path,
                            state: RemoteState::Failed(error),
                        },
                    )
                    .await
                }
            }
        }
        ClientFrame::Unsubscribe => {
            if let Some(previous) = active.take() {
                previous.release();
            }
            send_frame(session, &ServerFrame::Unsubscribed).await
        }
    }
}

async fn send_frame(session: &mut Session, frame: &ServerFrame) -> Result<(), ()> {
    match serde_json::to_string(frame) {
        Ok(body) => session.text(body).await.map_err(|_| ()),
        Err(serialise_error) => {
            warn!(error = %serialise_error, "failed to serialise WebSocket frame");
            Ok(())
        }
    }
}

const PRIMARY_HOST: &str = "clubhub.example";
const LOCALHOST: &str = "localhost";
const ALLOWED_SUBDOMAIN_SUFFIX: &str = ".clubhub.example";

/// Returns true when a parsed Origin belongs to the static allow-list.
///
/// The allow-list currently accepts HTTPS requests from the production root
/// domain and any of its subdomains, and HTTP requests from localhost with a
/// non-zero explicit port. Once configuration is available this should move
/// into a runtime-controlled allow-list.
fn is_allowed_origin(origin: &Url) -> bool {
    let host = match origin.host_str() {
        Some(value) => value,
        None => return false,
    };

    match origin.scheme() {
        "http" if host == LOCALHOST => matches!(origin.port(), Some(port) if port != 0),
        "https" if host == PRIMARY_HOST => true,
        "https" if host.strip_suffix(ALLOWED_SUBDOMAIN_SUFFIX).is_some() => true,
        _ => false,
    }
}

fn validate_origin(origin_header: &HeaderValue) -> actix_web::Result<()> {
    let origin_value = match origin_header.to_str() {
        Ok(value) => value,
        Err(to_str_error) => {
            error!(error = %to_str_error, "Failed to parse Origin header as string");
            return Err(actix_web::error::ErrorBadRequest("Invalid Origin header"));
        }
    };

    let origin = Url::parse(origin_value).map_err(|parse_error| {
        error!(error = %parse_error, "Failed to parse Origin header as URL");
        actix_web::error::ErrorBadRequest("Invalid Origin header")
    })?;

    if is_allowed_origin(&origin) {
        Ok(())
    } else {
        warn!(
            origin = origin_value,
            "Rejected WS upgrade due to disallowed Origin"
        );
        Err(actix_web::error::ErrorForbidden("Origin not allowed"))
    }
}
