//! Backend entry-point: wires REST endpoints, WebSocket entry, and OpenAPI docs.

use std::env;
use std::net::SocketAddr;

use actix_web::cookie::{Key, SameSite};
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};
use url::Url;

use backend::server::{self, ServerConfig};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// Application bootstrap.
#[actix_web::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    if let Err(init_error) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %init_error, "tracing init failed");
    }

    let key_path =
        env::var("SESSION_KEY_FILE").unwrap_or_else(|_| "/var/run/secrets/session_key".into());
    let key = match std::fs::read(&key_path) {
        Ok(bytes) => Key::derive_from(&bytes),
        Err(read_error) => {
            let allow_dev = env::var("SESSION_ALLOW_EPHEMERAL").ok().as_deref() == Some("1");
            if cfg!(debug_assertions) || allow_dev {
                warn!(path = %key_path, error = %read_error, "using temporary session key (dev only)");
                Key::generate()
            } else {
                return Err(color_eyre::eyre::eyre!(
                    "failed to read session key at {key_path}: {read_error}"
                ));
            }
        }
    };

    let cookie_secure = env::var("SESSION_COOKIE_SECURE")
        .map(|value| value != "0")
        .unwrap_or(true);

    let bind_addr: SocketAddr = env::var("BIND_ADDR")
        .unwrap_or_else(|_| DEFAULT_BIND_ADDR.into())
        .parse()?;

    let mut config = ServerConfig::new(key, cookie_secure, SameSite::Lax, bind_addr);
    if let Ok(raw_endpoint) = env::var("PUSH_RELAY_URL") {
        match Url::parse(&raw_endpoint) {
            Ok(endpoint) => config = config.with_push_endpoint(endpoint),
            Err(parse_error) => {
                warn!(error = %parse_error, "PUSH_RELAY_URL is not a valid URL; push disabled");
            }
        }
    }

    let state = server::build_state(&config);

    #[cfg(feature = "example-data")]
    if let Ok(registry_path) = env::var("EXAMPLE_DATA_REGISTRY") {
        let seed_name =
            env::var("EXAMPLE_DATA_SEED").unwrap_or_else(|_| "campus-demo".into());
        match std::fs::read_to_string(&registry_path) {
            Ok(registry_json) => {
                server::seed_example_data(&state, &registry_json, &seed_name).await;
            }
            Err(read_error) => {
                warn!(path = %registry_path, error = %read_error, "example data registry unreadable");
            }
        }
    }

    server::run(config, state).await?;
    Ok(())
}
