//! lmguard gateway: entry point.
//!
//! # Environment variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `LMGUARD_CONFIG` | *(none)* | Settings file (yaml/toml/json/ini/ron/json5). |
//! | `LMGUARD__SECTION__KEY` | *(none)* | Override one setting (`LMGUARD__SERVER__PORT=9000`). |
//! | `RUST_LOG` | `lmguard_gateway=info` | Log filter. |

use lmguard_foundation::{LmStudioClient, ReqwestTransport};
use lmguard_gateway::{AppState, GatewayServer, InMemoryLibrary};
use lmguard_kernel::SharedSettings;
use lmguard_kernel::config::load_settings;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("lmguard_gateway=info".parse()?),
        )
        .init();

    let config_path = std::env::var("LMGUARD_CONFIG").ok();
    let settings = load_settings(config_path.as_deref())?;

    if !settings.server.enabled {
        info!("server.enabled is false; not starting the gateway");
        return Ok(());
    }
    if !settings.server.require_auth {
        warn!("server.requireAuth is off; every local process can call the gateway");
    }

    let store = Arc::new(SharedSettings::new(settings));
    let upstream = LmStudioClient::with_transport(Arc::new(ReqwestTransport::new()?));
    let state = AppState::new(store, upstream, Arc::new(InMemoryLibrary::new()));
    info!(
        fingerprint = %state.credentials.active().fingerprint(),
        "inbound API key ready"
    );

    GatewayServer::new(state).start().await?;
    Ok(())
}
