//! `plaza` binary entry point.
//!
//! Usage:
//! ```bash
//! plaza                      # defaults: ws on :3001, http on :3002
//! plaza --config plaza.toml
//! PORT=8080 plaza            # override the WebSocket port
//! ```

use std::path::PathBuf;

use plaza::{PlazaConfig, PlazaError, PlazaServer};

#[tokio::main]
async fn main() -> Result<(), PlazaError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = load_config()?;

    let mut builder = PlazaServer::builder()
        .bind(&config.server.bind)
        .handshake_timeout(config.handshake_timeout())
        .hub_config(config.hub_config());
    if let Some(addr) = config.http_bind() {
        builder = builder.http_bind(addr);
    }

    let server = builder.build().await?;
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        ws = ?server.local_addr().ok(),
        http = ?server.http_addr(),
        "starting Plaza relay"
    );
    server.run().await
}

fn load_config() -> Result<PlazaConfig, PlazaError> {
    let config = match config_path() {
        Some(path) => {
            tracing::info!(path = %path.display(), "loading config file");
            PlazaConfig::from_file(&path)?
        }
        None => PlazaConfig::default(),
    };

    match std::env::var("PORT") {
        Ok(port) => Ok(config.with_port(&port)?),
        Err(_) => Ok(config),
    }
}

fn config_path() -> Option<PathBuf> {
    std::env::args()
        .skip_while(|arg| arg != "--config")
        .nth(1)
        .map(PathBuf::from)
}
