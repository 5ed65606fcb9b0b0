//! Standalone Quickdraw server.
//!
//! ```text
//! quickdraw-server [bind-addr] [reaction|contention]
//! ```
//!
//! Defaults to `127.0.0.1:5000` in reaction mode. Log verbosity via
//! `RUST_LOG` (e.g. `RUST_LOG=quickdraw=debug`).

use quickdraw::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), QuickdrawError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let bind_addr = args
        .next()
        .unwrap_or_else(|| "127.0.0.1:5000".to_string());
    let mode = match args.next().as_deref() {
        Some("contention") => GameMode::Contention,
        _ => GameMode::Reaction,
    };

    let server = QuickdrawServer::builder()
        .bind(&bind_addr)
        .mode(mode)
        .build()
        .await?;

    tracing::info!(
        addr = %server.local_addr().map(|a| a.to_string()).unwrap_or_default(),
        ?mode,
        "quickdraw server starting"
    );

    server.run().await
}
