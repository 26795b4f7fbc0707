//! `menu-platform` server binary.
//!
//! ```bash
//! MENU__ADMIN__PLATFORM_KEY=change-me MENU__STORAGE__DATA_DIR=./data RUST_LOG=info cargo run
//! ```

use anyhow::Context;
use menu_platform::config::Settings;
use menu_platform::http::{self, AppState};
use menu_platform::lifecycle::{setup_tracing, MenuPlatform, ShutdownHandle};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    setup_tracing();

    let settings = Settings::load().context("loading configuration")?;
    let addr = settings.bind_addr()?;

    let platform = MenuPlatform::start(&settings)
        .await
        .context("starting platform")?;
    let shutdown = platform.shutdown_handle();

    let app = http::router(AppState::new(&platform, &settings), &settings.server);
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await
        .context("serving HTTP")?;

    // The router and its clients are gone; the actors can now drain.
    platform.shutdown().await?;
    info!("Bye");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM, after telling open event streams to close.
async fn shutdown_signal(handle: ShutdownHandle) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    handle.trigger();
}
