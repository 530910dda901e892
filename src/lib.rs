//! Autoscreen: web-triggered screenshot mode.
//!
//! This is the app shell that wires the domains together. No business
//! logic lives here, only module declarations, configuration, logging
//! setup and the HTTP server lifecycle.
//!
//! Domains:
//!   - capture:  screen → PNG bytes (xcap)
//!   - sink:     PNG bytes → .xlsx / .docx on disk
//!   - trigger:  key polling thread
//!   - session:  the state machine tying the three together
//!   - commands: HTTP handlers over the session

pub mod capture;
pub mod commands;
pub mod page;
pub mod session;
pub mod settings;
pub mod sink;
pub mod trigger;

use capture::PrimaryMonitor;
use session::SessionController;
use settings::Settings;
use std::sync::Arc;
use trigger::SystemKeyboard;

/// Entry point, called from `main`.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env.local → .env from the working directory. Logging is not
    // up yet, so report on stderr.
    'env_load: for env_file in [".env.local", ".env"] {
        let path = std::path::Path::new(env_file);
        if path.exists() {
            match dotenvy::from_path(path) {
                Ok(_) => eprintln!("[STARTUP] Loaded {}", path.display()),
                Err(e) => eprintln!("[STARTUP] Failed to load {}: {}", path.display(), e),
            }
            break 'env_load;
        }
    }

    env_logger::init();

    let settings = Settings::from_env()?;
    log::info!(
        "[STARTUP] Storage: {}, trigger key {:?}",
        settings.storage_dir.display(),
        settings.trigger_key()
    );

    let bind = settings.bind;
    let session = Arc::new(SessionController::new(
        settings,
        Arc::new(PrimaryMonitor),
        Arc::new(SystemKeyboard),
    ));

    let listener = tokio::net::TcpListener::bind(bind).await?;
    log::info!("[STARTUP] Listening on http://{}", bind);

    axum::serve(listener, commands::router(Arc::clone(&session)))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Stop the poller and flush an open workbook before exiting.
    let closing = Arc::clone(&session);
    tokio::task::spawn_blocking(move || closing.shutdown()).await??;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("[STARTUP] Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    log::info!("Shutdown requested");
}
