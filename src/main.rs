use anyhow::{Context, Result};
use tracing::info;

use heart_predictor::api::{self, AppState};
use heart_predictor::common::config::AppCfg;
use heart_predictor::common::log;
use heart_predictor::model::service::load_model;

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = AppCfg::load().context("loading configuration")?;
    log::init(&cfg)?;

    // No model, no service.
    let model = load_model(&cfg).context("loading model artefact")?;
    let addr = cfg.bind_addr()?;

    let app = api::router(AppState::from(model));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;

    info!(ev = "listening", %addr, "{} listening on http://{addr}", api::http::SERVICE_TITLE);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    info!(ev = "shutdown", "server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to listen for SIGTERM");
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
}
