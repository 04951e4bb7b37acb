// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::net::SocketAddr;
use std::process::ExitCode;
use std::time::Duration;

use axum_server::{tls_rustls::RustlsConfig, Handle};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use relational_auth_server::api::router;
use relational_auth_server::challenge_sweeper::ChallengeSweeper;
use relational_auth_server::config::{AppConfig, LogFormat};
use relational_auth_server::error::StartupError;
use relational_auth_server::state::AppState;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> ExitCode {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    init_tracing(config.log_format);

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Server failed");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(fmt::layer()).init(),
    }
}

async fn run(config: AppConfig) -> Result<(), StartupError> {
    let state = AppState::from_config(&config)?;

    let shutdown = CancellationToken::new();
    let sweeper = ChallengeSweeper::new(state.challenges()).with_interval(config.sweep_interval);
    let sweeper_task = tokio::spawn(sweeper.run(shutdown.clone()));

    let handle = Handle::new();
    tokio::spawn({
        let handle = handle.clone();
        let shutdown = shutdown.clone();
        async move {
            shutdown_signal().await;
            info!("Shutdown signal received");
            shutdown.cancel();
            handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
        }
    });

    let bind = format!("{}:{}", config.host, config.port);
    let addr: SocketAddr = bind
        .parse()
        .map_err(|_| StartupError::BindAddress(bind.clone()))?;
    let app = router(state);

    match &config.tls {
        Some((cert, key)) => {
            // The ring provider must be installed before any TLS config is built
            if rustls::crypto::ring::default_provider()
                .install_default()
                .is_err()
            {
                warn!("rustls crypto provider was already installed");
            }
            let tls = RustlsConfig::from_pem_file(cert, key).await?;

            info!(%addr, "Relational Auth listening on https (docs at /docs)");
            axum_server::bind_rustls(addr, tls)
                .handle(handle)
                .serve(app.into_make_service())
                .await?;
        }
        None => {
            info!(%addr, "Relational Auth listening on http (docs at /docs)");
            axum_server::bind(addr)
                .handle(handle)
                .serve(app.into_make_service())
                .await?;
        }
    }

    shutdown.cancel();
    if let Err(e) = sweeper_task.await {
        warn!(error = %e, "Challenge sweeper task ended abnormally");
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
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
