// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Portfolio Contact Service
//!
//! Serves `POST /api/contact` for the portfolio site and emails each accepted
//! submission to the site owner.
//!
//! ## Configuration
//!
//! Configuration is loaded from environment variables (a local `.env` file is
//! read first when present):
//!
//! - `BIND_ADDR`: Server bind address (default: 0.0.0.0:8080)
//! - `CONTACT_MAX_SUBMISSIONS`: Submissions per IP per window (default: 3)
//! - `CONTACT_WINDOW_SECS`: Rate limit window (default: 3600)
//! - `RESEND_API_KEY`, `CONTACT_FROM_EMAIL`, `CONTACT_TO_EMAIL`: email
//!   provider credentials; submissions fail with a configuration error
//!   until all three are set

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use portfolio_contact::{
    clock::{Clock, SystemClock},
    config::Config,
    error::AppError,
    handlers::AppState,
    limiter::{InMemoryRateLimiter, RateLimitStore},
    mailer::ResendMailer,
    metrics::ContactMetrics,
    routes::build_router,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is normal outside local development
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let config = Config::from_env().map_err(AppError::from)?;
    info!(
        bind_addr = %config.bind_addr,
        max_submissions = config.rate_limit.max_submissions,
        window_secs = config.rate_limit.window_secs,
        metrics = config.metrics.enabled,
        "Starting portfolio contact service"
    );

    if let Err(err) = config.email.credentials() {
        warn!(error = %err, "Email delivery disabled until credentials are set");
    }

    // Create application state
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let limiter: Arc<dyn RateLimitStore> = Arc::new(InMemoryRateLimiter::new(
        config.rate_limit.clone(),
        clock.clone(),
    ));
    let mailer = Arc::new(ResendMailer::new(&config.email).map_err(AppError::from)?);
    let metrics = ContactMetrics::new().map_err(AppError::from)?;

    let state = Arc::new(AppState {
        limiter: limiter.clone(),
        mailer,
        clock,
        metrics,
        config: config.clone(),
    });

    // Spawn sweep task
    let sweep_every = config.rate_limit.sweep_interval();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(sweep_every);
        loop {
            interval.tick().await;
            limiter.sweep_expired().await;
        }
    });

    let app = build_router(state);

    // Start server
    let addr: SocketAddr = config.bind_addr.parse().map_err(AppError::from)?;
    let listener = TcpListener::bind(addr).await.map_err(AppError::from)?;
    info!(addr = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "Failed to listen for SIGTERM");
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

    info!("Shutdown signal received");
}
