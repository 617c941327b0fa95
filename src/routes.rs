// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Router construction.

use crate::config::Config;
use crate::handlers::{self, handle_panic, AppState};
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

/// Largest accepted request body.
pub const MAX_BODY_BYTES: usize = 16 * 1024;

pub const CONTACT_PATH: &str = "/api/contact";

/// Build the service router.
pub fn build_router(state: Arc<AppState>) -> Router {
    let mut router = Router::new()
        .route("/health", get(handlers::health))
        .route("/healthz", get(handlers::health))
        .route(
            CONTACT_PATH,
            post(handlers::submit_contact).fallback(handlers::method_not_allowed),
        );

    if state.config.metrics.enabled {
        router = router.route(&state.config.metrics.path, get(handlers::metrics));
    }

    router
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(cors_layer(&state.config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    match config.cors_allowed_origin.as_deref() {
        None => CorsLayer::permissive(),
        Some(origin) => match origin.parse::<HeaderValue>() {
            Ok(origin) => CorsLayer::new()
                .allow_origin(origin)
                .allow_methods([Method::POST])
                .allow_headers([header::CONTENT_TYPE]),
            Err(_) => {
                warn!(origin = %origin, "Ignoring unparseable CORS origin");
                CorsLayer::new()
            }
        },
    }
}
