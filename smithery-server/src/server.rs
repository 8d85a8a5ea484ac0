// SPDX-FileCopyrightText: 2025 Timothy Pogue
//
// SPDX-License-Identifier: ISC

use std::{sync::Arc, time::Duration, net::SocketAddr};
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
    Extension,
};
use axum::response::{Json, IntoResponse};
use axum_server::{tls_rustls::RustlsConfig, Handle};
use serde::Serialize;
use tokio::signal;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;

use smithery_common::config::ServerConfig;
use smithery_common::constant::APP_NAME;
use smithery_common::telemetry::{create_trace_layer, error, info};
use smithery_dynamic::context::Context;

use crate::router::v1::{forge, widgets};

#[derive(Serialize)]
struct RootResponse {
    name: &'static str,
    version: &'static str,
}

async fn root() -> impl IntoResponse {
    let response = RootResponse {
        name: APP_NAME,
        version: env!("CARGO_PKG_VERSION"),
    };
    Json(response).into_response()
}

/// Wildcard origins never allow credentials, browsers reject that pair
pub fn create_cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::ACCEPT, header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(Duration::from_secs(300));

    if allowed_origins.is_empty() || allowed_origins.iter().any(|origin| origin == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    layer
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
}

pub fn create_router(ctx: Arc<Context>) -> Router {
    let config: &ServerConfig = &ctx.state.config.server;
    let body_limit = DefaultBodyLimit::max(config.max_body_size);
    let timeout = TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs));
    let cors = create_cors_layer(&config.cors_allowed_origins);

    Router::new()
        .merge(forge::router())
        .merge(widgets::router())
        .layer(Extension(ctx))
        .layer(body_limit)
        .layer(timeout)
        .layer(cors)
        .layer(create_trace_layer())
        // Health endpoints after the tracing layer so health checks
        // stay out of the request logs
        .route("/", get(root))
        .route("/health", get(root))
}

pub async fn create_tls_config(cert_file: &str, key_file: &str) -> std::io::Result<RustlsConfig> {
    RustlsConfig::from_pem_file(cert_file, key_file).await
}

/// Serve the router until the handle shuts it down, over TLS when a config
/// is given
pub async fn serve(addr: SocketAddr, router: Router, tls_config: Option<RustlsConfig>, handle: Handle) -> std::io::Result<()> {
    match tls_config {
        Some(tls_config) => {
            info!(event = "ServerStarting", address = %addr, tls = true);
            axum_server::bind_rustls(addr, tls_config)
                .handle(handle)
                .serve(router.into_make_service())
                .await
        }
        None => {
            info!(event = "ServerStarting", address = %addr, tls = false);
            axum_server::bind(addr)
                .handle(handle)
                .serve(router.into_make_service())
                .await
        }
    }
}

pub async fn shutdown_signal(handle: Handle) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!(event = "SignalHandlerFailed", signal = "SIGINT", error = %err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                error!(event = "SignalHandlerFailed", signal = "SIGTERM", error = %err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => (),
        _ = terminate => (),
    }

    info!(event = "ServerStopping");
    handle.graceful_shutdown(Some(Duration::from_secs(10)));
}
