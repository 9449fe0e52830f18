//! Updrop server binary.
//!
//! A small HTTP service for folder uploads: clients post multipart file parts
//! whose filenames carry relative paths, and the service reconstructs that
//! directory tree under a local upload root. The main entry point builds the
//! Axum router, attaches the per-route rate limiters, and starts the HTTP
//! listener.

mod background;
mod config;
mod error;
mod files;
mod frontend;
mod http;
mod logging;
mod rate_limit;
mod storage;
mod upload;

use axum::extract::{DefaultBodyLimit, Extension, connect_info::ConnectInfo};
use axum::http::Request;
use axum::routing::{get, post};
use axum::{Router, middleware};
use axum_server::Handle;
use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{Level, info, info_span};

use crate::background::spawn_background_tasks;
use crate::config::Args;
use crate::http::build_cors_layer;
use crate::rate_limit::{RateLimiter, RateLimits, RatePolicy};
use crate::storage::Storage;

const UPLOAD_LIMIT_MESSAGE: &str =
    "Too many upload requests from this IP, please try again later.";
const LIST_LIMIT_MESSAGE: &str = "Too many requests from this IP, please try again later.";

/// Starts the Updrop server and blocks until shutdown.
#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    logging::init_logging();

    let args = Args::parse();
    // The upload root itself is created on first write, not at startup.
    let storage = Arc::new(Storage::new(PathBuf::from(args.upload_dir.clone())));
    let limits = Arc::new(RateLimits {
        upload: RateLimiter::new(
            RatePolicy {
                window: Duration::from_secs(args.upload_window_secs),
                max_requests: args.upload_max_requests,
            },
            UPLOAD_LIMIT_MESSAGE,
        ),
        listing: RateLimiter::new(
            RatePolicy {
                window: Duration::from_secs(args.list_window_secs),
                max_requests: args.list_max_requests,
            },
            LIST_LIMIT_MESSAGE,
        ),
    });
    let limits_for_tasks = limits.clone();

    let mut app = Router::new()
        .route(
            "/upload",
            post(upload::upload_files)
                .route_layer(middleware::from_fn(rate_limit::limit_uploads))
                .layer(DefaultBodyLimit::disable()),
        )
        .route(
            "/uploads",
            get(files::list_uploads).route_layer(middleware::from_fn(rate_limit::limit_listing)),
        )
        .fallback(frontend::serve_frontend)
        .layer(middleware::from_fn(http::add_security_headers))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    let forwarded_ip = request
                        .headers()
                        .get("x-forwarded-for")
                        .and_then(|v| v.to_str().ok())
                        .map(|s| s.split(',').next().unwrap_or("").trim().to_string());
                    let connect_ip = request
                        .extensions()
                        .get::<ConnectInfo<SocketAddr>>()
                        .map(|ConnectInfo(addr)| addr.to_string());
                    let client_ip = forwarded_ip
                        .or(connect_ip)
                        .unwrap_or_else(|| "unknown".to_string());

                    info_span!(
                        env!("CARGO_CRATE_NAME"),
                        client_ip,
                        method = ?request.method(),
                        path = ?request.uri().path(),
                    )
                })
                .on_request(DefaultOnRequest::new().level(Level::DEBUG))
                .on_response(DefaultOnResponse::new().level(Level::DEBUG)),
        )
        .layer(Extension(storage))
        .layer(Extension(limits));

    if let Some(cors_layer) = build_cors_layer(args.cors_origins.as_deref()) {
        app = app.layer(cors_layer);
    }

    let host = args
        .host
        .parse::<IpAddr>()
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidInput, err.to_string()))?;
    let addr = SocketAddr::new(host, args.port);
    let handle = Handle::new();

    info!("Server is running on http://{}", addr);

    let server = axum_server::bind(addr)
        .handle(handle.clone())
        .serve(app.into_make_service_with_connect_info::<SocketAddr>());

    spawn_background_tasks(limits_for_tasks);
    tokio::select! {
        result = server => result?,
        _ = shutdown_signal(handle) => {}
    }

    Ok(())
}

async fn shutdown_signal(handle: Handle) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Received termination signal shutting down");
    handle.graceful_shutdown(Some(Duration::from_secs(10)));
}
