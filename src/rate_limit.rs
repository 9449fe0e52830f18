//! Per-client fixed-window rate limiting for the upload and listing routes.

use axum::body::Body as AxumBody;
use axum::extract::{Extension, connect_info::ConnectInfo};
use axum::http::Request;
use axum::{middleware, response::Response};
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::warn;

use crate::error::ApiError;
use crate::http::resolve_client_ip;

#[derive(Clone, Copy, Debug)]
pub struct RatePolicy {
    pub window: Duration,
    pub max_requests: u32,
}

#[derive(Debug)]
struct ClientWindow {
    window_start: Instant,
    count: u32,
}

/// One counter map per policy. Windows are fixed: the counter resets when a
/// request arrives after the window has elapsed, never mid-window.
#[derive(Debug)]
pub struct RateLimiter {
    policy: RatePolicy,
    message: &'static str,
    clients: Mutex<HashMap<IpAddr, ClientWindow>>,
}

impl RateLimiter {
    pub fn new(policy: RatePolicy, message: &'static str) -> Self {
        Self {
            policy,
            message,
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// Admits or rejects a request from `ip`. Rejected requests still consume
    /// the counter. Returns the seconds until the window resets on rejection.
    pub async fn check(&self, ip: IpAddr) -> Result<(), u64> {
        let mut clients = self.clients.lock().await;
        let now = Instant::now();
        let entry = clients.entry(ip).or_insert(ClientWindow {
            window_start: now,
            count: 0,
        });

        if now.duration_since(entry.window_start) > self.policy.window {
            entry.window_start = now;
            entry.count = 0;
        }

        entry.count = entry.count.saturating_add(1);
        if entry.count > self.policy.max_requests {
            let elapsed = now.duration_since(entry.window_start);
            let retry_after = self.policy.window.saturating_sub(elapsed).as_secs().max(1);
            return Err(retry_after);
        }

        Ok(())
    }

    /// Drops client entries whose window has elapsed.
    pub async fn prune(&self) {
        let mut clients = self.clients.lock().await;
        let now = Instant::now();
        clients.retain(|_, entry| now.duration_since(entry.window_start) <= self.policy.window);
    }
}

/// The two limiter maps the service runs with, shared across requests.
#[derive(Debug)]
pub struct RateLimits {
    pub upload: RateLimiter,
    pub listing: RateLimiter,
}

/// Middleware for the upload route.
pub async fn limit_uploads(
    Extension(limits): Extension<Arc<RateLimits>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    req: Request<AxumBody>,
    next: middleware::Next,
) -> Result<Response, ApiError> {
    admit(&limits.upload, addr, req, next).await
}

/// Middleware for the listing route.
pub async fn limit_listing(
    Extension(limits): Extension<Arc<RateLimits>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    req: Request<AxumBody>,
    next: middleware::Next,
) -> Result<Response, ApiError> {
    admit(&limits.listing, addr, req, next).await
}

async fn admit(
    limiter: &RateLimiter,
    addr: SocketAddr,
    req: Request<AxumBody>,
    next: middleware::Next,
) -> Result<Response, ApiError> {
    let client_ip = resolve_client_ip(req.headers(), Some(addr.ip())).unwrap_or_else(|| addr.ip());
    match limiter.check(client_ip).await {
        Ok(()) => Ok(next.run(req).await),
        Err(retry_after) => {
            warn!(client_ip = %client_ip, path = req.uri().path(), "rate limit exceeded");
            Err(ApiError::TooManyRequests {
                retry_after,
                message: limiter.message.to_string(),
            })
        }
    }
}
