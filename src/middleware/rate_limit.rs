//! Per-client sliding-window rate limiting middleware

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::Request,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use futures::future::BoxFuture;
use std::{
    collections::VecDeque,
    net::SocketAddr,
    sync::Arc,
    task::{Context, Poll},
    time::Duration,
};
use tokio::time::Instant;
use tower::{Layer, Service};
use tracing::warn;

use crate::error::AppError;

/// Sliding-window request log, one window per client id.
///
/// A throttled request consumes no slot: only allowed requests append a
/// timestamp. Windows are pruned on every call; keys are never evicted.
pub struct SlidingWindow {
    windows: DashMap<String, VecDeque<Instant>>,
    window: Duration,
    limit: usize,
}

impl SlidingWindow {
    pub fn new(window: Duration, limit: usize) -> Self {
        Self {
            windows: DashMap::new(),
            window,
            limit,
        }
    }

    /// Record a request attempt for `client_id`; returns whether it is
    /// allowed through.
    pub fn allow(&self, client_id: &str) -> bool {
        let now = Instant::now();
        let mut stamps = self.windows.entry(client_id.to_string()).or_default();

        while stamps
            .front()
            .is_some_and(|t| now.duration_since(*t) >= self.window)
        {
            stamps.pop_front();
        }

        if stamps.len() >= self.limit {
            return false;
        }

        stamps.push_back(now);
        true
    }
}

/// Rate limiting layer
#[derive(Clone)]
pub struct RateLimitLayer {
    limiter: Arc<SlidingWindow>,
}

impl RateLimitLayer {
    pub fn new(window: Duration, limit: usize) -> Self {
        Self {
            limiter: Arc::new(SlidingWindow::new(window, limit)),
        }
    }
}

impl<S> Layer<S> for RateLimitLayer {
    type Service = RateLimitMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RateLimitMiddleware {
            inner,
            limiter: self.limiter.clone(),
        }
    }
}

/// Rate limiting middleware service
#[derive(Clone)]
pub struct RateLimitMiddleware<S> {
    inner: S,
    limiter: Arc<SlidingWindow>,
}

impl<S> Service<Request<Body>> for RateLimitMiddleware<S>
where
    S: Service<Request<Body>, Response = Response> + Send + Clone + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        // Client identity is the peer network address; requests arriving
        // without one (e.g. in-process tests) share a single bucket.
        let client_id = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|info| info.0.ip().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        if self.limiter.allow(&client_id) {
            let future = self.inner.call(request);
            Box::pin(async move { future.await })
        } else {
            warn!(client = %client_id, "Rate limit exceeded");
            Box::pin(async move { Ok(AppError::Throttled.into_response()) })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::advance;

    #[tokio::test(start_paused = true)]
    async fn test_limit_boundary() {
        let limiter = SlidingWindow::new(Duration::from_secs(60), 100);

        for _ in 0..100 {
            assert!(limiter.allow("10.0.0.1"));
        }
        assert!(!limiter.allow("10.0.0.1"));

        advance(Duration::from_secs(60)).await;
        assert!(limiter.allow("10.0.0.1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_throttled_requests_consume_no_slot() {
        let limiter = SlidingWindow::new(Duration::from_secs(60), 100);

        for _ in 0..100 {
            assert!(limiter.allow("10.0.0.1"));
        }

        advance(Duration::from_secs(30)).await;
        for _ in 0..10 {
            assert!(!limiter.allow("10.0.0.1"));
        }

        // Once the original burst slides out, the client is admitted again;
        // had the throttled attempts been recorded, they would still block.
        advance(Duration::from_secs(30)).await;
        assert!(limiter.allow("10.0.0.1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_slides_per_request() {
        let limiter = SlidingWindow::new(Duration::from_secs(60), 2);

        assert!(limiter.allow("10.0.0.1"));
        advance(Duration::from_secs(40)).await;
        assert!(limiter.allow("10.0.0.1"));
        assert!(!limiter.allow("10.0.0.1"));

        // The first stamp ages out at 60s; the second is still inside.
        advance(Duration::from_secs(25)).await;
        assert!(limiter.allow("10.0.0.1"));
        assert!(!limiter.allow("10.0.0.1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_clients_are_isolated() {
        let limiter = SlidingWindow::new(Duration::from_secs(60), 1);

        assert!(limiter.allow("10.0.0.1"));
        assert!(!limiter.allow("10.0.0.1"));
        assert!(limiter.allow("10.0.0.2"));
    }
}
