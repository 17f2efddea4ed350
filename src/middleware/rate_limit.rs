//! Per-identity rate limiting using governor
//!
//! Callers presenting a valid access token are limited per user, everyone
//! else per client address.

use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use governor::{
    clock::{Clock, DefaultClock},
    DefaultKeyedRateLimiter, Quota, RateLimiter,
};

use crate::{
    config::RateLimitConfig,
    error::{AppError, AppResult},
    AppState,
};

/// How often callers whose budget is full again are forgotten
pub const PRUNE_INTERVAL: Duration = Duration::from_secs(60);

/// Keyed request-rate ceiling shared by all handlers
#[derive(Clone)]
pub struct Throttle {
    limiter: Option<Arc<DefaultKeyedRateLimiter<String>>>,
}

impl Throttle {
    pub fn new(config: &RateLimitConfig) -> Self {
        if !config.enabled {
            return Self { limiter: None };
        }
        let per_minute = NonZeroU32::new(config.requests_per_minute).unwrap_or(NonZeroU32::MIN);
        Self::with_quota(Quota::per_minute(per_minute))
    }

    fn with_quota(quota: Quota) -> Self {
        Self {
            limiter: Some(Arc::new(RateLimiter::keyed(quota))),
        }
    }

    /// Number of identities currently tracked
    pub fn tracked(&self) -> usize {
        self.limiter.as_ref().map_or(0, |limiter| limiter.len())
    }

    /// Drop the state of identities that are back to a full budget
    pub fn prune(&self) {
        if let Some(ref limiter) = self.limiter {
            limiter.retain_recent();
            limiter.shrink_to_fit();
        }
    }

    /// Prune every `period` on the current runtime; nothing to do when disabled
    pub fn spawn_pruner(&self, period: Duration) -> Option<tokio::task::JoinHandle<()>> {
        self.limiter.as_ref()?;
        let throttle = self.clone();
        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                let before = throttle.tracked();
                throttle.prune();
                tracing::debug!("Rate limiter pruned {} -> {} identities", before, throttle.tracked());
            }
        }))
    }

    /// Count one request against `identity`
    pub fn check(&self, identity: &str) -> AppResult<()> {
        let Some(ref limiter) = self.limiter else {
            return Ok(());
        };
        limiter.check_key(&identity.to_string()).map_err(|not_until| {
            let wait = not_until.wait_time_from(DefaultClock::default().now());
            AppError::RateLimited {
                retry_after_secs: wait.as_secs().max(1),
            }
        })
    }
}

/// Bearer token of a request, if any
fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
}

/// Identity a request is throttled under
pub fn identity(state: &AppState, request: &Request) -> String {
    if let Some(claims) = bearer(request.headers()).and_then(|t| state.services.auth.verify_access(t).ok()) {
        return format!("user:{}", claims.user_id);
    }

    let forwarded = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty());

    let address = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .or(forwarded)
        .unwrap_or_else(|| "unknown".to_string());

    format!("anon:{}", address)
}

/// Reject requests over the caller's ceiling with 429
pub async fn throttle(State(state): State<AppState>, request: Request, next: Next) -> Result<Response, AppError> {
    let identity = identity(&state, &request);
    if let Err(err) = state.throttle.check(&identity) {
        tracing::warn!("Throttled {}", identity);
        return Err(err);
    }
    Ok(next.run(request).await)
}
