//! Fixed-window request limiting.
//!
//! Requests are counted per client key: the owner of the bearer token when
//! that token is known, otherwise the peer IP, otherwise a shared
//! `anonymous` bucket. Unknown tokens count against the peer, so rotating
//! made-up tokens never opens a fresh bucket. Every response carries the
//! `X-RateLimit-*` headers.

use std::{
    collections::HashMap,
    net::{IpAddr, SocketAddr},
    sync::{Arc, Mutex, PoisonError},
    time::{Duration, Instant},
};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use sea_orm::ConnectionTrait;

use crate::auth::tokens;
use crate::config::RateLimitConfig;
use crate::errors::ApiError;
use crate::state::AppState;

pub const LIMIT_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const REMAINING_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub const RESET_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-reset");

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    started: Instant,
}

/// Outcome of counting one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Seconds until the window reopens.
    pub reset_secs: u64,
}

impl Decision {
    pub fn write_headers(&self, headers: &mut HeaderMap) {
        headers.insert(LIMIT_HEADER, HeaderValue::from(self.limit));
        headers.insert(REMAINING_HEADER, HeaderValue::from(self.remaining));
        headers.insert(RESET_HEADER, HeaderValue::from(self.reset_secs));
    }
}

#[derive(Debug, Clone)]
pub struct RateLimiter {
    windows: Arc<Mutex<HashMap<String, Window>>>,
    max_requests: u32,
    window: Duration,
}

impl RateLimiter {
    #[must_use]
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            windows: Arc::new(Mutex::new(HashMap::new())),
            max_requests,
            window: Duration::from_secs(window_secs.max(1)),
        }
    }

    /// `None` when the configuration switches limiting off.
    #[must_use]
    pub fn from_config(config: &RateLimitConfig) -> Option<Self> {
        config
            .enabled
            .then(|| Self::new(config.max_requests, config.window_secs))
    }

    #[must_use]
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Count one request against `key`.
    pub fn hit(&self, key: &str) -> Decision {
        self.hit_at(key, Instant::now())
    }

    fn hit_at(&self, key: &str, now: Instant) -> Decision {
        let mut windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);
        let window = windows.entry(key.to_owned()).or_insert(Window {
            count: 0,
            started: now,
        });

        if now.duration_since(window.started) >= self.window {
            *window = Window {
                count: 0,
                started: now,
            };
        }

        let allowed = window.count < self.max_requests;
        if allowed {
            window.count += 1;
        }

        let elapsed = now.duration_since(window.started);
        Decision {
            allowed,
            limit: self.max_requests,
            remaining: self.max_requests.saturating_sub(window.count),
            reset_secs: self.window.saturating_sub(elapsed).as_secs(),
        }
    }

    /// Forget windows that have run out. Returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);
        let before = windows.len();
        windows.retain(|_, window| now.duration_since(window.started) < self.window);
        before - windows.len()
    }
}

/// Bucket key for a client: its user when known, else its address.
#[must_use]
pub fn bucket_key(user_id: Option<i32>, peer: Option<IpAddr>) -> String {
    match (user_id, peer) {
        (Some(id), _) => format!("user:{id}"),
        (None, Some(ip)) => format!("ip:{ip}"),
        (None, None) => "anonymous".to_owned(),
    }
}

/// Bucket key for a request. The bearer token only counts once it resolves
/// to a user.
pub async fn client_key<C: ConnectionTrait>(
    db: &C,
    headers: &HeaderMap,
    peer: Option<IpAddr>,
) -> String {
    let user_id = match tokens::bearer(headers) {
        Some(token) => tokens::owner(db, token).await.unwrap_or_else(|err| {
            tracing::error!(error = %err, "token lookup failed, limiting by address");
            None
        }),
        None => None,
    };
    bucket_key(user_id, peer)
}

/// Middleware counting each request and stamping the limit headers.
pub async fn rate_limit(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let Some(limiter) = state.limiter.as_ref() else {
        return next.run(request).await;
    };

    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());
    let key = client_key(&state.db, request.headers(), peer).await;
    let decision = limiter.hit(&key);

    let mut response = if decision.allowed {
        next.run(request).await
    } else {
        tracing::warn!(key = %key, limit = decision.limit, "rate limit exceeded");
        ApiError::too_many_requests().into_response()
    };

    decision.write_headers(response.headers_mut());
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn test_counts_down_then_blocks() {
        let limiter = RateLimiter::new(2, 60);
        let now = Instant::now();

        let first = limiter.hit_at("k", now);
        assert!(first.allowed);
        assert_eq!(first.remaining, 1);
        assert_eq!(first.reset_secs, 60);

        assert!(limiter.hit_at("k", now).allowed);

        let third = limiter.hit_at("k", now + Duration::from_secs(10));
        assert!(!third.allowed);
        assert_eq!(third.remaining, 0);
        assert_eq!(third.reset_secs, 50);
    }

    #[test]
    fn test_window_reopens() {
        let limiter = RateLimiter::new(1, 60);
        let now = Instant::now();
        assert!(limiter.hit_at("k", now).allowed);
        assert!(!limiter.hit_at("k", now + Duration::from_secs(59)).allowed);
        assert!(limiter.hit_at("k", now + Duration::from_secs(60)).allowed);
    }

    #[test]
    fn test_keys_are_independent() {
        let limiter = RateLimiter::new(1, 60);
        assert!(limiter.hit("a").allowed);
        assert!(limiter.hit("b").allowed);
        assert!(!limiter.hit("a").allowed);
    }

    #[test]
    fn test_bucket_key_prefers_user() {
        let peer = Some(IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_eq!(bucket_key(None, peer), "ip:127.0.0.1");
        assert_eq!(bucket_key(None, None), "anonymous");
        assert_eq!(bucket_key(Some(7), peer), "user:7");
        assert_eq!(bucket_key(Some(7), None), "user:7");
    }

    #[test]
    fn test_disabled_config_builds_nothing() {
        let config = RateLimitConfig {
            enabled: false,
            ..RateLimitConfig::default()
        };
        assert!(RateLimiter::from_config(&config).is_none());
        assert!(RateLimiter::from_config(&RateLimitConfig::default()).is_some());
    }

    #[test]
    fn test_headers_written() {
        let mut headers = HeaderMap::new();
        Decision {
            allowed: true,
            limit: 60,
            remaining: 59,
            reset_secs: 60,
        }
        .write_headers(&mut headers);
        assert_eq!(headers.get(LIMIT_HEADER).unwrap(), "60");
        assert_eq!(headers.get(REMAINING_HEADER).unwrap(), "59");
        assert_eq!(headers.get(RESET_HEADER).unwrap(), "60");
    }
}
