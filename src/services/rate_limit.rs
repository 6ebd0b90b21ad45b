//! Fixed-window request throttling keyed by client.
//!
//! Window state lives behind [`RateLimitStore`] so a shared backend can
//! replace the in-process map without touching callers.

use async_trait::async_trait;
use axum::http::HeaderMap;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::RateLimitRule;

/// Requests counted in the current window for one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateWindow {
    pub count: u32,
    pub reset_at: DateTime<Utc>,
}

#[async_trait]
pub trait RateLimitStore: Send + Sync {
    async fn get(&self, key: &str) -> Option<RateWindow>;

    /// Bumps the counter of an existing window and returns the new count.
    async fn increment(&self, key: &str) -> u32;

    /// Starts a fresh window holding one request.
    async fn reset(&self, key: &str, reset_at: DateTime<Utc>);
}

#[derive(Default)]
pub struct MemoryRateLimitStore {
    windows: Mutex<HashMap<String, RateWindow>>,
}

impl MemoryRateLimitStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RateLimitStore for MemoryRateLimitStore {
    async fn get(&self, key: &str) -> Option<RateWindow> {
        self.windows.lock().await.get(key).copied()
    }

    async fn increment(&self, key: &str) -> u32 {
        let mut lock = self.windows.lock().await;
        match lock.get_mut(key) {
            Some(window) => {
                window.count = window.count.saturating_add(1);
                window.count
            }
            None => 0,
        }
    }

    async fn reset(&self, key: &str, reset_at: DateTime<Utc>) {
        self.windows
            .lock()
            .await
            .insert(key.to_string(), RateWindow { count: 1, reset_at });
    }
}

#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn RateLimitStore>,
    rule: RateLimitRule,
    scope: &'static str,
}

impl RateLimiter {
    #[must_use]
    pub fn new(store: Arc<dyn RateLimitStore>, rule: RateLimitRule, scope: &'static str) -> Self {
        Self { store, rule, scope }
    }

    #[must_use]
    pub fn in_memory(rule: RateLimitRule, scope: &'static str) -> Self {
        Self::new(Arc::new(MemoryRateLimitStore::new()), rule, scope)
    }

    /// Counts one request for `key`; `false` means the caller is throttled.
    pub async fn check(&self, key: &str) -> bool {
        self.check_at(key, Utc::now()).await
    }

    pub async fn check_at(&self, key: &str, now: DateTime<Utc>) -> bool {
        let key = format!("{}:{key}", self.scope);

        match self.store.get(&key).await {
            Some(window) if now <= window.reset_at => {
                if window.count >= self.rule.max_requests {
                    tracing::debug!(scope = self.scope, key = %key, "Rate limit exceeded");
                    metrics::counter!("rate_limit_rejections_total", "scope" => self.scope)
                        .increment(1);
                    return false;
                }
                self.store.increment(&key).await;
                true
            }
            _ => {
                let reset_at = i64::try_from(self.rule.window_seconds)
                    .ok()
                    .and_then(Duration::try_seconds)
                    .and_then(|window| now.checked_add_signed(window))
                    .unwrap_or(DateTime::<Utc>::MAX_UTC);
                self.store.reset(&key, reset_at).await;
                true
            }
        }
    }
}

/// Identifies the caller: first `X-Forwarded-For` hop, then `X-Real-IP`,
/// then the socket peer, else `"anonymous"`.
#[must_use]
pub fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    if let Some(ip) = forwarded {
        return ip.to_string();
    }

    let real_ip = headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    if let Some(ip) = real_ip {
        return ip.to_string();
    }

    peer.map_or_else(|| "anonymous".to_string(), |addr| addr.ip().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn rule(max_requests: u32, window_seconds: u64) -> RateLimitRule {
        RateLimitRule {
            max_requests,
            window_seconds,
        }
    }

    #[tokio::test]
    async fn test_allows_up_to_max_then_rejects() {
        let limiter = RateLimiter::in_memory(rule(3, 60), "test");
        let now = Utc::now();

        assert!(limiter.check_at("a", now).await);
        assert!(limiter.check_at("a", now).await);
        assert!(limiter.check_at("a", now).await);
        assert!(!limiter.check_at("a", now).await);
        assert!(!limiter.check_at("a", now).await);
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let limiter = RateLimiter::in_memory(rule(1, 60), "test");
        let now = Utc::now();

        assert!(limiter.check_at("a", now).await);
        assert!(!limiter.check_at("a", now).await);
        assert!(limiter.check_at("b", now).await);
    }

    #[tokio::test]
    async fn test_window_expiry_starts_new_window() {
        let limiter = RateLimiter::in_memory(rule(2, 60), "test");
        let start = Utc::now();

        assert!(limiter.check_at("a", start).await);
        assert!(limiter.check_at("a", start).await);
        assert!(!limiter.check_at("a", start + Duration::seconds(60)).await);
        assert!(limiter.check_at("a", start + Duration::seconds(61)).await);
        assert!(limiter.check_at("a", start + Duration::seconds(62)).await);
        assert!(!limiter.check_at("a", start + Duration::seconds(63)).await);
    }

    #[tokio::test]
    async fn test_rejection_does_not_extend_window() {
        let store = Arc::new(MemoryRateLimitStore::new());
        let limiter = RateLimiter::new(store.clone(), rule(1, 60), "test");
        let start = Utc::now();

        assert!(limiter.check_at("a", start).await);
        assert!(!limiter.check_at("a", start + Duration::seconds(30)).await);

        let window = store.get("test:a").await.unwrap();
        assert_eq!(window.count, 1);
        assert_eq!(window.reset_at, start + Duration::seconds(60));
    }

    #[test]
    fn test_client_key_prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("10.0.0.1, 10.0.0.2"));
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.9"));
        assert_eq!(client_key(&headers, None), "10.0.0.1");
    }

    #[test]
    fn test_client_key_fallbacks() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.9"));
        assert_eq!(client_key(&headers, None), "10.0.0.9");

        let peer: SocketAddr = "192.168.1.4:5000".parse().unwrap();
        assert_eq!(client_key(&HeaderMap::new(), Some(peer)), "192.168.1.4");
        assert_eq!(client_key(&HeaderMap::new(), None), "anonymous");
    }
}
