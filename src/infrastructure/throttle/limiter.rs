//! Fixed window throttle limiter
//!
//! Counts admitted calls per `(api key, route)` pair. The increment and the
//! comparison against the limit happen under one lock, so concurrent callers
//! can never push a window past its limit.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::domain::api_key::ApiKeyId;
use crate::domain::guard::GuardError;
use crate::domain::throttle::{ThrottleKey, ThrottlePolicy, ThrottleStatus};

#[derive(Debug, Clone, Copy)]
struct ThrottleWindow {
    count: u32,
    started_at: Instant,
    ttl: Duration,
}

impl ThrottleWindow {
    fn open(now: Instant, ttl: Duration) -> Self {
        Self {
            count: 0,
            started_at: now,
            ttl,
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.started_at) >= self.ttl
    }

    fn reset_in(&self, now: Instant) -> Duration {
        self.ttl.saturating_sub(now.duration_since(self.started_at))
    }
}

#[derive(Debug)]
struct WindowTable {
    windows: HashMap<ThrottleKey, ThrottleWindow>,
    last_sweep: Instant,
}

/// In-memory throttle limiter
#[derive(Debug)]
pub struct ThrottleLimiter {
    table: Mutex<WindowTable>,
    sweep_interval: Duration,
}

impl ThrottleLimiter {
    pub fn new() -> Self {
        Self::with_sweep_interval(Duration::from_secs(300))
    }

    /// Expired windows are dropped at most once per `sweep_interval`
    pub fn with_sweep_interval(sweep_interval: Duration) -> Self {
        Self {
            table: Mutex::new(WindowTable {
                windows: HashMap::new(),
                last_sweep: Instant::now(),
            }),
            sweep_interval,
        }
    }

    /// Count one call against the key's window
    ///
    /// Rejected calls are not counted. A window that has run past its TTL is
    /// restarted before counting.
    pub async fn check(
        &self,
        key: &ThrottleKey,
        policy: ThrottlePolicy,
    ) -> Result<ThrottleStatus, GuardError> {
        let now = Instant::now();
        let mut table = self.table.lock().await;
        self.maybe_sweep(&mut table, now);

        let window = table
            .windows
            .entry(key.clone())
            .or_insert_with(|| ThrottleWindow::open(now, policy.ttl()));

        if window.is_expired(now) {
            *window = ThrottleWindow::open(now, policy.ttl());
        }

        let reset_in_secs = ceil_secs(window.reset_in(now));

        if window.count >= policy.limit {
            debug!(throttle_key = %key, limit = policy.limit, "Throttle limit reached");
            return Err(GuardError::RateLimited {
                limit: policy.limit,
                retry_after_secs: reset_in_secs.max(1),
            });
        }

        window.count += 1;

        Ok(ThrottleStatus {
            limit: policy.limit,
            remaining: policy.limit - window.count,
            reset_in_secs,
        })
    }

    /// Calls counted in the key's live window
    pub async fn count(&self, key: &ThrottleKey) -> Option<u32> {
        let now = Instant::now();
        let table = self.table.lock().await;
        table
            .windows
            .get(key)
            .filter(|window| !window.is_expired(now))
            .map(|window| window.count)
    }

    /// Drop every window held by an API key
    pub async fn reset_key(&self, api_key_id: &ApiKeyId) {
        let mut table = self.table.lock().await;
        table.windows.retain(|key, _| &key.api_key_id != api_key_id);
    }

    fn maybe_sweep(&self, table: &mut WindowTable, now: Instant) {
        if now.duration_since(table.last_sweep) < self.sweep_interval {
            return;
        }

        let before = table.windows.len();
        table.windows.retain(|_, window| !window.is_expired(now));
        table.last_sweep = now;

        let removed = before - table.windows.len();
        if removed > 0 {
            debug!(removed, "Swept expired throttle windows");
        }
    }
}

impl Default for ThrottleLimiter {
    fn default() -> Self {
        Self::new()
    }
}

fn ceil_secs(duration: Duration) -> u64 {
    let secs = duration.as_secs();
    if duration.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::guard::RouteId;
    use std::sync::Arc;

    fn key(id: &str, route: RouteId) -> ThrottleKey {
        ThrottleKey::new(ApiKeyId::new(id).unwrap(), route)
    }

    #[tokio::test(start_paused = true)]
    async fn test_limit_then_reset_after_window() {
        let limiter = ThrottleLimiter::new();
        let key = key("key-1", RouteId::GetSubscriber);
        let policy = ThrottlePolicy::DEFAULT;

        for i in 0..150 {
            let status = limiter.check(&key, policy).await.unwrap();
            assert_eq!(status.remaining, 149 - i);
        }

        let err = limiter.check(&key, policy).await.unwrap_err();
        assert_eq!(
            err,
            GuardError::RateLimited {
                limit: 150,
                retry_after_secs: 60
            }
        );
        // Rejections are not counted
        assert_eq!(limiter.count(&key).await, Some(150));

        tokio::time::advance(Duration::from_secs(60)).await;

        let status = limiter.check(&key, policy).await.unwrap();
        assert_eq!(status.remaining, 149);
        assert_eq!(limiter.count(&key).await, Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_after_tracks_window() {
        let limiter = ThrottleLimiter::new();
        let key = key("key-1", RouteId::CountSubscribers);
        let policy = ThrottlePolicy::new(1, 60);

        limiter.check(&key, policy).await.unwrap();
        tokio::time::advance(Duration::from_millis(45_500)).await;

        match limiter.check(&key, policy).await {
            Err(GuardError::RateLimited {
                retry_after_secs, ..
            }) => assert_eq!(retry_after_secs, 15),
            other => panic!("expected rate limit, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_windows_are_per_key_and_route() {
        let limiter = ThrottleLimiter::new();
        let policy = ThrottlePolicy::new(1, 60);

        limiter.check(&key("a", RouteId::GetSubscriber), policy).await.unwrap();
        limiter.check(&key("a", RouteId::UpdateSubscriber), policy).await.unwrap();
        limiter.check(&key("b", RouteId::GetSubscriber), policy).await.unwrap();

        assert!(limiter.check(&key("a", RouteId::GetSubscriber), policy).await.is_err());
    }

    #[tokio::test]
    async fn test_concurrent_checks_never_exceed_limit() {
        let limiter = Arc::new(ThrottleLimiter::new());
        let policy = ThrottlePolicy::new(1, 60);

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let limiter = limiter.clone();
                tokio::spawn(async move {
                    limiter
                        .check(&key("shared", RouteId::CountSubscribers), policy)
                        .await
                        .is_ok()
                })
            })
            .collect();

        let mut admitted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                admitted += 1;
            }
        }

        assert_eq!(admitted, 1);
    }

    #[tokio::test]
    async fn test_reset_key_drops_all_routes() {
        let limiter = ThrottleLimiter::new();
        let policy = ThrottlePolicy::DEFAULT;
        let get = key("a", RouteId::GetSubscriber);
        let count = key("a", RouteId::CountSubscribers);
        let other = key("b", RouteId::GetSubscriber);

        limiter.check(&get, policy).await.unwrap();
        limiter.check(&count, policy).await.unwrap();
        limiter.check(&other, policy).await.unwrap();

        limiter.reset_key(&ApiKeyId::new("a").unwrap()).await;

        assert_eq!(limiter.count(&get).await, None);
        assert_eq!(limiter.count(&count).await, None);
        assert_eq!(limiter.count(&other).await, Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_removes_expired_windows() {
        let limiter = ThrottleLimiter::with_sweep_interval(Duration::from_secs(30));
        let stale = key("stale", RouteId::GetSubscriber);
        limiter.check(&stale, ThrottlePolicy::new(5, 10)).await.unwrap();

        tokio::time::advance(Duration::from_secs(31)).await;
        limiter
            .check(&key("fresh", RouteId::GetSubscriber), ThrottlePolicy::DEFAULT)
            .await
            .unwrap();

        assert_eq!(limiter.table.lock().await.windows.len(), 1);
    }
}
