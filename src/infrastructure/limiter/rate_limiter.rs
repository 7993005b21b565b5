use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::{task::JoinHandle, time::interval};

/// Fractional token bucket: a burst of `capacity`, refilled continuously.
#[derive(Debug)]
struct TokenBucket {
    capacity: f64,
    tokens: f64,
    refill_per_sec: f64,
    last_refill: Instant,
}

impl TokenBucket {
    fn new(capacity: f64, refill_per_sec: f64) -> Self {
        Self {
            capacity,
            tokens: capacity,
            refill_per_sec,
            last_refill: Instant::now(),
        }
    }

    fn refill(&mut self, now: Instant) {
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        if elapsed > 0.0 {
            self.tokens = (self.tokens + elapsed * self.refill_per_sec).min(self.capacity);
            self.last_refill = now;
        }
    }

    fn try_take(&mut self, now: Instant) -> bool {
        self.refill(now);
        // epsilon for float drift
        if self.tokens + 1e-12 >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    fn seconds_until_token(&self) -> u64 {
        let missing = (1.0 - self.tokens).max(0.0);
        ((missing / self.refill_per_sec).ceil() as u64).max(1)
    }
}

/// Two-window approximation of a sliding request count.
#[derive(Debug)]
struct SlidingWindow {
    size: Duration,
    limit: u64,
    window_start: Instant,
    current: u64,
    previous: u64,
}

impl SlidingWindow {
    fn new(size: Duration, limit: u64) -> Self {
        Self {
            size,
            limit,
            window_start: Instant::now(),
            current: 0,
            previous: 0,
        }
    }

    fn try_count(&mut self, now: Instant) -> bool {
        let mut elapsed = now.duration_since(self.window_start);
        if elapsed >= self.size {
            // more than one full window idle means nothing carries over
            self.previous = if elapsed >= self.size * 2 { 0 } else { self.current };
            self.current = 0;
            self.window_start = now;
            elapsed = Duration::ZERO;
        }

        let weight = elapsed.as_secs_f64() / self.size.as_secs_f64();
        let effective = self.previous as f64 * (1.0 - weight) + self.current as f64;

        if effective < self.limit as f64 {
            self.current += 1;
            true
        } else {
            false
        }
    }
}

#[derive(Debug)]
struct ClientLimiter {
    bucket: TokenBucket,
    window: SlidingWindow,
    last_seen: Instant,
}

impl ClientLimiter {
    /// Both the burst bucket and the window must admit the attempt.
    fn check(&mut self, now: Instant) -> RateDecision {
        self.last_seen = now;
        if !self.window.try_count(now) {
            return RateDecision::Limited {
                retry_after_secs: self.window.size.as_secs().max(1),
            };
        }
        if !self.bucket.try_take(now) {
            return RateDecision::Limited {
                retry_after_secs: self.bucket.seconds_until_token(),
            };
        }
        RateDecision::Allowed {
            remaining: self.bucket.tokens.floor() as u64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed { remaining: u64 },
    Limited { retry_after_secs: u64 },
}

impl RateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateDecision::Allowed { .. })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RateLimitPolicy {
    pub burst: f64,
    pub refill_per_sec: f64,
    pub window: Duration,
    pub window_limit: u64,
    pub idle_ttl: Duration,
}

impl RateLimitPolicy {
    /// Admin sign-in: a burst of 5, one attempt per 12s after that, at most
    /// 20 per 15 minutes.
    pub fn login() -> Self {
        RateLimitPolicy {
            burst: 5.0,
            refill_per_sec: 1.0 / 12.0,
            window: Duration::from_secs(15 * 60),
            window_limit: 20,
            idle_ttl: Duration::from_secs(30 * 60),
        }
    }
}

/// Per-key limiter store, keyed by client IP.
#[derive(Clone)]
pub struct RateLimiterStore {
    clients: Arc<DashMap<String, Arc<Mutex<ClientLimiter>>>>,
    policy: RateLimitPolicy,
}

impl RateLimiterStore {
    pub fn new(policy: RateLimitPolicy) -> Self {
        RateLimiterStore {
            clients: Arc::new(DashMap::new()),
            policy,
        }
    }

    fn limiter_for(&self, key: &str) -> Arc<Mutex<ClientLimiter>> {
        if let Some(existing) = self.clients.get(key) {
            return existing.clone();
        }
        self.clients
            .entry(key.to_string())
            .or_insert_with(|| {
                Arc::new(Mutex::new(ClientLimiter {
                    bucket: TokenBucket::new(self.policy.burst, self.policy.refill_per_sec),
                    window: SlidingWindow::new(self.policy.window, self.policy.window_limit),
                    last_seen: Instant::now(),
                }))
            })
            .clone()
    }

    pub fn check(&self, key: &str) -> RateDecision {
        let limiter = self.limiter_for(key);
        let mut guard = limiter.lock();
        guard.check(Instant::now())
    }

    /// Forgets a client, e.g. after a successful sign-in.
    pub fn reset(&self, key: &str) {
        self.clients.remove(key);
    }

    pub fn tracked_clients(&self) -> usize {
        self.clients.len()
    }

    fn evict_idle(&self) -> usize {
        let now = Instant::now();
        let ttl = self.policy.idle_ttl;
        let before = self.clients.len();
        self.clients
            .retain(|_, limiter| now.duration_since(limiter.lock().last_seen) <= ttl);
        before.saturating_sub(self.clients.len())
    }

    /// Periodically drops clients idle for longer than the policy TTL.
    pub fn spawn_eviction(&self, every: Duration) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = interval(every);
            loop {
                ticker.tick().await;
                let evicted = store.evict_idle();
                if evicted > 0 {
                    tracing::debug!(evicted, "Evicted idle rate limiter entries");
                }
            }
        })
    }
}
