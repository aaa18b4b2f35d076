//! Per-player cache and throttle state for network aggregation.
//!
//! [`NetworkCache`] is constructed once and injected into
//! [`super::NetworkService`]. Each auth user owns one [`CacheSlot`] behind
//! its own async mutex; the aggregator holds that mutex for the whole
//! fetch, which makes aggregation single-flight per player.
//!
//! Two windows apply, both measured on the tokio clock:
//!
//! - **TTL** (default 30 s): a stored value younger than this is served
//!   without touching the store.
//! - **Throttle** (default 2 s): when the value is stale or was
//!   invalidated, a new fetch is skipped if the previous one started less
//!   than this long ago.
//!
//! Slots whose last fetch started more than twice the TTL plus the throttle
//! window ago are swept when a new slot is created, at most once per TTL.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;

use crate::domain::{AggregatedNetwork, AuthUserId};

/// Cached aggregation state for one player.
#[derive(Debug, Default)]
pub struct CacheSlot {
    value: Option<Arc<AggregatedNetwork>>,
    expires_at: Option<Instant>,
    last_fetch_at: Option<Instant>,
}

impl CacheSlot {
    /// Returns the stored value if it has not expired at `now`.
    #[must_use]
    pub fn fresh(&self, now: Instant) -> Option<Arc<AggregatedNetwork>> {
        match (&self.value, self.expires_at) {
            (Some(value), Some(expires_at)) if now < expires_at => Some(Arc::clone(value)),
            _ => None,
        }
    }

    /// Returns the last stored value regardless of age.
    #[must_use]
    pub fn last_value(&self) -> Option<Arc<AggregatedNetwork>> {
        self.value.as_ref().map(Arc::clone)
    }

    /// Returns `true` if a fetch started less than `window` before `now`.
    #[must_use]
    pub fn is_throttled(&self, now: Instant, window: Duration) -> bool {
        self.last_fetch_at
            .is_some_and(|at| now.saturating_duration_since(at) < window)
    }

    /// Records that a fetch starts at `now`.
    pub fn begin_fetch(&mut self, now: Instant) {
        self.last_fetch_at = Some(now);
    }

    /// Forgets the fetch timestamp so the next caller is not throttled.
    /// Used when a fetch found nothing worth caching.
    pub fn abandon_fetch(&mut self) {
        self.last_fetch_at = None;
    }

    /// Returns `true` if no fetch started within `idle_after` before `now`.
    #[must_use]
    pub fn is_idle(&self, now: Instant, idle_after: Duration) -> bool {
        self.last_fetch_at
            .is_none_or(|at| now.saturating_duration_since(at) >= idle_after)
    }

    /// Stores a freshly aggregated value valid for `ttl` from `now`.
    pub fn store(&mut self, value: Arc<AggregatedNetwork>, now: Instant, ttl: Duration) {
        self.value = Some(value);
        self.expires_at = Some(now + ttl);
    }

    /// Marks the stored value stale. The value itself is kept so a
    /// throttled caller can still be answered with it.
    pub fn invalidate(&mut self) {
        self.expires_at = None;
    }
}

#[derive(Debug, Default)]
struct SlotMap {
    slots: HashMap<AuthUserId, Arc<Mutex<CacheSlot>>>,
    swept_at: Option<Instant>,
}

impl SlotMap {
    /// Drops idle slots nobody holds. Returns how many were removed.
    fn sweep(&mut self, now: Instant, idle_after: Duration) -> usize {
        let before = self.slots.len();
        self.slots.retain(|_, slot| {
            if Arc::strong_count(slot) > 1 {
                return true;
            }
            slot.try_lock()
                .map_or(true, |slot| !slot.is_idle(now, idle_after))
        });
        self.swept_at = Some(now);
        before - self.slots.len()
    }
}

/// Explicit, injectable cache of aggregated networks keyed by auth user.
#[derive(Debug)]
pub struct NetworkCache {
    ttl: Duration,
    throttle: Duration,
    slots: RwLock<SlotMap>,
}

impl NetworkCache {
    /// Creates an empty cache with the given TTL and throttle window.
    #[must_use]
    pub fn new(ttl: Duration, throttle: Duration) -> Self {
        Self {
            ttl,
            throttle,
            slots: RwLock::new(SlotMap::default()),
        }
    }

    /// How long a stored value stays fresh.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Minimum spacing between two fetches for the same player.
    #[must_use]
    pub const fn throttle(&self) -> Duration {
        self.throttle
    }

    /// How long a slot may go without a fetch before it is swept.
    #[must_use]
    pub fn idle_after(&self) -> Duration {
        self.ttl * 2 + self.throttle
    }

    /// Returns the slot for `user`, creating an empty one on first use.
    pub async fn slot(&self, user: AuthUserId) -> Arc<Mutex<CacheSlot>> {
        if let Some(slot) = self.slots.read().await.slots.get(&user) {
            return Arc::clone(slot);
        }
        let mut map = self.slots.write().await;
        if !map.slots.contains_key(&user) {
            let now = Instant::now();
            if map
                .swept_at
                .is_none_or(|at| now.saturating_duration_since(at) >= self.ttl)
            {
                let removed = map.sweep(now, self.idle_after());
                if removed > 0 {
                    tracing::debug!(removed, "swept idle network cache slots");
                }
            }
        }
        Arc::clone(map.slots.entry(user).or_default())
    }

    /// Marks `user`'s cached value stale without forgetting the throttle
    /// timestamp.
    pub async fn invalidate(&self, user: AuthUserId) {
        let existing = self.slots.read().await.slots.get(&user).map(Arc::clone);
        if let Some(slot) = existing {
            slot.lock().await.invalidate();
        }
    }

    /// Drops all state for `user`.
    pub async fn evict(&self, user: AuthUserId) {
        self.slots.write().await.slots.remove(&user);
    }

    /// Drops idle slots now, regardless of when the last sweep ran.
    /// Returns how many were removed.
    pub async fn sweep(&self) -> usize {
        let idle_after = self.idle_after();
        self.slots.write().await.sweep(Instant::now(), idle_after)
    }

    /// Drops all state. Called on shutdown.
    pub async fn clear(&self) {
        self.slots.write().await.slots.clear();
    }

    /// Number of players with cache state.
    pub async fn len(&self) -> usize {
        self.slots.read().await.slots.len()
    }

    /// Returns `true` if no player has cache state.
    pub async fn is_empty(&self) -> bool {
        self.slots.read().await.slots.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{PlayerId, PlayerSummary, SponsorState};

    fn value() -> Arc<AggregatedNetwork> {
        let me = PlayerSummary {
            id: PlayerId::new(),
            alias: "me".to_string(),
        };
        Arc::new(AggregatedNetwork::assemble(
            me,
            SponsorState::None,
            Vec::new(),
            Vec::new(),
            Vec::new(),
            Vec::new(),
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn value_expires_after_ttl() {
        let mut slot = CacheSlot::default();
        let now = Instant::now();
        slot.store(value(), now, Duration::from_secs(30));

        assert!(slot.fresh(now + Duration::from_secs(29)).is_some());
        assert!(slot.fresh(now + Duration::from_secs(30)).is_none());
        assert!(slot.last_value().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn throttle_window_measured_from_fetch_start() {
        let mut slot = CacheSlot::default();
        let window = Duration::from_secs(2);
        let now = Instant::now();
        assert!(!slot.is_throttled(now, window));

        slot.begin_fetch(now);
        assert!(slot.is_throttled(now + Duration::from_millis(1_999), window));
        assert!(!slot.is_throttled(now + window, window));
    }

    #[tokio::test(start_paused = true)]
    async fn invalidate_keeps_last_value() {
        let mut slot = CacheSlot::default();
        let now = Instant::now();
        let stored = value();
        slot.store(Arc::clone(&stored), now, Duration::from_secs(30));
        slot.invalidate();

        assert!(slot.fresh(now).is_none());
        let Some(last) = slot.last_value() else {
            panic!("value dropped on invalidate");
        };
        assert!(Arc::ptr_eq(&last, &stored));
    }

    #[tokio::test]
    async fn slots_are_shared_per_user_and_evictable() {
        let cache = NetworkCache::new(Duration::from_secs(30), Duration::from_secs(2));
        let user = AuthUserId::new();
        let a = cache.slot(user).await;
        let b = cache.slot(user).await;
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len().await, 1);

        cache.evict(user).await;
        assert!(cache.is_empty().await);

        let _ = cache.slot(AuthUserId::new()).await;
        cache.clear().await;
        assert!(cache.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn idle_slots_are_swept_on_insert() {
        let cache = NetworkCache::new(Duration::from_secs(30), Duration::from_secs(2));
        let idle = AuthUserId::new();
        {
            let slot = cache.slot(idle).await;
            let mut slot = slot.lock().await;
            slot.begin_fetch(Instant::now());
            slot.store(value(), Instant::now(), cache.ttl());
        }

        tokio::time::advance(cache.idle_after()).await;
        let busy = AuthUserId::new();
        let held = cache.slot(busy).await;
        assert_eq!(cache.len().await, 1);

        // A slot someone holds survives a sweep.
        tokio::time::advance(cache.idle_after()).await;
        assert_eq!(cache.sweep().await, 0);
        drop(held);
        assert_eq!(cache.sweep().await, 1);
        assert!(cache.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn recently_fetched_slots_survive_sweep() {
        let cache = NetworkCache::new(Duration::from_secs(30), Duration::from_secs(2));
        let user = AuthUserId::new();
        cache.slot(user).await.lock().await.begin_fetch(Instant::now());

        tokio::time::advance(Duration::from_secs(40)).await;
        assert_eq!(cache.sweep().await, 0);
        assert_eq!(cache.len().await, 1);
    }

    #[test]
    fn abandoned_fetch_is_not_throttled() {
        let mut slot = CacheSlot::default();
        let now = Instant::now();
        slot.begin_fetch(now);
        slot.abandon_fetch();
        assert!(!slot.is_throttled(now, Duration::from_secs(2)));
    }
}
