//! The settings cache service.
//!
//! [`SettingsCache`] is the single authoritative in-memory holder of the
//! current [`BusinessSettings`] value for the active session. It fetches the
//! record once and serves it to many callers, persists it locally for reload
//! resilience, guards against retry storms with a fixed backoff window, and
//! notifies subscribers when the cached value changes.
//!
//! The cache is an injectable service object, not a global: construct one per
//! session (or per test) with the API, store, and clock it should use.

mod clock;
mod state;

pub use clock::{Clock, ManualClock, SystemClock};
pub use state::CacheState;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use log::{debug, error, warn};

use crate::api::SettingsApi;
use crate::calc;
use crate::errors::{FailureClass, Result};
use crate::models::{BusinessSettings, SettingsUpdate};
use crate::store::SettingsStore;

use state::CacheInner;

/// Cooldown after a failed fetch during which no network attempt is made.
pub const BACKOFF_WINDOW: Duration = Duration::from_secs(30);

/// Interval at which coalescing callers re-check the in-flight fetch.
const FETCH_POLL_INTERVAL: Duration = Duration::from_millis(100);

type Listener = Arc<dyn Fn() + Send + Sync + 'static>;
type ListenerMap = HashMap<u64, Listener>;

/// Lock a listener map, recovering from poison.
///
/// Worst case after recovery is a stale listener entry, which is better than
/// panicking inside a notification.
fn lock_listeners(listeners: &Mutex<ListenerMap>) -> MutexGuard<'_, ListenerMap> {
    listeners.lock().unwrap_or_else(|poisoned| {
        warn!("Settings listener mutex was poisoned, recovering");
        poisoned.into_inner()
    })
}

/// Handle returned by [`SettingsCache::subscribe`].
///
/// Call [`unsubscribe`](Self::unsubscribe) to remove the callback. Dropping
/// the handle without calling it keeps the subscription alive for the life
/// of the cache.
pub struct Subscription {
    id: u64,
    listeners: Weak<Mutex<ListenerMap>>,
}

impl Subscription {
    /// Remove the subscribed callback.
    pub fn unsubscribe(self) {
        if let Some(listeners) = self.listeners.upgrade() {
            lock_listeners(&listeners).remove(&self.id);
        }
    }
}

/// Cached copy of the company's business settings.
///
/// See the [module docs](self) for the lifecycle. All state is guarded by a
/// mutex so the cache can be shared across tasks behind an `Arc`.
pub struct SettingsCache {
    api: Arc<dyn SettingsApi>,
    store: Arc<dyn SettingsStore>,
    clock: Arc<dyn Clock>,
    /// The authenticated user's company; fixed for the session. A tenant
    /// switch means constructing a fresh cache.
    company_id: Option<i64>,
    inner: Mutex<CacheInner>,
    listeners: Arc<Mutex<ListenerMap>>,
    next_listener_id: AtomicU64,
}

impl SettingsCache {
    /// Create a cache using the real wall clock.
    pub fn new(
        api: Arc<dyn SettingsApi>,
        store: Arc<dyn SettingsStore>,
        company_id: Option<i64>,
    ) -> Self {
        Self::with_clock(api, store, company_id, Arc::new(SystemClock))
    }

    /// Create a cache with an injected clock (tests simulate the backoff
    /// window through this).
    ///
    /// Construction attempts to load a previously persisted record; on a hit
    /// the cache starts Ready, otherwise Uninitialized. Storage failures are
    /// logged and ignored.
    pub fn with_clock(
        api: Arc<dyn SettingsApi>,
        store: Arc<dyn SettingsStore>,
        company_id: Option<i64>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let mut inner = CacheInner::new();
        match store.load() {
            Ok(Some(settings)) => {
                debug!("Settings cache: loaded persisted record");
                inner.settings = Some(settings);
                inner.transition(CacheState::Ready);
            }
            Ok(None) => {}
            Err(e) => {
                warn!("Failed to load persisted business settings: {}", e);
            }
        }

        Self {
            api,
            store,
            clock,
            company_id,
            inner: Mutex::new(inner),
            listeners: Arc::new(Mutex::new(HashMap::new())),
            next_listener_id: AtomicU64::new(0),
        }
    }

    /// Lock the cache state, recovering from poison.
    fn lock_inner(&self) -> MutexGuard<'_, CacheInner> {
        self.inner.lock().unwrap_or_else(|poisoned| {
            warn!("Settings cache mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Return the cached value if present, otherwise fetch it.
    ///
    /// Never fails; worst case is the default record.
    pub async fn get_settings(&self) -> BusinessSettings {
        if let Some(settings) = self.lock_inner().settings.clone() {
            return settings;
        }
        self.fetch_settings().await
    }

    /// Fetch the settings from the backend.
    ///
    /// Inside the backoff window this short-circuits to the default record
    /// with no network I/O. While another fetch is in flight, callers wait
    /// on it (100 ms poll) instead of issuing a duplicate request. Never
    /// fails; a failed fetch enters backoff and returns the default record.
    pub async fn fetch_settings(&self) -> BusinessSettings {
        let mut waited = false;
        loop {
            {
                let mut inner = self.lock_inner();
                let now = self.clock.now();
                if inner.in_backoff(now, BACKOFF_WINDOW) {
                    return BusinessSettings::default();
                }
                if inner.state == CacheState::Fetching {
                    waited = true;
                } else if waited {
                    // The fetch we waited on has resolved; hand out its result.
                    return inner.settings.clone().unwrap_or_default();
                } else {
                    inner.transition(CacheState::Fetching);
                    break;
                }
            }
            tokio::time::sleep(FETCH_POLL_INTERVAL).await;
        }

        match self.fetch_remote().await {
            Ok(settings) => {
                {
                    let mut inner = self.lock_inner();
                    inner.settings = Some(settings.clone());
                    inner.using_defaults = false;
                    inner.backoff_since = None;
                    inner.transition(CacheState::Ready);
                }
                self.persist(&settings);
                self.notify_subscribers();
                settings
            }
            Err(e) => {
                error!(
                    "Failed to fetch business settings ({:?}): {}",
                    e.failure_class(),
                    e
                );
                {
                    let mut inner = self.lock_inner();
                    inner.backoff_since = Some(self.clock.now());
                    inner.using_defaults = true;
                    inner.transition(CacheState::Backoff);
                }
                self.notify_subscribers();
                BusinessSettings::default()
            }
        }
    }

    /// Query the list endpoint for the caller's company, falling back to the
    /// own-company endpoint when the record (or the endpoint) is absent.
    async fn fetch_remote(&self) -> Result<BusinessSettings> {
        let matched = match self.api.list_settings().await {
            Ok(all) => match self.company_id {
                Some(company_id) => all.into_iter().find(|s| s.company_id == Some(company_id)),
                None => None,
            },
            Err(e) if e.failure_class() == FailureClass::FeatureUnavailable => {
                debug!("Settings list endpoint unavailable, trying own-company endpoint");
                None
            }
            Err(e) => return Err(e),
        };

        match matched {
            Some(settings) => Ok(settings),
            None => self.api.my_settings().await,
        }
    }

    /// Send a partial update to the backend.
    ///
    /// On success the backend's record replaces the cached value. A
    /// feature-unavailable failure (the update endpoint is not deployed)
    /// degrades to an optimistic local merge. Any other failure propagates
    /// without touching cached state.
    pub async fn update_settings(&self, update: &SettingsUpdate) -> Result<BusinessSettings> {
        match self.api.update_my_settings(update).await {
            Ok(settings) => {
                {
                    let mut inner = self.lock_inner();
                    inner.settings = Some(settings.clone());
                    inner.using_defaults = false;
                    inner.backoff_since = None;
                    inner.transition(CacheState::Ready);
                }
                self.persist(&settings);
                self.notify_subscribers();
                Ok(settings)
            }
            Err(e) if e.failure_class() == FailureClass::FeatureUnavailable => {
                warn!(
                    "Settings update endpoint unavailable, applying local-only update: {}",
                    e
                );
                let merged = {
                    let mut inner = self.lock_inner();
                    let base = inner.settings.clone().unwrap_or_default();
                    let merged = update.apply_to(&base);
                    inner.settings = Some(merged.clone());
                    inner.using_defaults = true;
                    inner.transition(CacheState::Ready);
                    merged
                };
                self.persist(&merged);
                self.notify_subscribers();
                Ok(merged)
            }
            Err(e) => Err(e),
        }
    }

    /// Register a callback invoked after every change to the cached value.
    ///
    /// Notification runs on a separate task, never inside the call stack
    /// that triggered the change. No ordering guarantee across subscribers.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        let id = self.next_listener_id.fetch_add(1, Ordering::Relaxed);
        lock_listeners(&self.listeners).insert(id, Arc::new(callback));
        Subscription {
            id,
            listeners: Arc::downgrade(&self.listeners),
        }
    }

    /// True while the cache serves the default record after a fetch failure
    /// or an optimistic local-only update, so the UI can show a degraded-mode
    /// indicator.
    pub fn is_using_defaults(&self) -> bool {
        self.lock_inner().using_defaults
    }

    /// Current lifecycle state (an expired backoff window is resolved before
    /// reporting).
    pub fn state(&self) -> CacheState {
        let mut inner = self.lock_inner();
        let now = self.clock.now();
        inner.in_backoff(now, BACKOFF_WINDOW);
        inner.state
    }

    /// The cached record, or the default record if nothing is cached.
    fn current(&self) -> BusinessSettings {
        self.lock_inner().settings.clone().unwrap_or_default()
    }

    /// True if the check-in time-of-day is strictly after the workday start.
    pub fn is_late(&self, check_in: &str) -> bool {
        calc::is_late(&self.current(), check_in)
    }

    /// True if either stamp is absent or checkout precedes the workday end.
    pub fn is_incomplete_day(&self, check_in: Option<&str>, check_out: Option<&str>) -> bool {
        calc::is_incomplete_day(&self.current(), check_in, check_out)
    }

    /// Expected daily hours per the cached workday bounds.
    pub fn expected_hours(&self) -> f64 {
        calc::expected_hours(&self.current())
    }

    /// Overtime pay per the cached overtime multiplier.
    pub fn overtime_pay(&self, regular_hours: f64, overtime_hours: f64, hourly_rate: f64) -> f64 {
        calc::overtime_pay(&self.current(), regular_hours, overtime_hours, hourly_rate)
    }

    /// Monetary string using the cached currency code.
    pub fn format_currency(&self, amount: f64) -> String {
        calc::format_currency(&self.current(), amount)
    }

    fn persist(&self, settings: &BusinessSettings) {
        if let Err(e) = self.store.save(settings) {
            warn!("Failed to persist business settings locally: {}", e);
        }
    }

    fn notify_subscribers(&self) {
        let listeners: Vec<Listener> = lock_listeners(&self.listeners).values().cloned().collect();
        if listeners.is_empty() {
            return;
        }
        // Deferred to its own task so a notified subscriber cannot
        // synchronously re-enter the cache mid-operation.
        tokio::spawn(async move {
            for listener in listeners {
                listener();
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockSettingsApi;
    use crate::errors::SettingsError;
    use crate::store::MemorySettingsStore;

    fn company_settings(company_id: i64) -> BusinessSettings {
        BusinessSettings {
            id: Some(1),
            company_id: Some(company_id),
            ..Default::default()
        }
    }

    fn cache_with(
        api: Arc<MockSettingsApi>,
        store: Arc<MemorySettingsStore>,
        company_id: Option<i64>,
    ) -> SettingsCache {
        SettingsCache::new(api, store, company_id)
    }

    #[tokio::test]
    async fn test_starts_ready_from_persisted_record() {
        let api = Arc::new(MockSettingsApi::new());
        let store = Arc::new(MemorySettingsStore::with_settings(company_settings(7)));
        let cache = cache_with(api.clone(), store, Some(7));

        assert_eq!(cache.state(), CacheState::Ready);
        assert_eq!(cache.get_settings().await.company_id, Some(7));
        assert_eq!(api.read_calls(), 0);
    }

    #[tokio::test]
    async fn test_fetch_filters_list_by_company() {
        let api = Arc::new(MockSettingsApi::with_settings(company_settings(7)));
        let cache = cache_with(api.clone(), Arc::new(MemorySettingsStore::new()), Some(7));

        let settings = cache.fetch_settings().await;
        assert_eq!(settings.company_id, Some(7));
        assert_eq!(api.list_calls(), 1);
        assert_eq!(api.me_calls(), 0);
        assert_eq!(cache.state(), CacheState::Ready);
    }

    #[tokio::test]
    async fn test_fetch_falls_back_to_own_company_endpoint() {
        // List returns a record for a different company; /me must be queried.
        let api = Arc::new(MockSettingsApi::with_settings(company_settings(9)));
        let cache = cache_with(api.clone(), Arc::new(MemorySettingsStore::new()), Some(7));

        let settings = cache.fetch_settings().await;
        assert_eq!(settings.company_id, Some(9));
        assert_eq!(api.list_calls(), 1);
        assert_eq!(api.me_calls(), 1);
    }

    #[tokio::test]
    async fn test_fetch_failure_serves_defaults_and_enters_backoff() {
        let api = Arc::new(MockSettingsApi::new());
        api.set_fail_reads(true);
        let store = Arc::new(MemorySettingsStore::new());
        let cache = cache_with(api.clone(), store.clone(), Some(7));

        let settings = cache.fetch_settings().await;
        assert_eq!(settings, BusinessSettings::default());
        assert_eq!(cache.state(), CacheState::Backoff);
        assert!(cache.is_using_defaults());
        // Nothing gets persisted on failure
        assert!(store.persisted().is_none());
    }

    #[tokio::test]
    async fn test_update_success_replaces_cache_and_persists() {
        let api = Arc::new(MockSettingsApi::with_settings(company_settings(7)));
        let store = Arc::new(MemorySettingsStore::new());
        let cache = cache_with(api.clone(), store.clone(), Some(7));

        let update = SettingsUpdate {
            overtime_rate: Some(2.5),
            ..Default::default()
        };
        let updated = cache.update_settings(&update).await.unwrap();
        assert_eq!(api.update_calls(), 1);
        assert_eq!(updated.overtime_rate, 2.5);
        assert_eq!(cache.get_settings().await.overtime_rate, 2.5);
        assert_eq!(store.persisted().unwrap().overtime_rate, 2.5);
        assert!(!cache.is_using_defaults());
    }

    #[tokio::test]
    async fn test_update_fatal_failure_propagates_without_mutation() {
        let api = Arc::new(MockSettingsApi::with_settings(company_settings(7)));
        let cache = cache_with(api.clone(), Arc::new(MemorySettingsStore::new()), Some(7));
        cache.fetch_settings().await;

        api.set_update_failure(422, "overtime_rate must be positive");
        let update = SettingsUpdate {
            overtime_rate: Some(-1.0),
            ..Default::default()
        };
        let err = cache.update_settings(&update).await.unwrap_err();
        assert!(matches!(err, SettingsError::Backend { status: 422, .. }));
        // Cached value untouched
        assert_eq!(cache.get_settings().await.overtime_rate, 1.5);
        assert!(!cache.is_using_defaults());
    }

    #[tokio::test]
    async fn test_unsubscribe_removes_callback() {
        use std::sync::atomic::AtomicUsize;

        let api = Arc::new(MockSettingsApi::with_settings(company_settings(7)));
        let cache = cache_with(api, Arc::new(MemorySettingsStore::new()), Some(7));

        let hits = Arc::new(AtomicUsize::new(0));
        let hits_clone = hits.clone();
        let subscription = cache.subscribe(move || {
            hits_clone.fetch_add(1, Ordering::SeqCst);
        });
        subscription.unsubscribe();

        cache.fetch_settings().await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }
}
