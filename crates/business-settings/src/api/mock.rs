//! Mock settings backend for testing - programmable responses and call counters.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::errors::{Result, SettingsError};
use crate::models::{BusinessSettings, SettingsUpdate};

use super::SettingsApi;

/// In-memory settings backend double.
///
/// Counts calls per endpoint, can simulate latency (for coalescing tests),
/// read failures (for backoff tests), and update failures by HTTP status
/// (for the optimistic-degrade path).
#[derive(Default)]
pub struct MockSettingsApi {
    settings: Mutex<Option<BusinessSettings>>,
    fetch_delay: Mutex<Option<Duration>>,
    fail_reads: AtomicBool,
    update_failure: Mutex<Option<(u16, String)>>,
    list_calls: AtomicUsize,
    me_calls: AtomicUsize,
    update_calls: AtomicUsize,
}

impl MockSettingsApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend pre-seeded with one settings record.
    pub fn with_settings(settings: BusinessSettings) -> Self {
        let api = Self::new();
        *api.settings.lock().unwrap() = Some(settings);
        api
    }

    /// Replace the record the backend serves.
    pub fn set_settings(&self, settings: BusinessSettings) {
        *self.settings.lock().unwrap() = Some(settings);
    }

    /// Delay every read by `delay` to keep a fetch in flight.
    pub fn set_fetch_delay(&self, delay: Duration) {
        *self.fetch_delay.lock().unwrap() = Some(delay);
    }

    /// Make all reads fail with HTTP 503.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make updates fail with the given HTTP status.
    pub fn set_update_failure(&self, status: u16, message: impl Into<String>) {
        *self.update_failure.lock().unwrap() = Some((status, message.into()));
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn me_calls(&self) -> usize {
        self.me_calls.load(Ordering::SeqCst)
    }

    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    /// Total reads across both fetch endpoints.
    pub fn read_calls(&self) -> usize {
        self.list_calls() + self.me_calls()
    }

    async fn simulate_latency(&self) {
        let delay = *self.fetch_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn read_error() -> SettingsError {
        SettingsError::Backend {
            status: 503,
            message: "Service Unavailable".to_string(),
        }
    }
}

#[async_trait]
impl SettingsApi for MockSettingsApi {
    async fn list_settings(&self) -> Result<Vec<BusinessSettings>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Self::read_error());
        }
        Ok(self.settings.lock().unwrap().clone().into_iter().collect())
    }

    async fn my_settings(&self) -> Result<BusinessSettings> {
        self.me_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Self::read_error());
        }
        self.settings
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| SettingsError::NotFound("GET /business-settings/me".to_string()))
    }

    async fn update_my_settings(&self, update: &SettingsUpdate) -> Result<BusinessSettings> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        let failure = self.update_failure.lock().unwrap().clone();
        if let Some((status, message)) = failure {
            if status == 404 {
                return Err(SettingsError::NotFound(
                    "PUT /business-settings/me".to_string(),
                ));
            }
            return Err(SettingsError::Backend { status, message });
        }

        let mut guard = self.settings.lock().unwrap();
        let base = guard.clone().unwrap_or_default();
        let merged = update.apply_to(&base);
        *guard = Some(merged.clone());
        Ok(merged)
    }
}
