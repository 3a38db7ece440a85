//! Cache lifecycle state machine.

use std::time::{Duration, Instant};

use log::debug;

use crate::models::BusinessSettings;

/// Lifecycle state of the settings cache.
///
/// - **Uninitialized**: no in-memory value yet.
/// - **Fetching**: a backend fetch is in flight; concurrent callers wait for
///   it instead of issuing duplicate requests.
/// - **Ready**: an in-memory value exists and is served synchronously.
/// - **Backoff**: the most recent fetch failed; until the cooldown window
///   elapses, all reads short-circuit to the default record.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CacheState {
    Uninitialized,
    Fetching,
    Ready,
    Backoff,
}

impl std::fmt::Display for CacheState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "Uninitialized"),
            Self::Fetching => write!(f, "Fetching"),
            Self::Ready => write!(f, "Ready"),
            Self::Backoff => write!(f, "Backoff"),
        }
    }
}

/// Mutex-guarded mutable state of the cache.
///
/// All mutation goes through [`transition`](Self::transition) so every state
/// change shows up in the debug log.
#[derive(Debug)]
pub(super) struct CacheInner {
    pub state: CacheState,
    /// The cached record, if any. Defaults are never stored here - a cache
    /// serving defaults keeps `None` plus the `using_defaults` flag.
    pub settings: Option<BusinessSettings>,
    /// Start of the current backoff window.
    pub backoff_since: Option<Instant>,
    /// True while the cache serves the default record after a fetch failure
    /// or an optimistic local-only update.
    pub using_defaults: bool,
}

impl CacheInner {
    pub fn new() -> Self {
        Self {
            state: CacheState::Uninitialized,
            settings: None,
            backoff_since: None,
            using_defaults: false,
        }
    }

    /// The single transition function of the state machine.
    pub fn transition(&mut self, to: CacheState) {
        if self.state != to {
            debug!("Settings cache: {} -> {}", self.state, to);
        }
        self.state = to;
    }

    /// Check whether the cache is inside its backoff window.
    ///
    /// An expired window transitions the cache back to a state willing to
    /// retry (Ready if a value exists, Uninitialized otherwise). A recurring
    /// failure overwrites `backoff_since`, which is the one-shot "replace
    /// any previously scheduled reset" semantic.
    pub fn in_backoff(&mut self, now: Instant, window: Duration) -> bool {
        if self.state != CacheState::Backoff {
            return false;
        }
        match self.backoff_since {
            Some(since) if now.duration_since(since) < window => true,
            _ => {
                self.backoff_since = None;
                let next = if self.settings.is_some() {
                    CacheState::Ready
                } else {
                    CacheState::Uninitialized
                };
                self.transition(next);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(30);

    #[test]
    fn test_starts_uninitialized() {
        let inner = CacheInner::new();
        assert_eq!(inner.state, CacheState::Uninitialized);
        assert!(inner.settings.is_none());
        assert!(!inner.using_defaults);
    }

    #[test]
    fn test_not_in_backoff_outside_backoff_state() {
        let mut inner = CacheInner::new();
        assert!(!inner.in_backoff(Instant::now(), WINDOW));

        inner.transition(CacheState::Ready);
        assert!(!inner.in_backoff(Instant::now(), WINDOW));
    }

    #[test]
    fn test_backoff_holds_within_window() {
        let mut inner = CacheInner::new();
        let start = Instant::now();
        inner.backoff_since = Some(start);
        inner.transition(CacheState::Backoff);

        assert!(inner.in_backoff(start + Duration::from_secs(29), WINDOW));
        assert_eq!(inner.state, CacheState::Backoff);
    }

    #[test]
    fn test_backoff_expires_to_uninitialized_without_value() {
        let mut inner = CacheInner::new();
        let start = Instant::now();
        inner.backoff_since = Some(start);
        inner.transition(CacheState::Backoff);

        assert!(!inner.in_backoff(start + Duration::from_secs(31), WINDOW));
        assert_eq!(inner.state, CacheState::Uninitialized);
        assert!(inner.backoff_since.is_none());
    }

    #[test]
    fn test_backoff_expires_to_ready_with_value() {
        let mut inner = CacheInner::new();
        inner.settings = Some(BusinessSettings::default());
        let start = Instant::now();
        inner.backoff_since = Some(start);
        inner.transition(CacheState::Backoff);

        assert!(!inner.in_backoff(start + WINDOW, WINDOW));
        assert_eq!(inner.state, CacheState::Ready);
    }

    #[test]
    fn test_state_display() {
        assert_eq!(CacheState::Fetching.to_string(), "Fetching");
        assert_eq!(CacheState::Backoff.to_string(), "Backoff");
    }
}
