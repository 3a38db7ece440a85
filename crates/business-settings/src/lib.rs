//! Staffolio Business Settings Crate
//!
//! This crate provides the client-side cache/synchronization service for a
//! company's business settings (working hours, leave allotments, overtime
//! multiplier, currency, salary cycle) in the Staffolio HR application.
//!
//! # Overview
//!
//! The cache:
//! - Fetches the settings record from the backend once and serves it to many
//!   callers
//! - Persists it to local durable storage so a reload starts warm
//! - Coalesces concurrent fetches into a single network request
//! - Enters a fixed 30-second backoff window after a failed fetch, serving
//!   the default record instead of hammering the backend
//! - Notifies subscribers asynchronously whenever the cached value changes
//! - Exposes pure derived calculations (lateness, incomplete day, expected
//!   hours, overtime pay, currency formatting) over the cached state
//!
//! # Architecture
//!
//! ```text
//! +------------------+     +------------------+
//! |   UI callers     | --> |  SettingsCache   |  (state machine + listeners)
//! +------------------+     +------------------+
//!                             |            |
//!                             v            v
//!                   +---------------+  +----------------+
//!                   |  SettingsApi  |  | SettingsStore  |
//!                   |  (REST seam)  |  | (local JSON)   |
//!                   +---------------+  +----------------+
//! ```
//!
//! # Core Types
//!
//! - [`SettingsCache`] - the cache service; construct one per session
//! - [`BusinessSettings`] / [`SettingsUpdate`] - the data model
//! - [`SettingsApi`] / [`HttpSettingsApi`] - the backend seam
//! - [`SettingsStore`] / [`FileSettingsStore`] - local durable persistence
//! - [`SettingsError`] / [`FailureClass`] - error taxonomy and classification

pub mod api;
pub mod cache;
pub mod calc;
pub mod errors;
pub mod models;
pub mod store;

// Re-export the cache service and its collaborator types
pub use cache::{
    CacheState, Clock, ManualClock, SettingsCache, Subscription, SystemClock, BACKOFF_WINDOW,
};

// Re-export the data model
pub use models::{BusinessSettings, SalaryCycle, SettingsUpdate};

// Re-export the backend seam
pub use api::{HttpSettingsApi, MockSettingsApi, SettingsApi};

// Re-export persistence
pub use store::{FileSettingsStore, MemorySettingsStore, SettingsStore};

// Re-export error types
pub use errors::{FailureClass, Result, SettingsError};
