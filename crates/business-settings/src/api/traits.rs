//! Settings backend trait definition.

use async_trait::async_trait;

use crate::errors::Result;
use crate::models::{BusinessSettings, SettingsUpdate};

/// Trait for the business-settings backend.
///
/// The cache issues all network I/O through this trait so tests can swap in
/// a mock and count calls.
#[async_trait]
pub trait SettingsApi: Send + Sync {
    /// Fetch the settings records of all tenants.
    ///
    /// The cache filters client-side for the record whose `company_id`
    /// matches the authenticated user's company.
    async fn list_settings(&self) -> Result<Vec<BusinessSettings>>;

    /// Fetch the settings record for the caller's own company.
    ///
    /// Fallback used when the list response has no matching record.
    async fn my_settings(&self) -> Result<BusinessSettings>;

    /// Send a partial update for the caller's own company.
    ///
    /// Returns the full updated record as persisted by the backend.
    async fn update_my_settings(&self, update: &SettingsUpdate) -> Result<BusinessSettings>;
}
