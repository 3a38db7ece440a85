//! Error types and failure classification for the business-settings crate.
//!
//! This module provides:
//! - [`SettingsError`]: The main error enum for all settings operations
//! - [`FailureClass`]: Classification for determining how a failure is handled

mod classify;

pub use classify::FailureClass;

use thiserror::Error;

/// Type alias for Result using our error type.
pub type Result<T> = std::result::Result<T, SettingsError>;

/// Errors that can occur while fetching, updating, or persisting settings.
///
/// Each variant is classified into a [`FailureClass`] via the
/// [`failure_class`](Self::failure_class) method, which determines whether
/// the update path degrades to a local merge, whether a failure counts as
/// transient, or whether it must be surfaced to the caller.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// The backend has no record or no endpoint for the request (HTTP 404).
    /// The cache treats this as the feature not being deployed yet.
    #[error("Settings not found: {0}")]
    NotFound(String),

    /// The backend rejected the request with a non-success status.
    #[error("Backend error: HTTP {status} - {message}")]
    Backend {
        /// HTTP status code returned by the backend
        status: u16,
        /// Response body or status text
        message: String,
    },

    /// A network error occurred while talking to the backend.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The backend returned a payload that could not be decoded.
    #[error("Malformed settings payload: {0}")]
    Decode(#[from] serde_json::Error),

    /// Local durable storage failed (quota, permissions, serialization).
    /// The cache catches and logs these at the point of use.
    #[error("Local storage error: {0}")]
    Storage(String),
}

impl SettingsError {
    /// Returns the failure classification for this error.
    ///
    /// The update path consults this to decide between the optimistic
    /// local-merge degrade ([`FailureClass::FeatureUnavailable`]) and
    /// propagating the error; the fetch path logs it for diagnostics.
    ///
    /// # Examples
    ///
    /// ```
    /// use staffolio_business_settings::errors::{FailureClass, SettingsError};
    ///
    /// let error = SettingsError::NotFound("PUT /business-settings/me".to_string());
    /// assert_eq!(error.failure_class(), FailureClass::FeatureUnavailable);
    ///
    /// let error = SettingsError::Backend { status: 422, message: "invalid rate".to_string() };
    /// assert_eq!(error.failure_class(), FailureClass::Fatal);
    /// ```
    pub fn failure_class(&self) -> FailureClass {
        match self {
            // Missing record or missing endpoint - feature not deployed
            Self::NotFound(_) => FailureClass::FeatureUnavailable,
            Self::Backend { status, .. } if *status == 404 || *status == 501 => {
                FailureClass::FeatureUnavailable
            }

            // Backend overloaded or unavailable - worth retrying later
            Self::Backend { status, .. } if *status == 429 || *status >= 500 => {
                FailureClass::Transient
            }

            // Validation, auth, and the remaining 4xx range - caller's problem
            Self::Backend { .. } => FailureClass::Fatal,

            // Connectivity failures are transient by definition
            Self::Network(_) => FailureClass::Transient,

            // A payload we cannot decode won't decode on retry either
            Self::Decode(_) => FailureClass::Fatal,

            // Storage failures are absorbed at the call site; the class is
            // only ever observed in logs
            Self::Storage(_) => FailureClass::Fatal,
        }
    }
}
