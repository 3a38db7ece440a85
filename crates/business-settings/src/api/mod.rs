//! Backend REST interface for business settings.
//!
//! The cache talks to the backend exclusively through the [`SettingsApi`]
//! trait; [`HttpSettingsApi`] is the production implementation and
//! [`MockSettingsApi`] the programmable test double.

mod http;
mod mock;
mod traits;

pub use http::HttpSettingsApi;
pub use mock::MockSettingsApi;
pub use traits::SettingsApi;
