//! Prelude for Fasal Rakshak
//!
//! ```rust
//! use fasal_rakshak::prelude::*;
//! ```

pub use fasal_core::prelude::*;

#[cfg(feature = "i18n")]
pub use fasal_i18n::{CurrencyFormatter, LanguagePreferences, Translator, locale_tag};

#[cfg(feature = "sqlite")]
pub use fasal_sqlite::{SqliteIdentityProvider, SqliteStore};

#[cfg(feature = "gateway")]
pub use fasal_gateway::{GatewayConfig, HttpPolicyGateway, NetworkConfig};
