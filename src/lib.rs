//! # Fasal Rakshak
//!
//! Parametric crop insurance for Indian farmers: rate-card pricing, a
//! three-step purchase wizard, a self-refreshing dashboard, claim payout
//! timelines and an education quiz, with Hindi, Marathi and English text.
//!
//! This crate bundles the workspace behind feature flags:
//!
//! | Feature | Crate | Contents |
//! |---|---|---|
//! | always | `fasal-core` | models, pricing, wizard, dashboard, timeline, quiz, store traits |
//! | `i18n` | `fasal-i18n` | translations, rupee formatting, language preference |
//! | `sqlite` | `fasal-sqlite` | SQLite store and password identity |
//! | `gateway` | `fasal-gateway` | `POST /api/policies/create` server and client |
//!
//! ```rust,ignore
//! use fasal_rakshak::prelude::*;
//!
//! let quote = PricingCalculator::default().quote("Maharashtra", "Cotton");
//! assert_eq!((quote.premium, quote.coverage), (450, 18000));
//! ```

pub use fasal_core::{
    FasalConfig, FasalError, Language, catalog, config, dashboard, gateway, identity, models, pricing, quiz, store,
    timeline, types, wizard,
};

pub mod prelude;

#[cfg(feature = "i18n")]
pub use fasal_i18n as i18n;

#[cfg(feature = "sqlite")]
pub use fasal_sqlite as sqlite;

#[cfg(feature = "gateway")]
pub use fasal_gateway as http;
