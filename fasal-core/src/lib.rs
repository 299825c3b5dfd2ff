//! # fasal-core
//!
//! Domain model and engines for Fasal Rakshak crop insurance: pricing, the
//! policy purchase wizard, the dashboard aggregator, claim timelines and the
//! education quiz, plus the store, identity and gateway seams they run on.

pub mod catalog;
pub mod config;
pub mod dashboard;
pub mod gateway;
pub mod identity;
pub mod models;
pub mod prelude;
pub mod pricing;
pub mod quiz;
pub mod store;
pub mod timeline;
pub mod types;
pub mod wizard;

pub use config::FasalConfig;
pub use types::{FasalError, Language};
