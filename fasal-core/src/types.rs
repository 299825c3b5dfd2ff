use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strum::{AsRefStr, Display, EnumIter, EnumString};
use thiserror::Error;

use crate::wizard::WizardStep;

/// Languages the application is translated into.
///
/// Stored as the two-letter code (`hi`, `mr`, `en`) both in the local
/// preference file and in the `profiles.preferred_language` column.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
    schemars::JsonSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Language {
    /// Hindi. First launch defaults to it.
    #[default]
    Hi,
    /// Marathi.
    Mr,
    /// English. Fallback for any missing translation.
    En,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::Hi => "hi",
            Language::Mr => "mr",
            Language::En => "en",
        }
    }

    /// Accepts the bare code or a regional tag (`hi-IN`), case-insensitive.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "hi" | "hi-in" => Some(Language::Hi),
            "mr" | "mr-in" => Some(Language::Mr),
            "en" | "en-in" | "en-us" | "en-gb" => Some(Language::En),
            _ => None,
        }
    }

    /// Name of the language written in its own script, as shown on the
    /// language picker.
    pub fn native_name(&self) -> &'static str {
        match self {
            Language::Hi => "हिंदी (Hindi)",
            Language::Mr => "मराठी (Marathi)",
            Language::En => "English",
        }
    }
}

/// Details for an input that failed validation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InvalidInputDetails {
    /// Field that failed (e.g. "district", "selected_option").
    pub field: String,
    /// Offending value, rendered as text.
    pub value: String,
    /// Translation key describing the failure.
    pub reason_key: String,
    /// Extra arguments for the translated message.
    pub args: Option<HashMap<String, String>>,
    /// Component that raised the error.
    pub source_label: Option<String>,
}

impl InvalidInputDetails {
    pub fn new(field: impl Into<String>, value: impl Into<String>, reason_key: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
            reason_key: reason_key.into(),
            args: None,
            source_label: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source_label = Some(source.into());
        self
    }
}

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq)]
pub enum FasalError {
    #[error("Invalid input for '{}': {} ({})", .0.field, .0.value, .0.reason_key)]
    InvalidInput(Box<InvalidInputDetails>),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Connectivity failure. Never fatal; surfaced as "check your connection".
    #[error("Network error: {0}")]
    NetworkError(String),

    /// The submission gateway answered with a non-2xx status.
    #[error("Gateway rejected request ({status}): {message}")]
    GatewayError { status: u16, message: String },

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Authentication error: {0}")]
    AuthError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Operation requires step {required:?} but the wizard is at {current:?}")]
    InvalidStep {
        current: WizardStep,
        required: WizardStep,
    },

    #[error("A policy submission is already in flight")]
    SubmissionInFlight,
}

impl FasalError {
    pub fn invalid_input(field: &str, value: &str, reason_key: &str, source: &str) -> Self {
        FasalError::InvalidInput(Box::new(
            InvalidInputDetails::new(field, value, reason_key).with_source(source),
        ))
    }

    /// Translation key for the message shown to the user.
    pub fn reason_key(&self) -> &str {
        match self {
            FasalError::InvalidInput(details) => &details.reason_key,
            FasalError::ConfigurationError(_) => "error-configuration",
            FasalError::NetworkError(_) => "error-connection",
            FasalError::GatewayError { .. } => "error-gateway",
            FasalError::StorageError(_) => "error-storage",
            FasalError::AuthError(_) => "error-auth",
            FasalError::NotFound(_) => "error-not-found",
            FasalError::InvalidStep { .. } => "error-invalid-step",
            FasalError::SubmissionInFlight => "error-submission-in-flight",
        }
    }

    /// Whether the failure came from connectivity rather than from the
    /// remote side refusing the request.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, FasalError::NetworkError(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn test_language_codes_roundtrip() {
        for lang in Language::iter() {
            assert_eq!(Language::from_str(lang.code()).unwrap(), lang);
            assert_eq!(lang.to_string(), lang.code());
        }
        assert_eq!(Language::from_code("hi-IN"), Some(Language::Hi));
        assert_eq!(Language::from_code(" EN "), Some(Language::En));
        assert_eq!(Language::from_code("ta"), None);
    }

    #[test]
    fn test_language_serde_is_lowercase() {
        let json = serde_json::to_string(&Language::Mr).unwrap();
        assert_eq!(json, "\"mr\"");
        assert_eq!(Language::default(), Language::Hi);
    }

    #[test]
    fn test_reason_keys() {
        let err = FasalError::invalid_input("district", "", "error-district-required", "PolicyWizard");
        assert_eq!(err.reason_key(), "error-district-required");
        assert!(err.to_string().contains("district"));
        assert_eq!(FasalError::NetworkError("refused".into()).reason_key(), "error-connection");
        assert!(FasalError::NetworkError("refused".into()).is_connectivity());
    }
}
