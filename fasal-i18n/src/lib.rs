//! Translations and number formatting for the three supported languages.
//!
//! Messages are Fluent files embedded at build time from
//! `assets/locales/<tag>/main.ftl`. Lookups fall back to English, then to
//! `MISSING:<key>`.

use fluent_bundle::bundle::FluentBundle;
use fluent_bundle::{FluentArgs, FluentResource};
use icu::decimal::FixedDecimalFormatter;
use icu::decimal::options::FixedDecimalFormatterOptions;
use icu::locid::Locale;
use rust_decimal::Decimal;
use rust_embed::RustEmbed;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, warn};
use unic_langid::LanguageIdentifier;
use writeable::Writeable;

use fasal_core::types::{FasalError, Language};
use fixed_decimal::FixedDecimal;

pub mod preferences;

pub use preferences::LanguagePreferences;

#[derive(RustEmbed)]
#[folder = "assets/locales"]
struct Asset;

type Bundle = FluentBundle<FluentResource, intl_memoizer::concurrent::IntlLangMemoizer>;

/// BCP-47 tag used for message files and number formatting.
pub fn locale_tag(language: Language) -> &'static str {
    match language {
        Language::Hi => "hi-IN",
        Language::Mr => "mr-IN",
        Language::En => "en-IN",
    }
}

/// Formats rupee amounts with Indian digit grouping.
pub trait CurrencyFormatter {
    fn format_currency(&self, amount: Decimal) -> String;
}

impl CurrencyFormatter for Language {
    fn format_currency(&self, amount: Decimal) -> String {
        format!("₹{}", format_number(*self, amount))
    }
}

/// Locale-aware grouping of a plain number (`1,00,000` in `en-IN`).
pub fn format_number(language: Language, amount: Decimal) -> String {
    let fixed = FixedDecimal::from_str(&amount.normalize().to_string()).unwrap_or_else(|_| FixedDecimal::from(0));

    let formatter = Locale::from_str(locale_tag(language))
        .ok()
        .and_then(|locale| FixedDecimalFormatter::try_new(&locale.into(), FixedDecimalFormatterOptions::default()).ok());

    match formatter {
        Some(f) => f.format(&fixed).write_to_string().into_owned(),
        None => {
            warn!(language = %language, "No ICU decimal data; formatting without grouping");
            amount.normalize().to_string()
        }
    }
}

#[derive(Clone)]
pub struct Translator {
    bundles: Arc<HashMap<Language, Bundle>>,
}

impl std::fmt::Debug for Translator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Translator")
            .field("languages", &self.bundles.keys())
            .finish()
    }
}

impl Default for Translator {
    fn default() -> Self {
        Self::new()
    }
}

impl Translator {
    pub fn new() -> Self {
        let mut bundles = HashMap::new();

        for language in [Language::Hi, Language::Mr, Language::En] {
            let tag = locale_tag(language);
            let lang_id: LanguageIdentifier = match tag.parse() {
                Ok(id) => id,
                Err(e) => {
                    error!(%tag, error = %e, "Invalid language tag");
                    continue;
                }
            };
            let mut bundle = FluentBundle::new_concurrent(vec![lang_id]);
            bundle.set_use_isolating(false);

            let file_path = format!("{}/main.ftl", tag);
            match Asset::get(&file_path) {
                Some(file) => {
                    let source = String::from_utf8_lossy(file.data.as_ref()).into_owned();
                    let resource = match FluentResource::try_new(source) {
                        Ok(res) => res,
                        Err((res, errors)) => {
                            warn!(%tag, count = errors.len(), "Fluent syntax errors; keeping parsed messages");
                            res
                        }
                    };
                    if let Err(errors) = bundle.add_resource(resource) {
                        warn!(%tag, count = errors.len(), "Duplicate Fluent messages");
                    }
                }
                None => warn!(%tag, "Translation file not found"),
            }

            bundles.insert(language, bundle);
        }

        Translator {
            bundles: Arc::new(bundles),
        }
    }

    fn lookup(&self, language: Language, key: &str, args: Option<&FluentArgs>) -> Option<String> {
        let bundle = self.bundles.get(&language)?;
        let pattern = bundle.get_message(key)?.value()?;
        let mut errors = vec![];
        let value = bundle.format_pattern(pattern, args, &mut errors);
        if !errors.is_empty() {
            warn!(%key, ?errors, "Fluent formatting errors");
        }
        Some(value.into_owned())
    }

    pub fn translate(&self, language: Language, key: &str, args: Option<&FluentArgs>) -> String {
        self.lookup(language, key, args)
            .or_else(|| self.lookup(Language::En, key, args))
            .unwrap_or_else(|| format!("MISSING:{}", key))
    }

    /// Translation with string arguments, e.g. `[("amount", "₹450".into())]`.
    pub fn translate_with_args(&self, language: Language, key: &str, args: &[(&str, String)]) -> String {
        let mut fluent_args = FluentArgs::new();
        for (name, value) in args {
            fluent_args.set(*name, value.clone());
        }
        self.translate(language, key, Some(&fluent_args))
    }

    pub fn translate_map(&self, language: Language, key: &str, args: Option<&HashMap<String, String>>) -> String {
        match args {
            Some(map) => {
                let mut fluent_args = FluentArgs::new();
                for (k, v) in map {
                    fluent_args.set(k.as_str(), v.clone());
                }
                self.translate(language, key, Some(&fluent_args))
            }
            None => self.translate(language, key, None),
        }
    }

    pub fn has_message(&self, language: Language, key: &str) -> bool {
        self.bundles.get(&language).is_some_and(|b| b.has_message(key))
    }

    /// User-facing text for an error, in the given language.
    pub fn error_message(&self, language: Language, err: &FasalError) -> String {
        match err {
            FasalError::InvalidInput(details) => self.translate_map(language, &details.reason_key, details.args.as_ref()),
            other => self.translate(language, other.reason_key(), None),
        }
    }
}

pub fn default_translator() -> Translator {
    Translator::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const KEYS: &[&str] = &[
        "select-language",
        "dashboard",
        "no-claim-triggered",
        "payout-sent",
        "coins-earned",
        "privacy-content",
        "buy-policy-instructions",
        "error-connection",
    ];

    #[test]
    fn test_every_language_has_core_keys() {
        let t = Translator::new();
        for lang in [Language::Hi, Language::Mr, Language::En] {
            for key in KEYS {
                assert!(t.has_message(lang, key), "{lang}: {key}");
            }
        }
    }

    #[test]
    fn test_lookup_per_language() {
        let t = Translator::new();
        assert_eq!(t.translate(Language::En, "dashboard", None), "Dashboard");
        assert_eq!(t.translate(Language::Hi, "dashboard", None), "डैशबोर्ड");
        assert_eq!(t.translate(Language::Mr, "dashboard", None), "डॅशबोर्ड");
        assert_eq!(t.translate(Language::Mr, "crop", None), "पीक");
    }

    #[test]
    fn test_missing_key() {
        let t = Translator::new();
        assert_eq!(t.translate(Language::Hi, "no-such-key", None), "MISSING:no-such-key");
    }

    #[test]
    fn test_arguments_without_isolation_marks() {
        let t = Translator::new();
        let text = t.translate_with_args(
            Language::En,
            "question-progress",
            &[("current", "2".to_string()), ("total", "5".to_string())],
        );
        assert_eq!(text, "Question 2 of 5");
    }

    #[test]
    fn test_error_messages() {
        let t = Translator::new();
        let offline = FasalError::NetworkError("connection refused".into());
        assert!(t.error_message(Language::En, &offline).contains("check your connection"));

        let bad = FasalError::invalid_input("crop", "Saffron", "error-unknown-crop", "PolicyWizard");
        assert_eq!(t.error_message(Language::En, &bad), "Please choose a crop from the list.");
    }

    #[test]
    fn test_rupee_formatting() {
        assert_eq!(Language::En.format_currency(dec!(18000)), "₹18,000");
        assert_eq!(Language::En.format_currency(dec!(100000)), "₹1,00,000");
        assert_eq!(Language::En.format_currency(dec!(450)), "₹450");
        assert!(Language::Hi.format_currency(dec!(10000)).starts_with('₹'));
        assert!(Language::Mr.format_currency(dec!(10000)).starts_with('₹'));
    }
}
