use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};
use uuid::Uuid;

use fasal_core::store::FasalStore;
use fasal_core::types::{FasalError, Language};

use crate::{CurrencyFormatter, Translator};

const APP_DIR: &str = "fasal-rakshak";
const FILE_NAME: &str = "preferences.toml";

#[derive(Debug, Default, Serialize, Deserialize)]
struct PreferenceFile {
    language: Option<String>,
}

/// The active UI language, persisted across runs, plus the translator that
/// renders it.
#[derive(Debug, Clone)]
pub struct LanguagePreferences {
    path: Option<PathBuf>,
    language: Language,
    stored: bool,
    translator: Translator,
}

impl LanguagePreferences {
    /// `<config_dir>/fasal-rakshak/preferences.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join(APP_DIR).join(FILE_NAME))
    }

    /// Reads the stored language. A missing or unreadable file, or an
    /// unsupported code, leaves Hindi active.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let stored = read_language(&path);
        Self {
            path: Some(path),
            language: stored.unwrap_or_default(),
            stored: stored.is_some(),
            translator: Translator::new(),
        }
    }

    /// Loads from [`default_path`](Self::default_path), or keeps the choice
    /// in memory only when there is no config directory.
    pub fn load_default() -> Self {
        match Self::default_path() {
            Some(path) => Self::load(path),
            None => Self::in_memory(Language::default()),
        }
    }

    pub fn in_memory(language: Language) -> Self {
        Self {
            path: None,
            language,
            stored: false,
            translator: Translator::new(),
        }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Whether a language was ever chosen explicitly. Drives the first-run
    /// language picker.
    pub fn has_stored_choice(&self) -> bool {
        self.stored
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Writes the choice to disk, then activates it. Nothing changes if the
    /// write fails.
    pub fn set(&mut self, language: Language) -> Result<(), FasalError> {
        if let Some(path) = &self.path {
            write_language(path, language)?;
            self.stored = true;
        }
        self.language = language;
        debug!(language = %language, "Language preference saved");
        Ok(())
    }

    /// Changes the language for a signed-in owner: local preference first,
    /// then the profile row. If the profile update fails the local change is
    /// rolled back and the update error returned.
    pub async fn change_for_profile(
        &mut self,
        store: &dyn FasalStore,
        owner: Uuid,
        language: Language,
    ) -> Result<(), FasalError> {
        let previous = self.language;
        let previously_stored = self.stored;
        self.set(language)?;

        if let Err(e) = store.update_preferred_language(owner, language).await {
            warn!(error = %e, %owner, "Profile language update failed; restoring previous language");
            if let Err(restore) = self.restore(previous, previously_stored) {
                error!(error = %restore, "Could not restore previous language preference");
            }
            return Err(e);
        }
        Ok(())
    }

    fn restore(&mut self, language: Language, stored: bool) -> Result<(), FasalError> {
        if let Some(path) = &self.path {
            if stored {
                write_language(path, language)?;
            } else if path.exists() {
                fs::remove_file(path)
                    .map_err(|e| FasalError::StorageError(format!("Failed to remove preference file: {}", e)))?;
            }
        }
        self.language = language;
        self.stored = stored;
        Ok(())
    }

    pub fn translator(&self) -> &Translator {
        &self.translator
    }

    pub fn t(&self, key: &str) -> String {
        self.translator.translate(self.language, key, None)
    }

    pub fn t_with(&self, key: &str, args: &[(&str, String)]) -> String {
        self.translator.translate_with_args(self.language, key, args)
    }

    pub fn error_message(&self, err: &FasalError) -> String {
        self.translator.error_message(self.language, err)
    }

    pub fn format_currency(&self, amount: Decimal) -> String {
        self.language.format_currency(amount)
    }
}

fn read_language(path: &Path) -> Option<Language> {
    let content = fs::read_to_string(path).ok()?;
    let file: PreferenceFile = match toml::from_str(&content) {
        Ok(f) => f,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Ignoring unreadable preference file");
            return None;
        }
    };
    let code = file.language?;
    let language = Language::from_code(&code);
    if language.is_none() {
        warn!(%code, "Ignoring unsupported stored language");
    }
    language
}

fn write_language(path: &Path, language: Language) -> Result<(), FasalError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| FasalError::StorageError(format!("Failed to create config directory: {}", e)))?;
    }
    let file = PreferenceFile {
        language: Some(language.code().to_string()),
    };
    let content = toml::to_string(&file)
        .map_err(|e| FasalError::StorageError(format!("Failed to serialize preferences: {}", e)))?;
    fs::write(path, content).map_err(|e| FasalError::StorageError(format!("Failed to write preferences: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fasal_core::models::NewProfile;
    use fasal_core::store::MemoryStore;
    use rust_decimal_macros::dec;

    #[test]
    fn test_first_run_defaults_to_hindi() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = LanguagePreferences::load(dir.path().join("preferences.toml"));
        assert_eq!(prefs.language(), Language::Hi);
        assert!(!prefs.has_stored_choice());
        assert_eq!(prefs.t("welcome"), "स्वागत है");
    }

    #[test]
    fn test_choice_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("preferences.toml");
        let mut prefs = LanguagePreferences::load(&path);
        prefs.set(Language::Mr).unwrap();

        let reloaded = LanguagePreferences::load(&path);
        assert_eq!(reloaded.language(), Language::Mr);
        assert!(reloaded.has_stored_choice());
        assert_eq!(reloaded.t("crop"), "पीक");
    }

    #[test]
    fn test_invalid_stored_values_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.toml");
        fs::write(&path, "language = \"ta\"\n").unwrap();
        assert_eq!(LanguagePreferences::load(&path).language(), Language::Hi);

        fs::write(&path, "not = [valid").unwrap();
        assert_eq!(LanguagePreferences::load(&path).language(), Language::Hi);
    }

    #[tokio::test]
    async fn test_change_for_profile_updates_both() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.toml");
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        store
            .insert_profile(NewProfile {
                id: owner,
                full_name: "Meena".into(),
                email: "meena@example.in".into(),
                preferred_language: Language::Hi,
            })
            .await
            .unwrap();

        let mut prefs = LanguagePreferences::load(&path);
        prefs.change_for_profile(&store, owner, Language::En).await.unwrap();
        assert_eq!(prefs.language(), Language::En);
        assert_eq!(LanguagePreferences::load(&path).language(), Language::En);
        assert_eq!(store.get_profile(owner).await.unwrap().unwrap().preferred_language, Language::En);
    }

    #[tokio::test]
    async fn test_change_rolls_back_when_profile_update_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.toml");
        let store = MemoryStore::new();

        let mut prefs = LanguagePreferences::load(&path);
        prefs.set(Language::Mr).unwrap();

        // No profile row for this owner: the update fails.
        let err = prefs.change_for_profile(&store, Uuid::new_v4(), Language::En).await.unwrap_err();
        assert!(matches!(err, FasalError::NotFound(_)));
        assert_eq!(prefs.language(), Language::Mr);
        assert_eq!(LanguagePreferences::load(&path).language(), Language::Mr);
    }

    #[tokio::test]
    async fn test_rollback_of_first_choice_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.toml");
        let store = MemoryStore::new();

        let mut prefs = LanguagePreferences::load(&path);
        assert!(prefs.change_for_profile(&store, Uuid::new_v4(), Language::En).await.is_err());
        assert!(!path.exists());
        assert!(!prefs.has_stored_choice());
    }

    #[test]
    fn test_currency_follows_language() {
        let prefs = LanguagePreferences::in_memory(Language::En);
        assert_eq!(prefs.format_currency(dec!(15600)), "₹15,600");
    }
}
