use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::time::Duration;

use crate::types::FasalError;

/// Pricing and scheduling parameters.
///
/// Defaults reproduce the published rate card: ₹250 premium and ₹10,000
/// coverage per policy, Maharashtra at 1.2×, Cotton at 1.5×, Rice at 1.3×,
/// everything else at 1.0×.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FasalConfig {
    pub base_premium: Decimal,
    pub base_coverage: Decimal,
    /// Region (state) name to multiplier. Unlisted regions price at 1.0.
    pub region_multipliers: BTreeMap<String, Decimal>,
    /// Crop name to multiplier. Unlisted crops price at 1.0.
    pub crop_multipliers: BTreeMap<String, Decimal>,
    pub coverage_term_years: u32,
    /// Dashboard refresh period, in seconds.
    pub poll_interval_secs: u64,
}

impl Default for FasalConfig {
    fn default() -> Self {
        let mut region_multipliers = BTreeMap::new();
        region_multipliers.insert("Maharashtra".to_string(), dec!(1.2));

        let mut crop_multipliers = BTreeMap::new();
        crop_multipliers.insert("Cotton".to_string(), dec!(1.5));
        crop_multipliers.insert("Rice".to_string(), dec!(1.3));

        FasalConfig {
            base_premium: dec!(250),
            base_coverage: dec!(10000),
            region_multipliers,
            crop_multipliers,
            coverage_term_years: 1,
            poll_interval_secs: 5,
        }
    }
}

impl std::str::FromStr for FasalConfig {
    type Err = FasalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let config: FasalConfig = serde_json::from_str(s)
            .map_err(|e| FasalError::ConfigurationError(format!("Failed to parse config JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }
}

impl FasalConfig {
    pub fn builder() -> FasalConfigBuilder {
        FasalConfigBuilder::default()
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Rejects anything that could price a policy at zero or below.
    pub fn validate(&self) -> Result<(), FasalError> {
        if self.base_premium <= Decimal::ZERO {
            return Err(FasalError::ConfigurationError("Base premium must be positive".to_string()));
        }
        if self.base_coverage <= Decimal::ZERO {
            return Err(FasalError::ConfigurationError("Base coverage must be positive".to_string()));
        }
        for (name, m) in self.region_multipliers.iter().chain(self.crop_multipliers.iter()) {
            if *m <= Decimal::ZERO {
                return Err(FasalError::ConfigurationError(format!(
                    "Multiplier for '{}' must be positive, got {}",
                    name, m
                )));
            }
        }
        if self.coverage_term_years == 0 {
            return Err(FasalError::ConfigurationError("Coverage term must be at least one year".to_string()));
        }
        if self.poll_interval_secs == 0 {
            return Err(FasalError::ConfigurationError("Poll interval must be at least one second".to_string()));
        }
        Ok(())
    }

    /// Overlays `FASAL_BASE_PREMIUM`, `FASAL_BASE_COVERAGE` and
    /// `FASAL_POLL_INTERVAL_SECS` on the defaults. Unset variables keep the
    /// default; malformed ones are an error.
    pub fn from_env() -> Result<Self, FasalError> {
        let mut config = FasalConfig::default();

        if let Ok(raw) = env::var("FASAL_BASE_PREMIUM") {
            config.base_premium = raw
                .trim()
                .parse::<Decimal>()
                .map_err(|e| FasalError::ConfigurationError(format!("Invalid FASAL_BASE_PREMIUM: {}", e)))?;
        }
        if let Ok(raw) = env::var("FASAL_BASE_COVERAGE") {
            config.base_coverage = raw
                .trim()
                .parse::<Decimal>()
                .map_err(|e| FasalError::ConfigurationError(format!("Invalid FASAL_BASE_COVERAGE: {}", e)))?;
        }
        if let Ok(raw) = env::var("FASAL_POLL_INTERVAL_SECS") {
            config.poll_interval_secs = raw
                .trim()
                .parse::<u64>()
                .map_err(|e| FasalError::ConfigurationError(format!("Invalid FASAL_POLL_INTERVAL_SECS: {}", e)))?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Loads a JSON config file. Missing keys take their defaults.
    pub fn try_from_json(path: &str) -> Result<Self, FasalError> {
        let content = fs::read_to_string(path)
            .map_err(|e| FasalError::ConfigurationError(format!("Failed to read config file: {}", e)))?;
        content.parse()
    }
}

#[derive(Default)]
pub struct FasalConfigBuilder {
    base_premium: Option<Decimal>,
    base_coverage: Option<Decimal>,
    region_multipliers: Vec<(String, Decimal)>,
    crop_multipliers: Vec<(String, Decimal)>,
    coverage_term_years: Option<u32>,
    poll_interval_secs: Option<u64>,
}

impl FasalConfigBuilder {
    pub fn base_premium(mut self, amount: Decimal) -> Self {
        self.base_premium = Some(amount);
        self
    }

    pub fn base_coverage(mut self, amount: Decimal) -> Self {
        self.base_coverage = Some(amount);
        self
    }

    pub fn region_multiplier(mut self, region: impl Into<String>, m: Decimal) -> Self {
        self.region_multipliers.push((region.into(), m));
        self
    }

    pub fn crop_multiplier(mut self, crop: impl Into<String>, m: Decimal) -> Self {
        self.crop_multipliers.push((crop.into(), m));
        self
    }

    pub fn coverage_term_years(mut self, years: u32) -> Self {
        self.coverage_term_years = Some(years);
        self
    }

    pub fn poll_interval_secs(mut self, secs: u64) -> Self {
        self.poll_interval_secs = Some(secs);
        self
    }

    /// Starts from the defaults and applies every override; later entries for
    /// the same region or crop win.
    pub fn build(self) -> Result<FasalConfig, FasalError> {
        let mut config = FasalConfig::default();
        if let Some(p) = self.base_premium {
            config.base_premium = p;
        }
        if let Some(c) = self.base_coverage {
            config.base_coverage = c;
        }
        config.region_multipliers.extend(self.region_multipliers);
        config.crop_multipliers.extend(self.crop_multipliers);
        if let Some(y) = self.coverage_term_years {
            config.coverage_term_years = y;
        }
        if let Some(s) = self.poll_interval_secs {
            config.poll_interval_secs = s;
        }
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_rate_card() {
        let config = FasalConfig::default();
        assert_eq!(config.base_premium, dec!(250));
        assert_eq!(config.base_coverage, dec!(10000));
        assert_eq!(config.region_multipliers.get("Maharashtra"), Some(&dec!(1.2)));
        assert_eq!(config.crop_multipliers.get("Cotton"), Some(&dec!(1.5)));
        assert_eq!(config.crop_multipliers.get("Rice"), Some(&dec!(1.3)));
        assert_eq!(config.poll_interval(), Duration::from_secs(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_validation() {
        let res = FasalConfig::builder()
            .base_premium(dec!(300))
            .crop_multiplier("Sugarcane", dec!(1.1))
            .build();
        let config = res.unwrap();
        assert_eq!(config.base_premium, dec!(300));
        assert_eq!(config.crop_multipliers.len(), 3);

        let res_fail = FasalConfig::builder().crop_multiplier("Wheat", dec!(0)).build();
        assert!(matches!(res_fail, Err(FasalError::ConfigurationError(_))));

        let res_fail = FasalConfig::builder().base_coverage(dec!(-1)).build();
        assert!(res_fail.is_err());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: FasalConfig = r#"{"base_premium": 500, "poll_interval_secs": 10}"#.parse().unwrap();
        assert_eq!(config.base_premium, dec!(500));
        assert_eq!(config.base_coverage, dec!(10000));
        assert_eq!(config.poll_interval_secs, 10);

        assert!("{not json".parse::<FasalConfig>().is_err());
        assert!(r#"{"poll_interval_secs": 0}"#.parse::<FasalConfig>().is_err());
    }

    #[test]
    fn test_try_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"region_multipliers": {{"Punjab": 1.1}}}}"#).unwrap();
        let config = FasalConfig::try_from_json(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.region_multipliers.get("Punjab"), Some(&dec!(1.1)));
        // A supplied table replaces the default one.
        assert!(!config.region_multipliers.contains_key("Maharashtra"));

        assert!(FasalConfig::try_from_json("/nonexistent/fasal.json").is_err());
    }
}
