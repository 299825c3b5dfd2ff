//! Premium and coverage pricing.
//!
//! A quote is the base rate scaled by a region multiplier and a crop
//! multiplier, rounded half away from zero to whole rupees. All arithmetic is
//! exact decimal; nothing is cached, every selection change re-prices.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::FasalConfig;

/// Premium and coverage in whole rupees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Quote {
    pub premium: u64,
    pub coverage: u64,
}

#[derive(Debug, Clone)]
pub struct PricingCalculator {
    config: Arc<FasalConfig>,
}

impl Default for PricingCalculator {
    fn default() -> Self {
        Self::new(Arc::new(FasalConfig::default()))
    }
}

impl PricingCalculator {
    pub fn new(config: Arc<FasalConfig>) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FasalConfig {
        &self.config
    }

    /// Multiplier for a region; unlisted or empty regions are 1.0.
    pub fn region_multiplier(&self, region: &str) -> Decimal {
        self.config
            .region_multipliers
            .get(region)
            .copied()
            .unwrap_or(Decimal::ONE)
    }

    /// Multiplier for a crop; unlisted or empty crops are 1.0.
    pub fn crop_multiplier(&self, crop: &str) -> Decimal {
        self.config
            .crop_multipliers
            .get(crop)
            .copied()
            .unwrap_or(Decimal::ONE)
    }

    pub fn quote(&self, region: &str, crop: &str) -> Quote {
        let factor = self.region_multiplier(region) * self.crop_multiplier(crop);
        Quote {
            premium: to_rupees(self.config.base_premium * factor),
            coverage: to_rupees(self.config.base_coverage * factor),
        }
    }
}

fn to_rupees(amount: Decimal) -> u64 {
    amount
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u64()
        .unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use rust_decimal_macros::dec;

    #[test]
    fn test_maharashtra_cotton() {
        let calc = PricingCalculator::default();
        assert_eq!(calc.quote("Maharashtra", "Cotton"), Quote { premium: 450, coverage: 18000 });
    }

    #[test]
    fn test_known_pairs() {
        let calc = PricingCalculator::default();
        assert_eq!(calc.quote("Maharashtra", "Rice"), Quote { premium: 390, coverage: 15600 });
        assert_eq!(calc.quote("Maharashtra", "Wheat"), Quote { premium: 300, coverage: 12000 });
        assert_eq!(calc.quote("Punjab", "Cotton"), Quote { premium: 375, coverage: 15000 });
        assert_eq!(calc.quote("Punjab", "Rice"), Quote { premium: 325, coverage: 13000 });
        assert_eq!(calc.quote("Gujarat", "Onion"), Quote { premium: 250, coverage: 10000 });
    }

    #[test]
    fn test_empty_selection_prices_at_base() {
        let calc = PricingCalculator::default();
        assert_eq!(calc.quote("", ""), Quote { premium: 250, coverage: 10000 });
        assert_eq!(calc.quote("Maharashtra", ""), Quote { premium: 300, coverage: 12000 });
        assert_eq!(calc.quote("", "Rice"), Quote { premium: 325, coverage: 13000 });
    }

    #[test]
    fn test_every_catalog_pair_follows_the_formula() {
        let calc = PricingCalculator::default();
        for region in catalog::STATES {
            for crop in catalog::CROPS {
                let rm = if *region == "Maharashtra" { dec!(1.2) } else { dec!(1.0) };
                let cm = match *crop {
                    "Cotton" => dec!(1.5),
                    "Rice" => dec!(1.3),
                    _ => dec!(1.0),
                };
                let expected_premium = (dec!(250) * rm * cm)
                    .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
                let expected_coverage = (dec!(10000) * rm * cm)
                    .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
                let quote = calc.quote(region, crop);
                assert_eq!(Decimal::from(quote.premium), expected_premium, "{region}/{crop}");
                assert_eq!(Decimal::from(quote.coverage), expected_coverage, "{region}/{crop}");
                assert!(quote.premium > 0 && quote.coverage > 0);
            }
        }
    }

    #[test]
    fn test_midpoint_rounds_away_from_zero() {
        let config = FasalConfig::builder()
            .base_premium(dec!(251))
            .base_coverage(dec!(10001))
            .build()
            .unwrap();
        let calc = PricingCalculator::new(Arc::new(config));
        // 251 * 1.5 = 376.5, 10001 * 1.5 = 15001.5
        assert_eq!(calc.quote("Bihar", "Cotton"), Quote { premium: 377, coverage: 15002 });
    }
}
