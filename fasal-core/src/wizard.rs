//! Three-step policy purchase flow: select, review, pay.
//!
//! The draft lives only in memory. Forward navigation out of `Select` is
//! gated on a complete selection, `Review -> Pay` is free, and going back is
//! always allowed. Paying sends the draft to a [`PolicyGateway`] once; a
//! successful submission consumes the draft.

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};
use uuid::Uuid;

use crate::catalog;
use crate::gateway::PolicyGateway;
use crate::models::{CreatePolicyRequest, Policy, PolicyStatus};
use crate::pricing::{PricingCalculator, Quote};
use crate::types::FasalError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WizardStep {
    #[default]
    Select = 1,
    Review = 2,
    Pay = 3,
}

impl WizardStep {
    /// 1-based position, as drawn on the step indicator.
    pub fn number(self) -> u8 {
        self as u8
    }

    fn forward(self) -> Option<WizardStep> {
        match self {
            WizardStep::Select => Some(WizardStep::Review),
            WizardStep::Review => Some(WizardStep::Pay),
            WizardStep::Pay => None,
        }
    }

    fn backward(self) -> Option<WizardStep> {
        match self {
            WizardStep::Select => None,
            WizardStep::Review => Some(WizardStep::Select),
            WizardStep::Pay => Some(WizardStep::Review),
        }
    }
}

/// In-progress selections with their current price.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WizardDraft {
    pub state: String,
    pub district: String,
    pub crop: String,
    pub quote: Quote,
}

impl WizardDraft {
    pub fn is_complete(&self) -> bool {
        !self.state.is_empty() && !self.district.is_empty() && !self.crop.is_empty()
    }
}

/// Clears the in-flight flag when the submission ends, including when the
/// submitting future is dropped before completion.
struct InFlight(Arc<AtomicBool>);

impl InFlight {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlight(Arc::clone(flag)))
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct PolicyWizard {
    step: WizardStep,
    draft: WizardDraft,
    pricing: PricingCalculator,
    in_flight: Arc<AtomicBool>,
    confirmation: Option<Policy>,
}

impl PolicyWizard {
    pub fn new(pricing: PricingCalculator) -> Self {
        let draft = WizardDraft {
            quote: pricing.quote("", ""),
            ..Default::default()
        };
        Self {
            step: WizardStep::Select,
            draft,
            pricing,
            in_flight: Arc::new(AtomicBool::new(false)),
            confirmation: None,
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn draft(&self) -> &WizardDraft {
        &self.draft
    }

    /// Policy created by the last successful payment.
    pub fn confirmation(&self) -> Option<&Policy> {
        self.confirmation.as_ref()
    }

    /// Districts offered for the currently selected state.
    pub fn district_options(&self) -> &'static [&'static str] {
        catalog::districts(&self.draft.state)
    }

    fn ensure_selecting(&self) -> Result<(), FasalError> {
        if self.step != WizardStep::Select {
            return Err(FasalError::InvalidStep {
                current: self.step,
                required: WizardStep::Select,
            });
        }
        Ok(())
    }

    /// Picks a state. Clears the district, since districts belong to a
    /// state, and re-prices. An empty string clears the selection.
    pub fn set_state(&mut self, state: &str) -> Result<(), FasalError> {
        self.ensure_selecting()?;
        if !state.is_empty() && !catalog::is_known_state(state) {
            return Err(FasalError::invalid_input("state", state, "error-unknown-state", "PolicyWizard"));
        }
        self.draft.state = state.to_string();
        self.draft.district.clear();
        self.reprice();
        Ok(())
    }

    pub fn set_district(&mut self, district: &str) -> Result<(), FasalError> {
        self.ensure_selecting()?;
        if !district.is_empty() && !self.district_options().contains(&district) {
            return Err(FasalError::invalid_input(
                "district",
                district,
                "error-unknown-district",
                "PolicyWizard",
            ));
        }
        self.draft.district = district.to_string();
        Ok(())
    }

    pub fn set_crop(&mut self, crop: &str) -> Result<(), FasalError> {
        self.ensure_selecting()?;
        if !crop.is_empty() && !catalog::is_known_crop(crop) {
            return Err(FasalError::invalid_input("crop", crop, "error-unknown-crop", "PolicyWizard"));
        }
        self.draft.crop = crop.to_string();
        self.reprice();
        Ok(())
    }

    fn reprice(&mut self) {
        self.draft.quote = self.pricing.quote(&self.draft.state, &self.draft.crop);
    }

    /// Forward-navigation guard for the current step.
    pub fn can_advance(&self) -> bool {
        match self.step {
            WizardStep::Select => self.draft.is_complete(),
            WizardStep::Review => true,
            WizardStep::Pay => false,
        }
    }

    /// Moves one step forward if the guard allows it. Returns whether the
    /// step changed.
    pub fn next(&mut self) -> bool {
        if !self.can_advance() {
            return false;
        }
        match self.step.forward() {
            Some(step) => {
                self.step = step;
                true
            }
            None => false,
        }
    }

    pub fn back(&mut self) -> bool {
        match self.step.backward() {
            Some(step) => {
                self.step = step;
                true
            }
            None => false,
        }
    }

    /// Whether the pay control should be enabled.
    pub fn can_pay(&self) -> bool {
        self.step == WizardStep::Pay && self.draft.is_complete() && !self.is_submitting()
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Shared handle on the in-flight flag, for rendering a busy state from
    /// another task.
    pub fn in_flight_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.in_flight)
    }

    /// Request that paying now would send: coverage runs for the configured
    /// number of years starting `today`.
    pub fn build_request(&self, owner: Uuid, today: NaiveDate) -> Result<CreatePolicyRequest, FasalError> {
        if !self.draft.is_complete() {
            return Err(FasalError::invalid_input(
                "draft",
                "incomplete",
                "error-draft-incomplete",
                "PolicyWizard",
            ));
        }
        let years = self.pricing.config().coverage_term_years;
        let end_date = today
            .checked_add_months(Months::new(years.saturating_mul(12)))
            .ok_or_else(|| FasalError::ConfigurationError(format!("Coverage end date out of range for {}", today)))?;

        Ok(CreatePolicyRequest {
            user_id: owner,
            state: self.draft.state.clone(),
            district: self.draft.district.clone(),
            crop: self.draft.crop.clone(),
            premium_amount: self.draft.quote.premium,
            coverage_amount: self.draft.quote.coverage,
            start_date: today,
            end_date,
            status: PolicyStatus::Active,
        })
    }

    /// Pays for the draft. Only valid on the `Pay` step, and only one
    /// submission may be in flight.
    ///
    /// On success the draft is consumed and the created policy becomes the
    /// confirmation; the wizard stays on `Pay`. On failure the draft is kept
    /// so the user can retry.
    pub async fn submit(
        &mut self,
        gateway: &dyn PolicyGateway,
        owner: Uuid,
        today: NaiveDate,
    ) -> Result<Policy, FasalError> {
        if self.step != WizardStep::Pay {
            return Err(FasalError::InvalidStep {
                current: self.step,
                required: WizardStep::Pay,
            });
        }
        let request = self.build_request(owner, today)?;
        let guard = InFlight::acquire(&self.in_flight).ok_or(FasalError::SubmissionInFlight)?;

        let result = gateway.create_policy(&request).await;
        drop(guard);

        match result {
            Ok(policy) => {
                info!(policy_id = %policy.id, crop = %policy.crop, premium = policy.premium_amount, "Policy purchased");
                self.draft = WizardDraft {
                    quote: self.pricing.quote("", ""),
                    ..Default::default()
                };
                self.confirmation = Some(policy.clone());
                Ok(policy)
            }
            Err(e) => {
                warn!(error = %e, "Policy submission failed; draft kept for retry");
                Err(e)
            }
        }
    }

    /// Starts a fresh purchase.
    pub fn reset(&mut self) {
        self.step = WizardStep::Select;
        self.draft = WizardDraft {
            quote: self.pricing.quote("", ""),
            ..Default::default()
        };
        self.confirmation = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::StoreGateway;
    use crate::store::{FasalStore, MemoryStore};
    use async_trait::async_trait;
    use std::time::Duration;

    fn wizard() -> PolicyWizard {
        PolicyWizard::new(PricingCalculator::default())
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    fn ready_to_pay() -> PolicyWizard {
        let mut w = wizard();
        w.set_state("Maharashtra").unwrap();
        w.set_district("Pune").unwrap();
        w.set_crop("Cotton").unwrap();
        assert!(w.next());
        assert!(w.next());
        assert_eq!(w.step(), WizardStep::Pay);
        w
    }

    struct FailingGateway;

    #[async_trait]
    impl PolicyGateway for FailingGateway {
        async fn create_policy(&self, _request: &CreatePolicyRequest) -> Result<Policy, FasalError> {
            Err(FasalError::GatewayError {
                status: 500,
                message: "insert failed".to_string(),
            })
        }
    }

    struct HangingGateway;

    #[async_trait]
    impl PolicyGateway for HangingGateway {
        async fn create_policy(&self, _request: &CreatePolicyRequest) -> Result<Policy, FasalError> {
            std::future::pending().await
        }
    }

    #[test]
    fn test_guard_requires_all_three_fields() {
        let mut w = wizard();
        assert!(!w.can_advance());

        w.set_state("Maharashtra").unwrap();
        w.set_crop("Cotton").unwrap();
        assert!(!w.can_advance());
        assert!(!w.next());
        assert_eq!(w.step(), WizardStep::Select);

        w.set_district("Nashik").unwrap();
        assert!(w.can_advance());
        assert!(w.next());
        assert_eq!(w.step(), WizardStep::Review);
        assert!(w.can_advance());
    }

    #[test]
    fn test_state_change_clears_district_and_reprices() {
        let mut w = wizard();
        assert_eq!(w.draft().quote, Quote { premium: 250, coverage: 10000 });

        w.set_state("Maharashtra").unwrap();
        w.set_district("Pune").unwrap();
        w.set_crop("Cotton").unwrap();
        assert_eq!(w.draft().quote, Quote { premium: 450, coverage: 18000 });

        w.set_state("Punjab").unwrap();
        assert!(w.draft().district.is_empty());
        assert_eq!(w.draft().quote, Quote { premium: 375, coverage: 15000 });
        assert!(!w.can_advance());
    }

    #[test]
    fn test_rejects_values_outside_the_lists() {
        let mut w = wizard();
        assert!(w.set_state("Atlantis").is_err());
        w.set_state("Punjab").unwrap();
        let err = w.set_district("Pune").unwrap_err();
        assert_eq!(err.reason_key(), "error-unknown-district");
        assert!(w.set_crop("Saffron").is_err());
    }

    #[test]
    fn test_back_is_always_allowed() {
        let mut w = ready_to_pay();
        assert!(w.back());
        assert_eq!(w.step(), WizardStep::Review);
        assert!(w.back());
        assert_eq!(w.step(), WizardStep::Select);
        assert!(!w.back());
        assert!(matches!(
            ready_to_pay().set_crop("Rice"),
            Err(FasalError::InvalidStep { .. })
        ));
    }

    #[test]
    fn test_one_year_window() {
        let w = ready_to_pay();
        let req = w.build_request(Uuid::new_v4(), today()).unwrap();
        assert_eq!(req.start_date, today());
        assert_eq!(req.end_date, NaiveDate::from_ymd_opt(2026, 6, 1).unwrap());
        assert_eq!(req.status, PolicyStatus::Active);
        assert_eq!(req.premium_amount, 450);

        let leap = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let req = w.build_request(Uuid::new_v4(), leap).unwrap();
        assert_eq!(req.end_date, NaiveDate::from_ymd_opt(2025, 2, 28).unwrap());
    }

    #[tokio::test]
    async fn test_submit_outside_pay_step() {
        let store: Arc<dyn FasalStore> = Arc::new(MemoryStore::new());
        let gateway = StoreGateway::new(store);
        let mut w = wizard();
        let err = w.submit(&gateway, Uuid::new_v4(), today()).await.unwrap_err();
        assert!(matches!(
            err,
            FasalError::InvalidStep {
                current: WizardStep::Select,
                required: WizardStep::Pay
            }
        ));
    }

    #[tokio::test]
    async fn test_successful_submit_consumes_draft() {
        let store: Arc<dyn FasalStore> = Arc::new(MemoryStore::new());
        let gateway = StoreGateway::new(store.clone());
        let owner = Uuid::new_v4();
        let mut w = ready_to_pay();

        let policy = w.submit(&gateway, owner, today()).await.unwrap();
        assert_eq!(policy.coverage_amount, 18000);
        assert_eq!(w.step(), WizardStep::Pay);
        assert_eq!(w.confirmation().map(|p| p.id), Some(policy.id));
        assert!(!w.draft().is_complete());
        assert!(!w.can_pay());

        // Paying again cannot resend the same draft.
        assert!(w.submit(&gateway, owner, today()).await.is_err());
        assert_eq!(store.policies_for_owner(owner).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_submit_keeps_draft() {
        let mut w = ready_to_pay();
        let err = w.submit(&FailingGateway, Uuid::new_v4(), today()).await.unwrap_err();
        assert!(matches!(err, FasalError::GatewayError { status: 500, .. }));
        assert_eq!(w.step(), WizardStep::Pay);
        assert!(w.draft().is_complete());
        assert!(w.confirmation().is_none());
        assert!(w.can_pay());
    }

    #[tokio::test]
    async fn test_in_flight_flag_released_when_abandoned() {
        let mut w = ready_to_pay();
        let flag = w.in_flight_flag();
        {
            let pending = w.submit(&HangingGateway, Uuid::new_v4(), today());
            tokio::pin!(pending);
            let timed_out = tokio::time::timeout(Duration::from_millis(20), &mut pending).await;
            assert!(timed_out.is_err());
            assert!(flag.load(Ordering::Acquire));
        }
        assert!(!w.is_submitting());
        assert!(w.can_pay());
    }

    #[test]
    fn test_second_acquire_is_refused() {
        let flag = Arc::new(AtomicBool::new(false));
        let first = InFlight::acquire(&flag);
        assert!(first.is_some());
        assert!(InFlight::acquire(&flag).is_none());
        drop(first);
        assert!(InFlight::acquire(&flag).is_some());
    }
}
