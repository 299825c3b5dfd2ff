//! Commonly used types in one import.
//!
//! ```rust
//! use fasal_core::prelude::*;
//! ```

pub use crate::config::{FasalConfig, FasalConfigBuilder};
pub use crate::dashboard::{
    BannerKind, ClaimBanner, DashboardRefresher, DashboardSnapshot, Tone, coverage_elapsed_percent, load_snapshot,
};
pub use crate::gateway::{PolicyGateway, StoreGateway};
pub use crate::identity::{IdentityProvider, Session, SessionCell, register};
pub use crate::models::{
    Claim, ClaimStatus, CreatePolicyRequest, EducationProgress, NewClaim, NewProfile, Policy, PolicyStatus, Profile,
};
pub use crate::pricing::{PricingCalculator, Quote};
pub use crate::quiz::{AnswerOutcome, QUESTIONS, Question, QuizEngine};
pub use crate::store::{FasalStore, MemoryStore};
pub use crate::timeline::{Milestone, MilestoneEvent, build_timeline, demo_claim};
pub use crate::types::{FasalError, InvalidInputDetails, Language};
pub use crate::wizard::{PolicyWizard, WizardDraft, WizardStep};
