//! Records shared by the store, the gateway and the screens.
//!
//! Field names follow the column names of the `profiles`, `policies`,
//! `claims` and `education_progress` tables, so the same structs serve as
//! wire format for the submission gateway and as rows for the store.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::types::Language;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString, schemars::JsonSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PolicyStatus {
    #[default]
    Active,
    Expired,
    Claimed,
}

/// A crop-insurance contract for one crop in one district, covering a
/// fixed window (one year from purchase).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Policy {
    pub id: Uuid,
    pub user_id: Uuid,
    pub state: String,
    pub district: String,
    pub crop: String,
    pub premium_amount: u64,
    pub coverage_amount: u64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: PolicyStatus,
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /api/policies/create`.
///
/// Dates travel as `YYYY-MM-DD`. The gateway accepts whatever is
/// structurally valid; premiums and coverage are taken as sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CreatePolicyRequest {
    pub user_id: Uuid,
    pub state: String,
    pub district: String,
    pub crop: String,
    pub premium_amount: u64,
    pub coverage_amount: u64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub status: PolicyStatus,
}

impl CreatePolicyRequest {
    /// Materialises the row the store will hold for this request.
    pub fn into_policy(self, id: Uuid, created_at: DateTime<Utc>) -> Policy {
        Policy {
            id,
            user_id: self.user_id,
            state: self.state,
            district: self.district,
            crop: self.crop,
            premium_amount: self.premium_amount,
            coverage_amount: self.coverage_amount,
            start_date: self.start_date,
            end_date: self.end_date,
            status: self.status,
            created_at,
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString, schemars::JsonSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ClaimStatus {
    #[default]
    Triggered,
    Processing,
    Completed,
}

/// A payout event raised against a policy by the (external) weather
/// trigger. The application only reads these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Claim {
    pub id: Uuid,
    pub policy_id: Uuid,
    pub user_id: Uuid,
    pub trigger_event: String,
    pub trigger_date: NaiveDate,
    #[serde(with = "rust_decimal::serde::float")]
    #[schemars(with = "f64")]
    pub payout_amount: Decimal,
    pub status: ClaimStatus,
    /// Transaction hash of the on-chain payout, when one exists.
    pub blockchain_tx_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert shape for claims written by external trigger processes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewClaim {
    pub policy_id: Uuid,
    pub user_id: Uuid,
    pub trigger_event: String,
    pub trigger_date: NaiveDate,
    #[serde(with = "rust_decimal::serde::float")]
    pub payout_amount: Decimal,
    #[serde(default)]
    pub status: ClaimStatus,
    pub blockchain_tx_hash: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Same id as the identity-service user.
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub preferred_language: Language,
    pub coins_earned: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// Profile shown when the row cannot be read: the name is the local part
    /// of the e-mail address, Hindi, no coins.
    pub fn fallback(id: Uuid, email: &str) -> Self {
        let name = email
            .split('@')
            .next()
            .filter(|s| !s.is_empty())
            .unwrap_or("User")
            .to_string();
        let now = Utc::now();
        Profile {
            id,
            full_name: name,
            email: email.to_string(),
            preferred_language: Language::Hi,
            coins_earned: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProfile {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub preferred_language: Language,
}

/// One row per (user, question). Written only for first-time correct
/// answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EducationProgress {
    pub user_id: Uuid,
    pub question_id: String,
    pub is_correct: bool,
    pub coins_earned: u32,
    pub completed_at: DateTime<Utc>,
}
