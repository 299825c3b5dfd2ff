//! Persistence boundary.
//!
//! Screens and engines only talk to [`FasalStore`]. `fasal-sqlite` provides
//! the durable implementation; [`MemoryStore`] backs tests and demos.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::models::{
    Claim, CreatePolicyRequest, EducationProgress, NewClaim, NewProfile, Policy, PolicyStatus, Profile,
};
use crate::types::{FasalError, Language};

#[async_trait]
pub trait FasalStore: Send + Sync {
    /// Inserts a policy row and returns it with its generated id and
    /// creation time.
    async fn insert_policy(&self, request: CreatePolicyRequest) -> Result<Policy, FasalError>;

    /// Most recently created policy with status `active`.
    async fn latest_active_policy(&self, owner: Uuid) -> Result<Option<Policy>, FasalError>;

    /// All policies of an owner, newest first.
    async fn policies_for_owner(&self, owner: Uuid) -> Result<Vec<Policy>, FasalError>;

    async fn insert_claim(&self, claim: NewClaim) -> Result<Claim, FasalError>;

    async fn latest_claim_for_policy(&self, policy_id: Uuid) -> Result<Option<Claim>, FasalError>;

    /// All claims of an owner, newest first.
    async fn claims_for_owner(&self, owner: Uuid) -> Result<Vec<Claim>, FasalError>;

    async fn insert_profile(&self, profile: NewProfile) -> Result<Profile, FasalError>;

    async fn get_profile(&self, owner: Uuid) -> Result<Option<Profile>, FasalError>;

    /// Fails with [`FasalError::NotFound`] when the owner has no profile.
    async fn update_preferred_language(&self, owner: Uuid, language: Language) -> Result<(), FasalError>;

    /// Ids of the questions the owner has already been rewarded for.
    async fn answered_questions(&self, owner: Uuid) -> Result<HashSet<String>, FasalError>;

    /// Records a first correct answer and adds `coins` to the owner's total,
    /// atomically. Returns `false`, changing nothing, when the
    /// (owner, question) pair already has a progress row.
    async fn award_first_correct(&self, owner: Uuid, question_id: &str, coins: u32) -> Result<bool, FasalError>;
}

#[derive(Default)]
struct MemoryTables {
    policies: Vec<Policy>,
    claims: Vec<Claim>,
    profiles: HashMap<Uuid, Profile>,
    progress: HashMap<(Uuid, String), EducationProgress>,
}

/// In-process store. Rows live in insertion order, which is also creation
/// order.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<MemoryTables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FasalStore for MemoryStore {
    async fn insert_policy(&self, request: CreatePolicyRequest) -> Result<Policy, FasalError> {
        let policy = request.into_policy(Uuid::new_v4(), Utc::now());
        debug!(policy_id = %policy.id, owner = %policy.user_id, "memory: insert policy");
        self.tables.write().await.policies.push(policy.clone());
        Ok(policy)
    }

    async fn latest_active_policy(&self, owner: Uuid) -> Result<Option<Policy>, FasalError> {
        let tables = self.tables.read().await;
        Ok(tables
            .policies
            .iter()
            .rev()
            .find(|p| p.user_id == owner && p.status == PolicyStatus::Active)
            .cloned())
    }

    async fn policies_for_owner(&self, owner: Uuid) -> Result<Vec<Policy>, FasalError> {
        let tables = self.tables.read().await;
        Ok(tables.policies.iter().rev().filter(|p| p.user_id == owner).cloned().collect())
    }

    async fn insert_claim(&self, claim: NewClaim) -> Result<Claim, FasalError> {
        let now = Utc::now();
        let claim = Claim {
            id: Uuid::new_v4(),
            policy_id: claim.policy_id,
            user_id: claim.user_id,
            trigger_event: claim.trigger_event,
            trigger_date: claim.trigger_date,
            payout_amount: claim.payout_amount,
            status: claim.status,
            blockchain_tx_hash: claim.blockchain_tx_hash,
            created_at: now,
            updated_at: now,
        };
        self.tables.write().await.claims.push(claim.clone());
        Ok(claim)
    }

    async fn latest_claim_for_policy(&self, policy_id: Uuid) -> Result<Option<Claim>, FasalError> {
        let tables = self.tables.read().await;
        Ok(tables.claims.iter().rev().find(|c| c.policy_id == policy_id).cloned())
    }

    async fn claims_for_owner(&self, owner: Uuid) -> Result<Vec<Claim>, FasalError> {
        let tables = self.tables.read().await;
        Ok(tables.claims.iter().rev().filter(|c| c.user_id == owner).cloned().collect())
    }

    async fn insert_profile(&self, profile: NewProfile) -> Result<Profile, FasalError> {
        let mut tables = self.tables.write().await;
        if tables.profiles.contains_key(&profile.id) {
            return Err(FasalError::StorageError(format!("Profile {} already exists", profile.id)));
        }
        let now = Utc::now();
        let row = Profile {
            id: profile.id,
            full_name: profile.full_name,
            email: profile.email,
            preferred_language: profile.preferred_language,
            coins_earned: 0,
            created_at: now,
            updated_at: now,
        };
        tables.profiles.insert(row.id, row.clone());
        Ok(row)
    }

    async fn get_profile(&self, owner: Uuid) -> Result<Option<Profile>, FasalError> {
        Ok(self.tables.read().await.profiles.get(&owner).cloned())
    }

    async fn update_preferred_language(&self, owner: Uuid, language: Language) -> Result<(), FasalError> {
        let mut tables = self.tables.write().await;
        let profile = tables
            .profiles
            .get_mut(&owner)
            .ok_or_else(|| FasalError::NotFound(format!("profile {}", owner)))?;
        profile.preferred_language = language;
        profile.updated_at = Utc::now();
        Ok(())
    }

    async fn answered_questions(&self, owner: Uuid) -> Result<HashSet<String>, FasalError> {
        let tables = self.tables.read().await;
        Ok(tables
            .progress
            .keys()
            .filter(|(user, _)| *user == owner)
            .map(|(_, qid)| qid.clone())
            .collect())
    }

    async fn award_first_correct(&self, owner: Uuid, question_id: &str, coins: u32) -> Result<bool, FasalError> {
        let mut tables = self.tables.write().await;
        let key = (owner, question_id.to_string());
        if tables.progress.contains_key(&key) {
            return Ok(false);
        }
        let profile = tables
            .profiles
            .get_mut(&owner)
            .ok_or_else(|| FasalError::NotFound(format!("profile {}", owner)))?;
        profile.coins_earned += u64::from(coins);
        profile.updated_at = Utc::now();
        tables.progress.insert(
            key,
            EducationProgress {
                user_id: owner,
                question_id: question_id.to_string(),
                is_correct: true,
                coins_earned: coins,
                completed_at: Utc::now(),
            },
        );
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn request(owner: Uuid, crop: &str, status: PolicyStatus) -> CreatePolicyRequest {
        CreatePolicyRequest {
            user_id: owner,
            state: "Punjab".to_string(),
            district: "Amritsar".to_string(),
            crop: crop.to_string(),
            premium_amount: 250,
            coverage_amount: 10000,
            start_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(),
            status,
        }
    }

    async fn store_with_profile(owner: Uuid) -> MemoryStore {
        let store = MemoryStore::new();
        store
            .insert_profile(NewProfile {
                id: owner,
                full_name: "Sita".to_string(),
                email: "sita@example.in".to_string(),
                preferred_language: Language::Mr,
            })
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_latest_active_policy_wins() {
        let owner = Uuid::new_v4();
        let store = MemoryStore::new();
        store.insert_policy(request(owner, "Wheat", PolicyStatus::Active)).await.unwrap();
        let newer = store.insert_policy(request(owner, "Rice", PolicyStatus::Active)).await.unwrap();
        store.insert_policy(request(owner, "Maize", PolicyStatus::Expired)).await.unwrap();
        store.insert_policy(request(Uuid::new_v4(), "Cotton", PolicyStatus::Active)).await.unwrap();

        let active = store.latest_active_policy(owner).await.unwrap().unwrap();
        assert_eq!(active.id, newer.id);
        assert_eq!(store.policies_for_owner(owner).await.unwrap().len(), 3);
        assert!(store.latest_active_policy(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_claims_newest_first() {
        let owner = Uuid::new_v4();
        let store = MemoryStore::new();
        let policy = store.insert_policy(request(owner, "Rice", PolicyStatus::Active)).await.unwrap();
        for event in ["Heavy Rain", "Low Rainfall"] {
            store
                .insert_claim(NewClaim {
                    policy_id: policy.id,
                    user_id: owner,
                    trigger_event: event.to_string(),
                    trigger_date: NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
                    payout_amount: dec!(5000),
                    status: Default::default(),
                    blockchain_tx_hash: None,
                })
                .await
                .unwrap();
        }
        let latest = store.latest_claim_for_policy(policy.id).await.unwrap().unwrap();
        assert_eq!(latest.trigger_event, "Low Rainfall");
        let all = store.claims_for_owner(owner).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].trigger_event, "Low Rainfall");
    }

    #[tokio::test]
    async fn test_award_is_idempotent() {
        let owner = Uuid::new_v4();
        let store = store_with_profile(owner).await;

        assert!(store.award_first_correct(owner, "q3", 20).await.unwrap());
        assert!(!store.award_first_correct(owner, "q3", 20).await.unwrap());

        let profile = store.get_profile(owner).await.unwrap().unwrap();
        assert_eq!(profile.coins_earned, 20);
        assert!(store.answered_questions(owner).await.unwrap().contains("q3"));
    }

    #[tokio::test]
    async fn test_profile_language_update() {
        let owner = Uuid::new_v4();
        let store = store_with_profile(owner).await;
        store.update_preferred_language(owner, Language::En).await.unwrap();
        assert_eq!(store.get_profile(owner).await.unwrap().unwrap().preferred_language, Language::En);

        let missing = store.update_preferred_language(Uuid::new_v4(), Language::Hi).await;
        assert!(matches!(missing, Err(FasalError::NotFound(_))));

        let duplicate = store
            .insert_profile(NewProfile {
                id: owner,
                full_name: "Again".to_string(),
                email: "again@example.in".to_string(),
                preferred_language: Language::Hi,
            })
            .await;
        assert!(duplicate.is_err());
    }
}
