//! Claim progress as four fixed milestones.

use chrono::{NaiveDate, TimeZone, Utc};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Claim, ClaimStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Milestone {
    WeatherConditionMet,
    SmartContractTriggered,
    PayoutSent,
    AmountCredited,
}

impl Milestone {
    pub const ALL: [Milestone; 4] = [
        Milestone::WeatherConditionMet,
        Milestone::SmartContractTriggered,
        Milestone::PayoutSent,
        Milestone::AmountCredited,
    ];

    /// Translation key of the milestone title.
    pub fn title_key(self) -> &'static str {
        match self {
            Milestone::WeatherConditionMet => "weather-condition-met",
            Milestone::SmartContractTriggered => "smart-contract-triggered",
            Milestone::PayoutSent => "payout-sent",
            Milestone::AmountCredited => "amount-credited",
        }
    }

    /// Translation key of the milestone description.
    pub fn detail_key(self) -> &'static str {
        match self {
            Milestone::WeatherConditionMet => "milestone-weather-detail",
            Milestone::SmartContractTriggered => "milestone-contract-detail",
            Milestone::PayoutSent => "milestone-payout-detail",
            Milestone::AmountCredited => "milestone-credited-detail",
        }
    }

    pub fn number(self) -> u8 {
        match self {
            Milestone::WeatherConditionMet => 1,
            Milestone::SmartContractTriggered => 2,
            Milestone::PayoutSent => 3,
            Milestone::AmountCredited => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneEvent {
    pub milestone: Milestone,
    pub completed: bool,
    pub date: Option<NaiveDate>,
}

/// Builds the timeline of a claim. Total over [`ClaimStatus`]: triggered
/// completes two milestones, processing three, completed all four.
pub fn build_timeline(claim: &Claim) -> [MilestoneEvent; 4] {
    let created = claim.created_at.date_naive();
    let paid = claim.status != ClaimStatus::Triggered;
    let credited = claim.status == ClaimStatus::Completed;

    [
        MilestoneEvent {
            milestone: Milestone::WeatherConditionMet,
            completed: true,
            date: Some(claim.trigger_date),
        },
        MilestoneEvent {
            milestone: Milestone::SmartContractTriggered,
            completed: true,
            date: Some(created),
        },
        MilestoneEvent {
            milestone: Milestone::PayoutSent,
            completed: paid,
            date: paid.then_some(created),
        },
        MilestoneEvent {
            milestone: Milestone::AmountCredited,
            completed: credited,
            date: credited.then_some(created),
        },
    ]
}

/// Label key and tone for a claim in the claims list.
pub fn status_label(status: ClaimStatus) -> (&'static str, crate::dashboard::Tone) {
    use crate::dashboard::Tone;
    match status {
        ClaimStatus::Triggered => ("claim-status-triggered", Tone::Warning),
        ClaimStatus::Processing => ("claim-status-processing", Tone::Info),
        ClaimStatus::Completed => ("claim-status-completed", Tone::Success),
    }
}

/// Sample claim shown to owners who have none yet, explaining how an
/// automated payout unfolds.
pub fn demo_claim() -> Claim {
    let created = Utc
        .with_ymd_and_hms(2024, 7, 15, 10, 0, 0)
        .single()
        .unwrap_or_else(Utc::now);
    Claim {
        id: Uuid::nil(),
        policy_id: Uuid::nil(),
        user_id: Uuid::nil(),
        trigger_event: "Low Rainfall Detected (Below 15mm)".to_string(),
        trigger_date: created.date_naive(),
        payout_amount: dec!(10000),
        status: ClaimStatus::Completed,
        blockchain_tx_hash: Some("demo_hash".to_string()),
        created_at: created,
        updated_at: created,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claim_with(status: ClaimStatus) -> Claim {
        Claim {
            status,
            ..demo_claim()
        }
    }

    fn completed_count(events: &[MilestoneEvent]) -> usize {
        events.iter().filter(|e| e.completed).count()
    }

    #[test]
    fn test_completion_per_status() {
        assert_eq!(completed_count(&build_timeline(&claim_with(ClaimStatus::Triggered))), 2);
        assert_eq!(completed_count(&build_timeline(&claim_with(ClaimStatus::Processing))), 3);
        assert_eq!(completed_count(&build_timeline(&claim_with(ClaimStatus::Completed))), 4);
    }

    #[test]
    fn test_processing_claim_is_paid_not_credited() {
        let events = build_timeline(&claim_with(ClaimStatus::Processing));
        assert_eq!(events[2].milestone, Milestone::PayoutSent);
        assert!(events[2].completed);
        assert!(events[2].date.is_some());
        assert_eq!(events[3].milestone, Milestone::AmountCredited);
        assert!(!events[3].completed);
        assert_eq!(events[3].date, None);
    }

    #[test]
    fn test_order_and_dates() {
        let mut claim = claim_with(ClaimStatus::Triggered);
        claim.trigger_date = NaiveDate::from_ymd_opt(2024, 7, 10).unwrap();
        let events = build_timeline(&claim);
        let order: Vec<_> = events.iter().map(|e| e.milestone).collect();
        assert_eq!(order, Milestone::ALL.to_vec());
        assert_eq!(events[0].date, NaiveDate::from_ymd_opt(2024, 7, 10));
        assert_eq!(events[1].date, NaiveDate::from_ymd_opt(2024, 7, 15));
        assert_eq!(events[2].date, None);
    }

    #[test]
    fn test_demo_claim() {
        let demo = demo_claim();
        assert_eq!(demo.trigger_date, NaiveDate::from_ymd_opt(2024, 7, 15).unwrap());
        assert_eq!(demo.payout_amount, dec!(10000));
        assert_eq!(completed_count(&build_timeline(&demo)), 4);
        assert_eq!(status_label(demo.status).0, "claim-status-completed");
    }
}
