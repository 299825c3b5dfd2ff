//! Home-screen aggregation: the current active policy, its latest claim,
//! the claim banner and how far the coverage window has run.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::{Claim, ClaimStatus, Policy};
use crate::store::FasalStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Neutral,
    Warning,
    Info,
    Success,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BannerKind {
    NoClaim,
    Alert,
    Processing,
    Completed,
}

/// Display tuple for the claim status card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClaimBanner {
    pub kind: BannerKind,
    pub text_key: &'static str,
    pub icon: &'static str,
    pub tone: Tone,
    /// Shown next to the text for processing and completed claims.
    pub payout: Option<Decimal>,
}

impl ClaimBanner {
    pub fn for_claim(claim: Option<&Claim>) -> Self {
        match claim {
            None => ClaimBanner {
                kind: BannerKind::NoClaim,
                text_key: "no-claim-triggered",
                icon: "📈",
                tone: Tone::Neutral,
                payout: None,
            },
            Some(c) => match c.status {
                ClaimStatus::Triggered => ClaimBanner {
                    kind: BannerKind::Alert,
                    text_key: "drought-alert",
                    icon: "⚠️",
                    tone: Tone::Warning,
                    payout: None,
                },
                ClaimStatus::Processing => ClaimBanner {
                    kind: BannerKind::Processing,
                    text_key: "payout-processing",
                    icon: "📈",
                    tone: Tone::Info,
                    payout: Some(c.payout_amount),
                },
                ClaimStatus::Completed => ClaimBanner {
                    kind: BannerKind::Completed,
                    text_key: "payout-credited",
                    icon: "✅",
                    tone: Tone::Success,
                    payout: Some(c.payout_amount),
                },
            },
        }
    }
}

/// Share of the coverage window already elapsed, in percent, clamped to
/// `[0, 100]` and rounded to two places.
///
/// Dates are taken at midnight UTC. A window of zero (or negative) length
/// reads 0 before its start and 100 from its start on.
pub fn coverage_elapsed_percent(start: NaiveDate, end: NaiveDate, now: DateTime<Utc>) -> Decimal {
    let start_at = start.and_hms_opt(0, 0, 0).map(|t| t.and_utc());
    let end_at = end.and_hms_opt(0, 0, 0).map(|t| t.and_utc());
    let (Some(start_at), Some(end_at)) = (start_at, end_at) else {
        return Decimal::ZERO;
    };

    let total = (end_at - start_at).num_seconds();
    let elapsed = (now - start_at).num_seconds();
    if total <= 0 {
        return if elapsed < 0 { Decimal::ZERO } else { dec!(100) };
    }

    let percent = Decimal::from(elapsed) * dec!(100) / Decimal::from(total);
    percent
        .clamp(Decimal::ZERO, dec!(100))
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Static weather card content. No live feed is wired in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherCard {
    pub temperature_c: i32,
    pub rainfall_mm: u32,
}

pub const DEMO_WEATHER: WeatherCard = WeatherCard {
    temperature_c: 34,
    rainfall_mm: 15,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    pub policy: Option<Policy>,
    pub claim: Option<Claim>,
    pub banner: ClaimBanner,
    pub progress_percent: Decimal,
    pub weather: WeatherCard,
    pub refreshed_at: DateTime<Utc>,
}

impl DashboardSnapshot {
    pub fn empty(now: DateTime<Utc>) -> Self {
        DashboardSnapshot {
            policy: None,
            claim: None,
            banner: ClaimBanner::for_claim(None),
            progress_percent: Decimal::ZERO,
            weather: DEMO_WEATHER,
            refreshed_at: now,
        }
    }
}

/// Reads the dashboard for `owner`. Store failures are logged and degrade
/// to whatever could be read.
pub async fn load_snapshot(store: &dyn FasalStore, owner: Uuid, now: DateTime<Utc>) -> DashboardSnapshot {
    let policy = match store.latest_active_policy(owner).await {
        Ok(p) => p,
        Err(e) => {
            warn!(error = %e, %owner, "Dashboard data unavailable");
            return DashboardSnapshot::empty(now);
        }
    };
    let Some(policy) = policy else {
        return DashboardSnapshot::empty(now);
    };

    let claim = match store.latest_claim_for_policy(policy.id).await {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, policy_id = %policy.id, "Latest claim unavailable");
            None
        }
    };

    DashboardSnapshot {
        banner: ClaimBanner::for_claim(claim.as_ref()),
        progress_percent: coverage_elapsed_percent(policy.start_date, policy.end_date, now),
        policy: Some(policy),
        claim,
        weather: DEMO_WEATHER,
        refreshed_at: now,
    }
}

/// Periodic dashboard reload, tied to the lifetime of the screen.
///
/// Loads once immediately, then every `interval`. Snapshots are published
/// on a watch channel; `None` means the first load has not finished. The
/// task ends on [`stop`](Self::stop) or when the refresher is dropped.
pub struct DashboardRefresher {
    receiver: watch::Receiver<Option<DashboardSnapshot>>,
    handle: Option<JoinHandle<()>>,
}

impl DashboardRefresher {
    pub fn spawn(store: Arc<dyn FasalStore>, owner: Uuid, interval: Duration) -> Self {
        let (sender, receiver) = watch::channel(None);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let snapshot = load_snapshot(store.as_ref(), owner, Utc::now()).await;
                debug!(%owner, has_policy = snapshot.policy.is_some(), "Dashboard refreshed");
                if sender.send(Some(snapshot)).is_err() {
                    break;
                }
            }
        });
        Self {
            receiver,
            handle: Some(handle),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<DashboardSnapshot>> {
        self.receiver.clone()
    }

    pub fn latest(&self) -> Option<DashboardSnapshot> {
        self.receiver.borrow().clone()
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            debug!("Dashboard refresher stopped");
        }
    }
}

impl Drop for DashboardRefresher {
    fn drop(&mut self) {
        self.stop();
    }
}
