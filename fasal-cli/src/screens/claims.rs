use colored::Colorize;

use fasal_core::prelude::*;
use fasal_core::timeline::status_label;
use fasal_i18n::CurrencyFormatter;

use super::{ScreenResult, paint, print_header, require_session};
use crate::context::AppContext;

fn milestone_detail(ctx: &AppContext, claim: &Claim, event: &MilestoneEvent) -> String {
    let lang = ctx.prefs.language();
    match event.milestone {
        Milestone::WeatherConditionMet => ctx.t_with(
            event.milestone.detail_key(),
            &[
                ("event", claim.trigger_event.clone()),
                ("date", claim.trigger_date.to_string()),
            ],
        ),
        Milestone::PayoutSent => ctx.t_with(
            event.milestone.detail_key(),
            &[("amount", lang.format_currency(claim.payout_amount))],
        ),
        other => ctx.t(other.detail_key()),
    }
}

fn render_claim(ctx: &AppContext, claim: &Claim) {
    let (label_key, tone) = status_label(claim.status);
    println!(
        "{}  {}  {}",
        claim.trigger_event.bold(),
        paint(&ctx.t(label_key), tone),
        ctx.prefs.language().format_currency(claim.payout_amount).green()
    );

    for event in build_timeline(claim) {
        let marker = if event.completed { "●".green() } else { "○".dimmed() };
        let date = event
            .date
            .map(|d| d.to_string())
            .unwrap_or_else(|| ctx.t("pending"));
        let title = ctx.t(event.milestone.title_key());
        let title = if event.completed { title.normal() } else { title.dimmed() };
        println!("  {} {}. {}  {}", marker, event.milestone.number(), title, date.dimmed());
        println!("       {}", milestone_detail(ctx, claim, &event).dimmed());
    }

    if let Some(hash) = &claim.blockchain_tx_hash {
        println!("  🔗 {}", ctx.t_with("transaction", &[("hash", hash.clone())]).dimmed());
    }
    println!();
}

/// Claims with their four-milestone timelines. Owners without claims see
/// the sample claim.
pub async fn run(ctx: &AppContext) -> ScreenResult {
    print_header(ctx, "claims", "claims-instructions");
    let Some(session) = require_session(ctx).await else {
        return Ok(());
    };

    let claims = ctx
        .store
        .claims_for_owner(session.user_id)
        .await
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Claims unavailable");
            Vec::new()
        });

    if claims.is_empty() {
        println!("{}\n", ctx.t("no-claims").dimmed());
        println!("{}", ctx.t("how-claims-work").bright_cyan().bold());
        render_claim(ctx, &demo_claim());
        return Ok(());
    }

    println!("{}", ctx.t("claim-timeline").bright_cyan().bold());
    for claim in &claims {
        render_claim(ctx, claim);
    }
    Ok(())
}
