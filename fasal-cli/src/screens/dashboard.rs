use colored::Colorize;
use rust_decimal::Decimal;
use tokio::io::{AsyncBufReadExt, BufReader};

use fasal_core::prelude::*;
use fasal_i18n::CurrencyFormatter;

use super::{ScreenResult, paint, print_header, require_session};
use crate::context::AppContext;

fn render(ctx: &AppContext, snapshot: &DashboardSnapshot) {
    let lang = ctx.prefs.language();

    println!("{}", ctx.t("weather").bold());
    println!(
        "  🌡  {}: {}°C   🌧  {}: {}mm",
        ctx.t("temperature"),
        snapshot.weather.temperature_c,
        ctx.t("todays-rain"),
        snapshot.weather.rainfall_mm
    );
    println!();

    println!("{}", ctx.t("active-policy").bold());
    match &snapshot.policy {
        Some(policy) => {
            println!(
                "  {} · {}, {}",
                policy.crop.bright_white().bold(),
                policy.district,
                policy.state
            );
            println!(
                "  {}: {}   {}: {}",
                ctx.t("premium"),
                lang.format_currency(Decimal::from(policy.premium_amount)),
                ctx.t("coverage"),
                lang.format_currency(Decimal::from(policy.coverage_amount)).green()
            );
            println!(
                "  {}",
                ctx.t_with(
                    "policy-period",
                    &[("start", policy.start_date.to_string()), ("end", policy.end_date.to_string())]
                )
                .dimmed()
            );
            println!(
                "  {}",
                ctx.t_with("coverage-progress", &[("percent", snapshot.progress_percent.to_string())])
            );
        }
        None => println!("  {}", ctx.t("no-active-policy").dimmed()),
    }
    println!();

    let banner = &snapshot.banner;
    let text = match banner.payout {
        Some(amount) if banner.kind == BannerKind::Completed => {
            ctx.t_with(banner.text_key, &[("amount", lang.format_currency(amount))])
        }
        Some(amount) => format!("{} · {}", ctx.t(banner.text_key), lang.format_currency(amount)),
        None => ctx.t(banner.text_key),
    };
    println!("{}", ctx.t("claim-status").bold());
    println!("  {} {}", banner.icon, paint(&text, banner.tone));
    if let Some(hash) = snapshot.claim.as_ref().and_then(|c| c.blockchain_tx_hash.as_deref()) {
        println!("  🔗 {}", ctx.t_with("transaction", &[("hash", hash.to_string())]).dimmed());
    }
}

/// Shows the dashboard once, or keeps refreshing it until Enter is pressed.
pub async fn run(ctx: &AppContext, watch: bool) -> ScreenResult {
    print_header(ctx, "dashboard", "dashboard-instructions");
    let Some(session) = require_session(ctx).await else {
        return Ok(());
    };

    if !watch {
        let snapshot = load_snapshot(ctx.store.as_ref(), session.user_id, chrono::Utc::now()).await;
        render(ctx, &snapshot);
        return Ok(());
    }

    let interval = ctx.poll_interval();
    let mut refresher = DashboardRefresher::spawn(ctx.store.clone(), session.user_id, interval);
    let mut updates = refresher.subscribe();
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                if let Some(snapshot) = snapshot {
                    print_header(ctx, "dashboard", "dashboard-instructions");
                    render(ctx, &snapshot);
                    println!(
                        "\n{}",
                        ctx.t_with("watching", &[("seconds", interval.as_secs().to_string())]).dimmed()
                    );
                }
            }
            _ = stdin.next_line() => break,
        }
    }

    refresher.stop();
    Ok(())
}
