use colored::Colorize;
use inquire::{Confirm, Select};
use rust_decimal::Decimal;

use fasal_core::catalog::{CROPS, STATES};
use fasal_core::prelude::*;
use fasal_i18n::CurrencyFormatter;

use super::{ScreenResult, print_header, report, require_session, spinner};
use crate::context::AppContext;

fn step_title(ctx: &AppContext, step: WizardStep) -> String {
    let key = match step {
        WizardStep::Select => "select-details",
        WizardStep::Review => "review-policy",
        WizardStep::Pay => "payment",
    };
    format!(
        "{} · {}",
        ctx.t_with(
            "step-indicator",
            &[("current", step.number().to_string()), ("total", "3".to_string())]
        ),
        ctx.t(key)
    )
}

fn print_quote(ctx: &AppContext, draft: &WizardDraft) {
    let lang = ctx.prefs.language();
    println!("  {:<12} {}", ctx.t("state"), draft.state);
    println!("  {:<12} {}", ctx.t("district"), draft.district);
    println!("  {:<12} {}", ctx.t("crop"), draft.crop);
    println!(
        "  {:<12} {}",
        ctx.t("premium"),
        lang.format_currency(Decimal::from(draft.quote.premium)).bright_yellow().bold()
    );
    println!(
        "  {:<12} {}",
        ctx.t("coverage"),
        lang.format_currency(Decimal::from(draft.quote.coverage)).green().bold()
    );
}

/// Step 1. Every list is closed, so the wizard only ever sees catalog values.
fn select_details(ctx: &AppContext, wizard: &mut PolicyWizard) -> ScreenResult {
    let state = Select::new(&ctx.t("state"), STATES.to_vec()).prompt()?;
    wizard.set_state(state)?;

    let district = Select::new(&ctx.t("district"), wizard.district_options().to_vec()).prompt()?;
    wizard.set_district(district)?;

    let crop = Select::new(&ctx.t("crop"), CROPS.to_vec()).prompt()?;
    wizard.set_crop(crop)?;

    println!();
    print_quote(ctx, wizard.draft());
    Ok(())
}

/// Three-step purchase: select, review, pay.
pub async fn run(ctx: &AppContext) -> ScreenResult {
    print_header(ctx, "buy-policy", "buy-policy-instructions");
    let Some(session) = require_session(ctx).await else {
        return Ok(());
    };

    let mut wizard = PolicyWizard::new(ctx.pricing());

    loop {
        println!("\n{}", step_title(ctx, wizard.step()).bright_cyan().bold());
        match wizard.step() {
            WizardStep::Select => {
                select_details(ctx, &mut wizard)?;
                if !wizard.next() {
                    continue;
                }
            }
            WizardStep::Review => {
                print_quote(ctx, wizard.draft());
                println!("  {} {}", "☔".blue(), ctx.t("drought-coverage"));
                let choice = Select::new("", vec![ctx.t("next"), ctx.t("back")]).raw_prompt()?;
                if choice.index == 0 {
                    wizard.next();
                } else {
                    wizard.back();
                }
            }
            WizardStep::Pay => {
                let lang = ctx.prefs.language();
                let premium = lang.format_currency(Decimal::from(wizard.draft().quote.premium));
                println!("  {} {}", ctx.t("premium"), premium.bright_yellow().bold());

                let choice = Select::new("", vec![ctx.t("pay-with-upi"), ctx.t("back")]).raw_prompt()?;
                if choice.index == 1 {
                    wizard.back();
                    continue;
                }

                let today = chrono::Utc::now().date_naive();
                let bar = spinner(ctx.t("submitting"));
                let result = wizard.submit(ctx.gateway.as_ref(), session.user_id, today).await;
                bar.finish_and_clear();

                match result {
                    Ok(policy) => {
                        println!("\n{}", format!("✅ {}", ctx.t("policy-created")).green().bold());
                        println!("{}", ctx.t_with("policy-reference", &[("id", policy.id.to_string())]));
                        println!(
                            "{}",
                            ctx.t_with(
                                "policy-period",
                                &[("start", policy.start_date.to_string()), ("end", policy.end_date.to_string())]
                            )
                            .dimmed()
                        );
                        return Ok(());
                    }
                    Err(e) => {
                        report(ctx, &e);
                        if !Confirm::new(&ctx.t("retry-payment")).with_default(true).prompt()? {
                            return Ok(());
                        }
                    }
                }
            }
        }
    }
}
