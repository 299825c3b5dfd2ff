use colored::Colorize;
use inquire::Select;
use tabled::builder::Builder;
use tabled::settings::Style;

use fasal_core::prelude::*;

use super::{ScreenResult, print_header, require_session};
use crate::context::AppContext;

/// Profile summary and settings menu. A missing profile row falls back to
/// a name derived from the e-mail address.
pub async fn run(ctx: &mut AppContext) -> ScreenResult {
    print_header(ctx, "profile", "profile-instructions");
    let Some(session) = require_session(ctx).await else {
        return Ok(());
    };

    loop {
        let profile = match ctx.store.get_profile(session.user_id).await {
            Ok(Some(profile)) => profile,
            Ok(None) => Profile::fallback(session.user_id, &session.email),
            Err(e) => {
                tracing::warn!(error = %e, "Profile unavailable; showing fallback");
                Profile::fallback(session.user_id, &session.email)
            }
        };
        let policies = ctx
            .store
            .policies_for_owner(session.user_id)
            .await
            .map(|p| p.len())
            .unwrap_or(0);

        let mut builder = Builder::default();
        builder.push_record([ctx.t("full-name"), profile.full_name.clone()]);
        builder.push_record([ctx.t("email"), profile.email.clone()]);
        builder.push_record([ctx.t("language"), profile.preferred_language.native_name().to_string()]);
        builder.push_record([ctx.t("coins-earned"), profile.coins_earned.to_string()]);
        builder.push_record([ctx.t("policies-held"), policies.to_string()]);
        let mut table = builder.build();
        table.with(Style::rounded());
        println!("{table}");
        println!(
            "{}",
            ctx.t_with("member-since", &[("date", profile.created_at.date_naive().to_string())]).dimmed()
        );

        let options = vec![
            ctx.t("language"),
            ctx.t("privacy-policy"),
            ctx.t("terms-of-service"),
            ctx.t("logout"),
            ctx.t("close"),
        ];
        let choice = Select::new(&ctx.t("settings"), options).raw_prompt()?;
        match choice.index {
            0 => super::language::run(ctx).await?,
            1 => println!("\n{}\n{}\n", ctx.t("privacy-policy").bold(), ctx.t("privacy-content")),
            2 => println!("\n{}\n{}\n", ctx.t("terms-of-service").bold(), ctx.t("terms-content")),
            3 => {
                super::auth::logout(ctx).await?;
                if ctx.resume_session().await.is_none() {
                    return Ok(());
                }
            }
            _ => return Ok(()),
        }
        println!("{}", "─".repeat(40).dimmed());
    }
}
