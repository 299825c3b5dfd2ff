use colored::Colorize;
use inquire::{Confirm, Password, PasswordDisplayMode, Text};

use fasal_core::identity::MIN_PASSWORD_LEN;
use fasal_core::prelude::*;

use super::{ScreenResult, report, spinner};
use crate::context::AppContext;

fn ask_password(ctx: &AppContext, confirm: bool) -> Result<String, inquire::InquireError> {
    let label = ctx.t("password");
    let mut prompt = Password::new(&label)
        .with_display_mode(PasswordDisplayMode::Masked)
        .with_validator(inquire::min_length!(MIN_PASSWORD_LEN, ctx.t("error-password-too-short")));
    if !confirm {
        prompt = prompt.without_confirmation();
    }
    prompt.prompt()
}

pub async fn login(ctx: &AppContext) -> ScreenResult {
    println!("\n{}", ctx.t("login").bright_cyan().bold());
    let email = Text::new(&ctx.t("email")).prompt()?;
    let password = ask_password(ctx, false)?;

    let bar = spinner(ctx.t("loading"));
    let result = ctx.identity.sign_in(&email, &password).await;
    bar.finish_and_clear();

    match result {
        Ok(session) => {
            ctx.remember_session(&session);
            let profile = ctx.store.get_profile(session.user_id).await.ok().flatten();
            let name = profile
                .map(|p| p.full_name)
                .unwrap_or_else(|| Profile::fallback(session.user_id, &session.email).full_name);
            println!("{}", ctx.t_with("login-success", &[("name", name)]).green());
        }
        Err(e) => report(ctx, &e),
    }
    Ok(())
}

/// Creates the account with the active language as its preference.
pub async fn signup(ctx: &AppContext) -> ScreenResult {
    println!("\n{}", ctx.t("signup").bright_cyan().bold());
    let full_name = Text::new(&ctx.t("full-name"))
        .with_validator(inquire::required!())
        .prompt()?;
    let email = Text::new(&ctx.t("email")).prompt()?;
    let password = ask_password(ctx, true)?;

    let bar = spinner(ctx.t("loading"));
    let result = register(
        &ctx.identity,
        ctx.store.as_ref(),
        &email,
        &password,
        &full_name,
        ctx.prefs.language(),
    )
    .await;
    bar.finish_and_clear();

    match result {
        Ok(session) => {
            ctx.remember_session(&session);
            println!(
                "{}",
                ctx.t_with("signup-success", &[("name", full_name.trim().to_string())]).green()
            );
        }
        Err(e) => report(ctx, &e),
    }
    Ok(())
}

/// Asks for confirmation, then revokes the saved session.
pub async fn logout(ctx: &AppContext) -> ScreenResult {
    if ctx.resume_session().await.is_none() {
        println!("{}", ctx.t("not-signed-in").yellow());
        return Ok(());
    }
    let confirmed = Confirm::new(&ctx.t("logout-confirm")).with_default(false).prompt()?;
    if !confirmed {
        return Ok(());
    }
    match ctx.end_session().await {
        Ok(()) => println!("{}", ctx.t("logout-success").green()),
        Err(e) => report(ctx, &e),
    }
    Ok(())
}
