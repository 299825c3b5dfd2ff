use colored::Colorize;
use inquire::Select;

use fasal_core::prelude::*;

use super::{ScreenResult, report};
use crate::context::AppContext;

const LANGUAGES: [Language; 3] = [Language::Hi, Language::Mr, Language::En];

/// Language picker. For a signed-in user the profile row changes too, and
/// a failed profile update leaves the old language in place.
pub async fn run(ctx: &mut AppContext) -> ScreenResult {
    let options: Vec<&str> = LANGUAGES.iter().map(|l| l.native_name()).collect();
    let start = LANGUAGES.iter().position(|l| *l == ctx.prefs.language()).unwrap_or(0);

    let choice = Select::new(&ctx.t("select-language"), options)
        .with_starting_cursor(start)
        .raw_prompt()?;
    let language = LANGUAGES[choice.index];

    let session = ctx.resume_session().await;
    let result = match session {
        Some(session) => {
            ctx.prefs
                .change_for_profile(ctx.store.as_ref(), session.user_id, language)
                .await
        }
        None => ctx.prefs.set(language),
    };

    match result {
        Ok(()) => println!(
            "{}",
            ctx.t_with("language-saved", &[("language", language.native_name().to_string())]).green()
        ),
        Err(e) => report(ctx, &e),
    }
    Ok(())
}
