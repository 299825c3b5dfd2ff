//! Interactive screens. Each takes the shared [`AppContext`] and returns
//! when the user leaves it.

use colored::{ColoredString, Colorize};

use fasal_core::prelude::*;

use crate::context::AppContext;

pub mod auth;
pub mod buy_policy;
pub mod claims;
pub mod dashboard;
pub mod education;
pub mod language;
pub mod profile;

pub type ScreenResult = Result<(), Box<dyn std::error::Error>>;

/// Title bar plus the screen's translated instructions.
pub fn print_header(ctx: &AppContext, title_key: &str, instructions_key: &str) {
    println!();
    println!("{}", format!("{} · {}", ctx.t("app-title"), ctx.t(title_key)).bright_green().bold());
    println!("{}", ctx.t(instructions_key).dimmed());
    println!();
}

pub fn paint(text: &str, tone: Tone) -> ColoredString {
    match tone {
        Tone::Neutral => text.normal(),
        Tone::Warning => text.yellow().bold(),
        Tone::Info => text.cyan(),
        Tone::Success => text.green().bold(),
    }
}

/// Prints an error in the active language.
pub fn report(ctx: &AppContext, err: &FasalError) {
    eprintln!("{} {}", format!("{}:", ctx.t("error")).red().bold(), ctx.prefs.error_message(err));
}

/// The saved session, or a "log in first" notice.
pub async fn require_session(ctx: &AppContext) -> Option<Session> {
    let session = ctx.resume_session().await;
    if session.is_none() {
        println!("{}", ctx.t("not-signed-in").yellow());
    }
    session
}

pub fn spinner(message: String) -> indicatif::ProgressBar {
    let bar = indicatif::ProgressBar::new_spinner();
    bar.set_message(message);
    bar.enable_steady_tick(std::time::Duration::from_millis(100));
    bar
}
