use colored::Colorize;
use inquire::{Confirm, Select};

use fasal_core::prelude::*;

use super::{ScreenResult, print_header, report, require_session};
use crate::context::AppContext;

/// Quiz loop. Starts at the first unanswered question.
pub async fn run(ctx: &AppContext) -> ScreenResult {
    print_header(ctx, "education", "education-instructions");
    let Some(session) = require_session(ctx).await else {
        return Ok(());
    };

    let mut quiz = QuizEngine::load(ctx.store.as_ref(), session.user_id).await;

    loop {
        println!(
            "{} {}   {}",
            "🪙".yellow(),
            format!("{}: {}", ctx.t("coins-earned"), quiz.coins()).yellow().bold(),
            ctx.t("earn-coins").dimmed()
        );

        let question = quiz.current();
        let (current, total) = quiz.position();
        println!(
            "\n{}",
            ctx.t_with(
                "question-progress",
                &[("current", current.to_string()), ("total", total.to_string())]
            )
            .bright_cyan()
        );
        if quiz.is_answered(question.id) {
            println!("{}", format!("✓ {}", ctx.t("already-answered")).dimmed());
        }

        let choice = Select::new(question.prompt, question.options.to_vec()).raw_prompt()?;
        match quiz.submit_answer(ctx.store.as_ref(), choice.index).await {
            Ok(outcome) => {
                if outcome.correct {
                    println!("{}", format!("✅ {}", ctx.t("correct")).green().bold());
                    if outcome.coins_awarded > 0 {
                        println!(
                            "{}",
                            ctx.t_with("coins-awarded", &[("coins", outcome.coins_awarded.to_string())])
                                .yellow()
                        );
                    }
                } else {
                    println!("{}", format!("❌ {}", ctx.t("incorrect")).red().bold());
                    println!("   → {}", question.options[outcome.correct_index].green());
                }
                println!("{}", outcome.explanation.dimmed());
            }
            Err(e) => report(ctx, &e),
        }

        if !Confirm::new(&ctx.t("keep-playing")).with_default(true).prompt()? {
            break;
        }
    }
    Ok(())
}
