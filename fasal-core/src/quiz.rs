//! Farmer education quiz: five fixed questions on parametric insurance,
//! each paying out coins the first time it is answered correctly.

use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashSet;
use tracing::{error, warn};
use uuid::Uuid;

use crate::store::FasalStore;
use crate::types::FasalError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    pub id: &'static str,
    pub prompt: &'static str,
    pub options: [&'static str; 4],
    pub correct: usize,
    pub explanation: &'static str,
    pub coins: u32,
}

pub static QUESTIONS: Lazy<Vec<Question>> = Lazy::new(|| {
    vec![
        Question {
            id: "q1",
            prompt: "What is basis risk in crop insurance?",
            options: [
                "The risk of crop damage",
                "The difference between actual loss and insurance payout",
                "The cost of insurance premium",
                "The time delay in claim processing",
            ],
            correct: 1,
            explanation: "Basis risk occurs when the insurance payout doesn't match the actual loss experienced by the farmer.",
            coins: 10,
        },
        Question {
            id: "q2",
            prompt: "How does parametric insurance work?",
            options: [
                "Based on actual crop damage assessment",
                "Based on predefined weather parameters",
                "Based on market prices",
                "Based on farmer's income",
            ],
            correct: 1,
            explanation: "Parametric insurance triggers payouts automatically when predefined weather parameters (like rainfall) cross certain thresholds.",
            coins: 15,
        },
        Question {
            id: "q3",
            prompt: "What is the main advantage of blockchain in insurance?",
            options: [
                "Lower premiums",
                "Faster claim processing",
                "Transparency and trust",
                "Better weather prediction",
            ],
            correct: 2,
            explanation: "Blockchain provides transparency and immutable records, building trust between farmers and insurers.",
            coins: 20,
        },
        Question {
            id: "q4",
            prompt: "When does a drought parametric policy typically trigger?",
            options: [
                "When crops start wilting",
                "When rainfall drops below threshold",
                "When temperature exceeds 40°C",
                "When farmer reports damage",
            ],
            correct: 1,
            explanation: "Drought policies trigger automatically when rainfall measurements drop below predefined thresholds.",
            coins: 15,
        },
        Question {
            id: "q5",
            prompt: "What data is used for weather-based insurance?",
            options: [
                "Satellite imagery only",
                "Weather station data only",
                "Both satellite and weather station data",
                "Farmer reports only",
            ],
            correct: 2,
            explanation: "Modern parametric insurance uses multiple data sources including satellites and weather stations for accurate measurements.",
            coins: 10,
        },
    ]
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerOutcome {
    pub question_id: &'static str,
    pub correct: bool,
    pub correct_index: usize,
    /// Coins credited by this answer; zero for wrong or repeated answers.
    pub coins_awarded: u32,
    /// The question had been rewarded before this answer.
    pub already_answered: bool,
    pub explanation: &'static str,
}

/// Quiz session for one owner.
#[derive(Debug, Clone)]
pub struct QuizEngine {
    owner: Uuid,
    answered: HashSet<String>,
    coins: u64,
    index: usize,
}

impl QuizEngine {
    /// Reads progress and coin total, positioned at the first unanswered
    /// question. Read failures start from a blank slate.
    pub async fn load(store: &dyn FasalStore, owner: Uuid) -> Self {
        let answered = store.answered_questions(owner).await.unwrap_or_else(|e| {
            warn!(error = %e, %owner, "Education progress unavailable");
            HashSet::new()
        });
        let coins = match store.get_profile(owner).await {
            Ok(profile) => profile.map(|p| p.coins_earned).unwrap_or(0),
            Err(e) => {
                warn!(error = %e, %owner, "Coin total unavailable");
                0
            }
        };
        Self::with_progress(owner, answered, coins)
    }

    pub fn with_progress(owner: Uuid, answered: HashSet<String>, coins: u64) -> Self {
        let mut engine = Self {
            owner,
            answered,
            coins,
            index: 0,
        };
        engine.index = engine.first_unanswered_from(0).unwrap_or(0);
        engine
    }

    pub fn current(&self) -> &'static Question {
        &QUESTIONS[self.index]
    }

    /// 1-based position and question count, for "Question 2 of 5".
    pub fn position(&self) -> (usize, usize) {
        (self.index + 1, QUESTIONS.len())
    }

    pub fn coins(&self) -> u64 {
        self.coins
    }

    pub fn is_answered(&self, question_id: &str) -> bool {
        self.answered.contains(question_id)
    }

    pub fn all_answered(&self) -> bool {
        QUESTIONS.iter().all(|q| self.answered.contains(q.id))
    }

    fn first_unanswered_from(&self, start: usize) -> Option<usize> {
        let n = QUESTIONS.len();
        (0..n)
            .map(|offset| (start + offset) % n)
            .find(|&i| !self.answered.contains(QUESTIONS[i].id))
    }

    /// Grades `selected` against the current question and moves on.
    ///
    /// A first correct answer is recorded and rewarded through the store. If
    /// that write fails the error is logged and nothing is credited. The
    /// engine then moves to the next unanswered question, wrapping to the
    /// first question when none is left.
    pub async fn submit_answer(&mut self, store: &dyn FasalStore, selected: usize) -> Result<AnswerOutcome, FasalError> {
        let question = self.current();
        if selected >= question.options.len() {
            return Err(FasalError::invalid_input(
                "selected_option",
                &selected.to_string(),
                "error-option-out-of-range",
                "QuizEngine",
            ));
        }

        let correct = selected == question.correct;
        let already_answered = self.answered.contains(question.id);
        let mut coins_awarded = 0;

        if correct && !already_answered {
            match store.award_first_correct(self.owner, question.id, question.coins).await {
                Ok(true) => {
                    coins_awarded = question.coins;
                    self.coins += u64::from(question.coins);
                    self.answered.insert(question.id.to_string());
                }
                Ok(false) => {
                    // Rewarded from another session.
                    self.answered.insert(question.id.to_string());
                }
                Err(e) => {
                    error!(error = %e, question = question.id, "Error saving quiz progress");
                }
            }
        }

        let outcome = AnswerOutcome {
            question_id: question.id,
            correct,
            correct_index: question.correct,
            coins_awarded,
            already_answered,
            explanation: question.explanation,
        };

        self.index = self.first_unanswered_from(self.index + 1).unwrap_or(0);
        Ok(outcome)
    }
}
