// src/services/fixtures.rs

//! Loads the quiz catalog from a JSON fixture file at startup.

use std::{fmt, path::Path};

use validator::Validate;

use crate::{
    models::quiz::NewQuiz,
    store::{AnswerStore, StoreError},
};

#[derive(Debug)]
pub enum FixtureError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    /// Validation failure of the quiz at the given position.
    Invalid { index: usize, reason: String },
    Store(StoreError),
}

impl fmt::Display for FixtureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FixtureError::Io(e) => write!(f, "cannot read fixture: {}", e),
            FixtureError::Parse(e) => write!(f, "malformed fixture: {}", e),
            FixtureError::Invalid { index, reason } => {
                write!(f, "invalid quiz #{} in fixture: {}", index + 1, reason)
            }
            FixtureError::Store(e) => write!(f, "cannot store fixture: {}", e),
        }
    }
}

impl std::error::Error for FixtureError {}

impl From<StoreError> for FixtureError {
    fn from(err: StoreError) -> Self {
        FixtureError::Store(err)
    }
}

/// Parses and validates a catalog. Questions without exactly one correct
/// answer are accepted but logged.
pub fn parse_catalog(raw: &str) -> Result<Vec<NewQuiz>, FixtureError> {
    let quizzes: Vec<NewQuiz> = serde_json::from_str(raw).map_err(FixtureError::Parse)?;

    for (index, quiz) in quizzes.iter().enumerate() {
        if let Err(validation_errors) = quiz.validate() {
            return Err(FixtureError::Invalid {
                index,
                reason: validation_errors.to_string(),
            });
        }
        for warning in quiz.correct_answer_warnings() {
            tracing::warn!("Fixture: {}", warning);
        }
    }

    Ok(quizzes)
}

/// Inserts the catalog unless the store already holds quizzes.
/// Returns the number of quizzes inserted.
pub async fn seed_catalog<S>(store: &S, quizzes: &[NewQuiz]) -> Result<usize, FixtureError>
where
    S: AnswerStore + ?Sized,
{
    if store.quiz_count().await? > 0 {
        tracing::info!("Catalog already populated, skipping fixture");
        return Ok(0);
    }

    for quiz in quizzes {
        let id = store.create_quiz(quiz).await?;
        tracing::info!("Seeded quiz {} '{}'", id, quiz.name);
    }

    Ok(quizzes.len())
}

/// Reads, validates and seeds the fixture at `path`.
pub async fn load_fixture<S>(store: &S, path: &Path) -> Result<usize, FixtureError>
where
    S: AnswerStore + ?Sized,
{
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(FixtureError::Io)?;
    let quizzes = parse_catalog(&raw)?;
    seed_catalog(store, &quizzes).await
}
