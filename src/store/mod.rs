// src/store/mod.rs

//! Storage seam for the quiz workflow.
//!
//! The catalog, attempt and response concerns are separate traits so each
//! can be reasoned about on its own; `QuizStore` bundles them for the
//! application state. Every upsert must be a single atomic operation so that
//! concurrent requests never produce duplicate rows for one key.

pub mod memory;
pub mod postgres;

use std::fmt;

use async_trait::async_trait;

use crate::models::{
    attempt::Attempt,
    quiz::{Answer, NewQuiz, Question, Quiz},
    selected_answer::SelectedAnswer,
    user::{User, UserId},
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Errors raised by a storage backend.
#[derive(Debug)]
pub enum StoreError {
    /// Underlying database failure.
    Database(sqlx::Error),

    /// A unique key already exists (e.g., duplicate username).
    Conflict(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Database(e) => write!(f, "database error: {}", e),
            StoreError::Conflict(msg) => write!(f, "conflict: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Database(err)
    }
}

/// Read-mostly catalog of quizzes, questions and candidate answers.
#[async_trait]
pub trait AnswerStore: Send + Sync {
    /// Active quizzes ordered by id.
    async fn list_active_quizzes(&self) -> Result<Vec<Quiz>, StoreError>;

    async fn quiz_count(&self) -> Result<i64, StoreError>;

    /// Looks a quiz up regardless of its active flag.
    async fn find_quiz(&self, id: i64) -> Result<Option<Quiz>, StoreError>;

    async fn find_active_quiz(&self, id: i64) -> Result<Option<Quiz>, StoreError>;

    /// Questions of a quiz in ascending id order.
    async fn list_questions(&self, quiz_id: i64) -> Result<Vec<Question>, StoreError>;

    async fn find_question(&self, id: i64) -> Result<Option<Question>, StoreError>;

    /// Candidate answers of a question in ascending id order.
    async fn list_answers(&self, question_id: i64) -> Result<Vec<Answer>, StoreError>;

    /// Finds `answer_id` only if it belongs to `question_id`.
    async fn find_answer(
        &self,
        question_id: i64,
        answer_id: i64,
    ) -> Result<Option<Answer>, StoreError>;

    /// Inserts a quiz with all of its questions and answers, returning the new quiz id.
    async fn create_quiz(&self, quiz: &NewQuiz) -> Result<i64, StoreError>;
}

/// Per-(user, quiz) attempt records.
#[async_trait]
pub trait AttemptTracker: Send + Sync {
    async fn has_started(&self, user: UserId, quiz_id: i64) -> Result<bool, StoreError>;

    /// Creates the attempt with status STARTED and `started_at = now`, or
    /// returns the existing one untouched.
    async fn start_or_resume(&self, user: UserId, quiz_id: i64) -> Result<Attempt, StoreError>;
}

/// Per-(user, quiz, question) selected answers, last write wins.
#[async_trait]
pub trait ResponseRecorder: Send + Sync {
    async fn selected_answer(
        &self,
        user: UserId,
        quiz_id: i64,
        question_id: i64,
    ) -> Result<Option<SelectedAnswer>, StoreError>;

    /// Inserts the response or replaces the content of the existing one.
    async fn record_answer(
        &self,
        user: UserId,
        quiz_id: i64,
        question_id: i64,
        content: &str,
    ) -> Result<SelectedAnswer, StoreError>;
}

/// User accounts backing authentication.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `StoreError::Conflict` when the username is taken.
    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User, StoreError>;

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;
}

/// Everything the application needs from storage.
pub trait QuizStore: AnswerStore + AttemptTracker + ResponseRecorder + UserStore {}

impl<T> QuizStore for T where T: AnswerStore + AttemptTracker + ResponseRecorder + UserStore {}
