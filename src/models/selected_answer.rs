// src/models/selected_answer.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the 'selected_answers' table in the database.
///
/// Holds a copy of the chosen answer's text rather than a reference to it.
/// Unique per (user_id, quiz_id, question_id).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct SelectedAnswer {
    pub id: i64,
    pub user_id: i64,
    pub quiz_id: i64,
    pub question_id: i64,
    pub content: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Form payload of `POST /quiz/question/{id}/`.
#[derive(Debug, Clone, Deserialize)]
pub struct AnswerSubmission {
    /// Quiz the response is recorded under.
    pub quiz: i64,
    /// Id of the chosen answer.
    pub choice: i64,
}
