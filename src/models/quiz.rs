// src/models/quiz.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'quizzes' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Quiz {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,

    /// Inactive quizzes are hidden from users entirely.
    pub is_active: bool,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub quiz_id: i64,

    /// The text content of the question.
    pub content: String,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Represents the 'answers' table: one candidate choice of a question.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Answer {
    pub id: i64,
    pub question_id: i64,

    /// The text shown to the user. Responses store a copy of this text.
    pub answer: String,

    pub is_correct: bool,
}

/// DTO for sending a candidate answer to the client (excludes `is_correct`).
#[derive(Debug, Clone, Serialize)]
pub struct PublicAnswer {
    pub id: i64,
    pub answer: String,
}

impl From<&Answer> for PublicAnswer {
    fn from(answer: &Answer) -> Self {
        Self {
            id: answer.id,
            answer: answer.answer.clone(),
        }
    }
}

/// Entry of the quiz listing.
#[derive(Debug, Serialize)]
pub struct QuizSummary {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

impl From<Quiz> for QuizSummary {
    fn from(quiz: Quiz) -> Self {
        Self {
            id: quiz.id,
            name: quiz.name,
            description: quiz.description,
        }
    }
}

/// DTO for creating a quiz together with its questions and answers.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewQuiz {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    #[validate(length(min = 1, max = 200), nested)]
    pub questions: Vec<NewQuestion>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewQuestion {
    #[validate(length(min = 1, max = 1000))]
    pub content: String,
    #[validate(length(min = 2, max = 20), nested)]
    pub answers: Vec<NewAnswer>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewAnswer {
    #[validate(length(min = 1, max = 500))]
    pub answer: String,
    #[serde(default)]
    pub is_correct: bool,
}

impl NewQuiz {
    /// Describes every question that does not have exactly one correct answer.
    ///
    /// These are accepted on write; grading falls back to the first answer
    /// flagged correct.
    pub fn correct_answer_warnings(&self) -> Vec<String> {
        self.questions
            .iter()
            .enumerate()
            .filter_map(|(idx, question)| {
                let correct = question.answers.iter().filter(|a| a.is_correct).count();
                match correct {
                    1 => None,
                    0 => Some(format!(
                        "quiz '{}' question #{} has no correct answer",
                        self.name,
                        idx + 1
                    )),
                    n => Some(format!(
                        "quiz '{}' question #{} has {} correct answers, the first one is used",
                        self.name,
                        idx + 1,
                        n
                    )),
                }
            })
            .collect()
    }
}
