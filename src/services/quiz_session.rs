// src/services/quiz_session.rs

//! Quiz-taking workflow: viewing a quiz (optionally starting it) and
//! recording the user's answer to one of its questions.

use std::fmt;

use serde::Serialize;

use crate::{
    models::{
        quiz::{Answer, PublicAnswer, Question, Quiz},
        selected_answer::{AnswerSubmission, SelectedAnswer},
        user::UserId,
    },
    store::{QuizStore, StoreError},
};

/// Value of the `option` query parameter that starts an attempt.
pub const START_OPTION: &str = "start";

#[derive(Debug)]
pub enum SessionError {
    /// Quiz missing or inactive, or question missing.
    NotFound,

    /// The submitted choice or quiz could not be resolved.
    InvalidSubmission(String),

    /// Storage failure.
    Internal(StoreError),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::NotFound => write!(f, "not found"),
            SessionError::InvalidSubmission(msg) => write!(f, "invalid submission: {}", msg),
            SessionError::Internal(e) => write!(f, "internal error: {}", e),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<StoreError> for SessionError {
    fn from(err: StoreError) -> Self {
        SessionError::Internal(err)
    }
}

/// One question of the quiz page.
#[derive(Debug, Serialize)]
pub struct QuestionView {
    pub question: Question,
    pub answers: Vec<PublicAnswer>,
    pub selected_answer: Option<SelectedAnswer>,
    pub answer_is_correct: bool,
}

/// Everything the quiz page displays.
#[derive(Debug, Serialize)]
pub struct QuizView {
    pub quiz: Quiz,
    pub questions: Vec<QuestionView>,
    pub started: bool,
    /// Completion is not tracked; always false.
    pub quiz_completed: bool,
}

/// Path of the quiz page, the redirect target after a submission.
pub fn quiz_path(quiz_id: i64) -> String {
    format!("/quiz/{}/", quiz_id)
}

/// Returns the first answer flagged correct, in store order.
pub fn correct_answer(answers: &[Answer]) -> Option<&Answer> {
    answers.iter().find(|a| a.is_correct)
}

/// True only when both exist and the stored text matches exactly.
pub fn is_answer_correct(selected: Option<&SelectedAnswer>, correct: Option<&Answer>) -> bool {
    match (selected, correct) {
        (Some(selected), Some(correct)) => selected.content == correct.answer,
        _ => false,
    }
}

/// Builds the quiz page for `user`.
///
/// * The quiz must exist and be active.
/// * With `start`, the attempt is started or resumed (idempotent).
/// * Each question carries the user's current response and its correctness.
pub async fn view_quiz(
    store: &dyn QuizStore,
    user: UserId,
    quiz_id: i64,
    start: bool,
) -> Result<QuizView, SessionError> {
    let quiz = store
        .find_active_quiz(quiz_id)
        .await?
        .ok_or(SessionError::NotFound)?;

    let mut started = store.has_started(user, quiz.id).await?;

    if start {
        let attempt = store.start_or_resume(user, quiz.id).await?;
        tracing::debug!(
            "User {} on quiz {}: attempt {} ({})",
            user.0,
            quiz.id,
            attempt.id,
            attempt.status
        );
        started = true;
    }

    let mut questions = Vec::new();
    for question in store.list_questions(quiz.id).await? {
        let answers = store.list_answers(question.id).await?;
        let selected_answer = store.selected_answer(user, quiz.id, question.id).await?;

        let correct_count = answers.iter().filter(|a| a.is_correct).count();
        if correct_count > 1 {
            tracing::warn!(
                "Question {} has {} answers marked correct, grading against the first",
                question.id,
                correct_count
            );
        }

        let answer_is_correct =
            is_answer_correct(selected_answer.as_ref(), correct_answer(&answers));

        questions.push(QuestionView {
            answers: answers.iter().map(PublicAnswer::from).collect(),
            question,
            selected_answer,
            answer_is_correct,
        });
    }

    Ok(QuizView {
        quiz,
        questions,
        started,
        quiz_completed: false,
    })
}

/// Records `user`'s choice for a question and returns the quiz id to redirect to.
///
/// The choice must be one of the question's own answers. The response is
/// keyed by the submitted quiz, so it only shows up in that quiz's page.
pub async fn submit_answer(
    store: &dyn QuizStore,
    user: UserId,
    question_id: i64,
    submission: &AnswerSubmission,
) -> Result<i64, SessionError> {
    let question = store
        .find_question(question_id)
        .await?
        .ok_or(SessionError::NotFound)?;

    let choice = store.find_answer(question.id, submission.choice).await?;
    let quiz = store.find_quiz(submission.quiz).await?;

    let (choice, quiz) = match (choice, quiz) {
        (Some(choice), Some(quiz)) => (choice, quiz),
        (None, _) => {
            return Err(SessionError::InvalidSubmission(format!(
                "Answer {} does not belong to question {}",
                submission.choice, question.id
            )));
        }
        (_, None) => {
            return Err(SessionError::InvalidSubmission(format!(
                "Quiz {} does not exist",
                submission.quiz
            )));
        }
    };

    store
        .record_answer(user, quiz.id, question.id, &choice.answer)
        .await?;

    tracing::info!(
        "User {} answered question {} of quiz {}",
        user.0,
        question.id,
        quiz.id
    );

    Ok(quiz.id)
}
