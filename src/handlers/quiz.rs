// src/handlers/quiz.rs

use axum::{
    Extension, Form, Json,
    extract::{Path, RawQuery, State, rejection::PathRejection},
    response::{IntoResponse, Redirect},
};
use url::form_urlencoded;

use crate::{
    error::AppError,
    models::{quiz::QuizSummary, selected_answer::AnswerSubmission},
    services::quiz_session::{self, START_OPTION, SessionError},
    state::AppState,
    utils::jwt::Claims,
};

/// Query string of the quiz page.
#[derive(Debug, Default, PartialEq)]
pub struct QuizPageParams {
    pub option: Option<String>,
}

impl QuizPageParams {
    /// Lenient parse: unknown keys are ignored and a repeated key keeps its last value.
    pub fn parse(query: Option<&str>) -> Self {
        let option = query.and_then(|q| {
            form_urlencoded::parse(q.as_bytes())
                .filter(|(key, _)| key == "option")
                .map(|(_, value)| value.into_owned())
                .last()
        });
        Self { option }
    }

    fn wants_start(&self) -> bool {
        self.option.as_deref() == Some(START_OPTION)
    }
}

fn not_found() -> AppError {
    AppError::NotFound("Not Found".to_string())
}

/// Lists the active quizzes.
pub async fn list_quizzes(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let quizzes: Vec<QuizSummary> = state
        .store
        .list_active_quizzes()
        .await?
        .into_iter()
        .map(QuizSummary::from)
        .collect();

    Ok(Json(quizzes))
}

/// Shows a quiz with the user's answers, starting it on `?option=start`.
///
/// Every failure (unknown id, inactive quiz, storage error) renders the same
/// not-found response; storage errors are logged.
pub async fn view_quiz(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    id: Result<Path<i64>, PathRejection>,
    RawQuery(query): RawQuery,
) -> Result<impl IntoResponse, AppError> {
    let Ok(Path(id)) = id else {
        return Err(not_found());
    };
    let user = claims.user_id()?;
    let params = QuizPageParams::parse(query.as_deref());

    match quiz_session::view_quiz(state.store.as_ref(), user, id, params.wants_start()).await {
        Ok(view) => Ok(Json(view)),
        Err(SessionError::Internal(e)) => {
            tracing::error!("Failed to load quiz {} for user {}: {}", id, user.0, e);
            Err(not_found())
        }
        Err(_) => Err(not_found()),
    }
}

/// Stores the user's choice for a question and redirects back to the quiz.
pub async fn answer_question(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    id: Result<Path<i64>, PathRejection>,
    Form(submission): Form<AnswerSubmission>,
) -> Result<impl IntoResponse, AppError> {
    let Ok(Path(question_id)) = id else {
        return Err(not_found());
    };
    let user = claims.user_id()?;

    let quiz_id =
        quiz_session::submit_answer(state.store.as_ref(), user, question_id, &submission)
            .await
            .map_err(|e| {
                if let SessionError::InvalidSubmission(msg) = &e {
                    tracing::warn!("Rejected submission from user {}: {}", user.0, msg);
                }
                AppError::from(e)
            })?;

    Ok(Redirect::to(&quiz_session::quiz_path(quiz_id)))
}
