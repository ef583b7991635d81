// src/store/postgres.rs

use async_trait::async_trait;
use sqlx::PgPool;

use super::{AnswerStore, AttemptTracker, ResponseRecorder, StoreError, UserStore};
use crate::models::{
    attempt::{Attempt, AttemptStatus},
    quiz::{Answer, NewQuiz, Question, Quiz},
    selected_answer::SelectedAnswer,
    user::{User, UserId},
};

/// PostgreSQL-backed store. Upserts rely on the unique constraints declared
/// in `migrations/0001_init.sql`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl AnswerStore for PgStore {
    async fn list_active_quizzes(&self) -> Result<Vec<Quiz>, StoreError> {
        let quizzes = sqlx::query_as::<_, Quiz>(
            r#"
            SELECT id, name, description, is_active, created_at
            FROM quizzes
            WHERE is_active = TRUE
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(quizzes)
    }

    async fn quiz_count(&self) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM quizzes")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn find_quiz(&self, id: i64) -> Result<Option<Quiz>, StoreError> {
        let quiz = sqlx::query_as::<_, Quiz>(
            "SELECT id, name, description, is_active, created_at FROM quizzes WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(quiz)
    }

    async fn find_active_quiz(&self, id: i64) -> Result<Option<Quiz>, StoreError> {
        let quiz = sqlx::query_as::<_, Quiz>(
            r#"
            SELECT id, name, description, is_active, created_at
            FROM quizzes
            WHERE id = $1 AND is_active = TRUE
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(quiz)
    }

    async fn list_questions(&self, quiz_id: i64) -> Result<Vec<Question>, StoreError> {
        let questions = sqlx::query_as::<_, Question>(
            r#"
            SELECT id, quiz_id, content, created_at
            FROM questions
            WHERE quiz_id = $1
            ORDER BY id
            "#,
        )
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(questions)
    }

    async fn find_question(&self, id: i64) -> Result<Option<Question>, StoreError> {
        let question = sqlx::query_as::<_, Question>(
            "SELECT id, quiz_id, content, created_at FROM questions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(question)
    }

    async fn list_answers(&self, question_id: i64) -> Result<Vec<Answer>, StoreError> {
        let answers = sqlx::query_as::<_, Answer>(
            r#"
            SELECT id, question_id, answer, is_correct
            FROM answers
            WHERE question_id = $1
            ORDER BY id
            "#,
        )
        .bind(question_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(answers)
    }

    async fn find_answer(
        &self,
        question_id: i64,
        answer_id: i64,
    ) -> Result<Option<Answer>, StoreError> {
        let answer = sqlx::query_as::<_, Answer>(
            r#"
            SELECT id, question_id, answer, is_correct
            FROM answers
            WHERE id = $1 AND question_id = $2
            "#,
        )
        .bind(answer_id)
        .bind(question_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(answer)
    }

    async fn create_quiz(&self, quiz: &NewQuiz) -> Result<i64, StoreError> {
        let mut tx = self.pool.begin().await?;

        let quiz_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO quizzes (name, description, is_active)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(&quiz.name)
        .bind(&quiz.description)
        .bind(quiz.is_active)
        .fetch_one(&mut *tx)
        .await?;

        for question in &quiz.questions {
            let question_id: i64 = sqlx::query_scalar(
                "INSERT INTO questions (quiz_id, content) VALUES ($1, $2) RETURNING id",
            )
            .bind(quiz_id)
            .bind(&question.content)
            .fetch_one(&mut *tx)
            .await?;

            // Use QueryBuilder for a multi-row insert of the candidate answers
            let mut query_builder = sqlx::QueryBuilder::<sqlx::Postgres>::new(
                "INSERT INTO answers (question_id, answer, is_correct) ",
            );
            query_builder.push_values(&question.answers, |mut row, answer| {
                row.push_bind(question_id)
                    .push_bind(&answer.answer)
                    .push_bind(answer.is_correct);
            });
            query_builder.build().execute(&mut *tx).await?;
        }

        tx.commit().await?;

        Ok(quiz_id)
    }
}

#[async_trait]
impl AttemptTracker for PgStore {
    async fn has_started(&self, user: UserId, quiz_id: i64) -> Result<bool, StoreError> {
        let started: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM quiz_taken WHERE user_id = $1 AND quiz_id = $2)",
        )
        .bind(user.0)
        .bind(quiz_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(started)
    }

    async fn start_or_resume(&self, user: UserId, quiz_id: i64) -> Result<Attempt, StoreError> {
        // The no-op update makes RETURNING yield the existing row on conflict
        let attempt = sqlx::query_as::<_, Attempt>(
            r#"
            INSERT INTO quiz_taken (user_id, quiz_id, status, started_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (user_id, quiz_id) DO UPDATE SET
                updated_at = quiz_taken.updated_at
            RETURNING id, user_id, quiz_id, status, started_at, created_at, updated_at
            "#,
        )
        .bind(user.0)
        .bind(quiz_id)
        .bind(AttemptStatus::Started.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(attempt)
    }
}

#[async_trait]
impl ResponseRecorder for PgStore {
    async fn selected_answer(
        &self,
        user: UserId,
        quiz_id: i64,
        question_id: i64,
    ) -> Result<Option<SelectedAnswer>, StoreError> {
        let selected = sqlx::query_as::<_, SelectedAnswer>(
            r#"
            SELECT id, user_id, quiz_id, question_id, content, created_at, updated_at
            FROM selected_answers
            WHERE user_id = $1 AND quiz_id = $2 AND question_id = $3
            "#,
        )
        .bind(user.0)
        .bind(quiz_id)
        .bind(question_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(selected)
    }

    async fn record_answer(
        &self,
        user: UserId,
        quiz_id: i64,
        question_id: i64,
        content: &str,
    ) -> Result<SelectedAnswer, StoreError> {
        let selected = sqlx::query_as::<_, SelectedAnswer>(
            r#"
            INSERT INTO selected_answers (user_id, quiz_id, question_id, content)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, quiz_id, question_id) DO UPDATE SET
                content = EXCLUDED.content,
                updated_at = NOW()
            RETURNING id, user_id, quiz_id, question_id, content, created_at, updated_at
            "#,
        )
        .bind(user.0)
        .bind(quiz_id)
        .bind(question_id)
        .bind(content)
        .fetch_one(&self.pool)
        .await?;

        Ok(selected)
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password)
            VALUES ($1, $2)
            RETURNING id, username, password, created_at
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db) = &e {
                if db.is_unique_violation() {
                    return StoreError::Conflict(format!("Username '{}' already exists", username));
                }
            }
            StoreError::Database(e)
        })
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }
}
