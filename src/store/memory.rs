// src/store/memory.rs

//! In-process store used when no database is configured, and by the tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;

use super::{AnswerStore, AttemptTracker, ResponseRecorder, StoreError, UserStore};
use crate::models::{
    attempt::{Attempt, AttemptStatus},
    quiz::{Answer, NewQuiz, Question, Quiz},
    selected_answer::SelectedAnswer,
    user::{User, UserId},
};

/// Last id handed out per table, like one `BIGSERIAL` each.
#[derive(Default)]
struct Sequences {
    users: i64,
    quizzes: i64,
    questions: i64,
    answers: i64,
    attempts: i64,
    selected: i64,
}

fn next(seq: &mut i64) -> i64 {
    *seq += 1;
    *seq
}

#[derive(Default)]
struct Tables {
    seq: Sequences,
    users: BTreeMap<i64, User>,
    quizzes: BTreeMap<i64, Quiz>,
    questions: BTreeMap<i64, Question>,
    answers: BTreeMap<i64, Answer>,
    attempts: HashMap<(i64, i64), Attempt>,
    selected: HashMap<(i64, i64, i64), SelectedAnswer>,
}

/// Every operation runs under a single mutex guard, which makes each upsert atomic.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Flips the active flag of a quiz. Returns false when the quiz is unknown.
    pub fn set_quiz_active(&self, quiz_id: i64, is_active: bool) -> bool {
        match self.tables().quizzes.get_mut(&quiz_id) {
            Some(quiz) => {
                quiz.is_active = is_active;
                true
            }
            None => false,
        }
    }

    /// Number of attempt records, across all users.
    pub fn attempt_count(&self) -> usize {
        self.tables().attempts.len()
    }

    /// Number of response records, across all users.
    pub fn response_count(&self) -> usize {
        self.tables().selected.len()
    }
}

#[async_trait]
impl AnswerStore for MemoryStore {
    async fn list_active_quizzes(&self) -> Result<Vec<Quiz>, StoreError> {
        Ok(self
            .tables()
            .quizzes
            .values()
            .filter(|q| q.is_active)
            .cloned()
            .collect())
    }

    async fn quiz_count(&self) -> Result<i64, StoreError> {
        Ok(self.tables().quizzes.len() as i64)
    }

    async fn find_quiz(&self, id: i64) -> Result<Option<Quiz>, StoreError> {
        Ok(self.tables().quizzes.get(&id).cloned())
    }

    async fn find_active_quiz(&self, id: i64) -> Result<Option<Quiz>, StoreError> {
        Ok(self
            .tables()
            .quizzes
            .get(&id)
            .filter(|q| q.is_active)
            .cloned())
    }

    async fn list_questions(&self, quiz_id: i64) -> Result<Vec<Question>, StoreError> {
        Ok(self
            .tables()
            .questions
            .values()
            .filter(|q| q.quiz_id == quiz_id)
            .cloned()
            .collect())
    }

    async fn find_question(&self, id: i64) -> Result<Option<Question>, StoreError> {
        Ok(self.tables().questions.get(&id).cloned())
    }

    async fn list_answers(&self, question_id: i64) -> Result<Vec<Answer>, StoreError> {
        Ok(self
            .tables()
            .answers
            .values()
            .filter(|a| a.question_id == question_id)
            .cloned()
            .collect())
    }

    async fn find_answer(
        &self,
        question_id: i64,
        answer_id: i64,
    ) -> Result<Option<Answer>, StoreError> {
        Ok(self
            .tables()
            .answers
            .get(&answer_id)
            .filter(|a| a.question_id == question_id)
            .cloned())
    }

    async fn create_quiz(&self, quiz: &NewQuiz) -> Result<i64, StoreError> {
        let mut tables = self.tables();
        let now = Utc::now();

        let quiz_id = next(&mut tables.seq.quizzes);
        tables.quizzes.insert(
            quiz_id,
            Quiz {
                id: quiz_id,
                name: quiz.name.clone(),
                description: quiz.description.clone(),
                is_active: quiz.is_active,
                created_at: now,
            },
        );

        for question in &quiz.questions {
            let question_id = next(&mut tables.seq.questions);
            tables.questions.insert(
                question_id,
                Question {
                    id: question_id,
                    quiz_id,
                    content: question.content.clone(),
                    created_at: now,
                },
            );

            for answer in &question.answers {
                let answer_id = next(&mut tables.seq.answers);
                tables.answers.insert(
                    answer_id,
                    Answer {
                        id: answer_id,
                        question_id,
                        answer: answer.answer.clone(),
                        is_correct: answer.is_correct,
                    },
                );
            }
        }

        Ok(quiz_id)
    }
}

#[async_trait]
impl AttemptTracker for MemoryStore {
    async fn has_started(&self, user: UserId, quiz_id: i64) -> Result<bool, StoreError> {
        Ok(self.tables().attempts.contains_key(&(user.0, quiz_id)))
    }

    async fn start_or_resume(&self, user: UserId, quiz_id: i64) -> Result<Attempt, StoreError> {
        let mut tables = self.tables();
        if let Some(existing) = tables.attempts.get(&(user.0, quiz_id)) {
            return Ok(existing.clone());
        }

        let now = Utc::now();
        let attempt = Attempt {
            id: next(&mut tables.seq.attempts),
            user_id: user.0,
            quiz_id,
            status: AttemptStatus::Started.as_str().to_string(),
            started_at: Some(now),
            created_at: now,
            updated_at: now,
        };
        tables.attempts.insert((user.0, quiz_id), attempt.clone());

        Ok(attempt)
    }
}

#[async_trait]
impl ResponseRecorder for MemoryStore {
    async fn selected_answer(
        &self,
        user: UserId,
        quiz_id: i64,
        question_id: i64,
    ) -> Result<Option<SelectedAnswer>, StoreError> {
        Ok(self
            .tables()
            .selected
            .get(&(user.0, quiz_id, question_id))
            .cloned())
    }

    async fn record_answer(
        &self,
        user: UserId,
        quiz_id: i64,
        question_id: i64,
        content: &str,
    ) -> Result<SelectedAnswer, StoreError> {
        let mut tables = self.tables();
        let now = Utc::now();
        let key = (user.0, quiz_id, question_id);

        if let Some(existing) = tables.selected.get_mut(&key) {
            existing.content = content.to_string();
            existing.updated_at = now;
            return Ok(existing.clone());
        }

        let selected = SelectedAnswer {
            id: next(&mut tables.seq.selected),
            user_id: user.0,
            quiz_id,
            question_id,
            content: content.to_string(),
            created_at: now,
            updated_at: now,
        };
        tables.selected.insert(key, selected.clone());

        Ok(selected)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User, StoreError> {
        let mut tables = self.tables();
        if tables.users.values().any(|u| u.username == username) {
            return Err(StoreError::Conflict(format!(
                "Username '{}' already exists",
                username
            )));
        }

        let user = User {
            id: next(&mut tables.seq.users),
            username: username.to_string(),
            password: password_hash.to_string(),
            created_at: Utc::now(),
        };
        tables.users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .tables()
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::quiz::{NewAnswer, NewQuestion};

    fn capitals() -> NewQuiz {
        NewQuiz {
            name: "Capitals".to_string(),
            description: None,
            is_active: true,
            questions: vec![NewQuestion {
                content: "Capital of France?".to_string(),
                answers: vec![
                    NewAnswer {
                        answer: "Paris".to_string(),
                        is_correct: true,
                    },
                    NewAnswer {
                        answer: "Lyon".to_string(),
                        is_correct: false,
                    },
                ],
            }],
        }
    }

    #[tokio::test]
    async fn first_quiz_gets_id_one() {
        let store = MemoryStore::new();
        assert_eq!(store.create_quiz(&capitals()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn each_table_numbers_its_own_rows() {
        let store = MemoryStore::new();
        store.create_user("alice", "hash").await.unwrap();
        assert_eq!(store.create_quiz(&capitals()).await.unwrap(), 1);
        assert_eq!(store.create_quiz(&capitals()).await.unwrap(), 2);

        let questions = store.list_questions(2).await.unwrap();
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].id, 2);

        let answers = store.list_answers(2).await.unwrap();
        let ids: Vec<i64> = answers.iter().map(|a| a.id).collect();
        assert_eq!(ids, [3, 4]);
    }

    #[tokio::test]
    async fn start_or_resume_keeps_single_attempt() {
        let store = MemoryStore::new();
        let quiz_id = store.create_quiz(&capitals()).await.unwrap();
        let user = UserId(42);

        assert!(!store.has_started(user, quiz_id).await.unwrap());
        let first = store.start_or_resume(user, quiz_id).await.unwrap();
        let second = store.start_or_resume(user, quiz_id).await.unwrap();

        assert!(store.has_started(user, quiz_id).await.unwrap());
        assert_eq!(first.id, second.id);
        assert_eq!(first.started_at, second.started_at);
        assert_eq!(second.status, "STARTED");
        assert_eq!(store.attempt_count(), 1);
    }

    #[tokio::test]
    async fn record_answer_last_write_wins() {
        let store = MemoryStore::new();
        let quiz_id = store.create_quiz(&capitals()).await.unwrap();
        let question = store.list_questions(quiz_id).await.unwrap().remove(0);
        let user = UserId(7);

        let first = store
            .record_answer(user, quiz_id, question.id, "Lyon")
            .await
            .unwrap();
        let second = store
            .record_answer(user, quiz_id, question.id, "Paris")
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(store.response_count(), 1);
        let stored = store
            .selected_answer(user, quiz_id, question.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.content, "Paris");
    }

    #[tokio::test]
    async fn find_answer_requires_owning_question() {
        let store = MemoryStore::new();
        let quiz_id = store.create_quiz(&capitals()).await.unwrap();
        let question = store.list_questions(quiz_id).await.unwrap().remove(0);
        let answers = store.list_answers(question.id).await.unwrap();

        assert_eq!(answers.len(), 2);
        assert!(store.find_answer(question.id, answers[0].id).await.unwrap().is_some());
        assert!(store.find_answer(question.id + 100, answers[0].id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_username_conflicts() {
        let store = MemoryStore::new();
        store.create_user("alice", "hash").await.unwrap();

        let err = store.create_user("alice", "other").await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn inactive_quiz_is_hidden() {
        let store = MemoryStore::new();
        let quiz_id = store.create_quiz(&capitals()).await.unwrap();
        assert!(store.set_quiz_active(quiz_id, false));

        assert!(store.find_active_quiz(quiz_id).await.unwrap().is_none());
        assert!(store.find_quiz(quiz_id).await.unwrap().is_some());
        assert!(store.list_active_quizzes().await.unwrap().is_empty());
    }
}
