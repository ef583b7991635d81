// tests/pg_store_tests.rs

//! Exercises the Postgres store. Needs a running database in DATABASE_URL;
//! every test returns early when it is unset.

use quizdesk::{
    models::{
        quiz::{NewAnswer, NewQuestion, NewQuiz},
        user::UserId,
    },
    store::{AnswerStore, AttemptTracker, PgStore, ResponseRecorder, StoreError, UserStore},
};
use sqlx::postgres::PgPoolOptions;

async fn store() -> Option<PgStore> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping Postgres store test");
        return None;
    };

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url)
        .await
        .expect("Failed to connect to Postgres for testing.");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    Some(PgStore::new(pool))
}

fn capitals() -> NewQuiz {
    NewQuiz {
        name: "Capitals".to_string(),
        description: None,
        is_active: true,
        questions: vec![NewQuestion {
            content: "What is the capital of France?".to_string(),
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

async fn new_user(store: &PgStore) -> UserId {
    let username = format!("pg_{}", &uuid::Uuid::new_v4().to_string()[..8]);
    let user = store.create_user(&username, "not-a-real-hash").await.unwrap();
    UserId(user.id)
}

#[tokio::test]
async fn create_quiz_keeps_question_and_answer_order() {
    let Some(store) = store().await else { return };

    let quiz_id = store.create_quiz(&capitals()).await.unwrap();
    let questions = store.list_questions(quiz_id).await.unwrap();
    assert_eq!(questions.len(), 1);

    let answers = store.list_answers(questions[0].id).await.unwrap();
    let texts: Vec<&str> = answers.iter().map(|a| a.answer.as_str()).collect();
    assert_eq!(texts, ["Paris", "Lyon"]);
    assert!(store.find_active_quiz(quiz_id).await.unwrap().is_some());
}

#[tokio::test]
async fn start_or_resume_is_a_single_upsert() {
    let Some(store) = store().await else { return };
    let quiz_id = store.create_quiz(&capitals()).await.unwrap();
    let user = new_user(&store).await;

    assert!(!store.has_started(user, quiz_id).await.unwrap());
    let first = store.start_or_resume(user, quiz_id).await.unwrap();
    let second = store.start_or_resume(user, quiz_id).await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(first.started_at, second.started_at);
    assert_eq!(second.status, "STARTED");
    assert!(store.has_started(user, quiz_id).await.unwrap());

    let rows: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM quiz_taken WHERE user_id = $1 AND quiz_id = $2")
            .bind(user.0)
            .bind(quiz_id)
            .fetch_one(store.pool())
            .await
            .unwrap();
    assert_eq!(rows, 1);
}

#[tokio::test]
async fn record_answer_overwrites_content() {
    let Some(store) = store().await else { return };
    let quiz_id = store.create_quiz(&capitals()).await.unwrap();
    let question = store.list_questions(quiz_id).await.unwrap().remove(0);
    let user = new_user(&store).await;

    store.record_answer(user, quiz_id, question.id, "Lyon").await.unwrap();
    store.record_answer(user, quiz_id, question.id, "Paris").await.unwrap();

    let selected = store
        .selected_answer(user, quiz_id, question.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(selected.content, "Paris");

    let rows: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM selected_answers WHERE user_id = $1 AND quiz_id = $2 AND question_id = $3",
    )
    .bind(user.0)
    .bind(quiz_id)
    .bind(question.id)
    .fetch_one(store.pool())
    .await
    .unwrap();
    assert_eq!(rows, 1);
}

#[tokio::test]
async fn concurrent_upserts_never_duplicate() {
    let Some(store) = store().await else { return };
    let quiz_id = store.create_quiz(&capitals()).await.unwrap();
    let question = store.list_questions(quiz_id).await.unwrap().remove(0);
    let user = new_user(&store).await;

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let store = store.clone();
            let question_id = question.id;
            tokio::spawn(async move {
                store.start_or_resume(user, quiz_id).await.unwrap();
                store
                    .record_answer(user, quiz_id, question_id, &format!("choice {}", i))
                    .await
                    .unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap();
    }

    let attempts: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM quiz_taken WHERE user_id = $1")
        .bind(user.0)
        .fetch_one(store.pool())
        .await
        .unwrap();
    let responses: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM selected_answers WHERE user_id = $1")
            .bind(user.0)
            .fetch_one(store.pool())
            .await
            .unwrap();
    assert_eq!(attempts, 1);
    assert_eq!(responses, 1);
}

#[tokio::test]
async fn duplicate_username_is_conflict() {
    let Some(store) = store().await else { return };
    let username = format!("pg_{}", &uuid::Uuid::new_v4().to_string()[..8]);

    store.create_user(&username, "hash").await.unwrap();
    let err = store.create_user(&username, "hash").await.unwrap_err();

    assert!(matches!(err, StoreError::Conflict(_)));
}
