// src/routes.rs

use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::{
    handlers::{auth, quiz},
    state::AppState,
    utils::jwt::auth_middleware,
};

/// Assembles the main application router.
///
/// * Account routes are public.
/// * Quiz routes require a session (bearer header or cookie).
/// * Applies global request tracing.
pub fn create_router(state: AppState) -> Router {
    let account_routes = Router::new()
        .route("/login/", get(auth::login_form).post(auth::login))
        .route("/logout/", get(auth::logout))
        .route("/register/", get(auth::register_form).post(auth::register));

    let quiz_routes = Router::new()
        .route("/{id}/", get(quiz::view_quiz))
        .route("/question/{id}/", post(quiz::answer_question))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/", get(quiz::list_quizzes))
        .nest("/accounts", account_routes)
        .nest("/quiz", quiz_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
        response::Response,
    };
    use tower::ServiceExt;

    use super::*;
    use crate::{
        config::Config,
        models::{
            attempt::Attempt,
            quiz::{Answer, NewAnswer, NewQuestion, NewQuiz, Question, Quiz},
            selected_answer::SelectedAnswer,
            user::{User, UserId},
        },
        store::{
            AnswerStore, AttemptTracker, MemoryStore, QuizStore, ResponseRecorder, StoreError,
            UserStore,
        },
        utils::jwt::sign_jwt,
    };

    const SECRET: &str = "router_test_secret";

    fn app_with(store: Arc<dyn QuizStore>) -> Router {
        let config = Config::from_lookup(|key| match key {
            "JWT_SECRET" => Some(SECRET.to_string()),
            _ => None,
        })
        .unwrap();

        create_router(AppState { store, config })
    }

    fn app() -> Router {
        app_with(Arc::new(MemoryStore::new()))
    }

    fn authed_get(uri: &str) -> Request<Body> {
        let token = sign_jwt(1, "alice", SECRET, 60).unwrap();
        Request::get(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn unavailable() -> StoreError {
        StoreError::Database(sqlx::Error::PoolTimedOut)
    }

    /// Every call fails as if the database were down.
    struct UnavailableStore;

    #[async_trait]
    impl AnswerStore for UnavailableStore {
        async fn list_active_quizzes(&self) -> Result<Vec<Quiz>, StoreError> {
            Err(unavailable())
        }
        async fn quiz_count(&self) -> Result<i64, StoreError> {
            Err(unavailable())
        }
        async fn find_quiz(&self, _id: i64) -> Result<Option<Quiz>, StoreError> {
            Err(unavailable())
        }
        async fn find_active_quiz(&self, _id: i64) -> Result<Option<Quiz>, StoreError> {
            Err(unavailable())
        }
        async fn list_questions(&self, _quiz_id: i64) -> Result<Vec<Question>, StoreError> {
            Err(unavailable())
        }
        async fn find_question(&self, _id: i64) -> Result<Option<Question>, StoreError> {
            Err(unavailable())
        }
        async fn list_answers(&self, _question_id: i64) -> Result<Vec<Answer>, StoreError> {
            Err(unavailable())
        }
        async fn find_answer(
            &self,
            _question_id: i64,
            _answer_id: i64,
        ) -> Result<Option<Answer>, StoreError> {
            Err(unavailable())
        }
        async fn create_quiz(&self, _quiz: &NewQuiz) -> Result<i64, StoreError> {
            Err(unavailable())
        }
    }

    #[async_trait]
    impl AttemptTracker for UnavailableStore {
        async fn has_started(&self, _user: UserId, _quiz_id: i64) -> Result<bool, StoreError> {
            Err(unavailable())
        }
        async fn start_or_resume(
            &self,
            _user: UserId,
            _quiz_id: i64,
        ) -> Result<Attempt, StoreError> {
            Err(unavailable())
        }
    }

    #[async_trait]
    impl ResponseRecorder for UnavailableStore {
        async fn selected_answer(
            &self,
            _user: UserId,
            _quiz_id: i64,
            _question_id: i64,
        ) -> Result<Option<SelectedAnswer>, StoreError> {
            Err(unavailable())
        }
        async fn record_answer(
            &self,
            _user: UserId,
            _quiz_id: i64,
            _question_id: i64,
            _content: &str,
        ) -> Result<SelectedAnswer, StoreError> {
            Err(unavailable())
        }
    }

    #[async_trait]
    impl UserStore for UnavailableStore {
        async fn create_user(
            &self,
            _username: &str,
            _password_hash: &str,
        ) -> Result<User, StoreError> {
            Err(unavailable())
        }
        async fn find_user_by_username(&self, _username: &str) -> Result<Option<User>, StoreError> {
            Err(unavailable())
        }
    }

    #[tokio::test]
    async fn quiz_page_redirects_anonymous_user_to_login() {
        let response = app()
            .oneshot(Request::get("/quiz/1/?option=start").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers()[header::LOCATION],
            "/accounts/login/?next=%2Fquiz%2F1%2F%3Foption%3Dstart"
        );
    }

    #[tokio::test]
    async fn login_page_is_public() {
        let response = app()
            .oneshot(Request::get("/accounts/login/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn logout_clears_cookie() {
        let response = app()
            .oneshot(Request::get("/accounts/logout/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with("access_token=;"));
        assert!(cookie.contains("Max-Age=0"));
    }

    #[tokio::test]
    async fn storage_failure_renders_not_found() {
        let app = app_with(Arc::new(UnavailableStore));

        for uri in ["/quiz/1/", "/quiz/1/?option=start"] {
            let response = app.clone().oneshot(authed_get(uri)).await.unwrap();

            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{}", uri);
            assert_eq!(json_body(response).await, serde_json::json!({"error": "Not Found"}));
        }
    }

    #[tokio::test]
    async fn repeated_start_option_starts_quiz() {
        let store = Arc::new(MemoryStore::new());
        let quiz_id = store
            .create_quiz(&NewQuiz {
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
            })
            .await
            .unwrap();
        let app = app_with(store.clone());

        let uri = format!("/quiz/{}/?option=start&option=start", quiz_id);
        let response = app.oneshot(authed_get(&uri)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["started"], true);
        assert_eq!(store.attempt_count(), 1);
    }
}
