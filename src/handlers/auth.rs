// src/handlers/auth.rs

use axum::{
    Form,
    extract::State,
    http::header,
    response::{Html, IntoResponse, Redirect},
};
use validator::Validate;

use crate::{
    config::LOGIN_PATH,
    error::AppError,
    models::user::{CreateUserRequest, LoginRequest},
    state::AppState,
    utils::{
        hash::{hash_password, verify_password},
        jwt::{expired_session_cookie, safe_next, session_cookie, sign_jwt},
    },
};

const LOGIN_FORM: &str = r#"<!doctype html>
<title>Log in</title>
<form method="post" action="/accounts/login/">
  <input name="username" placeholder="Username" required>
  <input name="password" type="password" placeholder="Password" required>
  <button type="submit">Log in</button>
</form>
<a href="/accounts/register/">Register</a>
"#;

const REGISTER_FORM: &str = r#"<!doctype html>
<title>Register</title>
<form method="post" action="/accounts/register/">
  <input name="username" placeholder="Username" required>
  <input name="password" type="password" placeholder="Password" required>
  <button type="submit">Register</button>
</form>
"#;

/// One message for unknown users and wrong passwords, so usernames cannot be enumerated.
fn invalid_credentials() -> AppError {
    AppError::AuthError("Invalid username or password".to_string())
}

pub async fn login_form() -> impl IntoResponse {
    Html(LOGIN_FORM)
}

pub async fn register_form() -> impl IntoResponse {
    Html(REGISTER_FORM)
}

/// Registers a new user.
///
/// Hashes the password using Argon2 before storing it, then sends the
/// browser to the login page.
pub async fn register(
    State(state): State<AppState>,
    Form(payload): Form<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let hashed_password = hash_password(&payload.password)?;

    let user = state
        .store
        .create_user(&payload.username, &hashed_password)
        .await
        .map_err(|e| {
            tracing::warn!("Failed to register user '{}': {}", payload.username, e);
            AppError::from(e)
        })?;

    tracing::info!("Registered user {} '{}'", user.id, user.username);

    Ok(Redirect::to(LOGIN_PATH))
}

/// Authenticates a user and stores a signed JWT in the session cookie.
///
/// Redirects to `next` when it is a local path, otherwise to `/`.
pub async fn login(
    State(state): State<AppState>,
    Form(payload): Form<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let user = state
        .store
        .find_user_by_username(&payload.username)
        .await?
        .ok_or_else(invalid_credentials)?;

    if !verify_password(&payload.password, &user.password)? {
        return Err(invalid_credentials());
    }

    let token = sign_jwt(
        user.id,
        &user.username,
        &state.config.jwt_secret,
        state.config.jwt_expiration,
    )?;

    let cookie = session_cookie(&token, state.config.jwt_expiration);
    let target = safe_next(payload.next.as_deref());

    Ok(([(header::SET_COOKIE, cookie)], Redirect::to(target)))
}

/// Clears the session cookie.
pub async fn logout() -> impl IntoResponse {
    (
        [(header::SET_COOKIE, expired_session_cookie())],
        Redirect::to(LOGIN_PATH),
    )
}
