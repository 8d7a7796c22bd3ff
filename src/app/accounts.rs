use crate::accounts;
use crate::auth::Session;
use crate::error::Error;
use crate::ports::store::StoreError;
use crate::state;

use axum::Extension;
use axum::Json;
use axum::extract::State;
use axum::http::HeaderValue;
use axum::http::StatusCode;
use axum::http::header::SET_COOKIE;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Deserialize)]
pub(crate) struct RegisterRequest {
    email: String,
    password: String,
    username: String,
    #[serde(rename = "diaryTitle")]
    diary_title: String,
    #[serde(rename = "diaryDescription", default)]
    diary_description: String,
    #[serde(rename = "diaryLanguage", default)]
    diary_language: String,
    #[serde(rename = "diaryPrivate", default = "default_private")]
    diary_private: bool,
}

fn default_private() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Serialize)]
pub(crate) struct SessionResponse {
    token: String,
    #[serde(rename = "userId")]
    user_id: String,
}

fn session_response(state: &state::AppState, user_id: String) -> Result<Response, Error> {
    let token = state
        .auth
        .issue_token(&user_id)
        .map_err(|err| StoreError::Backend(err.to_string()))?;
    let cookie = state.auth.auth_cookie(&token);
    let mut response = Json(SessionResponse { token, user_id }).into_response();
    response.headers_mut().append(
        SET_COOKIE,
        HeaderValue::from_str(&cookie).map_err(|err| StoreError::Backend(err.to_string()))?,
    );
    Ok(response)
}

pub(crate) async fn register(
    State(state): State<state::AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<Response, Error> {
    let user_id = accounts::register(
        state.store.as_ref(),
        state.identity.as_ref(),
        accounts::Registration {
            email: request.email,
            secret: request.password,
            username: request.username,
            diary_title: request.diary_title,
            diary_description: request.diary_description,
            diary_language: request.diary_language,
            diary_private: request.diary_private,
        },
    )
    .await?;
    session_response(&state, user_id)
}

pub(crate) async fn login(
    State(state): State<state::AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Response, Error> {
    let user_id = state
        .identity
        .sign_in(&request.email, &request.password)
        .await?;
    session_response(&state, user_id)
}

pub(crate) async fn logout(State(state): State<state::AppState>) -> Result<Response, Error> {
    let cookie = state.auth.clear_cookie();
    let mut response = StatusCode::NO_CONTENT.into_response();
    response.headers_mut().append(
        SET_COOKIE,
        HeaderValue::from_str(&cookie).map_err(|err| StoreError::Backend(err.to_string()))?,
    );
    Ok(response)
}

pub(crate) async fn me(
    State(state): State<state::AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<accounts::Profile>, Error> {
    let profile = accounts::profile(state.store.as_ref(), &session.user_id).await?;
    Ok(Json(profile))
}

#[derive(Debug, Deserialize)]
pub(crate) struct UsernameRequest {
    username: String,
}

pub(crate) async fn update_username(
    State(state): State<state::AppState>,
    Extension(session): Extension<Session>,
    Json(request): Json<UsernameRequest>,
) -> Result<StatusCode, Error> {
    accounts::update_username(state.store.as_ref(), &session.user_id, &request.username).await?;
    Ok(StatusCode::NO_CONTENT)
}
