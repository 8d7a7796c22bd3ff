use crate::auth::Session;
use crate::entries;
use crate::error::Error;
use crate::notifications;
use crate::state;
use crate::subscriptions;
use crate::types::Timestamp;

use axum::Extension;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Deserialize)]
pub(crate) struct EntryRequest {
    #[serde(default)]
    title: Option<String>,
    content: String,
}

#[derive(Serialize)]
pub(crate) struct EntryCreatedResponse {
    #[serde(rename = "entryId")]
    entry_id: String,
}

/// Writes the entry into the author's own diary, then fans notifications
/// out to subscribers. The entry is committed before fan-out starts, so a
/// fan-out failure can only cost notifications, never the entry.
pub(crate) async fn create_entry(
    State(state): State<state::AppState>,
    Extension(session): Extension<Session>,
    Json(request): Json<EntryRequest>,
) -> Result<Json<EntryCreatedResponse>, Error> {
    let store = state.store.as_ref();
    let user = subscriptions::load_user(store, &session.user_id).await?;
    let diary = subscriptions::load_diary(store, &user.diary_id).await?;
    let now = Timestamp::from_datetime(state.clock.now());

    let entry_id = entries::create_entry(
        store,
        &session.user_id,
        &user.diary_id,
        request.title.clone(),
        &request.content,
        now,
    )
    .await?;

    notifications::on_entry_created(
        store,
        state.mailer.as_ref(),
        &user.diary_id,
        &diary.title,
        request.title.as_deref(),
        &session.user_id,
        &user.username,
        now,
    )
    .await;

    Ok(Json(EntryCreatedResponse { entry_id }))
}

pub(crate) async fn update_entry(
    State(state): State<state::AppState>,
    Extension(session): Extension<Session>,
    Path(entry_id): Path<String>,
    Json(request): Json<EntryRequest>,
) -> Result<StatusCode, Error> {
    let store = state.store.as_ref();
    let user = subscriptions::load_user(store, &session.user_id).await?;
    entries::update_entry(
        store,
        &session.user_id,
        &user.diary_id,
        &entry_id,
        request.title,
        &request.content,
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn delete_entry(
    State(state): State<state::AppState>,
    Extension(session): Extension<Session>,
    Path(entry_id): Path<String>,
) -> Result<StatusCode, Error> {
    let store = state.store.as_ref();
    let user = subscriptions::load_user(store, &session.user_id).await?;
    entries::delete_entry(store, &session.user_id, &user.diary_id, &entry_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Serialize)]
pub(crate) struct LikeResponse {
    liked: bool,
}

pub(crate) async fn toggle_like(
    State(state): State<state::AppState>,
    Extension(session): Extension<Session>,
    Path((diary_id, entry_id)): Path<(String, String)>,
) -> Result<Json<LikeResponse>, Error> {
    let store = state.store.as_ref();
    let diary = subscriptions::load_diary(store, &diary_id).await?;
    if !subscriptions::is_authorized(store, &diary, &diary_id, &session.user_id).await? {
        return Err(Error::Forbidden("this diary is private"));
    }
    let liked = entries::toggle_like(store, &diary_id, &entry_id, &session.user_id).await?;
    Ok(Json(LikeResponse { liked }))
}

#[derive(Debug, Deserialize)]
pub(crate) struct CommentRequest {
    text: String,
}

#[derive(Serialize)]
pub(crate) struct CommentCreatedResponse {
    #[serde(rename = "commentId")]
    comment_id: Option<String>,
}

pub(crate) async fn add_comment(
    State(state): State<state::AppState>,
    Extension(session): Extension<Session>,
    Path((diary_id, entry_id)): Path<(String, String)>,
    Json(request): Json<CommentRequest>,
) -> Result<Json<CommentCreatedResponse>, Error> {
    let store = state.store.as_ref();
    let diary = subscriptions::load_diary(store, &diary_id).await?;
    if !subscriptions::is_authorized(store, &diary, &diary_id, &session.user_id).await? {
        return Err(Error::Forbidden("this diary is private"));
    }
    let now = Timestamp::from_datetime(state.clock.now());
    let comment_id = entries::add_comment(
        store,
        &session.user_id,
        &diary_id,
        &entry_id,
        &request.text,
        now,
    )
    .await?;
    Ok(Json(CommentCreatedResponse { comment_id }))
}

pub(crate) async fn delete_comment(
    State(state): State<state::AppState>,
    Extension(session): Extension<Session>,
    Path((diary_id, entry_id, comment_id)): Path<(String, String, String)>,
) -> Result<StatusCode, Error> {
    entries::delete_comment(
        state.store.as_ref(),
        &session.user_id,
        &diary_id,
        &entry_id,
        &comment_id,
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}
