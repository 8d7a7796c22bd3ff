use crate::accounts;
use crate::auth::Session;
use crate::corrections;
use crate::entries;
use crate::error::Error;
use crate::notifications;
use crate::state;
use crate::subscriptions;
use crate::types::DiaryRecord;

use axum::Extension;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::Deserialize;
use serde::Serialize;

#[derive(Serialize)]
pub(crate) struct DiaryResponse {
    #[serde(rename = "diaryId")]
    diary_id: String,
    diary: DiaryRecord,
    entries: Vec<entries::EntryView>,
}

#[derive(Serialize)]
pub(crate) struct OwnDiaryResponse {
    #[serde(flatten)]
    diary: DiaryResponse,
    #[serde(rename = "unreadCorrectionEntries")]
    unread_correction_entries: Vec<String>,
    subscriptions: Vec<subscriptions::SubscriptionDetail>,
}

/// The owner's dashboard: their entries, the entries flagged with unread
/// corrections, and their subscription list.
pub(crate) async fn own_diary(
    State(state): State<state::AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<OwnDiaryResponse>, Error> {
    let store = state.store.as_ref();
    let user = subscriptions::load_user(store, &session.user_id).await?;
    let diary = subscriptions::load_diary(store, &user.diary_id).await?;
    let entries = entries::list_entries(store, &user.diary_id).await?;
    let unread_correction_entries =
        corrections::unread_correction_entries(store, &user.diary_id).await?;
    let details = subscriptions::list_subscription_details(store, &session.user_id).await?;
    Ok(Json(OwnDiaryResponse {
        diary: DiaryResponse {
            diary_id: user.diary_id,
            diary,
            entries,
        },
        unread_correction_entries,
        subscriptions: details,
    }))
}

#[derive(Debug, Deserialize)]
pub(crate) struct DiarySettingsRequest {
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    language: String,
    private: bool,
}

pub(crate) async fn update_diary(
    State(state): State<state::AppState>,
    Extension(session): Extension<Session>,
    Json(request): Json<DiarySettingsRequest>,
) -> Result<StatusCode, Error> {
    accounts::update_diary(
        state.store.as_ref(),
        &session.user_id,
        accounts::DiarySettings {
            title: request.title,
            description: request.description,
            language: request.language,
            private: request.private,
        },
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Reader view of another diary. Opening it consumes the viewer's unread
/// notification for that diary.
pub(crate) async fn view_diary(
    State(state): State<state::AppState>,
    Extension(session): Extension<Session>,
    Path(diary_id): Path<String>,
) -> Result<Json<DiaryResponse>, Error> {
    let store = state.store.as_ref();
    let diary = subscriptions::load_diary(store, &diary_id).await?;
    if !subscriptions::is_authorized(store, &diary, &diary_id, &session.user_id).await? {
        return Err(Error::Forbidden("this diary is private"));
    }
    let entries = entries::list_entries(store, &diary_id).await?;
    notifications::mark_read(store, &session.user_id, &diary_id).await?;
    Ok(Json(DiaryResponse {
        diary_id,
        diary,
        entries,
    }))
}

pub(crate) async fn subscribe(
    State(state): State<state::AppState>,
    Extension(session): Extension<Session>,
    Path(diary_id): Path<String>,
) -> Result<StatusCode, Error> {
    subscriptions::subscribe(state.store.as_ref(), &diary_id, &session.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn unsubscribe(
    State(state): State<state::AppState>,
    Extension(session): Extension<Session>,
    Path(diary_id): Path<String>,
) -> Result<StatusCode, Error> {
    subscriptions::cancel_subscription(state.store.as_ref(), &diary_id, &session.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Serialize)]
pub(crate) struct RequestCreatedResponse {
    #[serde(rename = "requestId")]
    request_id: String,
}

pub(crate) async fn request_subscription(
    State(state): State<state::AppState>,
    Extension(session): Extension<Session>,
    Path(diary_id): Path<String>,
) -> Result<Json<RequestCreatedResponse>, Error> {
    let request_id =
        subscriptions::request_subscription(state.store.as_ref(), &diary_id, &session.user_id)
            .await?;
    Ok(Json(RequestCreatedResponse { request_id }))
}

pub(crate) async fn list_requests(
    State(state): State<state::AppState>,
    Extension(session): Extension<Session>,
    Path(diary_id): Path<String>,
) -> Result<Json<Vec<subscriptions::PendingRequest>>, Error> {
    let requests =
        subscriptions::list_requests(state.store.as_ref(), &session.user_id, &diary_id).await?;
    Ok(Json(requests))
}

pub(crate) async fn approve_request(
    State(state): State<state::AppState>,
    Extension(session): Extension<Session>,
    Path((diary_id, request_id)): Path<(String, String)>,
) -> Result<StatusCode, Error> {
    subscriptions::approve_subscription(
        state.store.as_ref(),
        &session.user_id,
        &diary_id,
        &request_id,
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn reject_request(
    State(state): State<state::AppState>,
    Extension(session): Extension<Session>,
    Path((diary_id, request_id)): Path<(String, String)>,
) -> Result<StatusCode, Error> {
    subscriptions::reject_subscription(
        state.store.as_ref(),
        &session.user_id,
        &diary_id,
        &request_id,
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn list_subscribers(
    State(state): State<state::AppState>,
    Extension(session): Extension<Session>,
    Path(diary_id): Path<String>,
) -> Result<Json<Vec<subscriptions::Subscriber>>, Error> {
    let subscribers =
        subscriptions::list_subscribers(state.store.as_ref(), &session.user_id, &diary_id).await?;
    Ok(Json(subscribers))
}

pub(crate) async fn remove_subscriber(
    State(state): State<state::AppState>,
    Extension(session): Extension<Session>,
    Path((diary_id, subscriber_id)): Path<(String, String)>,
) -> Result<StatusCode, Error> {
    subscriptions::remove_subscriber(
        state.store.as_ref(),
        &session.user_id,
        &diary_id,
        &subscriber_id,
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn list_subscriptions(
    State(state): State<state::AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<Vec<subscriptions::SubscriptionDetail>>, Error> {
    let details =
        subscriptions::list_subscription_details(state.store.as_ref(), &session.user_id).await?;
    Ok(Json(details))
}
