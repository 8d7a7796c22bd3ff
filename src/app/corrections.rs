use crate::auth::Session;
use crate::corrections;
use crate::error::Error;
use crate::state;
use crate::subscriptions;
use crate::ports::store::decode;
use crate::types::{CorrectionRecord, EntryRecord, Timestamp, entry_path};

use axum::Extension;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::Deserialize;
use serde::Serialize;

#[derive(Serialize)]
pub(crate) struct MyCorrectionResponse {
    #[serde(rename = "diaryId")]
    diary_id: String,
    #[serde(rename = "entryContent")]
    entry_content: String,
    correction: Option<CorrectionRecord>,
}

/// The corrector's view of an entry: the text to correct and their own
/// correction so far. Corrector routes carry only the entry id; the owning
/// diary is located by scanning.
pub(crate) async fn my_correction(
    State(state): State<state::AppState>,
    Extension(session): Extension<Session>,
    Path(entry_id): Path<String>,
) -> Result<Json<MyCorrectionResponse>, Error> {
    let store = state.store.as_ref();
    let (diary_id, diary) = corrections::find_entry_diary(store, &entry_id).await?;
    if !subscriptions::is_authorized(store, &diary, &diary_id, &session.user_id).await? {
        return Err(Error::Forbidden("this diary is private"));
    }
    let entry: EntryRecord = decode(
        store
            .get(&entry_path(&diary_id, &entry_id))
            .await?
            .ok_or(Error::NotFound("entry"))?,
    )?;
    let correction =
        corrections::my_correction(store, &diary_id, &entry_id, &session.user_id).await?;
    Ok(Json(MyCorrectionResponse {
        diary_id,
        entry_content: entry.content,
        correction,
    }))
}

#[derive(Debug, Deserialize)]
pub(crate) struct CorrectionRequest {
    content: String,
}

pub(crate) async fn save_correction(
    State(state): State<state::AppState>,
    Extension(session): Extension<Session>,
    Path(entry_id): Path<String>,
    Json(request): Json<CorrectionRequest>,
) -> Result<StatusCode, Error> {
    let store = state.store.as_ref();
    let (diary_id, diary) = corrections::find_entry_diary(store, &entry_id).await?;
    if !subscriptions::is_authorized(store, &diary, &diary_id, &session.user_id).await? {
        return Err(Error::Forbidden("this diary is private"));
    }
    let now = Timestamp::from_datetime(state.clock.now());
    corrections::save_correction(
        store,
        &diary_id,
        &entry_id,
        &session.user_id,
        &request.content,
        now,
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn list_corrections(
    State(state): State<state::AppState>,
    Extension(session): Extension<Session>,
    Path(entry_id): Path<String>,
) -> Result<Json<Vec<corrections::CorrectionView>>, Error> {
    let store = state.store.as_ref();
    let (diary_id, _) = corrections::find_entry_diary(store, &entry_id).await?;
    let views = corrections::list_corrections(store, &session.user_id, &diary_id, &entry_id).await?;
    Ok(Json(views))
}

pub(crate) async fn mark_correction_read(
    State(state): State<state::AppState>,
    Extension(session): Extension<Session>,
    Path((entry_id, correction_id)): Path<(String, String)>,
) -> Result<StatusCode, Error> {
    let store = state.store.as_ref();
    let (diary_id, _) = corrections::find_entry_diary(store, &entry_id).await?;
    corrections::mark_correction_read(
        store,
        &session.user_id,
        &diary_id,
        &entry_id,
        &correction_id,
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}
