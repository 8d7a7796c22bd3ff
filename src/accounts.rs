//! Account lifecycle. Registration writes the user record and their diary
//! in one atomic batch, so `User.diaryId` and `Diary.userId` are mutual
//! inverses from the first moment either exists.

use crate::error::Error;
use crate::ports::identity::IdentityProvider;
use crate::ports::store::{DocumentStore, Fields, Query, WriteBatch, auto_id, decode, encode};
use crate::subscriptions::{load_diary, load_user};
use crate::types::{DiaryRecord, USERS, UserRecord, diary_path, requests_path, user_path};

use serde::Serialize;
use serde_json::json;

#[derive(Debug, Clone)]
pub struct Registration {
    pub email: String,
    pub secret: String,
    pub username: String,
    pub diary_title: String,
    pub diary_description: String,
    pub diary_language: String,
    pub diary_private: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub email: String,
    pub username: String,
    #[serde(rename = "diaryId")]
    pub diary_id: String,
    pub diary: DiaryRecord,
    #[serde(rename = "pendingRequests")]
    pub pending_requests: usize,
}

async fn username_taken(store: &dyn DocumentStore, username: &str) -> Result<bool, Error> {
    let matches = store
        .query(USERS, Query::field_equals("username", username).limit(1))
        .await?;
    Ok(!matches.is_empty())
}

/// Creates the credential, the user record, and the user's diary. The two
/// store documents land in one committed batch after the credential exists;
/// a failed commit leaves a credential without records, which a retried
/// registration reports as a taken email.
pub(crate) async fn register(
    store: &dyn DocumentStore,
    identity: &dyn IdentityProvider,
    registration: Registration,
) -> Result<String, Error> {
    let username = registration.username.trim();
    if username.is_empty() {
        return Err(Error::validation("username must not be empty"));
    }
    let diary_title = registration.diary_title.trim();
    if diary_title.is_empty() {
        return Err(Error::validation("diary title must not be empty"));
    }
    if username_taken(store, username).await? {
        return Err(Error::validation("username is already taken"));
    }

    let user_id = identity
        .register(&registration.email, &registration.secret)
        .await?;
    let diary_id = auto_id();

    let diary = DiaryRecord {
        user_id: user_id.clone(),
        title: diary_title.to_string(),
        description: registration.diary_description,
        language: registration.diary_language,
        private: registration.diary_private,
    };
    let user = UserRecord {
        email: registration.email,
        username: username.to_string(),
        diary_id: diary_id.clone(),
        subscriptions: Vec::new(),
    };
    store
        .commit(
            WriteBatch::new()
                .set(diary_path(&diary_id), encode(&diary)?)
                .set(user_path(&user_id), encode(&user)?),
        )
        .await?;
    Ok(user_id)
}

pub(crate) async fn profile(store: &dyn DocumentStore, user_id: &str) -> Result<Profile, Error> {
    let user = load_user(store, user_id).await?;
    let diary = load_diary(store, &user.diary_id).await?;
    let pending_requests = store
        .query(&requests_path(&user.diary_id), Query::all())
        .await?
        .len();
    Ok(Profile {
        user_id: user_id.to_string(),
        email: user.email,
        username: user.username,
        diary_id: user.diary_id,
        diary,
        pending_requests,
    })
}

/// Renames the account. Comments written before the rename keep the old
/// username; they captured it at write time on purpose.
pub(crate) async fn update_username(
    store: &dyn DocumentStore,
    user_id: &str,
    new_username: &str,
) -> Result<(), Error> {
    let new_username = new_username.trim();
    if new_username.is_empty() {
        return Err(Error::validation("username must not be empty"));
    }
    let user = load_user(store, user_id).await?;
    if user.username == new_username {
        return Err(Error::validation("that is already your username"));
    }
    if username_taken(store, new_username).await? {
        return Err(Error::validation("username is already taken"));
    }

    let mut fields = Fields::new();
    fields.insert("username".to_string(), json!(new_username));
    store.merge(&user_path(user_id), fields).await?;
    Ok(())
}

#[derive(Debug, Clone)]
pub struct DiarySettings {
    pub title: String,
    pub description: String,
    pub language: String,
    pub private: bool,
}

pub(crate) async fn update_diary(
    store: &dyn DocumentStore,
    user_id: &str,
    settings: DiarySettings,
) -> Result<(), Error> {
    let title = settings.title.trim();
    if title.is_empty() {
        return Err(Error::validation("diary title must not be empty"));
    }
    let user = load_user(store, user_id).await?;
    let mut diary = load_diary(store, &user.diary_id).await?;
    diary.title = title.to_string();
    diary.description = settings.description;
    diary.language = settings.language;
    diary.private = settings.private;
    store
        .set(&diary_path(&user.diary_id), encode(&diary)?)
        .await?;
    Ok(())
}
