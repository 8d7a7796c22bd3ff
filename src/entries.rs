//! Diary entries and the engagement attached to them: likes on the entry's
//! `likedBy` array and denormalized comments in the entry's subcollection.

use crate::error::Error;
use crate::ports::store::{DocumentStore, Query, decode, encode};
use crate::subscriptions::{load_diary, load_user};
use crate::types::{
    CommentRecord, EntryRecord, Timestamp, comment_path, comments_path, entries_path, entry_path,
};

use serde::Serialize;
use serde_json::json;

#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    pub id: String,
    #[serde(rename = "userId")]
    pub user_id: String,
    pub username: String,
    pub text: String,
    pub timestamp: Timestamp,
}

#[derive(Debug, Clone, Serialize)]
pub struct EntryView {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub content: String,
    pub date: Timestamp,
    #[serde(rename = "likedBy")]
    pub liked_by: Vec<String>,
    pub comments: Vec<CommentView>,
}

fn normalized_title(title: Option<String>) -> Option<String> {
    title.and_then(|t| {
        let trimmed = t.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// Persists a new entry with a server-assigned timestamp. Notification
/// fan-out happens after this returns and never affects its outcome.
pub(crate) async fn create_entry(
    store: &dyn DocumentStore,
    acting_user: &str,
    diary_id: &str,
    title: Option<String>,
    content: &str,
    now: Timestamp,
) -> Result<String, Error> {
    let diary = load_diary(store, diary_id).await?;
    if diary.user_id != acting_user {
        return Err(Error::Forbidden("only the diary owner can write entries"));
    }
    if content.trim().is_empty() {
        return Err(Error::validation("entry content must not be empty"));
    }

    let entry = EntryRecord {
        title: normalized_title(title),
        content: content.to_string(),
        date: now,
        liked_by: Vec::new(),
    };
    let entry_id = store.add(&entries_path(diary_id), encode(&entry)?).await?;
    Ok(entry_id)
}

/// Rewrites title and content in place; the original date and the collected
/// likes stay untouched.
pub(crate) async fn update_entry(
    store: &dyn DocumentStore,
    acting_user: &str,
    diary_id: &str,
    entry_id: &str,
    title: Option<String>,
    content: &str,
) -> Result<(), Error> {
    let diary = load_diary(store, diary_id).await?;
    if diary.user_id != acting_user {
        return Err(Error::Forbidden("only the diary owner can edit entries"));
    }
    if content.trim().is_empty() {
        return Err(Error::validation("entry content must not be empty"));
    }

    let path = entry_path(diary_id, entry_id);
    let mut entry: EntryRecord = decode(store.get(&path).await?.ok_or(Error::NotFound("entry"))?)?;
    entry.title = normalized_title(title);
    entry.content = content.to_string();
    store.set(&path, encode(&entry)?).await?;
    Ok(())
}

/// Removes the entry document. Comments and corrections under it are left
/// behind; the store does not cascade deletes.
pub(crate) async fn delete_entry(
    store: &dyn DocumentStore,
    acting_user: &str,
    diary_id: &str,
    entry_id: &str,
) -> Result<(), Error> {
    let diary = load_diary(store, diary_id).await?;
    if diary.user_id != acting_user {
        return Err(Error::Forbidden("only the diary owner can delete entries"));
    }
    let path = entry_path(diary_id, entry_id);
    if store.get(&path).await?.is_none() {
        return Err(Error::NotFound("entry"));
    }
    store.delete(&path).await?;
    Ok(())
}

/// Adds or removes the user's like. The membership check picks the
/// direction; the mutation itself is an atomic array operation, so
/// concurrent likers cannot overwrite each other.
pub(crate) async fn toggle_like(
    store: &dyn DocumentStore,
    diary_id: &str,
    entry_id: &str,
    user_id: &str,
) -> Result<bool, Error> {
    let path = entry_path(diary_id, entry_id);
    let entry: EntryRecord = decode(store.get(&path).await?.ok_or(Error::NotFound("entry"))?)?;

    if entry.liked_by.iter().any(|id| id == user_id) {
        store.array_remove(&path, "likedBy", json!(user_id)).await?;
        Ok(false)
    } else {
        store.array_union(&path, "likedBy", json!(user_id)).await?;
        Ok(true)
    }
}

/// Appends a comment with the author's username captured at write time.
/// Whitespace-only text is silently dropped, matching the submit behavior
/// of the entry view.
pub(crate) async fn add_comment(
    store: &dyn DocumentStore,
    acting_user: &str,
    diary_id: &str,
    entry_id: &str,
    text: &str,
    now: Timestamp,
) -> Result<Option<String>, Error> {
    if text.trim().is_empty() {
        return Ok(None);
    }
    let path = entry_path(diary_id, entry_id);
    if store.get(&path).await?.is_none() {
        return Err(Error::NotFound("entry"));
    }

    let username = match load_user(store, acting_user).await {
        Ok(user) => user.username,
        Err(Error::NotFound(_)) => "Anonymous".to_string(),
        Err(err) => return Err(err),
    };
    let comment = CommentRecord {
        user_id: acting_user.to_string(),
        username,
        text: text.to_string(),
        timestamp: now,
    };
    let comment_id = store
        .add(&comments_path(diary_id, entry_id), encode(&comment)?)
        .await?;
    Ok(Some(comment_id))
}

pub(crate) async fn delete_comment(
    store: &dyn DocumentStore,
    acting_user: &str,
    diary_id: &str,
    entry_id: &str,
    comment_id: &str,
) -> Result<(), Error> {
    let path = comment_path(diary_id, entry_id, comment_id);
    let comment: CommentRecord =
        decode(store.get(&path).await?.ok_or(Error::NotFound("comment"))?)?;
    if comment.user_id != acting_user {
        return Err(Error::Forbidden("only the comment author can delete it"));
    }
    store.delete(&path).await?;
    Ok(())
}

/// Entries newest first, each with its comments oldest first. Entries that
/// never got a date are excluded by the store's ordering contract.
pub(crate) async fn list_entries(
    store: &dyn DocumentStore,
    diary_id: &str,
) -> Result<Vec<EntryView>, Error> {
    let mut views = Vec::new();
    for (entry_id, fields) in store
        .query(&entries_path(diary_id), Query::all().order_by_desc("date"))
        .await?
    {
        let entry: EntryRecord = decode(fields)?;
        let mut comments = Vec::new();
        for (comment_id, fields) in store
            .query(
                &comments_path(diary_id, &entry_id),
                Query::all().order_by_asc("timestamp"),
            )
            .await?
        {
            let comment: CommentRecord = decode(fields)?;
            comments.push(CommentView {
                id: comment_id,
                user_id: comment.user_id,
                username: comment.username,
                text: comment.text,
                timestamp: comment.timestamp,
            });
        }
        views.push(EntryView {
            id: entry_id,
            title: entry.title,
            content: entry.content,
            date: entry.date,
            liked_by: entry.liked_by,
            comments,
        });
    }
    Ok(views)
}
