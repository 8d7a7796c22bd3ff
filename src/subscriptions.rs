//! Subscription ledger: the `subscriptions` array on the user record is the
//! single source of truth for who may read a private diary. Requests to
//! private diaries queue under the diary until the owner approves or
//! rejects them.

use crate::error::Error;
use crate::ports::store::{DocumentStore, Query, StoreError, WriteBatch, decode, encode};
use crate::types::{
    DiaryRecord, NotificationRecord, REQUEST_STATUS_PENDING, SubscriptionRequestRecord, USERS,
    UserRecord, diary_path, notification_path, request_path, requests_path, user_path,
};

use serde::Serialize;
use serde_json::json;

#[derive(Debug, Clone, Serialize)]
pub struct PendingRequest {
    pub id: String,
    #[serde(rename = "userId")]
    pub user_id: String,
    pub username: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Subscriber {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub username: String,
}

/// One diary the user is subscribed to, enriched for the subscription list.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionDetail {
    #[serde(rename = "diaryId")]
    pub diary_id: String,
    pub title: String,
    pub language: String,
    #[serde(rename = "ownerUsername")]
    pub owner_username: String,
    #[serde(rename = "hasUnreadEntries")]
    pub has_unread_entries: bool,
}

pub(crate) async fn load_diary(
    store: &dyn DocumentStore,
    diary_id: &str,
) -> Result<DiaryRecord, Error> {
    let fields = store
        .get(&diary_path(diary_id))
        .await?
        .ok_or(Error::NotFound("diary"))?;
    Ok(decode(fields)?)
}

pub(crate) async fn load_user(
    store: &dyn DocumentStore,
    user_id: &str,
) -> Result<UserRecord, Error> {
    let fields = store
        .get(&user_path(user_id))
        .await?
        .ok_or(Error::NotFound("user"))?;
    Ok(decode(fields)?)
}

/// Queues a pending request on a private diary. Requesting your own diary,
/// an already-subscribed diary, or a diary with a request already in flight
/// is rejected.
pub(crate) async fn request_subscription(
    store: &dyn DocumentStore,
    diary_id: &str,
    user_id: &str,
) -> Result<String, Error> {
    let diary = load_diary(store, diary_id).await?;
    if diary.user_id == user_id {
        return Err(Error::validation("you already own this diary"));
    }
    let user = load_user(store, user_id).await?;
    if user.subscriptions.iter().any(|id| id == diary_id) {
        return Err(Error::validation("already subscribed to this diary"));
    }

    let pending = store
        .query(
            &requests_path(diary_id),
            Query::field_equals("userId", user_id),
        )
        .await?;
    if !pending.is_empty() {
        return Err(Error::validation("a request for this diary is already pending"));
    }

    let request = SubscriptionRequestRecord {
        user_id: user_id.to_string(),
        username: user.username,
        status: REQUEST_STATUS_PENDING.to_string(),
    };
    let request_id = store
        .add(&requests_path(diary_id), encode(&request)?)
        .await?;
    Ok(request_id)
}

/// Grants the requested subscription and consumes the request in one atomic
/// batch, so no failure can leave a granted subscription with a live request
/// or vice versa.
pub(crate) async fn approve_subscription(
    store: &dyn DocumentStore,
    acting_user: &str,
    diary_id: &str,
    request_id: &str,
) -> Result<(), Error> {
    let diary = load_diary(store, diary_id).await?;
    if diary.user_id != acting_user {
        return Err(Error::Forbidden("only the diary owner can approve requests"));
    }

    let path = request_path(diary_id, request_id);
    let fields = store
        .get(&path)
        .await?
        .ok_or(Error::NotFound("subscription request"))?;
    let request: SubscriptionRequestRecord = decode(fields)?;
    // The requester's record must still exist for the array-union to land.
    load_user(store, &request.user_id).await?;

    store
        .commit(
            WriteBatch::new()
                .array_union(user_path(&request.user_id), "subscriptions", diary_id)
                .delete(path),
        )
        .await?;
    Ok(())
}

pub(crate) async fn reject_subscription(
    store: &dyn DocumentStore,
    acting_user: &str,
    diary_id: &str,
    request_id: &str,
) -> Result<(), Error> {
    let diary = load_diary(store, diary_id).await?;
    if diary.user_id != acting_user {
        return Err(Error::Forbidden("only the diary owner can reject requests"));
    }

    let path = request_path(diary_id, request_id);
    if store.get(&path).await?.is_none() {
        return Err(Error::NotFound("subscription request"));
    }
    store.delete(&path).await?;
    Ok(())
}

/// Direct subscription, available on public diaries only. Private diaries
/// go through the request queue.
pub(crate) async fn subscribe(
    store: &dyn DocumentStore,
    diary_id: &str,
    user_id: &str,
) -> Result<(), Error> {
    let diary = load_diary(store, diary_id).await?;
    if diary.user_id == user_id {
        return Err(Error::validation("you already own this diary"));
    }
    if diary.private {
        return Err(Error::Forbidden("this diary requires an approved request"));
    }
    store
        .array_union(&user_path(user_id), "subscriptions", json!(diary_id))
        .await?;
    Ok(())
}

pub(crate) async fn cancel_subscription(
    store: &dyn DocumentStore,
    diary_id: &str,
    user_id: &str,
) -> Result<(), Error> {
    store
        .array_remove(&user_path(user_id), "subscriptions", json!(diary_id))
        .await?;
    Ok(())
}

/// Owner-side removal of a reader; same ledger mutation as a reader-side
/// cancellation.
pub(crate) async fn remove_subscriber(
    store: &dyn DocumentStore,
    acting_user: &str,
    diary_id: &str,
    subscriber_id: &str,
) -> Result<(), Error> {
    let diary = load_diary(store, diary_id).await?;
    if diary.user_id != acting_user {
        return Err(Error::Forbidden("only the diary owner can remove readers"));
    }
    match store
        .array_remove(&user_path(subscriber_id), "subscriptions", json!(diary_id))
        .await
    {
        Ok(()) => Ok(()),
        Err(StoreError::NotFound(_)) => Err(Error::NotFound("user")),
        Err(err) => Err(err.into()),
    }
}

/// Whether `user_id` may read the diary: owners and everyone on a public
/// diary may, otherwise membership in the subscription ledger decides.
pub(crate) async fn is_authorized(
    store: &dyn DocumentStore,
    diary: &DiaryRecord,
    diary_id: &str,
    user_id: &str,
) -> Result<bool, Error> {
    if diary.user_id == user_id || !diary.private {
        return Ok(true);
    }
    let user = load_user(store, user_id).await?;
    Ok(user.subscriptions.iter().any(|id| id == diary_id))
}

pub(crate) async fn list_requests(
    store: &dyn DocumentStore,
    acting_user: &str,
    diary_id: &str,
) -> Result<Vec<PendingRequest>, Error> {
    let diary = load_diary(store, diary_id).await?;
    if diary.user_id != acting_user {
        return Err(Error::Forbidden("only the diary owner can list requests"));
    }

    let mut requests = Vec::new();
    for (id, fields) in store.query(&requests_path(diary_id), Query::all()).await? {
        let request: SubscriptionRequestRecord = decode(fields)?;
        requests.push(PendingRequest {
            id,
            user_id: request.user_id,
            username: request.username,
        });
    }
    Ok(requests)
}

pub(crate) async fn list_subscribers(
    store: &dyn DocumentStore,
    acting_user: &str,
    diary_id: &str,
) -> Result<Vec<Subscriber>, Error> {
    let diary = load_diary(store, diary_id).await?;
    if diary.user_id != acting_user {
        return Err(Error::Forbidden("only the diary owner can list readers"));
    }

    let mut subscribers = Vec::new();
    for (id, fields) in store
        .query(USERS, Query::array_contains("subscriptions", diary_id))
        .await?
    {
        let user: UserRecord = decode(fields)?;
        subscribers.push(Subscriber {
            user_id: id,
            username: user.username,
        });
    }
    Ok(subscribers)
}

/// The user's subscription list, diaries with unread activity first. The
/// sort is stable, so diaries with equal unread status keep their ledger
/// order.
pub(crate) async fn list_subscription_details(
    store: &dyn DocumentStore,
    user_id: &str,
) -> Result<Vec<SubscriptionDetail>, Error> {
    let user = load_user(store, user_id).await?;

    let mut details = Vec::new();
    for diary_id in &user.subscriptions {
        // A deleted diary may linger in the ledger; skip it.
        let Some(fields) = store.get(&diary_path(diary_id)).await? else {
            continue;
        };
        let diary: DiaryRecord = decode(fields)?;

        let owner_username = match store.get(&user_path(&diary.user_id)).await? {
            Some(fields) => decode::<UserRecord>(fields)?.username,
            None => "Unknown User".to_string(),
        };

        let has_unread_entries = match store.get(&notification_path(user_id, diary_id)).await? {
            Some(fields) => decode::<NotificationRecord>(fields)?.unread,
            None => false,
        };

        details.push(SubscriptionDetail {
            diary_id: diary_id.clone(),
            title: diary.title,
            language: diary.language,
            owner_username,
            has_unread_entries,
        });
    }

    details.sort_by_key(|detail| !detail.has_unread_entries);
    Ok(details)
}
