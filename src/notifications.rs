//! Notification fan-out. One notification document per (subscriber, diary)
//! pair; a repeat publication merges into the existing document instead of
//! stacking, so each subscriber sees at most one marker per diary.

use crate::error::Error;
use crate::ports::mail::Mailer;
use crate::ports::store::{DocumentStore, Fields, Query, decode, encode};
use crate::types::{NotificationRecord, Timestamp, USERS, UserRecord, notification_path};

use futures::future::join_all;
use serde_json::json;

const DEFAULT_ENTRY_TITLE: &str = "New Entry";

/// Fans a fresh-entry notification out to every subscriber of the diary.
/// Strictly best-effort: the entry is already persisted when this runs, so
/// per-recipient failures are logged and skipped, and nothing is returned
/// to the author.
pub(crate) async fn on_entry_created(
    store: &dyn DocumentStore,
    mailer: &dyn Mailer,
    diary_id: &str,
    diary_title: &str,
    entry_title: Option<&str>,
    sender_id: &str,
    sender_username: &str,
    now: Timestamp,
) {
    let subscribers = match store
        .query(USERS, Query::array_contains("subscriptions", diary_id))
        .await
    {
        Ok(subscribers) => subscribers,
        Err(err) => {
            tracing::warn!(diary = diary_id, error = %err, "subscriber lookup failed, skipping fan-out");
            return;
        }
    };

    let title = entry_title
        .filter(|t| !t.trim().is_empty())
        .unwrap_or(DEFAULT_ENTRY_TITLE);
    let notification = NotificationRecord {
        diary_id: diary_id.to_string(),
        diary_title: title.to_string(),
        unread: true,
        sender: sender_id.to_string(),
        timestamp: now,
    };
    let fields = match encode(&notification) {
        Ok(fields) => fields,
        Err(err) => {
            tracing::warn!(diary = diary_id, error = %err, "notification encode failed, skipping fan-out");
            return;
        }
    };

    let writes = subscribers.iter().map(|(subscriber_id, _)| {
        let path = notification_path(subscriber_id, diary_id);
        let fields = fields.clone();
        async move {
            if let Err(err) = store.merge(&path, fields).await {
                tracing::warn!(recipient = %path, error = %err, "notification write failed");
            }
        }
    });
    join_all(writes).await;

    let recipients: Vec<String> = subscribers
        .into_iter()
        .filter_map(|(_, fields)| decode::<UserRecord>(fields).ok())
        .map(|user| user.email)
        .filter(|email| !email.is_empty())
        .collect();
    if !recipients.is_empty() {
        let subject = format!("{sender_username} wrote \"{title}\" in {diary_title}");
        let body = format!("{sender_username} published a new entry in {diary_title}.");
        if let Err(err) = mailer.send(&recipients, &subject, &body).await {
            tracing::warn!(diary = diary_id, error = %err, "notification mail failed");
        }
    }
}

/// Clears the unread marker for one (user, diary) pair. A pair that never
/// received a notification is left without a record.
pub(crate) async fn mark_read(
    store: &dyn DocumentStore,
    user_id: &str,
    diary_id: &str,
) -> Result<(), Error> {
    let path = notification_path(user_id, diary_id);
    if store.get(&path).await?.is_none() {
        return Ok(());
    }
    let mut fields = Fields::new();
    fields.insert("unread".to_string(), json!(false));
    store.merge(&path, fields).await?;
    Ok(())
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;
    use crate::adapters::{LogMailer, MemoryStore};
    use crate::types::user_path;

    async fn seed_subscriber(store: &MemoryStore, user_id: &str, username: &str, diary_id: &str) {
        let user = UserRecord {
            email: format!("{username}@example.com"),
            username: username.to_string(),
            diary_id: format!("own-{user_id}"),
            subscriptions: vec![diary_id.to_string()],
        };
        store
            .set(&user_path(user_id), encode(&user).expect("encode user"))
            .await
            .expect("seed user");
    }

    #[tokio::test]
    async fn on_entry_created__should_write_one_keyed_record_per_subscriber() {
        // Given
        let store = MemoryStore::new();
        for i in 0..3 {
            seed_subscriber(&store, &format!("u{i}"), &format!("user{i}"), "d1").await;
        }
        seed_subscriber(&store, "other", "outsider", "d9").await;

        // When
        on_entry_created(
            &store,
            &LogMailer,
            "d1",
            "Travel log",
            Some("Day 3"),
            "author-1",
            "ana",
            Timestamp::from_millis(1_000),
        )
        .await;

        // Then
        for i in 0..3 {
            let note: NotificationRecord = decode(
                store
                    .get(&notification_path(&format!("u{i}"), "d1"))
                    .await
                    .expect("get")
                    .expect("notification"),
            )
            .expect("decode");
            assert!(note.unread);
            assert_eq!(note.diary_title, "Day 3");
            assert_eq!(note.sender, "author-1");
        }
        assert!(
            store
                .get(&notification_path("other", "d1"))
                .await
                .expect("get")
                .is_none()
        );
    }

    #[tokio::test]
    async fn on_entry_created__should_merge_repeat_publications_into_one_record() {
        // Given
        let store = MemoryStore::new();
        seed_subscriber(&store, "u1", "user1", "d1").await;

        // When
        on_entry_created(&store, &LogMailer, "d1", "Log", Some("First"), "author-1", "ana", Timestamp::from_millis(1_000)).await;
        mark_read(&store, "u1", "d1").await.expect("mark read");
        on_entry_created(&store, &LogMailer, "d1", "Log", Some("Second"), "author-1", "ana", Timestamp::from_millis(2_000)).await;

        // Then
        let note: NotificationRecord = decode(
            store
                .get(&notification_path("u1", "d1"))
                .await
                .expect("get")
                .expect("notification"),
        )
        .expect("decode");
        assert!(note.unread);
        assert_eq!(note.diary_title, "Second");
        assert_eq!(note.timestamp, Timestamp::from_millis(2_000));
    }

    #[tokio::test]
    async fn on_entry_created__should_fall_back_to_a_default_title() {
        // Given
        let store = MemoryStore::new();
        seed_subscriber(&store, "u1", "user1", "d1").await;

        // When
        on_entry_created(&store, &LogMailer, "d1", "Log", None, "author-1", "ana", Timestamp::from_millis(1_000)).await;

        // Then
        let note: NotificationRecord = decode(
            store
                .get(&notification_path("u1", "d1"))
                .await
                .expect("get")
                .expect("notification"),
        )
        .expect("decode");
        assert_eq!(note.diary_title, "New Entry");
    }

    #[tokio::test]
    async fn mark_read__should_only_touch_existing_records() {
        // Given
        let store = MemoryStore::new();
        seed_subscriber(&store, "u1", "user1", "d1").await;
        on_entry_created(&store, &LogMailer, "d1", "Log", Some("Hi"), "author-1", "ana", Timestamp::from_millis(1_000)).await;

        // When
        mark_read(&store, "u1", "d1").await.expect("mark read");
        mark_read(&store, "u1", "d9").await.expect("mark absent");

        // Then
        let note: NotificationRecord = decode(
            store
                .get(&notification_path("u1", "d1"))
                .await
                .expect("get")
                .expect("notification"),
        )
        .expect("decode");
        assert!(!note.unread);
        assert!(
            store
                .get(&notification_path("u1", "d9"))
                .await
                .expect("get")
                .is_none()
        );
    }
}
