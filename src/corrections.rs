//! Peer corrections. Each corrector holds exactly one correction slot per
//! entry, keyed by their user id, so resubmitting replaces in place. The
//! `read` flag only ever flips false to true.

use crate::error::Error;
use crate::ports::store::{DocumentStore, Fields, Query, decode, encode};
use crate::subscriptions::load_diary;
use crate::types::{
    CorrectionRecord, DIARIES, DiaryRecord, Timestamp, UserRecord, correction_path,
    corrections_path, entries_path, entry_path, user_path,
};

use serde::Serialize;
use serde_json::json;

#[derive(Debug, Clone, Serialize)]
pub struct CorrectionView {
    /// Corrector user id; doubles as the document id.
    pub id: String,
    pub content: String,
    #[serde(rename = "correctorUsername")]
    pub corrector_username: String,
    #[serde(rename = "correctedAt")]
    pub corrected_at: Timestamp,
    pub read: bool,
}

/// Locates the diary containing an entry by scanning every diary. Corrector
/// routes address entries without a diary id, so there is nothing better to
/// key on. Linear in the number of diaries.
pub(crate) async fn find_entry_diary(
    store: &dyn DocumentStore,
    entry_id: &str,
) -> Result<(String, DiaryRecord), Error> {
    for (diary_id, fields) in store.query(DIARIES, Query::all()).await? {
        if store.get(&entry_path(&diary_id, entry_id)).await?.is_some() {
            return Ok((diary_id, decode(fields)?));
        }
    }
    Err(Error::NotFound("entry"))
}

/// Saves or replaces the corrector's correction for an entry. The write is a
/// merge keyed by corrector id: content and timestamp are replaced, an
/// existing `read` flag is left as the owner set it.
pub(crate) async fn save_correction(
    store: &dyn DocumentStore,
    diary_id: &str,
    entry_id: &str,
    corrector_id: &str,
    content: &str,
    now: Timestamp,
) -> Result<(), Error> {
    if content.trim().is_empty() {
        return Err(Error::validation("correction content must not be empty"));
    }
    if store.get(&entry_path(diary_id, entry_id)).await?.is_none() {
        return Err(Error::NotFound("entry"));
    }

    let mut fields = Fields::new();
    fields.insert("content".to_string(), json!(content));
    fields.insert("correctedBy".to_string(), json!(corrector_id));
    fields.insert("correctedAt".to_string(), json!(now.as_millis()));
    store
        .merge(&correction_path(diary_id, entry_id, corrector_id), fields)
        .await?;
    Ok(())
}

/// The corrector's own correction for an entry, if any.
pub(crate) async fn my_correction(
    store: &dyn DocumentStore,
    diary_id: &str,
    entry_id: &str,
    corrector_id: &str,
) -> Result<Option<CorrectionRecord>, Error> {
    match store
        .get(&correction_path(diary_id, entry_id, corrector_id))
        .await?
    {
        Some(fields) => Ok(Some(decode(fields)?)),
        None => Ok(None),
    }
}

/// All corrections on an entry with corrector usernames joined in.
/// Owner-only: corrections are feedback to the author, not a public thread.
pub(crate) async fn list_corrections(
    store: &dyn DocumentStore,
    acting_user: &str,
    diary_id: &str,
    entry_id: &str,
) -> Result<Vec<CorrectionView>, Error> {
    let diary = load_diary(store, diary_id).await?;
    if diary.user_id != acting_user {
        return Err(Error::Forbidden("only the diary owner can read corrections"));
    }

    let mut views = Vec::new();
    for (correction_id, fields) in store
        .query(&corrections_path(diary_id, entry_id), Query::all())
        .await?
    {
        let correction: CorrectionRecord = decode(fields)?;
        let corrector_username = match store.get(&user_path(&correction.corrected_by)).await? {
            Some(fields) => decode::<UserRecord>(fields)?.username,
            None => "Unknown User".to_string(),
        };
        views.push(CorrectionView {
            id: correction_id,
            content: correction.content,
            corrector_username,
            corrected_at: correction.corrected_at,
            read: correction.read,
        });
    }
    Ok(views)
}

/// One-way flip of the read flag, allowed for the diary owner only.
pub(crate) async fn mark_correction_read(
    store: &dyn DocumentStore,
    acting_user: &str,
    diary_id: &str,
    entry_id: &str,
    correction_id: &str,
) -> Result<(), Error> {
    let diary = load_diary(store, diary_id).await?;
    if diary.user_id != acting_user {
        return Err(Error::Forbidden("only the diary owner can triage corrections"));
    }

    let path = correction_path(diary_id, entry_id, correction_id);
    if store.get(&path).await?.is_none() {
        return Err(Error::NotFound("correction"));
    }
    let mut fields = Fields::new();
    fields.insert("read".to_string(), json!(true));
    store.merge(&path, fields).await?;
    Ok(())
}

/// Ids of entries carrying at least one unread correction. Scans every
/// entry's correction subcollection; fine at diary scale, revisit if a
/// denormalized counter ever lands on the entry.
pub(crate) async fn unread_correction_entries(
    store: &dyn DocumentStore,
    diary_id: &str,
) -> Result<Vec<String>, Error> {
    let mut entry_ids = Vec::new();
    for (entry_id, _) in store.query(&entries_path(diary_id), Query::all()).await? {
        let corrections = store
            .query(&corrections_path(diary_id, &entry_id), Query::all())
            .await?;
        let mut unread = false;
        for (_, fields) in corrections {
            let correction: CorrectionRecord = decode(fields)?;
            if !correction.read {
                unread = true;
                break;
            }
        }
        if unread {
            entry_ids.push(entry_id);
        }
    }
    Ok(entry_ids)
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;
    use crate::adapters::MemoryStore;
    use crate::types::{EntryRecord, diary_path};

    async fn seed_world(store: &MemoryStore) {
        let owner = UserRecord {
            email: "ana@example.com".to_string(),
            username: "ana".to_string(),
            diary_id: "d1".to_string(),
            subscriptions: Vec::new(),
        };
        store
            .set(&user_path("owner"), encode(&owner).expect("encode"))
            .await
            .expect("seed owner");
        let corrector = UserRecord {
            email: "ben@example.com".to_string(),
            username: "ben".to_string(),
            diary_id: "d2".to_string(),
            subscriptions: vec!["d1".to_string()],
        };
        store
            .set(&user_path("corrector"), encode(&corrector).expect("encode"))
            .await
            .expect("seed corrector");
        let diary = DiaryRecord {
            user_id: "owner".to_string(),
            title: "Notebook".to_string(),
            description: String::new(),
            language: "en".to_string(),
            private: true,
        };
        store
            .set(&diary_path("d1"), encode(&diary).expect("encode"))
            .await
            .expect("seed diary");
        let entry = EntryRecord {
            title: None,
            content: "Halo world".to_string(),
            date: Timestamp::from_millis(1_000),
            liked_by: Vec::new(),
        };
        store
            .set(&entry_path("d1", "e1"), encode(&entry).expect("encode"))
            .await
            .expect("seed entry");
    }

    #[tokio::test]
    async fn find_entry_diary__should_locate_the_owning_diary() {
        // Given
        let store = MemoryStore::new();
        seed_world(&store).await;

        // When
        let (diary_id, diary) = find_entry_diary(&store, "e1").await.expect("found");
        let missing = find_entry_diary(&store, "nope").await;

        // Then
        assert_eq!(diary_id, "d1");
        assert_eq!(diary.user_id, "owner");
        assert!(matches!(missing, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn save_correction__should_replace_in_place_per_corrector() {
        // Given
        let store = MemoryStore::new();
        seed_world(&store).await;

        // When
        save_correction(&store, "d1", "e1", "corrector", "Hello world", Timestamp::from_millis(2_000))
            .await
            .expect("first save");
        save_correction(&store, "d1", "e1", "corrector", "Hello, world", Timestamp::from_millis(3_000))
            .await
            .expect("second save");

        // Then
        let corrections = store
            .query(&corrections_path("d1", "e1"), Query::all())
            .await
            .expect("query");
        assert_eq!(corrections.len(), 1);
        let saved = my_correction(&store, "d1", "e1", "corrector")
            .await
            .expect("load")
            .expect("correction");
        assert_eq!(saved.content, "Hello, world");
        assert_eq!(saved.corrected_at, Timestamp::from_millis(3_000));
        assert_eq!(saved.corrected_by, "corrector");
    }

    #[tokio::test]
    async fn save_correction__should_preserve_a_read_flag_on_resubmission() {
        // Given
        let store = MemoryStore::new();
        seed_world(&store).await;
        save_correction(&store, "d1", "e1", "corrector", "v1", Timestamp::from_millis(2_000))
            .await
            .expect("save");
        mark_correction_read(&store, "owner", "d1", "e1", "corrector")
            .await
            .expect("mark read");

        // When
        save_correction(&store, "d1", "e1", "corrector", "v2", Timestamp::from_millis(3_000))
            .await
            .expect("resubmit");

        // Then
        let saved = my_correction(&store, "d1", "e1", "corrector")
            .await
            .expect("load")
            .expect("correction");
        assert_eq!(saved.content, "v2");
        assert!(saved.read);
    }

    #[tokio::test]
    async fn save_correction__should_reject_blank_content_and_missing_entries() {
        // Given
        let store = MemoryStore::new();
        seed_world(&store).await;

        // When
        let blank =
            save_correction(&store, "d1", "e1", "corrector", "  ", Timestamp::from_millis(2_000)).await;
        let missing =
            save_correction(&store, "d1", "nope", "corrector", "text", Timestamp::from_millis(2_000))
                .await;

        // Then
        assert!(matches!(blank, Err(Error::Validation(_))));
        assert!(matches!(missing, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn list_corrections__should_join_usernames_for_the_owner_only() {
        // Given
        let store = MemoryStore::new();
        seed_world(&store).await;
        save_correction(&store, "d1", "e1", "corrector", "Fix", Timestamp::from_millis(2_000))
            .await
            .expect("save");
        save_correction(&store, "d1", "e1", "ghost", "Other fix", Timestamp::from_millis(2_500))
            .await
            .expect("save ghost");

        // When
        let stranger = list_corrections(&store, "corrector", "d1", "e1").await;
        let views = list_corrections(&store, "owner", "d1", "e1")
            .await
            .expect("list");

        // Then
        assert!(matches!(stranger, Err(Error::Forbidden(_))));
        assert_eq!(views.len(), 2);
        let by_corrector = views.iter().find(|v| v.id == "corrector").expect("known");
        assert_eq!(by_corrector.corrector_username, "ben");
        let by_ghost = views.iter().find(|v| v.id == "ghost").expect("ghost");
        assert_eq!(by_ghost.corrector_username, "Unknown User");
    }

    #[tokio::test]
    async fn mark_correction_read__should_flip_once_and_stay_read() {
        // Given
        let store = MemoryStore::new();
        seed_world(&store).await;
        save_correction(&store, "d1", "e1", "corrector", "Fix", Timestamp::from_millis(2_000))
            .await
            .expect("save");

        // When
        mark_correction_read(&store, "owner", "d1", "e1", "corrector")
            .await
            .expect("mark");
        mark_correction_read(&store, "owner", "d1", "e1", "corrector")
            .await
            .expect("mark again");

        // Then
        let saved = my_correction(&store, "d1", "e1", "corrector")
            .await
            .expect("load")
            .expect("correction");
        assert!(saved.read);
    }

    #[tokio::test]
    async fn unread_correction_entries__should_flag_entries_with_any_unread() {
        // Given
        let store = MemoryStore::new();
        seed_world(&store).await;
        let entry = EntryRecord {
            title: None,
            content: "Second".to_string(),
            date: Timestamp::from_millis(2_000),
            liked_by: Vec::new(),
        };
        store
            .set(&entry_path("d1", "e2"), encode(&entry).expect("encode"))
            .await
            .expect("seed e2");
        save_correction(&store, "d1", "e1", "corrector", "Fix", Timestamp::from_millis(3_000))
            .await
            .expect("save");
        mark_correction_read(&store, "owner", "d1", "e1", "corrector")
            .await
            .expect("mark");
        save_correction(&store, "d1", "e2", "corrector", "Fix too", Timestamp::from_millis(3_500))
            .await
            .expect("save e2");

        // When
        let unread = unread_correction_entries(&store, "d1").await.expect("scan");

        // Then
        assert_eq!(unread, vec!["e2".to_string()]);
    }
}
