//! Discovery: trending diaries ranked by most recent activity, and direct
//! search by diary id or exact username.

use crate::error::Error;
use crate::ports::store::{DocumentStore, Query, decode};
use crate::subscriptions::load_user;
use crate::types::{
    DIARIES, DiaryRecord, EntryRecord, Timestamp, USERS, UserRecord, diary_path, entries_path,
    user_path,
};

use serde::Serialize;

pub(crate) const DEFAULT_TRENDING_LIMIT: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct DiarySummary {
    #[serde(rename = "diaryId")]
    pub diary_id: String,
    pub title: String,
    pub description: String,
    pub language: String,
    pub private: bool,
    #[serde(rename = "ownerUsername")]
    pub owner_username: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrendingDiary {
    #[serde(flatten)]
    pub diary: DiarySummary,
    #[serde(rename = "latestEntryAt")]
    pub latest_entry_at: Timestamp,
    pub subscribed: bool,
}

async fn summarize(
    store: &dyn DocumentStore,
    diary_id: &str,
    diary: DiaryRecord,
) -> Result<DiarySummary, Error> {
    let owner_username = match store.get(&user_path(&diary.user_id)).await? {
        Some(fields) => decode::<UserRecord>(fields)?.username,
        None => "Unknown User".to_string(),
    };
    Ok(DiarySummary {
        diary_id: diary_id.to_string(),
        title: diary.title,
        description: diary.description,
        language: diary.language,
        private: diary.private,
        owner_username,
    })
}

/// Diaries ranked by their most recent entry, newest activity first.
/// Diaries with no dated entry never trend. Ranking reads one entry per
/// diary via a store-side order-and-limit query.
pub(crate) async fn compute_trending(
    store: &dyn DocumentStore,
    viewer_id: &str,
    limit: Option<usize>,
) -> Result<Vec<TrendingDiary>, Error> {
    let viewer = load_user(store, viewer_id).await?;
    let limit = limit.unwrap_or(DEFAULT_TRENDING_LIMIT);

    let mut ranked = Vec::new();
    for (diary_id, fields) in store.query(DIARIES, Query::all()).await? {
        let diary: DiaryRecord = decode(fields)?;
        if diary.user_id == viewer_id {
            continue;
        }
        let latest = store
            .query(
                &entries_path(&diary_id),
                Query::all().order_by_desc("date").limit(1),
            )
            .await?;
        let Some((_, entry_fields)) = latest.into_iter().next() else {
            continue;
        };
        let entry: EntryRecord = decode(entry_fields)?;
        let subscribed = viewer.subscriptions.iter().any(|id| id == &diary_id);
        let summary = summarize(store, &diary_id, diary).await?;
        ranked.push(TrendingDiary {
            diary: summary,
            latest_entry_at: entry.date,
            subscribed,
        });
    }

    ranked.sort_by(|a, b| b.latest_entry_at.cmp(&a.latest_entry_at));
    ranked.truncate(limit);
    Ok(ranked)
}

/// Exact-match lookup: a diary id hit wins, otherwise every diary owned by
/// a user with that exact username.
pub(crate) async fn search(
    store: &dyn DocumentStore,
    term: &str,
) -> Result<Vec<DiarySummary>, Error> {
    let term = term.trim();
    if term.is_empty() {
        return Ok(Vec::new());
    }

    // A term with a slash can never be a diary id and would not form a
    // valid document path.
    if !term.contains('/') {
        if let Some(fields) = store.get(&diary_path(term)).await? {
            let diary: DiaryRecord = decode(fields)?;
            return Ok(vec![summarize(store, term, diary).await?]);
        }
    }

    let mut results = Vec::new();
    for (_, fields) in store
        .query(USERS, Query::field_equals("username", term))
        .await?
    {
        let user: UserRecord = decode(fields)?;
        let Some(diary_fields) = store.get(&diary_path(&user.diary_id)).await? else {
            continue;
        };
        let diary: DiaryRecord = decode(diary_fields)?;
        results.push(summarize(store, &user.diary_id, diary).await?);
    }
    Ok(results)
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;
    use crate::adapters::MemoryStore;
    use crate::ports::store::encode;
    use crate::types::entry_path;

    async fn seed_user(store: &MemoryStore, user_id: &str, username: &str, diary_id: &str) {
        let user = UserRecord {
            email: format!("{username}@example.com"),
            username: username.to_string(),
            diary_id: diary_id.to_string(),
            subscriptions: Vec::new(),
        };
        store
            .set(&user_path(user_id), encode(&user).expect("encode"))
            .await
            .expect("seed user");
    }

    async fn seed_diary(store: &MemoryStore, diary_id: &str, owner: &str, title: &str) {
        let diary = DiaryRecord {
            user_id: owner.to_string(),
            title: title.to_string(),
            description: String::new(),
            language: "en".to_string(),
            private: false,
        };
        store
            .set(&diary_path(diary_id), encode(&diary).expect("encode"))
            .await
            .expect("seed diary");
    }

    async fn seed_entry(store: &MemoryStore, diary_id: &str, entry_id: &str, millis: i64) {
        let entry = EntryRecord {
            title: None,
            content: "text".to_string(),
            date: Timestamp::from_millis(millis),
            liked_by: Vec::new(),
        };
        store
            .set(&entry_path(diary_id, entry_id), encode(&entry).expect("encode"))
            .await
            .expect("seed entry");
    }

    #[tokio::test]
    async fn compute_trending__should_rank_by_latest_entry_and_skip_empty_diaries() {
        // Given
        let store = MemoryStore::new();
        seed_user(&store, "viewer", "vera", "dv").await;
        seed_diary(&store, "dv", "viewer", "Own diary").await;
        seed_entry(&store, "dv", "e0", 9_999).await;
        seed_user(&store, "u1", "ana", "d1").await;
        seed_diary(&store, "d1", "u1", "Quiet").await;
        seed_user(&store, "u2", "ben", "d2").await;
        seed_diary(&store, "d2", "u2", "Busy").await;
        seed_entry(&store, "d2", "e1", 1_000).await;
        seed_entry(&store, "d2", "e2", 3_000).await;
        seed_user(&store, "u3", "cal", "d3").await;
        seed_diary(&store, "d3", "u3", "Occasional").await;
        seed_entry(&store, "d3", "e3", 2_000).await;

        // When
        let trending = compute_trending(&store, "viewer", None).await.expect("rank");

        // Then: empty d1 and the viewer's own diary are absent, newest first
        let ids: Vec<&str> = trending.iter().map(|t| t.diary.diary_id.as_str()).collect();
        assert_eq!(ids, vec!["d2", "d3"]);
        assert_eq!(trending[0].latest_entry_at, Timestamp::from_millis(3_000));
        assert_eq!(trending[0].diary.owner_username, "ben");
    }

    #[tokio::test]
    async fn compute_trending__should_annotate_subscriptions_and_honor_the_limit() {
        // Given
        let store = MemoryStore::new();
        seed_user(&store, "viewer", "vera", "dv").await;
        store
            .array_union(&user_path("viewer"), "subscriptions", serde_json::json!("d1"))
            .await
            .expect("subscribe");
        for i in 1..=7 {
            let owner = format!("u{i}");
            let diary = format!("d{i}");
            seed_user(&store, &owner, &format!("user{i}"), &diary).await;
            seed_diary(&store, &diary, &owner, &format!("Diary {i}")).await;
            seed_entry(&store, &diary, "e", i * 1_000).await;
        }

        // When
        let top_default = compute_trending(&store, "viewer", None).await.expect("rank");
        let top_two = compute_trending(&store, "viewer", Some(2)).await.expect("rank");

        // Then
        assert_eq!(top_default.len(), 5);
        assert_eq!(top_two.len(), 2);
        assert_eq!(top_two[0].diary.diary_id, "d7");
        let d1 = top_default.iter().find(|t| t.diary.diary_id == "d1");
        assert!(d1.is_none() || d1.map(|t| t.subscribed) == Some(true));
        let all = compute_trending(&store, "viewer", Some(10)).await.expect("rank");
        let d1 = all
            .iter()
            .find(|t| t.diary.diary_id == "d1")
            .expect("d1 ranked");
        assert!(d1.subscribed);
        assert!(!all.iter().any(|t| t.diary.diary_id == "dv"));
    }

    #[tokio::test]
    async fn search__should_prefer_a_diary_id_hit_over_usernames() {
        // Given
        let store = MemoryStore::new();
        seed_user(&store, "u1", "ana", "d1").await;
        seed_diary(&store, "d1", "u1", "Ana's diary").await;
        seed_user(&store, "u2", "d1", "d2").await;
        seed_diary(&store, "d2", "u2", "Oddly named owner").await;

        // When
        let by_id = search(&store, "d1").await.expect("search id");
        let by_name = search(&store, "ana").await.expect("search name");
        let nothing = search(&store, "zzz").await.expect("search miss");
        let blank = search(&store, "   ").await.expect("search blank");

        // Then
        assert_eq!(by_id.len(), 1);
        assert_eq!(by_id[0].diary_id, "d1");
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].owner_username, "ana");
        assert!(nothing.is_empty());
        assert!(blank.is_empty());
    }
}
