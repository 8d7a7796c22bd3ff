use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;

/// Instant persisted as unix epoch milliseconds so the store's `order_by`
/// is total on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn from_datetime(at: OffsetDateTime) -> Self {
        Self((at.unix_timestamp_nanos() / 1_000_000) as i64)
    }

    pub fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    pub fn as_millis(&self) -> i64 {
        self.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub email: String,
    pub username: String,
    #[serde(rename = "diaryId")]
    pub diary_id: String,
    #[serde(default)]
    pub subscriptions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiaryRecord {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub language: String,
    pub private: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub content: String,
    pub date: Timestamp,
    #[serde(rename = "likedBy", default)]
    pub liked_by: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentRecord {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub username: String,
    pub text: String,
    pub timestamp: Timestamp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrectionRecord {
    pub content: String,
    #[serde(rename = "correctedBy")]
    pub corrected_by: String,
    #[serde(rename = "correctedAt")]
    pub corrected_at: Timestamp,
    #[serde(default)]
    pub read: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionRequestRecord {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub username: String,
    pub status: String,
}

pub const REQUEST_STATUS_PENDING: &str = "pending";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRecord {
    #[serde(rename = "diaryId")]
    pub diary_id: String,
    #[serde(rename = "diaryTitle")]
    pub diary_title: String,
    pub unread: bool,
    pub sender: String,
    pub timestamp: Timestamp,
}

// Collection layout shared with the hosted store. The nesting is part of the
// wire contract: diaries own entries, entries own comments and corrections,
// subscription requests live under the diary, notifications under the user.

pub const USERS: &str = "users";
pub const DIARIES: &str = "diaries";

pub fn user_path(user_id: &str) -> String {
    format!("users/{user_id}")
}

pub fn diary_path(diary_id: &str) -> String {
    format!("diaries/{diary_id}")
}

pub fn entries_path(diary_id: &str) -> String {
    format!("diaries/{diary_id}/entries")
}

pub fn entry_path(diary_id: &str, entry_id: &str) -> String {
    format!("diaries/{diary_id}/entries/{entry_id}")
}

pub fn comments_path(diary_id: &str, entry_id: &str) -> String {
    format!("diaries/{diary_id}/entries/{entry_id}/comments")
}

pub fn comment_path(diary_id: &str, entry_id: &str, comment_id: &str) -> String {
    format!("diaries/{diary_id}/entries/{entry_id}/comments/{comment_id}")
}

pub fn corrections_path(diary_id: &str, entry_id: &str) -> String {
    format!("diaries/{diary_id}/entries/{entry_id}/corrections")
}

pub fn correction_path(diary_id: &str, entry_id: &str, correction_id: &str) -> String {
    format!("diaries/{diary_id}/entries/{entry_id}/corrections/{correction_id}")
}

pub fn requests_path(diary_id: &str) -> String {
    format!("diaries/{diary_id}/subscription_requests")
}

pub fn request_path(diary_id: &str, request_id: &str) -> String {
    format!("diaries/{diary_id}/subscription_requests/{request_id}")
}

pub fn notification_path(user_id: &str, diary_id: &str) -> String {
    format!("users/{user_id}/notifications/{diary_id}")
}
