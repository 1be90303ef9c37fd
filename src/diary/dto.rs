use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::diary::repo::DiaryEntry;

/// Form body for entry creation and update.
#[derive(Debug, Deserialize)]
pub struct EntryForm {
    pub title: String,
    pub comment: String,
}

/// One diary entry as returned by GET /get_json.
#[derive(Debug, Serialize)]
pub struct DiaryEntryJson {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub comment: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<DiaryEntry> for DiaryEntryJson {
    fn from(e: DiaryEntry) -> Self {
        Self {
            id: e.id,
            user_id: e.user_id,
            title: e.title,
            comment: e.comment,
            created_at: e.created_at,
        }
    }
}

/// Response body for GET /get_json.
#[derive(Debug, Serialize)]
pub struct DiaryListResponse {
    pub diaries: Vec<DiaryEntryJson>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn sample() -> DiaryEntryJson {
        DiaryEntryJson {
            id: 3,
            user_id: 1,
            title: "My Title".into(),
            comment: "My content".into(),
            created_at: datetime!(2026-01-02 03:04:05 UTC),
        }
    }

    #[test]
    fn entry_serializes_with_the_expected_keys() {
        let json = serde_json::to_value(sample()).expect("serialize");
        assert_eq!(json["id"], 3);
        assert_eq!(json["user_id"], 1);
        assert_eq!(json["title"], "My Title");
        assert_eq!(json["comment"], "My content");
        assert_eq!(json["created_at"], "2026-01-02T03:04:05Z");
    }

    #[test]
    fn list_response_wraps_entries_under_diaries() {
        let json = serde_json::to_value(DiaryListResponse {
            diaries: vec![sample()],
        })
        .expect("serialize");
        assert!(json["diaries"].is_array());
        assert_eq!(json["diaries"][0]["title"], "My Title");
    }
}
