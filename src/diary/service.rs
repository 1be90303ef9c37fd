use sqlx::PgPool;
use tracing::info;

use crate::diary::repo::DiaryEntry;
use crate::error::DiaryError;

pub const TITLE_MAX_CHARS: usize = 100;
pub const COMMENT_MAX_CHARS: usize = 10000;

/// Trim both fields and enforce the length constraints. Limits count
/// characters, not bytes, so multibyte text gets the full budget.
fn validate(title: &str, comment: &str) -> Result<(String, String), DiaryError> {
    let title = title.trim();
    let comment = comment.trim();

    if title.is_empty() {
        return Err(DiaryError::TitleRequired);
    }
    if comment.is_empty() {
        return Err(DiaryError::CommentRequired);
    }
    if title.chars().count() > TITLE_MAX_CHARS {
        return Err(DiaryError::TitleTooLong);
    }
    if comment.chars().count() > COMMENT_MAX_CHARS {
        return Err(DiaryError::CommentTooLong);
    }
    Ok((title.to_string(), comment.to_string()))
}

/// List a user's entries, newest first.
pub async fn list_entries(db: &PgPool, user_id: i64) -> Result<Vec<DiaryEntry>, DiaryError> {
    Ok(DiaryEntry::list_by_user(db, user_id).await?)
}

/// Validate and create an entry owned by `user_id`.
pub async fn create_entry(
    db: &PgPool,
    user_id: i64,
    title: &str,
    comment: &str,
) -> Result<DiaryEntry, DiaryError> {
    let (title, comment) = validate(title, comment)?;
    let entry = DiaryEntry::create(db, user_id, &title, &comment).await?;
    info!(user_id, entry_id = entry.id, "diary entry created");
    Ok(entry)
}

/// Validate and update an entry. Fails with
/// [`DiaryError::NotFoundOrForbidden`] unless an entry with that id is
/// owned by `user_id` — nonexistent and foreign entries are
/// indistinguishable to the caller.
pub async fn update_entry(
    db: &PgPool,
    entry_id: i64,
    user_id: i64,
    title: &str,
    comment: &str,
) -> Result<DiaryEntry, DiaryError> {
    let (title, comment) = validate(title, comment)?;
    DiaryEntry::update_by_id_and_user(db, entry_id, user_id, &title, &comment)
        .await?
        .ok_or(DiaryError::NotFoundOrForbidden)
}

/// Delete an entry; same ownership contract as [`update_entry`].
pub async fn delete_entry(db: &PgPool, entry_id: i64, user_id: i64) -> Result<(), DiaryError> {
    if DiaryEntry::delete_by_id_and_user(db, entry_id, user_id).await? {
        info!(user_id, entry_id, "diary entry deleted");
        Ok(())
    } else {
        Err(DiaryError::NotFoundOrForbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_both_fields() {
        let (title, comment) = validate("  My Title  ", "\n My content \t").expect("valid");
        assert_eq!(title, "My Title");
        assert_eq!(comment, "My content");
    }

    #[test]
    fn empty_title_is_rejected() {
        assert!(matches!(
            validate("", "body"),
            Err(DiaryError::TitleRequired)
        ));
    }

    #[test]
    fn whitespace_only_fields_are_rejected_like_empty() {
        assert!(matches!(
            validate("   \t\n", "body"),
            Err(DiaryError::TitleRequired)
        ));
        assert!(matches!(
            validate("title", "   "),
            Err(DiaryError::CommentRequired)
        ));
    }

    #[test]
    fn title_at_the_limit_is_accepted() {
        let title = "a".repeat(TITLE_MAX_CHARS);
        assert!(validate(&title, "body").is_ok());
    }

    #[test]
    fn title_over_the_limit_is_rejected() {
        let title = "a".repeat(TITLE_MAX_CHARS + 1);
        assert!(matches!(
            validate(&title, "body"),
            Err(DiaryError::TitleTooLong)
        ));
    }

    #[test]
    fn limits_count_characters_not_bytes() {
        // 100 three-byte characters fit even though they exceed 100 bytes.
        let title = "あ".repeat(TITLE_MAX_CHARS);
        assert!(validate(&title, "body").is_ok());
        let title = "あ".repeat(TITLE_MAX_CHARS + 1);
        assert!(matches!(
            validate(&title, "body"),
            Err(DiaryError::TitleTooLong)
        ));
    }

    #[test]
    fn comment_at_and_over_the_limit() {
        let comment = "b".repeat(COMMENT_MAX_CHARS);
        assert!(validate("title", &comment).is_ok());
        let comment = "b".repeat(COMMENT_MAX_CHARS + 1);
        assert!(matches!(
            validate("title", &comment),
            Err(DiaryError::CommentTooLong)
        ));
    }

    #[test]
    fn surrounding_whitespace_does_not_count_toward_the_limit() {
        let title = format!("  {}  ", "a".repeat(TITLE_MAX_CHARS));
        assert!(validate(&title, "body").is_ok());
    }
}
