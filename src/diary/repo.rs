use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

/// Diary entry record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DiaryEntry {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub comment: String,
    pub created_at: OffsetDateTime,
}

impl DiaryEntry {
    /// List a user's entries newest first; id breaks timestamp ties so the
    /// order stays deterministic.
    pub async fn list_by_user(db: &PgPool, user_id: i64) -> Result<Vec<DiaryEntry>, sqlx::Error> {
        sqlx::query_as::<_, DiaryEntry>(
            r#"
            SELECT id, user_id, title, comment, created_at
            FROM diaries
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(db)
        .await
    }

    /// Insert a new entry owned by `user_id`.
    pub async fn create(
        db: &PgPool,
        user_id: i64,
        title: &str,
        comment: &str,
    ) -> Result<DiaryEntry, sqlx::Error> {
        sqlx::query_as::<_, DiaryEntry>(
            r#"
            INSERT INTO diaries (user_id, title, comment)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, title, comment, created_at
            "#,
        )
        .bind(user_id)
        .bind(title)
        .bind(comment)
        .fetch_one(db)
        .await
    }

    /// Update an entry only when `user_id` owns it; `None` otherwise.
    pub async fn update_by_id_and_user(
        db: &PgPool,
        entry_id: i64,
        user_id: i64,
        title: &str,
        comment: &str,
    ) -> Result<Option<DiaryEntry>, sqlx::Error> {
        sqlx::query_as::<_, DiaryEntry>(
            r#"
            UPDATE diaries
            SET title = $3, comment = $4
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, title, comment, created_at
            "#,
        )
        .bind(entry_id)
        .bind(user_id)
        .bind(title)
        .bind(comment)
        .fetch_optional(db)
        .await
    }

    /// Delete an entry only when `user_id` owns it; `false` otherwise.
    pub async fn delete_by_id_and_user(
        db: &PgPool,
        entry_id: i64,
        user_id: i64,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM diaries WHERE id = $1 AND user_id = $2")
            .bind(entry_id)
            .bind(user_id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
