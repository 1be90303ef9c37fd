use thiserror::Error;

/// Registration and sign-in failures.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("This email address is already registered.")]
    DuplicateEmail,

    #[error("Email or password is incorrect.")]
    InvalidCredentials,

    #[error("password hashing failed: {0}")]
    Hash(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Diary entry validation and mutation failures.
///
/// `NotFoundOrForbidden` deliberately covers both "no such entry" and
/// "owned by someone else" so callers cannot probe which ids exist.
#[derive(Debug, Error)]
pub enum DiaryError {
    #[error("Title is required.")]
    TitleRequired,

    #[error("Comment is required.")]
    CommentRequired,

    #[error("Title must be 100 characters or fewer.")]
    TitleTooLong,

    #[error("Comment must be 10000 characters or fewer.")]
    CommentTooLong,

    #[error("Diary entry not found.")]
    NotFoundOrForbidden,

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}
