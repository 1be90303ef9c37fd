use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Html,
    routing::{get, post},
    Form, Json, Router,
};
use serde_json::{json, Value};
use tracing::{error, instrument};

use crate::{
    auth::{repo::User, session::AuthUser},
    diary::{
        dto::{DiaryListResponse, EntryForm},
        service,
    },
    error::DiaryError,
    pages,
    state::AppState,
};

pub fn diary_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/get_json", get(get_json))
        .route("/create_diary", post(create_diary))
        .route("/diary/:id/update", post(update_diary))
        .route("/diary/:id/delete", post(delete_diary))
}

type JsonResult = Result<Json<Value>, (StatusCode, Json<Value>)>;

/// Map service errors onto the JSON contract: 400 for validation, 403 for
/// the merged not-found-or-forbidden kind, 500 otherwise.
fn diary_error(e: DiaryError) -> (StatusCode, Json<Value>) {
    let status = match &e {
        DiaryError::TitleRequired
        | DiaryError::CommentRequired
        | DiaryError::TitleTooLong
        | DiaryError::CommentTooLong => StatusCode::BAD_REQUEST,
        DiaryError::NotFoundOrForbidden => StatusCode::FORBIDDEN,
        DiaryError::Database(err) => {
            error!(error = %err, "diary operation failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Internal server error." })),
            );
        }
    };
    (status, Json(json!({ "error": e.to_string() })))
}

/// GET /dashboard — dashboard page with the resolved username.
#[instrument(skip(state))]
async fn dashboard(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Html<String>, (StatusCode, String)> {
    let user = User::find_by_id(&state.db, user_id).await.map_err(|e| {
        error!(error = %e, user_id, "find_by_id failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error.".to_string(),
        )
    })?;
    let username = user.map(|u| u.username).unwrap_or_else(|| "Guest".to_string());
    Ok(Html(pages::dashboard(&username)))
}

/// GET /get_json — the user's entries as `{"diaries": [...]}`, newest first.
#[instrument(skip(state))]
async fn get_json(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<DiaryListResponse>, (StatusCode, Json<Value>)> {
    let entries = service::list_entries(&state.db, user_id)
        .await
        .map_err(diary_error)?;
    Ok(Json(DiaryListResponse {
        diaries: entries.into_iter().map(Into::into).collect(),
    }))
}

/// POST /create_diary — create an entry from form fields.
#[instrument(skip(state, form))]
async fn create_diary(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Form(form): Form<EntryForm>,
) -> JsonResult {
    service::create_entry(&state.db, user_id, &form.title, &form.comment)
        .await
        .map_err(diary_error)?;
    Ok(Json(json!({ "success": "Diary entry created." })))
}

/// POST /diary/:id/update — update an owned entry.
#[instrument(skip(state, form))]
async fn update_diary(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(entry_id): Path<i64>,
    Form(form): Form<EntryForm>,
) -> JsonResult {
    service::update_entry(&state.db, entry_id, user_id, &form.title, &form.comment)
        .await
        .map_err(diary_error)?;
    Ok(Json(json!({ "success": "Diary entry updated." })))
}

/// POST /diary/:id/delete — delete an owned entry.
#[instrument(skip(state))]
async fn delete_diary(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(entry_id): Path<i64>,
) -> JsonResult {
    service::delete_entry(&state.db, entry_id, user_id)
        .await
        .map_err(diary_error)?;
    Ok(Json(json!({ "success": "Diary entry deleted." })))
}
