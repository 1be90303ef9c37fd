use axum::{
    extract::{FromRef, State},
    http::{
        header::{LOCATION, SET_COOKIE},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Form, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{RegisterForm, SignInForm},
        repo::User,
        service::{self, is_valid_email},
        session::{clear_session_cookie, AuthUser, Session, SessionKeys},
    },
    error::AuthError,
    pages,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/signin", get(signin_page))
        .route("/signup", get(signup_page))
        .route("/signout", get(signout))
        .route("/auth", post(sign_in))
        .route("/register", post(register))
        .route("/user/delete", get(delete_account_page))
        .route("/user/delete_confirm", post(delete_account))
}

type RedirectResult = Result<(StatusCode, HeaderMap), (StatusCode, String)>;

fn found(location: &'static str) -> (StatusCode, HeaderMap) {
    let mut headers = HeaderMap::new();
    headers.insert(LOCATION, HeaderValue::from_static(location));
    (StatusCode::FOUND, headers)
}

fn found_with_session(
    keys: &SessionKeys,
    location: &'static str,
    session: &Session,
) -> RedirectResult {
    let cookie = keys.cookie(session).map_err(internal)?;
    let (status, mut headers) = found(location);
    headers.insert(SET_COOKIE, cookie);
    Ok((status, headers))
}

fn flash_redirect(keys: &SessionKeys, location: &'static str, message: &str) -> RedirectResult {
    found_with_session(keys, location, &Session::with_flash(message))
}

fn internal<E: std::fmt::Display>(e: E) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

/// Renders a form page, consuming any pending flash message and re-issuing
/// the session cookie without it.
fn render_form_page(
    state: &AppState,
    session: &mut Session,
    page: fn(Option<&str>) -> String,
) -> Response {
    let flash = session.take_flash();
    let mut headers = HeaderMap::new();
    if flash.is_some() {
        let keys = SessionKeys::from_ref(state);
        match keys.cookie(session) {
            Ok(cookie) => {
                headers.insert(SET_COOKIE, cookie);
            }
            Err(e) => error!(error = %e, "failed to re-issue session cookie"),
        }
    }
    (headers, Html(page(flash.as_deref()))).into_response()
}

/// GET / — landing page; navigation depends on session state.
#[instrument(skip_all)]
async fn index(session: Session) -> Html<String> {
    Html(pages::index(session.user_id.is_some()))
}

/// GET /signin — sign-in form, or straight to the dashboard when already
/// authenticated.
#[instrument(skip_all)]
async fn signin_page(State(state): State<AppState>, mut session: Session) -> Response {
    if session.user_id.is_some() {
        return found("/dashboard").into_response();
    }
    render_form_page(&state, &mut session, pages::signin)
}

/// GET /signup — registration form, or the dashboard when signed in.
#[instrument(skip_all)]
async fn signup_page(State(state): State<AppState>, mut session: Session) -> Response {
    if session.user_id.is_some() {
        return found("/dashboard").into_response();
    }
    render_form_page(&state, &mut session, pages::signup)
}

/// GET /signout — drop the session and return to the landing page.
#[instrument(skip_all)]
async fn signout() -> (StatusCode, HeaderMap) {
    let (status, mut headers) = found("/");
    headers.insert(SET_COOKIE, clear_session_cookie());
    (status, headers)
}

/// POST /auth — sign in with email and password.
#[instrument(skip(state, form))]
async fn sign_in(State(state): State<AppState>, Form(mut form): Form<SignInForm>) -> RedirectResult {
    let keys = SessionKeys::from_ref(&state);
    form.email = form.email.trim().to_lowercase();

    if form.email.is_empty() || form.password.is_empty() {
        return flash_redirect(&keys, "/signin", "Email and password are required.");
    }

    match service::authenticate(&state.db, &form.email, &form.password).await {
        Ok(user) => {
            info!(user_id = user.id, "user signed in");
            found_with_session(&keys, "/dashboard", &Session::signed_in(user.id))
        }
        Err(e @ AuthError::InvalidCredentials) => {
            warn!(email = %form.email, "sign-in rejected");
            flash_redirect(&keys, "/signin", &e.to_string())
        }
        Err(e) => {
            error!(error = %e, "authenticate failed");
            Err(internal(e))
        }
    }
}

/// POST /register — create an account and sign in immediately.
#[instrument(skip(state, form))]
async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(mut form): Form<RegisterForm>,
) -> RedirectResult {
    let keys = SessionKeys::from_ref(&state);
    if session.user_id.is_some() {
        return Ok(found("/dashboard"));
    }

    form.username = form.username.trim().to_string();
    form.email = form.email.trim().to_lowercase();

    if form.username.is_empty() || form.email.is_empty() || form.password.is_empty() {
        return flash_redirect(&keys, "/signup", "All fields are required.");
    }
    if !is_valid_email(&form.email) {
        return flash_redirect(&keys, "/signup", "Please enter a valid email address.");
    }
    if form.password.chars().count() < 8 {
        return flash_redirect(&keys, "/signup", "Password must be at least 8 characters.");
    }

    match service::register(&state.db, &form.username, &form.email, &form.password).await {
        Ok(user) => found_with_session(&keys, "/dashboard", &Session::signed_in(user.id)),
        Err(e @ AuthError::DuplicateEmail) => {
            warn!(email = %form.email, "registration rejected: duplicate email");
            flash_redirect(&keys, "/signup", &e.to_string())
        }
        Err(e) => {
            error!(error = %e, "register failed");
            Err(internal(e))
        }
    }
}

/// GET /user/delete — account deletion confirmation page.
#[instrument(skip_all)]
async fn delete_account_page(AuthUser(_user_id): AuthUser) -> Html<String> {
    Html(pages::delete_account())
}

/// POST /user/delete_confirm — delete the account; owned diary entries go
/// with it via the cascading foreign key.
#[instrument(skip(state))]
async fn delete_account(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> RedirectResult {
    User::delete(&state.db, user_id).await.map_err(|e| {
        error!(error = %e, user_id, "delete user failed");
        internal(e)
    })?;
    info!(user_id, "account deleted");

    let (status, mut headers) = found("/");
    headers.insert(SET_COOKIE, clear_session_cookie());
    Ok((status, headers))
}
