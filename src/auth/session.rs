use std::convert::Infallible;
use std::time::Duration;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{
        header::{ACCEPT, COOKIE, LOCATION},
        request::Parts,
        HeaderMap, HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
    Json,
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{debug, warn};

use crate::config::SessionConfig;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "session";

/// Signed payload carried by the session cookie.
#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sub: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    flash: Option<String>,
    iat: usize,
    exp: usize,
}

/// Per-request session state: an optional signed-in user id and an
/// optional one-shot flash message. An absent, invalid or expired cookie
/// decodes to the anonymous session instead of rejecting the request.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: Option<i64>,
    pub flash: Option<String>,
}

impl Session {
    pub fn signed_in(user_id: i64) -> Self {
        Self {
            user_id: Some(user_id),
            flash: None,
        }
    }

    pub fn with_flash(message: &str) -> Self {
        Self {
            user_id: None,
            flash: Some(message.to_string()),
        }
    }

    /// Remove and return the flash message; it renders exactly once.
    pub fn take_flash(&mut self) -> Option<String> {
        self.flash.take()
    }
}

/// Holds session signing and verification keys with the configured TTL.
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl FromRef<AppState> for SessionKeys {
    fn from_ref(state: &AppState) -> Self {
        let SessionConfig {
            secret,
            ttl_minutes,
        } = state.config.session.clone();
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::from_secs((ttl_minutes as u64) * 60),
        }
    }
}

impl SessionKeys {
    pub fn issue(&self, session: &Session) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = now + TimeDuration::seconds(self.ttl.as_secs() as i64);
        let claims = SessionClaims {
            sub: session.user_id,
            flash: session.flash.clone(),
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        Ok(token)
    }

    pub fn decode(&self, token: &str) -> anyhow::Result<Session> {
        let data = decode::<SessionClaims>(token, &self.decoding, &Validation::default())?;
        Ok(Session {
            user_id: data.claims.sub,
            flash: data.claims.flash,
        })
    }

    /// `Set-Cookie` value carrying the signed session.
    pub fn cookie(&self, session: &Session) -> anyhow::Result<HeaderValue> {
        let token = self.issue(session)?;
        let value = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            SESSION_COOKIE,
            token,
            self.ttl.as_secs()
        );
        Ok(HeaderValue::from_str(&value)?)
    }
}

/// `Set-Cookie` value that discards the session.
pub fn clear_session_cookie() -> HeaderValue {
    HeaderValue::from_static("session=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
    SessionKeys: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = SessionKeys::from_ref(state);
        let Some(token) = cookie_value(&parts.headers, SESSION_COOKIE) else {
            return Ok(Session::default());
        };
        match keys.decode(&token) {
            Ok(session) => Ok(session),
            Err(e) => {
                debug!(error = %e, "invalid session cookie; treating as anonymous");
                Ok(Session::default())
            }
        }
    }
}

/// Gate for protected routes: yields the signed-in user id or rejects.
pub struct AuthUser(pub i64);

/// Rejection for [`AuthUser`]: clients that accept only JSON get a 401
/// payload, everyone else is redirected to the sign-in page.
pub struct AuthRejection {
    wants_json: bool,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        if self.wants_json {
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Not signed in." })),
            )
                .into_response()
        } else {
            let mut headers = HeaderMap::new();
            headers.insert(LOCATION, HeaderValue::from_static("/signin"));
            (StatusCode::FOUND, headers).into_response()
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    SessionKeys: FromRef<S>,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .unwrap_or_default();
        match session.user_id {
            Some(user_id) => Ok(AuthUser(user_id)),
            None => {
                warn!("unauthenticated access to protected route");
                Err(AuthRejection {
                    wants_json: wants_json(&parts.headers),
                })
            }
        }
    }
}

/// True when the request accepts JSON but not HTML (AJAX-style clients).
pub fn wants_json(headers: &HeaderMap) -> bool {
    let Some(accept) = headers.get(ACCEPT).and_then(|v| v.to_str().ok()) else {
        return false;
    };
    let any = accept.contains("*/*");
    let json = any || accept.contains("application/json");
    let html = any || accept.contains("text/html");
    json && !html
}

pub(crate) fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let raw = headers.get(COOKIE)?.to_str().ok()?;
    raw.split(';').map(str::trim).find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        (k == name).then(|| v.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppState;

    fn make_keys() -> SessionKeys {
        SessionKeys::from_ref(&AppState::fake())
    }

    #[tokio::test]
    async fn issue_and_decode_roundtrip() {
        let keys = make_keys();
        let token = keys.issue(&Session::signed_in(42)).expect("issue");
        let session = keys.decode(&token).expect("decode");
        assert_eq!(session.user_id, Some(42));
        assert_eq!(session.flash, None);
    }

    #[tokio::test]
    async fn flash_roundtrips_and_renders_once() {
        let keys = make_keys();
        let token = keys
            .issue(&Session::with_flash("Wrong password."))
            .expect("issue");
        let mut session = keys.decode(&token).expect("decode");
        assert_eq!(session.user_id, None);
        assert_eq!(session.take_flash().as_deref(), Some("Wrong password."));
        assert_eq!(session.take_flash(), None);
    }

    #[tokio::test]
    async fn decode_rejects_garbage() {
        let keys = make_keys();
        assert!(keys.decode("not-a-token").is_err());
    }

    #[tokio::test]
    async fn decode_rejects_foreign_signature() {
        let keys = make_keys();
        let other = SessionKeys {
            encoding: EncodingKey::from_secret(b"other-secret"),
            decoding: DecodingKey::from_secret(b"other-secret"),
            ttl: Duration::from_secs(300),
        };
        let token = other.issue(&Session::signed_in(1)).expect("issue");
        assert!(keys.decode(&token).is_err());
    }

    #[tokio::test]
    async fn session_cookie_is_http_only_and_lax() {
        let keys = make_keys();
        let cookie = keys.cookie(&Session::signed_in(7)).expect("cookie");
        let cookie = cookie.to_str().expect("ascii");
        assert!(cookie.starts_with("session="));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Path=/"));
    }

    #[test]
    fn clear_cookie_expires_immediately() {
        let cookie = clear_session_cookie();
        let cookie = cookie.to_str().expect("ascii");
        assert!(cookie.starts_with("session="));
        assert!(cookie.contains("Max-Age=0"));
    }

    #[test]
    fn cookie_value_finds_the_named_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; session=abc.def.ghi; lang=en"),
        );
        assert_eq!(
            cookie_value(&headers, "session").as_deref(),
            Some("abc.def.ghi")
        );
        assert_eq!(cookie_value(&headers, "missing"), None);
    }

    #[test]
    fn cookie_value_without_header_is_none() {
        assert_eq!(cookie_value(&HeaderMap::new(), "session"), None);
    }

    #[test]
    fn json_only_clients_want_json() {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        assert!(wants_json(&headers));
    }

    #[test]
    fn browser_accept_header_prefers_redirect() {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        );
        assert!(!wants_json(&headers));
    }

    #[test]
    fn wildcard_accept_prefers_redirect() {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
        assert!(!wants_json(&headers));
        assert!(!wants_json(&HeaderMap::new()));
    }

    #[test]
    fn rejection_is_401_json_for_json_clients() {
        let res = AuthRejection { wants_json: true }.into_response();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn rejection_redirects_browsers_to_signin() {
        let res = AuthRejection { wants_json: false }.into_response();
        assert_eq!(res.status(), StatusCode::FOUND);
        assert_eq!(
            res.headers().get(LOCATION).and_then(|v| v.to_str().ok()),
            Some("/signin")
        );
    }
}
