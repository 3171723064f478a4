//! Server-rendered console pages.
//!
//! Wires list/create/edit/delete user actions to the resource controller and form binder.
//! Every mutating action redirects back to a freshly fetched list; deletes require an
//! explicit confirmation step.

mod auth;
mod dashboard;
mod entities;
pub mod html;

pub use auth::*;
pub use dashboard::*;
pub use entities::*;

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use axum::{
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
};

use crate::auth::decode_claims;
use crate::errors::ClientError;
use crate::models::{catalog, Claims, Scope, Session};
use crate::transport::TransportClient;
use crate::AppState;

/// Name of the cookie carrying the console session id.
pub const SESSION_COOKIE: &str = "mdm_session";

/// Top-level entities whose navigation links only render for admins.
const ADMIN_ENTITIES: [&str; 3] = ["users", "turnos", "emergency-contacts"];

/// A signed-in console visitor.
pub struct Visitor {
    pub session_id: String,
    pub client: TransportClient,
    pub session: Session,
}

impl Visitor {
    /// Resolve the visitor from the session cookie. `None` means not signed in.
    ///
    /// A stored token whose `exp` has passed is discarded here rather than sent.
    pub async fn resolve(state: &AppState, headers: &HeaderMap) -> Option<Self> {
        let session_id = session_id(headers)?;
        let client = state.client.for_session(&session_id);
        let token = match client.tokens().get().await {
            Ok(Some(token)) => token,
            Ok(None) => return None,
            Err(e) => {
                tracing::error!("Session lookup failed: {}", e);
                return None;
            }
        };

        let claims = decode_claims(&token);
        let session = Session {
            expires_in: claims.as_ref().and_then(Claims::seconds_left),
            claims,
            token,
        };
        if session.is_expired() {
            tracing::info!("Session {} expired", session_id);
            if let Err(e) = client.tokens().on_unauthorized(&session.token).await {
                tracing::error!("Could not clear expired session {}: {}", session_id, e);
            }
            return None;
        }

        Some(Self {
            session_id,
            client,
            session,
        })
    }

    pub fn nav(&self) -> String {
        let links: Vec<(String, String, bool)> = catalog::descriptors(Scope::Top)
            .iter()
            .map(|d| {
                (
                    format!("/entities/{}", d.entity_key),
                    d.display_name.clone(),
                    ADMIN_ENTITIES.contains(&d.entity_key.as_str()),
                )
            })
            .collect();
        html::nav(self.session.claims.as_ref(), &links)
    }

    pub fn page(&self, title: &str, body: &str) -> Response {
        Html(html::layout(title, &self.nav(), body)).into_response()
    }

    /// Present a failed action. Rejected credentials send the visitor back to login; the
    /// transport has already discarded the token.
    pub fn failure(&self, err: ClientError, back: &str) -> Response {
        if err.is_unauthorized() {
            return Redirect::to("/login?expired=1").into_response();
        }

        let status = match &err {
            ClientError::Api { status: 404, .. } | ClientError::UnknownEntity(_) => {
                StatusCode::NOT_FOUND
            }
            ClientError::Validation(_) | ClientError::NotConfirmed => StatusCode::BAD_REQUEST,
            ClientError::MissingScope(_) => StatusCode::BAD_REQUEST,
            ClientError::InFlight => StatusCode::CONFLICT,
            _ => StatusCode::BAD_GATEWAY,
        };
        let body = format!(
            "{}<p><a href=\"{}\">Back</a></p>",
            html::flash(Some(&err.message()), "error"),
            html::escape(back)
        );
        (status, self.page("Error", &body)).into_response()
    }
}

/// Read the console session id from the request cookies.
pub fn session_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

/// Cookie for a new session. It expires with the token when the lifetime is known and
/// lasts for the browser session otherwise.
pub fn session_cookie(session_id: &str, max_age: Option<i64>, secure: bool) -> String {
    let mut cookie = format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, session_id);
    if let Some(max_age) = max_age {
        cookie.push_str(&format!("; Max-Age={}", max_age.max(0)));
    }
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

pub fn expired_session_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE)
}

/// Rejects a second mutating submission for the same form while the first is pending.
#[derive(Debug, Default)]
pub struct SubmitGuard {
    in_flight: Mutex<HashSet<String>>,
}

impl SubmitGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `key` until the returned ticket drops. `None` while another claim is held.
    pub fn begin(self: &Arc<Self>, key: String) -> Option<SubmitTicket> {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        if !in_flight.insert(key.clone()) {
            tracing::warn!("Duplicate submission rejected for {}", key);
            return None;
        }
        Some(SubmitTicket {
            guard: self.clone(),
            key,
        })
    }
}

/// Held for the duration of one mutating submission.
pub struct SubmitTicket {
    guard: Arc<SubmitGuard>,
    key: String,
}

impl Drop for SubmitTicket {
    fn drop(&mut self) {
        self.guard
            .in_flight
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_session_id_from_cookie_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; mdm_session=abc-123; other=1"),
        );
        assert_eq!(session_id(&headers).as_deref(), Some("abc-123"));

        let mut empty = HeaderMap::new();
        empty.insert(header::COOKIE, HeaderValue::from_static("mdm_session="));
        assert!(session_id(&empty).is_none());
        assert!(session_id(&HeaderMap::new()).is_none());
    }

    #[test]
    fn test_session_cookie_attributes() {
        assert_eq!(
            session_cookie("abc", None, false),
            "mdm_session=abc; Path=/; HttpOnly; SameSite=Lax"
        );
        assert_eq!(
            session_cookie("abc", Some(3600), true),
            "mdm_session=abc; Path=/; HttpOnly; SameSite=Lax; Max-Age=3600; Secure"
        );
        assert!(session_cookie("abc", Some(-5), false).ends_with("; Max-Age=0"));
    }

    #[test]
    fn test_submit_guard_releases_on_drop() {
        let guard = Arc::new(SubmitGuard::new());

        let ticket = guard.begin("s1:/entities/turnos".to_string()).unwrap();
        assert!(guard.begin("s1:/entities/turnos".to_string()).is_none());
        // Other visitors and other forms are unaffected
        assert!(guard.begin("s2:/entities/turnos".to_string()).is_some());

        drop(ticket);
        assert!(guard.begin("s1:/entities/turnos".to_string()).is_some());
    }
}
