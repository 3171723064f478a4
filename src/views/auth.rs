//! Login and logout pages.

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;

use super::{expired_session_cookie, html, session_cookie, session_id, Visitor};
use crate::auth::SessionManager;
use crate::errors::ClientError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    #[serde(default)]
    pub expired: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

fn login_page(status: StatusCode, error: Option<&str>, email: &str) -> Response {
    let body = html::login(error, email);
    (status, Html(html::layout("Sign in", "", &body))).into_response()
}

/// GET /login - Render the login form.
pub async fn login_form(Query(query): Query<LoginQuery>) -> Response {
    let notice = query
        .expired
        .map(|_| "Your session has expired. Please sign in again.");
    login_page(StatusCode::OK, notice, "")
}

/// POST /login - Exchange credentials for a token and start a console session.
///
/// A successful login replaces any session the browser already had.
pub async fn login_submit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<LoginForm>,
) -> Response {
    if form.email.trim().is_empty() || form.password.is_empty() {
        return login_page(
            StatusCode::BAD_REQUEST,
            Some("Email and password are required"),
            &form.email,
        );
    }

    if let Err(e) = state.client.tokens().prune_expired(state.config.session_ttl()).await {
        tracing::error!("Session token pruning failed: {}", e);
    }

    let new_id = uuid::Uuid::new_v4().to_string();
    let sessions = SessionManager::new(state.client.for_session(&new_id));

    match sessions.login(form.email.trim(), &form.password).await {
        Ok(session) => {
            if let Some(previous) = session_id(&headers) {
                let previous = SessionManager::new(state.client.for_session(&previous));
                if let Err(e) = previous.logout().await {
                    tracing::error!("Could not discard previous session: {}", e);
                }
            }
            tracing::info!(
                "Console session started for {} ({})",
                form.email.trim(),
                session.claims.as_ref().map(|c| c.role()).unwrap_or("unknown")
            );
            let cookie = session_cookie(&new_id, session.expires_in, state.config.secure_cookies);
            ([(header::SET_COOKIE, cookie)], Redirect::to("/")).into_response()
        }
        Err(ClientError::Api { status, message }) => {
            tracing::info!("Login rejected for {}: {} {}", form.email, status, message);
            login_page(StatusCode::UNAUTHORIZED, Some(&message), &form.email)
        }
        Err(e) => {
            tracing::error!("Login failed for {}: {}", form.email, e);
            login_page(StatusCode::BAD_GATEWAY, Some(&e.message()), &form.email)
        }
    }
}

/// POST /logout - Discard the stored token and expire the session cookie.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(visitor) = Visitor::resolve(&state, &headers).await {
        if let Err(e) = SessionManager::new(visitor.client).logout().await {
            tracing::error!("Logout failed for session {}: {}", visitor.session_id, e);
        }
    }

    (
        [(header::SET_COOKIE, expired_session_cookie())],
        Redirect::to("/login"),
    )
        .into_response()
}
