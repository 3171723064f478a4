//! Authenticated JSON transport over the backend REST API.
//!
//! One call is one request-response round trip: no retries, no deduplication and no
//! timeouts beyond the HTTP stack defaults.

use std::time::Instant;

use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use serde_json::Value;

use crate::auth::TokenProvider;
use crate::errors::ClientError;

/// HTTP methods the console issues. PATCH is never used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }

    /// Whether a JSON body is serialized for this method.
    pub fn carries_body(&self) -> bool {
        matches!(self, Method::Post | Method::Put)
    }

    fn to_reqwest(self) -> reqwest::Method {
        match self {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// What the caller expects back from a successful call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expect {
    /// Decode the body as JSON (unless the status is 204)
    Json,
    /// Never decode the body
    Empty,
}

/// Status and decoded body of a successful call.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: u16,
    pub body: Option<Value>,
}

/// Wraps authenticated HTTP calls to the backend.
#[derive(Clone)]
pub struct TransportClient {
    http: reqwest::Client,
    base_url: String,
    tokens: TokenProvider,
}

impl TransportClient {
    pub fn new(base_url: &str, tokens: TokenProvider) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, tokens)
    }

    pub fn with_client(http: reqwest::Client, base_url: &str, tokens: TokenProvider) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens,
        }
    }

    /// Same connection pool and base URL, token scoped to one console visitor.
    pub fn for_session(&self, session_id: &str) -> Self {
        Self {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            tokens: self.tokens.scoped(session_id),
        }
    }

    pub fn tokens(&self) -> &TokenProvider {
        &self.tokens
    }

    /// Issue one call and return the decoded body, or `None` for empty replies.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        expect: Expect,
    ) -> Result<Option<Value>, ClientError> {
        Ok(self.exchange(method, path, body, expect).await?.body)
    }

    /// Issue one call and return the status alongside the decoded body.
    pub async fn exchange(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        expect: Expect,
    ) -> Result<Reply, ClientError> {
        let token = self.tokens.get().await?;
        let url = format!("{}{}", self.base_url, path);

        let mut request = self
            .http
            .request(method.to_reqwest(), &url)
            .header(CONTENT_TYPE, "application/json");
        if let Some(token) = &token {
            request = request.bearer_auth(token);
        }
        if method.carries_body() {
            if let Some(body) = body {
                request = request.json(body);
            }
        }

        tracing::debug!("{} {} (authenticated: {})", method.as_str(), path, token.is_some());
        let started = Instant::now();

        let response = request.send().await.map_err(|e| {
            tracing::warn!("{} {} failed without a response: {}", method.as_str(), path, e);
            ClientError::Transport(format!("Transport error: {}", e))
        })?;
        let status = response.status();

        tracing::debug!(
            "{} {} -> {} in {}ms",
            method.as_str(),
            path,
            status.as_u16(),
            started.elapsed().as_millis()
        );

        if status.is_success() {
            if status == StatusCode::NO_CONTENT || expect == Expect::Empty {
                return Ok(Reply {
                    status: status.as_u16(),
                    body: None,
                });
            }
            let bytes = response.bytes().await?;
            let value: Value = serde_json::from_slice(&bytes)?;
            return Ok(Reply {
                status: status.as_u16(),
                body: Some(value),
            });
        }

        let text = response.text().await.unwrap_or_default();
        let message =
            extract_message(&text).unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
        tracing::warn!(
            "{} {} rejected: status={} message=\"{}\"",
            method.as_str(),
            path,
            status.as_u16(),
            message
        );

        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            if let Some(token) = &token {
                self.discard_token(token).await;
            }
        }

        Err(ClientError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn discard_token(&self, token: &str) {
        match self.tokens.on_unauthorized(token).await {
            Ok(true) => tracing::info!("Session {} cleared after rejection", self.tokens.key()),
            Ok(false) => {}
            Err(e) => tracing::error!("Could not clear session {}: {}", self.tokens.key(), e),
        }
    }
}

/// Pull a human-readable message out of an error body.
///
/// Looks at `detail` then `message`. A list-shaped `detail` (field validation errors) is
/// joined from each entry's `msg`.
pub fn extract_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let object = value.as_object()?;

    for key in ["detail", "message"] {
        match object.get(key) {
            Some(Value::String(s)) if !s.is_empty() => return Some(s.clone()),
            Some(Value::Array(items)) => {
                let parts: Vec<String> = items
                    .iter()
                    .filter_map(|item| item.get("msg").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect();
                if !parts.is_empty() {
                    return Some(parts.join("; "));
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_message_detail() {
        assert_eq!(
            extract_message(r#"{"detail":"Invalid credentials"}"#).as_deref(),
            Some("Invalid credentials")
        );
    }

    #[test]
    fn test_extract_message_prefers_detail_over_message() {
        assert_eq!(
            extract_message(r#"{"message":"second","detail":"first"}"#).as_deref(),
            Some("first")
        );
        assert_eq!(
            extract_message(r#"{"message":"only message"}"#).as_deref(),
            Some("only message")
        );
    }

    #[test]
    fn test_extract_message_validation_list() {
        let body = r#"{"detail":[{"loc":["body","email"],"msg":"field required"},{"msg":"bad date"}]}"#;
        assert_eq!(
            extract_message(body).as_deref(),
            Some("field required; bad date")
        );
    }

    #[test]
    fn test_extract_message_tolerates_non_json() {
        assert!(extract_message("<html>Bad Gateway</html>").is_none());
        assert!(extract_message("").is_none());
        assert!(extract_message(r#"["detail"]"#).is_none());
        assert!(extract_message(r#"{"error":"nope"}"#).is_none());
    }

    #[test]
    fn test_only_post_and_put_carry_bodies() {
        assert!(Method::Post.carries_body());
        assert!(Method::Put.carries_body());
        assert!(!Method::Get.carries_body());
        assert!(!Method::Delete.carries_body());
    }
}
