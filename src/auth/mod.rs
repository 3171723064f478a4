//! Token provider and session handling.
//!
//! The stored bearer token is only ever replaced wholesale. Its claims are decoded without
//! signature verification and serve as a rendering hint (which navigation to show), never as
//! an authorization decision: the backend re-checks every call.

mod session;

pub use session::*;

use std::sync::Arc;

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, Duration, Utc};

use crate::errors::ClientError;
use crate::models::Claims;

/// Persistent client-side storage for bearer tokens, keyed by storage key name.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn load(&self, key: &str) -> Result<Option<String>, ClientError>;

    async fn save(&self, key: &str, token: &str) -> Result<(), ClientError>;

    /// Remove the token under `key`. Returns whether one was stored.
    async fn remove(&self, key: &str) -> Result<bool, ClientError>;

    /// Remove the token under `key` only if it still equals `token`.
    async fn remove_if_matches(&self, key: &str, token: &str) -> Result<bool, ClientError>;

    /// Remove every token last saved before `cutoff`. Returns how many were removed.
    async fn remove_saved_before(&self, cutoff: DateTime<Utc>) -> Result<u64, ClientError>;
}

/// In-process token store.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    tokens: tokio::sync::RwLock<std::collections::HashMap<String, (String, DateTime<Utc>)>>,
}

#[cfg(test)]
impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn load(&self, key: &str) -> Result<Option<String>, ClientError> {
        Ok(self
            .tokens
            .read()
            .await
            .get(key)
            .map(|(token, _)| token.clone()))
    }

    async fn save(&self, key: &str, token: &str) -> Result<(), ClientError> {
        self.tokens
            .write()
            .await
            .insert(key.to_string(), (token.to_string(), Utc::now()));
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool, ClientError> {
        Ok(self.tokens.write().await.remove(key).is_some())
    }

    async fn remove_if_matches(&self, key: &str, token: &str) -> Result<bool, ClientError> {
        let mut tokens = self.tokens.write().await;
        if tokens.get(key).map(|(t, _)| t.as_str()) == Some(token) {
            tokens.remove(key);
            return Ok(true);
        }
        Ok(false)
    }

    async fn remove_saved_before(&self, cutoff: DateTime<Utc>) -> Result<u64, ClientError> {
        let mut tokens = self.tokens.write().await;
        let before = tokens.len();
        tokens.retain(|_, (_, saved_at)| *saved_at >= cutoff);
        Ok((before - tokens.len()) as u64)
    }
}

/// Stores, retrieves and clears the session credential under one storage key.
#[derive(Clone)]
pub struct TokenProvider {
    store: Arc<dyn TokenStore>,
    key: String,
}

impl TokenProvider {
    pub fn new(store: Arc<dyn TokenStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// Provider over the same store for one console visitor.
    pub fn scoped(&self, session_id: &str) -> Self {
        Self {
            store: self.store.clone(),
            key: format!("{}:{}", self.key, session_id),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub async fn get(&self) -> Result<Option<String>, ClientError> {
        self.store.load(&self.key).await
    }

    pub async fn set(&self, token: &str) -> Result<(), ClientError> {
        self.store.save(&self.key, token).await
    }

    pub async fn clear(&self) -> Result<bool, ClientError> {
        self.store.remove(&self.key).await
    }

    /// Discard the session after `token` was rejected, only if it is still the stored one.
    ///
    /// Concurrent calls rejected with the same token clear the session exactly once, and a
    /// newer login is left alone. The transport calls this on every 401/403.
    pub async fn on_unauthorized(&self, token: &str) -> Result<bool, ClientError> {
        self.store.remove_if_matches(&self.key, token).await
    }

    /// Drop every token in the store, under any key, not saved within `max_age`.
    pub async fn prune_expired(&self, max_age: Duration) -> Result<u64, ClientError> {
        let pruned = self.store.remove_saved_before(Utc::now() - max_age).await?;
        if pruned > 0 {
            tracing::info!("Pruned {} expired session token(s)", pruned);
        }
        Ok(pruned)
    }
}

/// Decode the payload segment of a compact JWT without verifying its signature.
///
/// Returns `None` for anything other than three dot-separated segments whose middle segment
/// is base64url-encoded UTF-8 JSON object text.
pub fn decode_claims(token: &str) -> Option<Claims> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return None;
    }

    let mut payload: String = segments[1]
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();
    while payload.len() % 4 != 0 {
        payload.push('=');
    }

    let bytes = general_purpose::STANDARD.decode(payload.as_bytes()).ok()?;
    let text = String::from_utf8(bytes).ok()?;
    match serde_json::from_str(&text).ok()? {
        serde_json::Value::Object(payload) => Some(Claims::from(payload)),
        _ => None,
    }
}

#[cfg(test)]
pub(crate) fn encode_test_token(claims: &serde_json::Value) -> String {
    let header = general_purpose::URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = general_purpose::URL_SAFE_NO_PAD.encode(claims.to_string().as_bytes());
    format!("{}.{}.signature", header, payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_claims_valid() {
        let token = encode_test_token(&json!({
            "sub": "12",
            "email": "admin@example.com",
            "role": "admin",
            "exp": 1893456000
        }));

        let claims = decode_claims(&token).unwrap();
        assert!(claims.is_admin());
        assert_eq!(claims.user_id(), Some(12));
        assert_eq!(claims.email.as_deref(), Some("admin@example.com"));
        assert_eq!(claims.exp, Some(1893456000));
    }

    #[test]
    fn test_decode_claims_utf8_payload() {
        let token = encode_test_token(&json!({ "role": "employee", "email": "josé.núñez@example.com" }));

        let claims = decode_claims(&token).unwrap();
        assert_eq!(claims.role(), "employee");
        assert_eq!(claims.email.as_deref(), Some("josé.núñez@example.com"));
    }

    #[test]
    fn test_decode_claims_tolerates_odd_claim_types() {
        let token = encode_test_token(&json!({
            "role": "admin",
            "email": 42,
            "exp": 1893456000.5,
            "sub": 12
        }));

        let claims = decode_claims(&token).unwrap();
        assert!(claims.is_admin());
        assert_eq!(claims.email, None);
        assert_eq!(claims.exp, Some(1893456000));
        assert_eq!(claims.user_id(), Some(12));
    }

    #[test]
    fn test_decode_claims_wrong_segment_count() {
        assert!(decode_claims("").is_none());
        assert!(decode_claims("only.two").is_none());
        assert!(decode_claims("a.b.c.d").is_none());
    }

    #[test]
    fn test_decode_claims_garbage_payload() {
        assert!(decode_claims("x.!!!not-base64!!!.y").is_none());
        // Valid base64 of "not json"
        assert!(decode_claims("x.bm90IGpzb24.y").is_none());
        // Valid base64 of "[1,2]", a JSON array
        assert!(decode_claims("x.WzEsMl0.y").is_none());
    }

    #[tokio::test]
    async fn test_provider_set_get_clear() {
        let provider = TokenProvider::new(Arc::new(MemoryTokenStore::new()), "mdm_token");
        assert!(provider.get().await.unwrap().is_none());

        let token = encode_test_token(&json!({ "role": "manager" }));
        provider.set(&token).await.unwrap();
        assert_eq!(provider.get().await.unwrap().as_deref(), Some(token.as_str()));

        assert!(provider.clear().await.unwrap());
        assert!(!provider.clear().await.unwrap());
        assert!(provider.get().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_prune_expired_spans_all_sessions() {
        let root = TokenProvider::new(Arc::new(MemoryTokenStore::new()), "mdm_token");
        root.scoped("a").set("token-a").await.unwrap();
        root.scoped("b").set("token-b").await.unwrap();

        assert_eq!(root.prune_expired(Duration::hours(24)).await.unwrap(), 0);
        assert!(root.scoped("a").get().await.unwrap().is_some());

        // Everything saved before now plus a margin counts as expired
        assert_eq!(root.prune_expired(Duration::seconds(-60)).await.unwrap(), 2);
        assert!(root.scoped("a").get().await.unwrap().is_none());
        assert!(root.scoped("b").get().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_on_unauthorized_only_once() {
        let provider = TokenProvider::new(Arc::new(MemoryTokenStore::new()), "mdm_token");
        provider.set("old").await.unwrap();

        assert!(provider.on_unauthorized("old").await.unwrap());
        assert!(!provider.on_unauthorized("old").await.unwrap());

        // A newer login is never discarded by a stale rejection
        provider.set("new").await.unwrap();
        assert!(!provider.on_unauthorized("old").await.unwrap());
        assert_eq!(provider.get().await.unwrap().as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn test_scoped_providers_are_isolated() {
        let root = TokenProvider::new(Arc::new(MemoryTokenStore::new()), "mdm_token");
        let a = root.scoped("a");
        let b = root.scoped("b");
        assert_eq!(a.key(), "mdm_token:a");

        a.set("token-a").await.unwrap();
        assert!(b.get().await.unwrap().is_none());
        assert!(root.get().await.unwrap().is_none());
    }
}
