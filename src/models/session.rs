//! Session, login and claim models matching the backend auth contract.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Request body for `POST /api/v1/auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Successful login response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
}

/// Decoded but unverified token payload.
///
/// Only ever used to decide which navigation renders; the backend re-checks
/// authorization on every call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Claims {
    pub role: Option<String>,
    /// Subject; the backend issues the user id as a string but numbers are tolerated
    pub sub: Option<Value>,
    pub email: Option<String>,
    pub exp: Option<i64>,
}

/// Known claims of an unexpected type read as absent instead of failing the whole token.
impl From<Map<String, Value>> for Claims {
    fn from(mut payload: Map<String, Value>) -> Self {
        let mut text = |key: &str| match payload.shift_remove(key) {
            Some(Value::String(s)) => Some(s),
            _ => None,
        };
        let role = text("role");
        let email = text("email");
        let sub = payload.shift_remove("sub").filter(|v| !v.is_null());
        let exp = payload
            .shift_remove("exp")
            .and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f as i64)));

        Self {
            role,
            sub,
            email,
            exp,
        }
    }
}

impl Claims {
    pub fn is_admin(&self) -> bool {
        self.role.as_deref() == Some("admin")
    }

    pub fn role(&self) -> &str {
        self.role.as_deref().unwrap_or("unknown")
    }

    /// Numeric user id carried in `sub`, when there is one.
    pub fn user_id(&self) -> Option<i64> {
        match self.sub.as_ref()? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Seconds until `exp`, if the token carries one.
    pub fn seconds_left(&self) -> Option<i64> {
        self.exp.map(|exp| exp - chrono::Utc::now().timestamp())
    }
}

/// The client-held bearer token plus its decoded claims.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub token: String,
    pub claims: Option<Claims>,
    /// Lifetime in seconds reported at login, or derived from `exp`
    pub expires_in: Option<i64>,
}

impl Session {
    /// Whether the token is known to be past its expiry.
    pub fn is_expired(&self) -> bool {
        self.expires_in.is_some_and(|left| left <= 0)
    }
}
