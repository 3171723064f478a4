//! Owner-controlled session lifecycle: login and logout.
//!
//! Rejected credentials are discarded by the transport itself, through the token provider
//! it was built with.

use serde_json::Value;

use crate::auth::decode_claims;
use crate::errors::ClientError;
use crate::models::{Claims, LoginRequest, LoginResponse, Session};
use crate::transport::{Expect, Method, TransportClient};

/// Path of the backend login endpoint.
pub const LOGIN_PATH: &str = "/api/v1/auth/login";

/// Creates and destroys the session held by a transport client's token provider.
#[derive(Clone)]
pub struct SessionManager {
    client: TransportClient,
}

impl SessionManager {
    pub fn new(client: TransportClient) -> Self {
        Self { client }
    }

    /// Exchange credentials for a token and store it.
    ///
    /// Only a 200 reply counts as a successful login.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, ClientError> {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let body = serde_json::to_value(&request)?;

        let reply = self
            .client
            .exchange(Method::Post, LOGIN_PATH, Some(&body), Expect::Json)
            .await?;
        if reply.status != 200 {
            return Err(ClientError::Api {
                status: reply.status,
                message: format!("HTTP {}", reply.status),
            });
        }

        let response: LoginResponse = serde_json::from_value(reply.body.unwrap_or(Value::Null))?;
        self.client.tokens().set(&response.access_token).await?;
        tracing::info!("Login succeeded for {}", email);

        let claims = decode_claims(&response.access_token);
        let expires_in = response
            .expires_in
            .or_else(|| claims.as_ref().and_then(Claims::seconds_left));
        Ok(Session {
            token: response.access_token,
            claims,
            expires_in,
        })
    }

    pub async fn logout(&self) -> Result<(), ClientError> {
        if self.client.tokens().clear().await? {
            tracing::info!("Session {} logged out", self.client.tokens().key());
        }
        Ok(())
    }
}
