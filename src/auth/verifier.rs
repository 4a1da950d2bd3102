use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, header};
use serde::Deserialize;

use crate::auth::error::{AuthError, invalid_credential, provider_unavailable};

/// Verified identity claims, as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    pub username: String,
    pub groups: Vec<String>,
}

impl Claims {
    pub fn in_group(&self, group: &str) -> bool {
        self.groups.iter().any(|g| g == group)
    }
}

/// Black-box token verification against an external identity provider.
/// No local token validation logic lives in this crate.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, bearer: &str) -> Result<Claims, AuthError>;
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    preferred_username: String,
    #[serde(default)]
    groups: Vec<String>,
}

pub struct HttpTokenVerifier {
    client: Client,
    userinfo_url: String,
    timeout: Duration,
}

impl HttpTokenVerifier {
    pub fn new(userinfo_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            userinfo_url: userinfo_url.into(),
            timeout,
        }
    }
}

#[async_trait]
impl TokenVerifier for HttpTokenVerifier {
    async fn verify(&self, bearer: &str) -> Result<Claims, AuthError> {
        let response = self
            .client
            .get(&self.userinfo_url)
            .timeout(self.timeout)
            .header(header::AUTHORIZATION, format!("Bearer {}", bearer))
            .send()
            .await
            .map_err(|err| {
                provider_unavailable(format!("identity provider request failed: {}", err))
            })?;

        if !response.status().is_success() {
            tracing::debug!(
                target: "auth",
                status = response.status().as_u16(),
                "token_verification_rejected"
            );
            return Err(invalid_credential());
        }

        let body: UserInfo = response
            .json()
            .await
            .map_err(|err| provider_unavailable(format!("malformed userinfo response: {}", err)))?;

        Ok(Claims {
            username: body.preferred_username,
            groups: body.groups,
        })
    }
}
