use std::sync::Arc;

use crate::auth::{
    error::{AuthError, insufficient_permission, invalid_trusted_token, no_credential},
    verifier::{Claims, TokenVerifier},
};

/// Credentials extracted from the transport layer by the caller.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    /// Value of the pre-shared machine token header, if present.
    pub machine_token: Option<String>,
    /// Bearer token, if present.
    pub bearer: Option<String>,
}

impl Credentials {
    pub fn trusted(token: impl Into<String>) -> Self {
        Self {
            machine_token: Some(token.into()),
            bearer: None,
        }
    }

    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            machine_token: None,
            bearer: Some(token.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    /// System-to-system caller holding the shared machine secret. Bypasses
    /// per-user checks entirely.
    TrustedMachine,
    User(Claims),
}

impl Principal {
    pub fn username(&self) -> Option<&str> {
        match self {
            Principal::TrustedMachine => None,
            Principal::User(claims) => Some(&claims.username),
        }
    }
}

pub struct AuthGate {
    machine_token: String,
    admin_group: String,
    verifier: Arc<dyn TokenVerifier>,
}

impl AuthGate {
    pub fn new(
        machine_token: impl Into<String>,
        admin_group: impl Into<String>,
        verifier: Arc<dyn TokenVerifier>,
    ) -> Self {
        Self {
            machine_token: machine_token.into(),
            admin_group: admin_group.into(),
            verifier,
        }
    }

    /// Resolve a caller to a principal. A presented machine token is decided
    /// on its own: a mismatch is rejected outright and never falls through to
    /// bearer validation.
    pub async fn authenticate(&self, credentials: &Credentials) -> Result<Principal, AuthError> {
        if let Some(key) = &credentials.machine_token {
            if *key == self.machine_token {
                return Ok(Principal::TrustedMachine);
            }
            tracing::debug!(target: "auth", "trusted_client_token_mismatch");
            return Err(invalid_trusted_token());
        }

        let bearer = match &credentials.bearer {
            Some(bearer) => bearer,
            None => {
                tracing::debug!(target: "auth", "request_without_credentials");
                return Err(no_credential());
            }
        };

        let claims = self.verifier.verify(bearer).await?;
        tracing::debug!(target: "auth", username = %claims.username, "user_authenticated");
        Ok(Principal::User(claims))
    }

    /// Admin-only operations additionally require the configured group claim.
    /// `mock_mode` bypasses only the group check; authentication is still
    /// required.
    pub fn authorize_admin(&self, principal: &Principal, mock_mode: bool) -> Result<(), AuthError> {
        match principal {
            Principal::TrustedMachine => Ok(()),
            Principal::User(_) if mock_mode => Ok(()),
            Principal::User(claims) => {
                if claims.in_group(&self.admin_group) {
                    Ok(())
                } else {
                    Err(insufficient_permission())
                }
            }
        }
    }
}
