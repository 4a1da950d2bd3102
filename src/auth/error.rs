use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorKind {
    /// No machine token and no bearer token were presented.
    NoCredential,
    /// A bearer token was presented but the identity provider rejected it.
    InvalidCredential,
    /// A machine token was presented and did not match the configured value.
    /// This never falls through to bearer validation.
    InvalidTrustedToken,
    /// Authenticated, but the admin-only group claim is absent.
    InsufficientPermission,
    /// The identity provider could not be reached.
    ProviderUnavailable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthError {
    pub kind: AuthErrorKind,
    pub message: String,
}

impl AuthError {
    pub fn new(kind: AuthErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AuthError {}

pub fn no_credential() -> AuthError {
    AuthError::new(AuthErrorKind::NoCredential, "could not authenticate user")
}

pub fn invalid_credential() -> AuthError {
    AuthError::new(
        AuthErrorKind::InvalidCredential,
        "could not authenticate user",
    )
}

pub fn invalid_trusted_token() -> AuthError {
    AuthError::new(
        AuthErrorKind::InvalidTrustedToken,
        "unable to authenticate trusted client",
    )
}

pub fn insufficient_permission() -> AuthError {
    AuthError::new(
        AuthErrorKind::InsufficientPermission,
        "user does not have the correct permissions",
    )
}

pub fn provider_unavailable(message: impl Into<String>) -> AuthError {
    AuthError::new(AuthErrorKind::ProviderUnavailable, message)
}
