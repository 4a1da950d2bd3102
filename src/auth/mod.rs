pub mod error;
pub mod gate;
pub mod verifier;

pub use error::{AuthError, AuthErrorKind};
pub use gate::{AuthGate, Credentials, Principal};
pub use verifier::{Claims, HttpTokenVerifier, TokenVerifier};
