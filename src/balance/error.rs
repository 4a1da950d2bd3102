use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceErrorKind {
    UnknownUser,
    /// The compare-and-swap guard failed: the stored balance no longer equals
    /// the expected value.
    Conflict,
    Backend,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceError {
    pub kind: BalanceErrorKind,
    pub message: String,
}

impl BalanceError {
    pub fn new(kind: BalanceErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for BalanceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for BalanceError {}

pub fn unknown_user(uid: &str) -> BalanceError {
    BalanceError::new(
        BalanceErrorKind::UnknownUser,
        format!("no user with uid '{}'", uid),
    )
}

pub fn conflict(message: impl Into<String>) -> BalanceError {
    BalanceError::new(BalanceErrorKind::Conflict, message)
}

pub fn backend_error(message: impl Into<String>) -> BalanceError {
    BalanceError::new(BalanceErrorKind::Backend, message)
}
