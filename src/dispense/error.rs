use std::fmt;

use crate::auth::{AuthError, AuthErrorKind};

/// Orchestrator-visible failure taxonomy. Every condition surfaces to the
/// caller with a stable machine-readable code; none is retried automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispenseErrorKind {
    Unauthorized,
    BadParams,
    NotFound,
    SlotEmpty,
    InsufficientBalance,
    MachineUnreachable,
    MachineTimedOut,
    MachineRejected,
    /// The dispense command itself timed out: the physical state is unknown.
    AmbiguousOutcome,
    /// A mutation step failed after a confirmed physical dispense. Fatal;
    /// escalated to operators, never silently swallowed.
    InternalInconsistency,
    /// Infrastructure failure before any side effect (store or directory
    /// unavailable).
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispenseError {
    pub kind: DispenseErrorKind,
    pub message: String,
    /// Upstream HTTP status for `MachineRejected`.
    pub status: Option<u16>,
}

impl DispenseError {
    pub fn new(kind: DispenseErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn code(&self) -> &'static str {
        match self.kind {
            DispenseErrorKind::Unauthorized => "unauthorized",
            DispenseErrorKind::BadParams => "bad_params",
            DispenseErrorKind::NotFound => "not_found",
            DispenseErrorKind::SlotEmpty => "slot_empty",
            DispenseErrorKind::InsufficientBalance => "insufficient_balance",
            DispenseErrorKind::MachineUnreachable => "machine_unreachable",
            DispenseErrorKind::MachineTimedOut => "machine_timed_out",
            DispenseErrorKind::MachineRejected => "machine_rejected",
            DispenseErrorKind::AmbiguousOutcome => "ambiguous_outcome",
            DispenseErrorKind::InternalInconsistency => "internal_inconsistency",
            DispenseErrorKind::Internal => "internal",
        }
    }
}

impl fmt::Display for DispenseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} (status={})", self.message, status),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for DispenseError {}

impl From<AuthError> for DispenseError {
    fn from(err: AuthError) -> Self {
        let kind = match err.kind {
            AuthErrorKind::NoCredential
            | AuthErrorKind::InvalidCredential
            | AuthErrorKind::InvalidTrustedToken
            | AuthErrorKind::InsufficientPermission => DispenseErrorKind::Unauthorized,
            AuthErrorKind::ProviderUnavailable => DispenseErrorKind::Internal,
        };
        DispenseError::new(kind, err.message)
    }
}

pub fn unauthorized(message: impl Into<String>) -> DispenseError {
    DispenseError::new(DispenseErrorKind::Unauthorized, message)
}

pub fn bad_params(message: impl Into<String>) -> DispenseError {
    DispenseError::new(DispenseErrorKind::BadParams, message)
}

pub fn not_found(message: impl Into<String>) -> DispenseError {
    DispenseError::new(DispenseErrorKind::NotFound, message)
}

pub fn slot_empty(message: impl Into<String>) -> DispenseError {
    DispenseError::new(DispenseErrorKind::SlotEmpty, message)
}

pub fn insufficient_balance(message: impl Into<String>) -> DispenseError {
    DispenseError::new(DispenseErrorKind::InsufficientBalance, message)
}

pub fn machine_unreachable(message: impl Into<String>) -> DispenseError {
    DispenseError::new(DispenseErrorKind::MachineUnreachable, message)
}

pub fn machine_timed_out(message: impl Into<String>) -> DispenseError {
    DispenseError::new(DispenseErrorKind::MachineTimedOut, message)
}

pub fn machine_rejected(status: u16, message: impl Into<String>) -> DispenseError {
    DispenseError::new(DispenseErrorKind::MachineRejected, message).with_status(status)
}

pub fn ambiguous_outcome(message: impl Into<String>) -> DispenseError {
    DispenseError::new(DispenseErrorKind::AmbiguousOutcome, message)
}

pub fn internal_inconsistency(message: impl Into<String>) -> DispenseError {
    DispenseError::new(DispenseErrorKind::InternalInconsistency, message)
}

pub fn internal_error(message: impl Into<String>) -> DispenseError {
    DispenseError::new(DispenseErrorKind::Internal, message)
}
