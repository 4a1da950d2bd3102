use std::fmt;

/// Failure taxonomy for one machine call. The kinds are never collapsed: the
/// coordinator's user-facing message differs per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelErrorKind {
    /// Connection-level failure before any response.
    Unreachable,
    /// No response within the bounded timeout.
    TimedOut,
    /// The machine answered but refused (e.g. jammed).
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelError {
    pub kind: ChannelErrorKind,
    pub message: String,
    /// HTTP status for `Rejected`.
    pub status: Option<u16>,
}

impl ChannelError {
    pub fn new(kind: ChannelErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
        }
    }
}

impl fmt::Display for ChannelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} (status={})", self.message, status),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for ChannelError {}

pub fn unreachable(message: impl Into<String>) -> ChannelError {
    ChannelError::new(ChannelErrorKind::Unreachable, message)
}

pub fn timed_out(message: impl Into<String>) -> ChannelError {
    ChannelError::new(ChannelErrorKind::TimedOut, message)
}

pub fn rejected(status: u16, message: impl Into<String>) -> ChannelError {
    ChannelError {
        kind: ChannelErrorKind::Rejected,
        message: message.into(),
        status: Some(status),
    }
}
