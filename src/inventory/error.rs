use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InventoryErrorKind {
    NotFound,
    Backend,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryError {
    pub kind: InventoryErrorKind,
    pub message: String,
}

impl InventoryError {
    pub fn new(kind: InventoryErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for InventoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for InventoryError {}

pub fn not_found(message: impl Into<String>) -> InventoryError {
    InventoryError::new(InventoryErrorKind::NotFound, message)
}

pub fn backend_error(message: impl Into<String>) -> InventoryError {
    InventoryError::new(InventoryErrorKind::Backend, message)
}
