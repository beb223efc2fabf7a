use thiserror::Error;

/// Identity and credential failures. The display strings are the wire-level
/// `error` field values clients match on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Invalid Auth")]
    InvalidAuth,
    #[error("Invalid Password")]
    InvalidPassword,
    /// A bare (unprefixed) name collided with a registered account.
    #[error("Username registered")]
    UsernameRegistered,
    #[error("Access Denied")]
    AccessDenied,
}

/// Channel lookup and creation failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RoutingError {
    #[error("Invalid Channel")]
    InvalidChannel,
    #[error("Duplicate Channel")]
    DuplicateChannel,
}

/// Malformed or out-of-range request input. Recoverable by the caller,
/// never fatal to the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Empty Message")]
    EmptyMessage,
    #[error("Invalid Level")]
    InvalidLevel,
    #[error("Missing Params")]
    MissingParams,
    #[error("Duplicate User")]
    DuplicateUser,
    #[error("Insufficient Level")]
    InsufficientLevel,
    #[error("Filter Toggle Denied")]
    FilterToggleDenied,
}
