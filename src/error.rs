//! Error kinds at the core boundary.
//!
//! Two classes of failure map onto these variants: user errors (bad
//! argument, unauthorized, insufficient funds) that a command layer should
//! surface as a message, and programmer/invariant errors (`Inconsistent`)
//! that indicate corrupted internal state.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid order: {0}")]
    InvalidOrder(String),
    #[error("invalid quantity: {0}")]
    InvalidQuantity(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("inconsistent state: {0}")]
    Inconsistent(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("already exists: {0}")]
    AlreadyExists(String),
    #[error("not approved: {0}")]
    NotApproved(String),
    #[error("expired: {0}")]
    Expired(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
