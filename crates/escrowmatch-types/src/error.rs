//! Error types for the EscrowMatch engine.
//!
//! All errors use the `EM_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by class:
//! - 1xx: Validation errors (caller-fixable)
//! - 2xx: Not-found errors
//! - 3xx: State-conflict errors (lost a race, wrong phase, duplicate write)
//! - 4xx: Authorization errors (identity or role mismatch)
//! - 5xx: Upstream errors (price collaborator)
//! - 6xx: Store integrity errors
//! - 9xx: Encoding and configuration errors
//!
//! No error in classes 1xx–5xx leaves an order partially updated.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::{OrderId, OrderStatus, Role};

/// Central error enum for all EscrowMatch operations.
#[derive(Debug, Error)]
pub enum EscrowError {
    // =================================================================
    // Validation Errors (1xx)
    // =================================================================
    /// The requested fiat amount is zero, negative, or unparseable.
    #[error("EM_ERR_100: Invalid amount: {reason}")]
    InvalidAmount { reason: String },

    /// The proof reference is blank or too long.
    #[error("EM_ERR_101: Invalid proof reference: {reason}")]
    InvalidProofReference { reason: String },

    // =================================================================
    // Not-found Errors (2xx)
    // =================================================================
    /// No order exists with this id.
    #[error("EM_ERR_200: Order not found: {0}")]
    OrderNotFound(OrderId),

    // =================================================================
    // State-conflict Errors (3xx)
    // =================================================================
    /// The order is no longer pending (accepted by someone else, or done).
    #[error("EM_ERR_300: Order {order_id} not acceptable: status is {status}")]
    OrderNotAcceptable {
        order_id: OrderId,
        status: OrderStatus,
    },

    /// The order's current state forbids the requested transition.
    #[error("EM_ERR_301: Invalid state for order {order_id} ({status}): {reason}")]
    InvalidState {
        order_id: OrderId,
        status: OrderStatus,
        reason: String,
    },

    /// An order with this id already exists in the store.
    #[error("EM_ERR_302: Order already exists: {0}")]
    DuplicateOrder(OrderId),

    // =================================================================
    // Authorization Errors (4xx)
    // =================================================================
    /// The caller is not the merchant assigned to this order.
    #[error("EM_ERR_400: Caller is not the assigned merchant of order {0}")]
    NotAssignedMerchant(OrderId),

    /// The caller is not the user who requested this order.
    #[error("EM_ERR_401: Caller is not the requester of order {0}")]
    NotRequester(OrderId),

    /// The caller's role does not permit this operation.
    #[error("EM_ERR_402: Role {actual} cannot perform this operation, {required} required")]
    RoleDenied { required: Role, actual: Role },

    /// The caller is neither requester nor assigned merchant.
    #[error("EM_ERR_403: Caller is not a participant of order {0}")]
    NotOrderParticipant(OrderId),

    // =================================================================
    // Upstream Errors (5xx)
    // =================================================================
    /// The price collaborator failed, timed out, or returned nonsense.
    #[error("EM_ERR_500: Quote unavailable: {reason}")]
    QuoteUnavailable { reason: String },

    // =================================================================
    // Store Integrity (6xx)
    // =================================================================
    /// A record violated the order invariants on write.
    #[error("EM_ERR_601: Order invariant violated: {reason}")]
    InvariantViolation { reason: String },

    // =================================================================
    // Encoding / Configuration (9xx)
    // =================================================================
    /// Serialization / deserialization error.
    #[error("EM_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (invalid value, missing field, etc.).
    #[error("EM_ERR_902: Configuration error: {0}")]
    Configuration(String),
}

/// Coarse classification used by transports to pick a response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    NotFound,
    StateConflict,
    Authorization,
    Upstream,
    Internal,
}

impl EscrowError {
    /// Which class of failure this is.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidAmount { .. } | Self::InvalidProofReference { .. } => {
                ErrorKind::Validation
            }
            Self::OrderNotFound(_) => ErrorKind::NotFound,
            Self::OrderNotAcceptable { .. }
            | Self::InvalidState { .. }
            | Self::DuplicateOrder(_) => ErrorKind::StateConflict,
            Self::NotAssignedMerchant(_)
            | Self::NotRequester(_)
            | Self::RoleDenied { .. }
            | Self::NotOrderParticipant(_) => ErrorKind::Authorization,
            Self::QuoteUnavailable { .. } => ErrorKind::Upstream,
            Self::InvariantViolation { .. }
            | Self::Serialization(_)
            | Self::Configuration(_) => ErrorKind::Internal,
        }
    }

    /// The `EM_ERR_xxx` code at the front of the display string.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidAmount { .. } => "EM_ERR_100",
            Self::InvalidProofReference { .. } => "EM_ERR_101",
            Self::OrderNotFound(_) => "EM_ERR_200",
            Self::OrderNotAcceptable { .. } => "EM_ERR_300",
            Self::InvalidState { .. } => "EM_ERR_301",
            Self::DuplicateOrder(_) => "EM_ERR_302",
            Self::NotAssignedMerchant(_) => "EM_ERR_400",
            Self::NotRequester(_) => "EM_ERR_401",
            Self::RoleDenied { .. } => "EM_ERR_402",
            Self::NotOrderParticipant(_) => "EM_ERR_403",
            Self::QuoteUnavailable { .. } => "EM_ERR_500",
            Self::InvariantViolation { .. } => "EM_ERR_601",
            Self::Serialization(_) => "EM_ERR_901",
            Self::Configuration(_) => "EM_ERR_902",
        }
    }

    /// Shorthand for a non-positive amount.
    #[must_use]
    pub fn non_positive_amount(amount: Decimal) -> Self {
        Self::InvalidAmount {
            reason: format!("{amount} is not a positive amount"),
        }
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, EscrowError>;

impl From<serde_json::Error> for EscrowError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
