//! Order types and the lifecycle state machine.
//!
//! ## State Machine
//!
//! ```text
//!   ┌─────────┐ accept (CAS) ┌──────────┐ verify ┌───────────┐
//!   │ PENDING ├─────────────▶│ ACCEPTED ├───────▶│ COMPLETED │
//!   └─────────┘              └────┬─────┘        └───────────┘
//!                                 │ attach proof (once)
//!                                 └──▶ ACCEPTED + proof
//! ```
//!
//! Every mutation goes through [`Order::apply`], which checks the full
//! precondition before touching any field. A store that runs `apply` under
//! its write lock therefore gets an atomic conditional update for free.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{EscrowError, MerchantId, OrderId, Result, UserId, constants};

/// Lifecycle status of an order.
///
/// Transitions are **monotonic**: `Pending → Accepted → Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Accepted,
    Completed,
}

impl OrderStatus {
    /// Can an order move from this status to `target`?
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Pending, Self::Accepted) | (Self::Accepted, Self::Completed)
        )
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        *self == Self::Completed
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Accepted => write!(f, "ACCEPTED"),
            Self::Completed => write!(f, "COMPLETED"),
        }
    }
}

/// A requested change to a stored order, with its caller baked in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderTransition {
    /// `Pending → Accepted`, assigning the merchant.
    Accept { merchant_id: MerchantId },
    /// Record the proof reference on an accepted order. Status unchanged.
    AttachProof {
        merchant_id: MerchantId,
        proof_reference: String,
    },
    /// `Accepted → Completed`, by the requester, once proof exists.
    Complete { requester_id: UserId },
}

impl OrderTransition {
    /// The status the stored order must have for this transition to apply.
    #[must_use]
    pub fn expected_status(&self) -> OrderStatus {
        match self {
            Self::Accept { .. } => OrderStatus::Pending,
            Self::AttachProof { .. } | Self::Complete { .. } => OrderStatus::Accepted,
        }
    }

    /// The status the order has once this transition is applied.
    #[must_use]
    pub fn target_status(&self) -> OrderStatus {
        match self {
            Self::Accept { .. } | Self::AttachProof { .. } => OrderStatus::Accepted,
            Self::Complete { .. } => OrderStatus::Completed,
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Accept { .. } => "accept",
            Self::AttachProof { .. } => "attach_proof",
            Self::Complete { .. } => "complete",
        }
    }
}

/// One escrow request from a user, fulfilled by at most one merchant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub requester_id: UserId,
    /// Set exactly once, on acceptance.
    pub merchant_id: Option<MerchantId>,
    pub fiat_amount: Decimal,
    /// Fixed at creation from the quote of that moment.
    pub crypto_amount: Decimal,
    pub status: OrderStatus,
    /// Set at most once, by the assigned merchant.
    pub proof_reference: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// A fresh `Pending` order.
    #[must_use]
    pub fn new(requester_id: UserId, fiat_amount: Decimal, crypto_amount: Decimal) -> Self {
        let now = Utc::now();
        Self {
            id: OrderId::new(),
            requester_id,
            merchant_id: None,
            fiat_amount,
            crypto_amount,
            status: OrderStatus::Pending,
            proof_reference: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check `transition` against the current state without mutating.
    ///
    /// # Errors
    /// - `OrderNotAcceptable` for an accept on anything but an unassigned pending order
    /// - `NotAssignedMerchant` / `NotRequester` on identity mismatch
    /// - `InvalidState` when the status or proof presence forbids the step
    /// - `InvalidProofReference` for a blank or oversized reference
    pub fn check(&self, transition: &OrderTransition) -> Result<()> {
        let in_expected_status = self.status == transition.expected_status();
        match transition {
            OrderTransition::Accept { .. } => {
                if !in_expected_status || self.merchant_id.is_some() {
                    return Err(EscrowError::OrderNotAcceptable {
                        order_id: self.id,
                        status: self.status,
                    });
                }
            }
            OrderTransition::AttachProof {
                merchant_id,
                proof_reference,
            } => {
                if self.merchant_id != Some(*merchant_id) {
                    return Err(EscrowError::NotAssignedMerchant(self.id));
                }
                if !in_expected_status {
                    return Err(self.invalid_state("proof can only be attached to an accepted order"));
                }
                if self.proof_reference.is_some() {
                    return Err(self.invalid_state("proof already submitted"));
                }
                validate_proof_reference(proof_reference)?;
            }
            OrderTransition::Complete { requester_id } => {
                if self.requester_id != *requester_id {
                    return Err(EscrowError::NotRequester(self.id));
                }
                if self.status.is_terminal() {
                    return Err(self.invalid_state("order already completed"));
                }
                if !in_expected_status {
                    return Err(self.invalid_state("only an accepted order can be verified"));
                }
                if self.proof_reference.is_none() {
                    return Err(self.invalid_state("no proof submitted yet"));
                }
            }
        }

        let target = transition.target_status();
        if target != self.status && !self.status.can_transition_to(target) {
            return Err(self.invalid_state("status change not allowed"));
        }
        Ok(())
    }

    /// Apply `transition` if and only if [`Order::check`] passes.
    ///
    /// On error the order is untouched. Proof references are stored as
    /// submitted; only their trimmed form is validated.
    pub fn apply(&mut self, transition: &OrderTransition) -> Result<()> {
        self.check(transition)?;
        match transition {
            OrderTransition::Accept { merchant_id } => {
                self.merchant_id = Some(*merchant_id);
            }
            OrderTransition::AttachProof {
                proof_reference, ..
            } => {
                self.proof_reference = Some(proof_reference.clone());
            }
            OrderTransition::Complete { .. } => {}
        }
        self.status = transition.target_status();
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Verify the record-level invariants.
    ///
    /// # Errors
    /// Returns `InvariantViolation` describing the first broken rule.
    pub fn check_invariants(&self) -> Result<()> {
        let assigned = matches!(self.status, OrderStatus::Accepted | OrderStatus::Completed);
        if self.merchant_id.is_some() != assigned {
            return Err(EscrowError::InvariantViolation {
                reason: format!(
                    "order {} is {} but merchant assignment is {:?}",
                    self.id, self.status, self.merchant_id
                ),
            });
        }
        if self.proof_reference.is_some() && !assigned {
            return Err(EscrowError::InvariantViolation {
                reason: format!("order {} has a proof while {}", self.id, self.status),
            });
        }
        if self.status == OrderStatus::Completed && self.proof_reference.is_none() {
            return Err(EscrowError::InvariantViolation {
                reason: format!("order {} completed without proof", self.id),
            });
        }
        if self.fiat_amount <= Decimal::ZERO || self.crypto_amount <= Decimal::ZERO {
            return Err(EscrowError::InvariantViolation {
                reason: format!("order {} has a non-positive amount", self.id),
            });
        }
        Ok(())
    }

    /// Is this caller the requester or the assigned merchant?
    #[must_use]
    pub fn is_participant(&self, party: uuid::Uuid) -> bool {
        self.requester_id.0 == party || self.merchant_id.is_some_and(|m| m.0 == party)
    }

    /// The projection shown to prospective merchants.
    #[must_use]
    pub fn pending_view(&self) -> PendingOrderView {
        PendingOrderView {
            order_id: self.id,
            fiat_amount: self.fiat_amount,
            crypto_amount: self.crypto_amount,
        }
    }

    fn invalid_state(&self, reason: &str) -> EscrowError {
        EscrowError::InvalidState {
            order_id: self.id,
            status: self.status,
            reason: reason.to_string(),
        }
    }
}

/// A pending order as listed to merchants: no requester identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingOrderView {
    pub order_id: OrderId,
    pub fiat_amount: Decimal,
    pub crypto_amount: Decimal,
}

/// Reject anything but a strictly positive fiat amount.
///
/// # Errors
/// Returns `InvalidAmount` for zero or negative values.
pub fn validate_fiat_amount(amount: Decimal) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(EscrowError::non_positive_amount(amount));
    }
    Ok(())
}

/// Parse and validate a fiat amount from its textual form.
///
/// # Errors
/// Returns `InvalidAmount` for unparseable, zero, or negative input.
pub fn parse_fiat_amount(raw: &str) -> Result<Decimal> {
    let amount = Decimal::from_str(raw.trim()).map_err(|e| EscrowError::InvalidAmount {
        reason: format!("'{raw}' is not a decimal number: {e}"),
    })?;
    validate_fiat_amount(amount)?;
    Ok(amount)
}

fn validate_proof_reference(reference: &str) -> Result<()> {
    if reference.trim().is_empty() {
        return Err(EscrowError::InvalidProofReference {
            reason: "reference is empty".to_string(),
        });
    }
    if reference.len() > constants::MAX_PROOF_REFERENCE_LEN {
        return Err(EscrowError::InvalidProofReference {
            reason: format!(
                "reference is {} bytes, limit is {}",
                reference.len(),
                constants::MAX_PROOF_REFERENCE_LEN
            ),
        });
    }
    Ok(())
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl Order {
    /// A pending order for 1000 fiat at 50 crypto.
    pub fn dummy_pending() -> Self {
        Self::new(UserId::new(), Decimal::new(1000, 0), Decimal::new(50, 0))
    }

    pub fn dummy_accepted(merchant_id: MerchantId) -> Self {
        let mut order = Self::dummy_pending();
        order.merchant_id = Some(merchant_id);
        order.status = OrderStatus::Accepted;
        order
    }
}
