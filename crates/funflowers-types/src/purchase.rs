//! # Purchase: the store transaction and its lifecycle
//!
//! A [`Purchase`] is borrowed from the billing gateway for one lifecycle
//! pass. The controller never owns it: the store remains the source of
//! truth, and an unconsumed purchase keeps showing up in reconciliation
//! queries until it is consumed.
//!
//! ## State Machine
//!
//! ```text
//!  DETECTED → VALIDATING ─┬─▶ VALIDATED ─┬─▶ AWARDING ─▶ CONSUMING ─┬─▶ CONSUMED
//!                         │              └──────────────▶ CONSUMING  └─▶ CONSUME_FAILED
//!                         └─▶ REJECTED
//! ```
//!
//! `VALIDATED → CONSUMING` skips the award for a token already awarded this
//! session. `REJECTED` and `CONSUME_FAILED` end one pass only: the next
//! detection of the same token starts over at `DETECTED`. `CONSUMED` is final.

use serde::{Deserialize, Serialize};

use crate::{FlowersError, ProductId, PurchaseToken, Result};

/// A purchase as reported by the billing gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Purchase {
    /// Token required to consume this purchase.
    pub token: PurchaseToken,
    /// SKUs contained in this transaction. Exactly one is expected.
    pub product_ids: Vec<ProductId>,
    /// Raw signed purchase data (the store's purchase JSON).
    pub payload: String,
    /// Base64 signature over `payload`.
    pub signature: String,
}

impl Purchase {
    /// The single product this purchase is for.
    ///
    /// # Errors
    /// Returns `MalformedPurchase` if the purchase carries zero or several
    /// product ids.
    pub fn single_product(&self) -> Result<&ProductId> {
        match self.product_ids.as_slice() {
            [only] => Ok(only),
            [] => Err(FlowersError::MalformedPurchase {
                reason: format!("{} has no product id", self.token),
            }),
            many => Err(FlowersError::MalformedPurchase {
                reason: format!("{} has {} product ids, expected 1", self.token, many.len()),
            }),
        }
    }
}

/// How a purchase entered the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PurchaseOrigin {
    /// The player completed a buy flow.
    PurchaseFlow,
    /// An owned-but-unconsumed purchase surfaced by a reconciliation query.
    Reconciliation,
}

impl std::fmt::Display for PurchaseOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PurchaseFlow => write!(f, "PURCHASE_FLOW"),
            Self::Reconciliation => write!(f, "RECONCILIATION"),
        }
    }
}

/// Per-token lifecycle state within one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PurchaseState {
    Detected,
    Validating,
    Validated,
    Awarding,
    Consuming,
    /// Terminal success. The store no longer reports the purchase as owned.
    Consumed,
    /// Terminal for this pass. Nothing was awarded or consumed.
    Rejected,
    /// Terminal for this pass. The award stands; consumption is retried on
    /// the next reconciliation.
    ConsumeFailed,
}

impl PurchaseState {
    /// Can this state transition to the given target state?
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Detected, Self::Validating)
                | (Self::Validating, Self::Validated | Self::Rejected)
                | (Self::Validated, Self::Awarding | Self::Consuming)
                | (Self::Awarding, Self::Consuming | Self::Rejected)
                | (Self::Consuming, Self::Consumed | Self::ConsumeFailed)
                | (Self::Rejected | Self::ConsumeFailed, Self::Detected)
        )
    }

    /// Whether this pass over the token has finished.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Consumed | Self::Rejected | Self::ConsumeFailed)
    }

    /// Whether a fresh detection of the token may start a new pass.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Rejected | Self::ConsumeFailed)
    }
}

impl std::fmt::Display for PurchaseState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Detected => "DETECTED",
            Self::Validating => "VALIDATING",
            Self::Validated => "VALIDATED",
            Self::Awarding => "AWARDING",
            Self::Consuming => "CONSUMING",
            Self::Consumed => "CONSUMED",
            Self::Rejected => "REJECTED",
            Self::ConsumeFailed => "CONSUME_FAILED",
        };
        f.write_str(s)
    }
}
