//! Billing service result codes.
//!
//! Every billing gateway call completes with a [`BillingResult`]. Each
//! operation has exactly one designated success code; any other code sends
//! the caller down the failure path with the code and debug message.

use serde::{Deserialize, Serialize};

/// Result codes reported by the billing service.
pub mod codes {
    /// Billing service connection established.
    pub const CONNECT_SUCCESS: i32 = 1000;
    /// Billing service connection failed.
    pub const CONNECT_ERROR: i32 = 1001;

    /// Product details query succeeded.
    pub const QUERY_PRODUCT_DETAILS_SUCCESS: i32 = 2000;
    /// Product details query failed.
    pub const QUERY_PRODUCT_DETAILS_ERROR: i32 = 2001;

    /// Owned purchases query succeeded.
    pub const QUERY_PURCHASES_SUCCESS: i32 = 2100;
    /// Owned purchases query failed.
    pub const QUERY_PURCHASES_ERROR: i32 = 2101;

    /// Purchase flow completed with a purchase.
    pub const PURCHASE_SUCCESS: i32 = 3000;
    /// The player cancelled the purchase flow.
    pub const PURCHASE_USER_CANCELLED: i32 = 3001;
    /// The purchase flow failed.
    pub const PURCHASE_ERROR: i32 = 3002;

    /// Purchase consumed.
    pub const CONSUME_SUCCESS: i32 = 4000;
    /// Consumption failed.
    pub const CONSUME_ERROR: i32 = 4001;
}

/// The billing operations the controller issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BillingOperation {
    Connect,
    QueryProductDetails,
    QueryPurchases,
    Purchase,
    Consume,
}

impl BillingOperation {
    /// The only code that means success for this operation.
    #[must_use]
    pub fn success_code(&self) -> i32 {
        match self {
            Self::Connect => codes::CONNECT_SUCCESS,
            Self::QueryProductDetails => codes::QUERY_PRODUCT_DETAILS_SUCCESS,
            Self::QueryPurchases => codes::QUERY_PURCHASES_SUCCESS,
            Self::Purchase => codes::PURCHASE_SUCCESS,
            Self::Consume => codes::CONSUME_SUCCESS,
        }
    }
}

impl std::fmt::Display for BillingOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connect => write!(f, "CONNECT"),
            Self::QueryProductDetails => write!(f, "QUERY_PRODUCT_DETAILS"),
            Self::QueryPurchases => write!(f, "QUERY_PURCHASES"),
            Self::Purchase => write!(f, "PURCHASE"),
            Self::Consume => write!(f, "CONSUME"),
        }
    }
}

/// Completion status of one billing gateway call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingResult {
    /// Response code (see [`codes`]).
    pub code: i32,
    /// Diagnostic message from the billing service. May be empty.
    pub debug_message: String,
}

impl BillingResult {
    #[must_use]
    pub fn new(code: i32, debug_message: impl Into<String>) -> Self {
        Self {
            code,
            debug_message: debug_message.into(),
        }
    }

    /// A success result for `op` with an empty message.
    #[must_use]
    pub fn success(op: BillingOperation) -> Self {
        Self::new(op.success_code(), "")
    }

    /// Whether this result is the designated success code for `op`.
    #[must_use]
    pub fn is_success(&self, op: BillingOperation) -> bool {
        self.code == op.success_code()
    }
}
