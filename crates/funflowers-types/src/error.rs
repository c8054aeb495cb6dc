//! Error types for the Fun Flowers engine.
//!
//! All errors use the `FF_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Billing connection errors
//! - 2xx: Purchase validation errors
//! - 3xx: Billing operation / purchase lifecycle errors
//! - 4xx: Ledger and persistence errors
//! - 9xx: General / internal errors

use thiserror::Error;

use crate::{ProductId, PurchaseState, PurchaseToken};

/// Central error enum for all Fun Flowers operations.
#[derive(Debug, Error)]
pub enum FlowersError {
    // =================================================================
    // Connection Errors (1xx)
    // =================================================================
    /// The billing service could not be reached or refused the connection.
    #[error("FF_ERR_100: Billing connection failed: {message} [{code}]")]
    Connection { code: i32, message: String },

    /// A billing operation was issued before the connection completed.
    #[error("FF_ERR_101: Billing service not connected")]
    NotConnected,

    /// The billing service dropped an established connection.
    #[error("FF_ERR_102: Billing service disconnected")]
    Disconnected,

    // =================================================================
    // Validation Errors (2xx)
    // =================================================================
    /// The signature or key material could not be processed at all.
    #[error("FF_ERR_200: Purchase verification failed: {reason}")]
    Verification { reason: String },

    /// The signature was well-formed but does not match the payload.
    #[error("FF_ERR_201: Invalid purchase signature")]
    SignatureRejected,

    /// The purchase references a SKU this game does not sell.
    #[error("FF_ERR_202: Unknown item id: {0}")]
    UnrecognizedProduct(ProductId),

    /// The purchase does not carry exactly one product id.
    #[error("FF_ERR_203: Malformed purchase: {reason}")]
    MalformedPurchase { reason: String },

    // =================================================================
    // Billing Operation / Lifecycle Errors (3xx)
    // =================================================================
    /// The billing service failed to consume a purchase token.
    #[error("FF_ERR_300: Consume error: {message} [{code}]")]
    Consume { code: i32, message: String },

    /// The product catalog query failed.
    #[error("FF_ERR_301: Query product details failed: {message} [{code}]")]
    QueryCatalog { code: i32, message: String },

    /// The owned-purchases query failed.
    #[error("FF_ERR_302: Query purchases failed: {message} [{code}]")]
    QueryPurchases { code: i32, message: String },

    /// The purchase flow ended with an error.
    #[error("FF_ERR_303: Purchase error: {message}")]
    PurchaseFlow { message: String },

    /// The player backed out of the purchase flow.
    #[error("FF_ERR_304: Purchase cancelled by user")]
    PurchaseCancelled,

    /// The purchase flow reported a result code nobody expects.
    #[error("FF_ERR_305: Unknown purchase status [{code}]")]
    UnknownPurchaseStatus { code: i32 },

    /// The token was already awarded in this session (idempotency guard).
    #[error("FF_ERR_306: Purchase already awarded: {0}")]
    AlreadyAwarded(PurchaseToken),

    /// The token is already being processed, or was consumed this session.
    #[error("FF_ERR_307: Purchase {token} already {state}")]
    PurchaseInProgress {
        token: PurchaseToken,
        state: PurchaseState,
    },

    /// An illegal lifecycle transition was requested.
    #[error("FF_ERR_308: Invalid purchase transition: {from} -> {to}")]
    InvalidTransition {
        from: PurchaseState,
        to: PurchaseState,
    },

    // =================================================================
    // Ledger Errors (4xx)
    // =================================================================
    /// Not enough seeds to perform the action.
    #[error("FF_ERR_400: Insufficient seeds: need {needed}, have {available}")]
    InsufficientBalance { needed: u64, available: u64 },

    /// An award would push the balance past the persistable range.
    #[error("FF_ERR_401: Seed balance overflow")]
    BalanceOverflow,

    /// The key-value store could not be read or written.
    #[error("FF_ERR_402: Persistence error: {0}")]
    Persistence(String),

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("FF_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Serialization / deserialization error.
    #[error("FF_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (zero amounts, empty ids, etc.).
    #[error("FF_ERR_902: Configuration error: {0}")]
    Configuration(String),
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, FlowersError>;

impl From<std::io::Error> for FlowersError {
    fn from(err: std::io::Error) -> Self {
        Self::Persistence(err.to_string())
    }
}

impl From<serde_json::Error> for FlowersError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
