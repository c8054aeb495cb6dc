//! # funflowers-ingress
//!
//! **Validation envelope**: every purchase passes through here before the
//! ledger is touched.
//!
//! - **SignatureVerifier**: SHA1-with-RSA check of the signed purchase payload
//! - **PurchaseValidator**: product check, then signature check
//!
//! ```text
//! BillingGateway → PurchaseValidator.validate() → award → consume
//! ```
//!
//! Both components are pure: they never mutate state, so the controller can
//! call them without holding its state lock.

pub mod validator;
pub mod verifier;

pub use validator::PurchaseValidator;
pub use verifier::SignatureVerifier;
