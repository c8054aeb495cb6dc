//! # funflowers-types
//!
//! Shared types, errors, and configuration for the **Fun Flowers** purchase
//! lifecycle engine.
//!
//! This crate is the leaf dependency of the workspace; every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`PurchaseToken`], [`ProductId`], [`SessionId`]
//! - **Purchase model**: [`Purchase`], [`PurchaseState`], [`PurchaseOrigin`]
//! - **Billing results**: [`BillingResult`], [`BillingOperation`], [`codes`]
//! - **Catalog**: [`ProductDetails`], [`ProductCatalog`]
//! - **Flower model**: [`Flower`], [`GrowOutcome`]
//! - **Configuration**: [`GameConfig`]
//! - **Errors**: [`FlowersError`] with `FF_ERR_` prefix codes
//! - **Constants**: SKU, economy and persistence defaults

pub mod billing;
pub mod catalog;
pub mod config;
pub mod constants;
pub mod error;
pub mod flower;
pub mod ids;
pub mod purchase;

pub use billing::*;
pub use catalog::*;
pub use config::*;
pub use error::*;
pub use flower::*;
pub use ids::*;
pub use purchase::*;

// Constants are accessed via `funflowers_types::constants::FOO`
// (not re-exported to avoid name collisions).
