//! # funflowers-settlement
//!
//! **Finality side** of the purchase pipeline: everything that decides
//! whether value was granted and keeps that decision durable.
//!
//! - **EntitlementLedger**: the seed balance, award/spend, load/save
//! - **KeyValueStore**: persistence seam (`MemoryStore`, `FileStore`)
//! - **AwardGuard**: at-most-once award per purchase token per session
//! - **PurchaseTracker**: per-token lifecycle state and in-flight set
//!
//! None of these types lock. The controller owns them behind a single
//! mutex so every balance mutation is serialized.

pub mod idempotency;
pub mod ledger;
pub mod store;
pub mod tracker;

pub use idempotency::AwardGuard;
pub use ledger::EntitlementLedger;
pub use store::{FileStore, KeyValueStore, MemoryStore};
pub use tracker::{PurchaseTracker, TrackedPurchase};
