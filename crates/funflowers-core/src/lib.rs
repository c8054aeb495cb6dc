//! # funflowers-core
//!
//! Purchase lifecycle controller for the **Fun Flowers** sample game.
//!
//! - [`PurchaseController`]: detect, validate, award, consume, persist, notify
//! - [`BillingGateway`]: async port to the store's billing service
//! - [`PresentationPort`]: fire-and-forget UI notifications
//! - [`FlowerPicker`]: random flower parts for the grow action
//! - [`telemetry`]: `tracing` subscriber setup for hosts without one
//!
//! ## Purchase Lifecycle
//!
//! ```text
//! DETECTED ──▶ VALIDATING ──▶ VALIDATED ──▶ AWARDING ──▶ CONSUMING ──▶ CONSUMED
//!                  │                            │            │
//!                  ▼                            ▼            ▼
//!              REJECTED ◀───────────────────────┘      CONSUME_FAILED
//!                  │                                         │
//!                  └────────── next reconciliation ◀─────────┘
//! ```
//!
//! Seeds are awarded and persisted before the store is asked to consume the
//! purchase. A failed consume is never rolled back; the purchase stays owned
//! and the next reconciliation retries it without awarding again.

pub mod controller;
pub mod garden;
pub mod gateway;
pub mod presentation;
pub mod telemetry;

pub use controller::{GardenSnapshot, PurchaseController, PurchaseOutcome, RejectReason};
pub use garden::FlowerPicker;
pub use gateway::{BillingGateway, BillingResponse};
pub use presentation::PresentationPort;
