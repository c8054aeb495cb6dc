//! Billing gateway port.
//!
//! The billing SDK is an external collaborator. The controller only depends
//! on this contract; hosts adapt their SDK's callback API to it.
//!
//! # Ordering
//!
//! `start_connection` must complete with the connect success code before
//! any other method is called. The controller enforces this.

use async_trait::async_trait;
use funflowers_types::{BillingResult, ProductDetails, ProductId, Purchase, PurchaseToken};

/// A billing call's completion: the result code plus any returned value.
///
/// `value` is meaningful only when `result` carries the operation's
/// success code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillingResponse<T> {
    pub result: BillingResult,
    pub value: T,
}

impl<T> BillingResponse<T> {
    #[must_use]
    pub fn new(result: BillingResult, value: T) -> Self {
        Self { result, value }
    }
}

/// Asynchronous billing service operations.
///
/// Every method may suspend for a network round trip. Implementations
/// report failures through the result code, never by panicking.
#[async_trait]
pub trait BillingGateway: Send + Sync {
    /// Connect to the billing service.
    async fn start_connection(&self) -> BillingResult;

    /// Fetch catalog entries for `skus`.
    async fn query_product_details(
        &self,
        sku_type: &str,
        skus: &[ProductId],
    ) -> BillingResponse<Vec<ProductDetails>>;

    /// List purchases the store considers owned but not yet consumed.
    async fn query_purchases(&self, sku_type: &str) -> BillingResponse<Vec<Purchase>>;

    /// Show the store's purchase UI for `sku` and wait for it to finish.
    ///
    /// On the purchase success code `value` holds the new purchase.
    async fn launch_billing_flow(
        &self,
        sku: &ProductId,
        sku_type: &str,
    ) -> BillingResponse<Option<Purchase>>;

    /// Consume a purchase so it can be bought again.
    async fn consume(&self, token: &PurchaseToken) -> BillingResult;
}
