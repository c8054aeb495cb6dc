//! Purchase validator: hard gate before any award.
//!
//! Checks run in this order, and the first failure rejects the purchase:
//! 1. The purchase names exactly one product
//! 2. That product is the recognized seeds SKU
//! 3. The payload signature verifies under the store key
//!
//! A verification *error* rejects just like a signature mismatch.

use funflowers_types::{FlowersError, ProductId, Purchase, Result};

use crate::verifier::SignatureVerifier;

/// Validates purchases for the one SKU this game sells.
#[derive(Debug, Clone)]
pub struct PurchaseValidator {
    verifier: SignatureVerifier,
    recognized_sku: ProductId,
}

impl PurchaseValidator {
    #[must_use]
    pub fn new(verifier: SignatureVerifier, recognized_sku: ProductId) -> Self {
        Self {
            verifier,
            recognized_sku,
        }
    }

    #[must_use]
    pub fn recognized_sku(&self) -> &ProductId {
        &self.recognized_sku
    }

    /// Validate a purchase. Returns the validated product id.
    ///
    /// # Errors
    /// - `MalformedPurchase` if the purchase does not carry exactly one product
    /// - `UnrecognizedProduct` if the product is not the recognized SKU
    /// - `SignatureRejected` if the signature does not match the payload
    /// - `Verification` if the signature could not be processed
    pub fn validate(&self, purchase: &Purchase) -> Result<ProductId> {
        let product = purchase.single_product()?;

        if *product != self.recognized_sku {
            tracing::warn!(
                token = %purchase.token,
                product = %product,
                "Purchase references unknown item"
            );
            return Err(FlowersError::UnrecognizedProduct(product.clone()));
        }

        match self
            .verifier
            .verify(purchase.payload.as_bytes(), &purchase.signature)
        {
            Ok(true) => {
                tracing::info!(token = %purchase.token, "Successful purchase validation");
                Ok(product.clone())
            }
            Ok(false) => {
                tracing::warn!(token = %purchase.token, "Invalid purchase signature");
                Err(FlowersError::SignatureRejected)
            }
            Err(err) => {
                tracing::warn!(token = %purchase.token, error = %err, "Purchase validation failed");
                Err(err)
            }
        }
    }
}
