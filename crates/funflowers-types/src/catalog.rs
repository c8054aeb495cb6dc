//! Product catalog cache.
//!
//! Refreshed once per session from the billing gateway. A refresh
//! overwrites entries per SKU and never removes SKUs it did not return.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::ProductId;

/// One catalog entry as returned by the product details query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDetails {
    /// The SKU this entry describes.
    pub id: ProductId,
    /// Localized, formatted price (e.g., `"€0.99"`).
    pub price: String,
}

/// Cached product details keyed by SKU.
#[derive(Debug, Clone, Default)]
pub struct ProductCatalog {
    entries: HashMap<ProductId, ProductDetails>,
}

impl ProductCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite cached entries with a fresh query result.
    pub fn refresh(&mut self, details: impl IntoIterator<Item = ProductDetails>) {
        for entry in details {
            self.entries.insert(entry.id.clone(), entry);
        }
    }

    /// Formatted price for `id`, if the catalog has it.
    #[must_use]
    pub fn price_of(&self, id: &ProductId) -> Option<&str> {
        self.entries.get(id).map(|d| d.price.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
