//! Game configuration.
//!
//! The values are fixed by the game design and default to [`constants`];
//! `GameConfig` groups them so the controller receives them by injection
//! instead of reaching for globals.

use serde::{Deserialize, Serialize};

use crate::{FlowersError, ProductId, Result, constants};

/// Economy and persistence settings for one game instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    /// The single SKU this game recognizes.
    pub seeds_sku: ProductId,
    /// SKU type passed to catalog/purchase queries.
    pub sku_type: String,
    /// Seeds granted per consumed purchase.
    pub seeds_per_purchase: u64,
    /// Balance for a player with no persisted record.
    pub starting_seeds: u64,
    /// Key of the persisted balance record.
    pub balance_key: String,
    /// Flower-top part IDs are `0..flower_top_variants`.
    pub flower_top_variants: u32,
    /// Flower-bottom part IDs are `0..flower_bottom_variants`.
    pub flower_bottom_variants: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            seeds_sku: ProductId::from(constants::ITEM_ID_SEEDS),
            sku_type: constants::SKU_TYPE_INAPP.to_string(),
            seeds_per_purchase: constants::SEEDS_PER_PURCHASE,
            starting_seeds: constants::PLAYER_STARTING_SEEDS,
            balance_key: constants::KEY_PLAYER_SEEDS.to_string(),
            flower_top_variants: constants::FLOWER_TOP_VARIANTS,
            flower_bottom_variants: constants::FLOWER_BOTTOM_VARIANTS,
        }
    }
}

impl GameConfig {
    /// Check the configuration for values the engine cannot run with.
    ///
    /// # Errors
    /// Returns `Configuration` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        let fail = |msg: &str| -> Result<()> { Err(FlowersError::Configuration(msg.to_string())) };

        if self.seeds_sku.as_str().is_empty() {
            return fail("seeds_sku must not be empty");
        }
        if self.sku_type.is_empty() {
            return fail("sku_type must not be empty");
        }
        if self.balance_key.is_empty() {
            return fail("balance_key must not be empty");
        }
        if self.seeds_per_purchase == 0 {
            return fail("seeds_per_purchase must be > 0");
        }
        if i64::try_from(self.starting_seeds).is_err() {
            return fail("starting_seeds exceeds the persistable range");
        }
        if self.flower_top_variants == 0 || self.flower_bottom_variants == 0 {
            return fail("flower part ranges must not be empty");
        }
        Ok(())
    }
}
