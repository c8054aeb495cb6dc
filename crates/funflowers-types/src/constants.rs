//! System-wide constants for the Fun Flowers purchase lifecycle engine.

/// Store product ID of the "seeds" item. The only SKU this game sells.
pub const ITEM_ID_SEEDS: &str = "1023608";

/// SKU type for one-time, consumable in-app products.
pub const SKU_TYPE_INAPP: &str = "inapp";

/// Seeds granted for one consumed "seeds" purchase.
pub const SEEDS_PER_PURCHASE: u64 = 20;

/// Seeds a player starts with on first run (no persisted balance yet).
pub const PLAYER_STARTING_SEEDS: u64 = 20;

/// Key of the single persisted record holding the player's seed balance.
pub const KEY_PLAYER_SEEDS: &str = "key_player_seeds";

/// Number of distinct flower-top artworks. Top part IDs are `0..FLOWER_TOP_VARIANTS`.
pub const FLOWER_TOP_VARIANTS: u32 = 10;

/// Number of distinct flower-bottom artworks. Bottom part IDs are `0..FLOWER_BOTTOM_VARIANTS`.
pub const FLOWER_BOTTOM_VARIANTS: u32 = 6;
