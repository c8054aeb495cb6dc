//! Flower picking for the grow-flower action.

use funflowers_types::{Flower, GameConfig};
use rand::Rng;

/// Picks random flower parts from fixed ranges.
#[derive(Debug, Clone, Copy)]
pub struct FlowerPicker {
    top_variants: u32,
    bottom_variants: u32,
}

impl FlowerPicker {
    /// # Panics
    /// Panics if either range is empty.
    #[must_use]
    pub fn new(top_variants: u32, bottom_variants: u32) -> Self {
        assert!(
            top_variants > 0 && bottom_variants > 0,
            "FlowerPicker ranges must not be empty"
        );
        Self {
            top_variants,
            bottom_variants,
        }
    }

    #[must_use]
    pub fn from_config(config: &GameConfig) -> Self {
        Self::new(config.flower_top_variants, config.flower_bottom_variants)
    }

    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> Flower {
        Flower {
            top: rng.gen_range(0..self.top_variants),
            bottom: rng.gen_range(0..self.bottom_variants),
        }
    }
}
