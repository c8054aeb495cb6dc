//! Flower model: the in-game result of spending a seed.

use serde::{Deserialize, Serialize};

/// A grown flower, identified by its top and bottom artwork parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Flower {
    /// Flower-top part ID.
    pub top: u32,
    /// Flower-bottom part ID.
    pub bottom: u32,
}

/// Outcome of the grow-flower action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GrowOutcome {
    /// A seed was spent and a flower grown.
    Grown {
        flower: Flower,
        /// Balance after spending the seed.
        balance: u64,
    },
    /// Balance was zero. Nothing changed.
    NoSeedsAvailable,
}

impl GrowOutcome {
    /// The grown flower, if any.
    #[must_use]
    pub fn flower(&self) -> Option<Flower> {
        match self {
            Self::Grown { flower, .. } => Some(*flower),
            Self::NoSeedsAvailable => None,
        }
    }
}
