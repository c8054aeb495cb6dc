//! Per-token lifecycle tracking for the current session.
//!
//! The tracker is the in-flight set: a token whose state is not terminal is
//! being processed, and a second detection of it (direct callback racing a
//! reconciliation query) is turned away instead of running a parallel pass.
//! A `CONSUMED` token is turned away for the rest of the session, so stale
//! reconciliation entries are harmless.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use funflowers_types::{FlowersError, PurchaseOrigin, PurchaseState, PurchaseToken, Result};

/// What the session knows about one purchase token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackedPurchase {
    /// Last known lifecycle state.
    pub state: PurchaseState,
    /// Entry path of the current (or last) pass.
    pub origin: PurchaseOrigin,
    /// Number of passes started for this token.
    pub passes: u32,
    /// When `state` was last changed.
    pub updated_at: DateTime<Utc>,
}

/// Lifecycle state of every purchase token seen this session.
#[derive(Debug, Default)]
pub struct PurchaseTracker {
    purchases: HashMap<PurchaseToken, TrackedPurchase>,
}

impl PurchaseTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a pass for `token` in state `DETECTED`.
    ///
    /// # Errors
    /// Returns `PurchaseInProgress` if the token is mid-pass or already
    /// consumed this session.
    pub fn begin(&mut self, token: &PurchaseToken, origin: PurchaseOrigin) -> Result<()> {
        let now = Utc::now();
        match self.purchases.get_mut(token) {
            None => {
                self.purchases.insert(
                    token.clone(),
                    TrackedPurchase {
                        state: PurchaseState::Detected,
                        origin,
                        passes: 1,
                        updated_at: now,
                    },
                );
            }
            Some(tracked) if tracked.state.is_retryable() => {
                tracked.state = PurchaseState::Detected;
                tracked.origin = origin;
                tracked.passes += 1;
                tracked.updated_at = now;
            }
            Some(tracked) => {
                return Err(FlowersError::PurchaseInProgress {
                    token: token.clone(),
                    state: tracked.state,
                });
            }
        }
        tracing::debug!(%token, %origin, "Purchase detected");
        Ok(())
    }

    /// Move `token` to state `to`.
    ///
    /// # Errors
    /// Returns `InvalidTransition` if the move is not allowed from the
    /// current state, `Internal` if the token is untracked.
    pub fn advance(&mut self, token: &PurchaseToken, to: PurchaseState) -> Result<()> {
        let tracked = self
            .purchases
            .get_mut(token)
            .ok_or_else(|| FlowersError::Internal(format!("{token} is not tracked")))?;

        if !tracked.state.can_transition_to(to) {
            return Err(FlowersError::InvalidTransition {
                from: tracked.state,
                to,
            });
        }

        tracing::debug!(%token, from = %tracked.state, %to, "Purchase state changed");
        tracked.state = to;
        tracked.updated_at = Utc::now();
        Ok(())
    }

    #[must_use]
    pub fn get(&self, token: &PurchaseToken) -> Option<&TrackedPurchase> {
        self.purchases.get(token)
    }

    #[must_use]
    pub fn state(&self, token: &PurchaseToken) -> Option<PurchaseState> {
        self.purchases.get(token).map(|t| t.state)
    }
}
