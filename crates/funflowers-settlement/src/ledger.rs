//! Entitlement ledger: the player's seed balance.
//!
//! The ledger is the only mutable state shared between the purchase
//! pipeline (award) and gameplay (spend). It does no locking itself: its
//! owner must serialize all mutations.

use funflowers_types::{FlowersError, Result};

use crate::store::KeyValueStore;

/// Seed balance with load/save against a [`KeyValueStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntitlementLedger {
    balance: u64,
}

impl EntitlementLedger {
    #[must_use]
    pub fn new(balance: u64) -> Self {
        Self { balance }
    }

    /// Load the persisted balance, or `starting` if there is none.
    ///
    /// Never fails: an unreadable, corrupt or negative record also falls
    /// back to `starting`.
    pub fn load(store: &dyn KeyValueStore, key: &str, starting: u64) -> Self {
        let balance = match store.get_i64(key) {
            Ok(Some(value)) => u64::try_from(value).unwrap_or_else(|_| {
                tracing::warn!(key, value, "Negative persisted balance, using starting balance");
                starting
            }),
            Ok(None) => starting,
            Err(err) => {
                tracing::warn!(key, error = %err, "Could not read balance, using starting balance");
                starting
            }
        };
        tracing::info!(key, balance, "Loaded player game data");
        Self { balance }
    }

    /// Persist the current balance.
    ///
    /// # Errors
    /// Returns `Persistence` if the store is unavailable, `BalanceOverflow`
    /// if the balance does not fit the signed record.
    pub fn save(&self, store: &dyn KeyValueStore, key: &str) -> Result<()> {
        let value = i64::try_from(self.balance).map_err(|_| FlowersError::BalanceOverflow)?;
        store.put_i64(key, value)?;
        tracing::debug!(key, balance = self.balance, "Saved player game data");
        Ok(())
    }

    #[must_use]
    pub fn balance(&self) -> u64 {
        self.balance
    }

    /// Add `amount` seeds. Returns the new balance.
    ///
    /// # Errors
    /// Returns `BalanceOverflow` if the result would not be persistable.
    /// The balance is unchanged on error.
    pub fn award(&mut self, amount: u64) -> Result<u64> {
        let next = self
            .balance
            .checked_add(amount)
            .filter(|b| i64::try_from(*b).is_ok())
            .ok_or(FlowersError::BalanceOverflow)?;
        self.balance = next;
        Ok(next)
    }

    /// Take `amount` seeds. Returns the new balance.
    ///
    /// # Errors
    /// Returns `InsufficientBalance` if balance < amount. The balance is
    /// unchanged on error.
    pub fn spend(&mut self, amount: u64) -> Result<u64> {
        if self.balance < amount {
            return Err(FlowersError::InsufficientBalance {
                needed: amount,
                available: self.balance,
            });
        }
        self.balance -= amount;
        Ok(self.balance)
    }
}
