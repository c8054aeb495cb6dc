//! Award idempotency guard. Prevents double-awarding a purchase.
//!
//! Each purchase token is awarded at most once per session. The store may
//! report a fresh purchase as "owned" right after the buy flow completes,
//! racing the startup reconciliation query, and a purchase whose consume
//! failed is rediscovered by the next reconciliation. Both paths hit this
//! guard before touching the ledger.
//!
//! The set is never trimmed during a session: forgetting a token whose
//! consume failed would award it again on the next reconciliation.
//! It is in-memory only. After a process restart an unconsumed purchase is
//! awarded again; nothing persists awarded-token history.

use std::collections::HashSet;

use funflowers_types::{FlowersError, PurchaseToken, Result};

/// Remembers which purchase tokens were already awarded this session.
#[derive(Debug, Default)]
pub struct AwardGuard {
    awarded: HashSet<PurchaseToken>,
}

impl AwardGuard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `token` has been awarded.
    ///
    /// # Errors
    /// Returns [`FlowersError::AlreadyAwarded`] if `token` was already
    /// recorded.
    pub fn mark_awarded(&mut self, token: &PurchaseToken) -> Result<()> {
        if !self.awarded.insert(token.clone()) {
            return Err(FlowersError::AlreadyAwarded(token.clone()));
        }
        Ok(())
    }

    /// Check whether `token` has already been awarded.
    pub fn is_awarded(&self, token: &PurchaseToken) -> bool {
        self.awarded.contains(token)
    }

    /// Number of tokens awarded this session.
    pub fn len(&self) -> usize {
        self.awarded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.awarded.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tok(s: &str) -> PurchaseToken {
        PurchaseToken::from(s)
    }

    #[test]
    fn first_award_ok() {
        let mut guard = AwardGuard::new();
        assert!(guard.mark_awarded(&tok("t1")).is_ok());
        assert!(guard.is_awarded(&tok("t1")));
        assert_eq!(guard.len(), 1);
    }

    #[test]
    fn double_award_blocked() {
        let mut guard = AwardGuard::new();
        guard.mark_awarded(&tok("t1")).unwrap();

        let err = guard.mark_awarded(&tok("t1")).unwrap_err();
        assert!(
            matches!(err, FlowersError::AlreadyAwarded(ref t) if *t == tok("t1")),
            "Expected AlreadyAwarded, got: {err:?}"
        );
        assert_eq!(guard.len(), 1);
    }

    #[test]
    fn early_token_remembered_after_many_awards() {
        let mut guard = AwardGuard::new();
        guard.mark_awarded(&tok("first")).unwrap();
        for i in 0..5000 {
            guard.mark_awarded(&tok(&format!("t{i}"))).unwrap();
        }
        assert_eq!(guard.len(), 5001);
        assert!(guard.is_awarded(&tok("first")));
        assert!(guard.mark_awarded(&tok("first")).is_err());
    }

    #[test]
    fn empty_guard() {
        let guard = AwardGuard::new();
        assert!(guard.is_empty());
        assert!(!guard.is_awarded(&tok("anything")));
    }
}
