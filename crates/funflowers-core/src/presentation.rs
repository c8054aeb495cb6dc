//! Presentation port: what the controller tells the UI.
//!
//! Calls are fire-and-forget notifications. Implementations must not call
//! back into the controller synchronously.

/// Receiver of user-visible controller events.
pub trait PresentationPort: Send + Sync {
    /// Informational message (toast).
    fn notify_info(&self, message: &str);

    /// Error message (alert dialog).
    fn notify_error(&self, message: &str);

    /// The seed balance changed.
    fn notify_balance_changed(&self, balance: u64);

    /// A flower was grown with the given part IDs.
    fn notify_flower_grown(&self, top: u32, bottom: u32);
}
