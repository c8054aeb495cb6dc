//! Purchase lifecycle controller.
//!
//! Turns store purchases into awarded, consumed entitlements:
//!
//! ```text
//!   buy flow ──┐
//!              ├─▶ detect ─▶ validate ─▶ award + persist ─▶ consume ─▶ notify
//!   reconcile ─┘
//! ```
//!
//! Both entry paths run the same pipeline, so a crash anywhere leaves the
//! purchase in a state the next reconciliation can finish:
//!
//! - crash before award: the purchase is still owned and gets the full pass
//! - crash after award, before consume: the purchase is still owned; within
//!   the session the award guard stops a second award, consumption is retried
//! - crash after consume: the award was persisted before consume was asked
//!
//! # Concurrency
//!
//! All session state (ledger, award guard, tracker, catalog) sits behind one
//! mutex that is never held across an `.await`. Gateway calls run unlocked;
//! every balance read-modify-write happens inside a single critical section.
//! Store writes run after that section, serialized by a separate lock.

use std::sync::{
    Arc, Mutex, MutexGuard, PoisonError,
    atomic::{AtomicBool, Ordering},
};

use funflowers_ingress::{PurchaseValidator, SignatureVerifier};
use funflowers_settlement::{
    AwardGuard, EntitlementLedger, KeyValueStore, PurchaseTracker, TrackedPurchase,
};
use funflowers_types::{
    BillingOperation, BillingResult, Flower, FlowersError, GameConfig, GrowOutcome,
    ProductCatalog, ProductId, Purchase, PurchaseOrigin, PurchaseState, PurchaseToken, Result,
    SessionId, codes,
};
use futures::future::join_all;

use crate::{garden::FlowerPicker, gateway::BillingGateway, presentation::PresentationPort};

const OUT_OF_SEEDS_MESSAGE: &str =
    "Oh no! You have run out of seeds! Buy some more so you can keep growing flowers!";

/// Why a purchase was rejected without award or consumption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// The purchase is for a SKU this game does not sell.
    UnrecognizedProduct(ProductId),
    /// The purchase did not carry exactly one product id.
    MalformedPurchase,
    /// The signature does not match the payload.
    SignatureRejected,
    /// The signature could not be processed at all.
    VerificationFailed,
    /// Validation passed but the ledger refused the award.
    AwardFailed,
}

impl From<&FlowersError> for RejectReason {
    fn from(err: &FlowersError) -> Self {
        match err {
            FlowersError::UnrecognizedProduct(product) => Self::UnrecognizedProduct(product.clone()),
            FlowersError::MalformedPurchase { .. } => Self::MalformedPurchase,
            FlowersError::SignatureRejected => Self::SignatureRejected,
            FlowersError::Verification { .. } => Self::VerificationFailed,
            _ => Self::AwardFailed,
        }
    }
}

/// Result of one lifecycle pass over a purchase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurchaseOutcome {
    /// The store confirmed consumption.
    Consumed {
        token: PurchaseToken,
        /// Whether this pass granted the seeds (false when an earlier pass
        /// of the session already did).
        awarded: bool,
        balance: u64,
    },
    /// Consumption failed. Any award stands; the next reconciliation retries.
    ConsumeFailed {
        token: PurchaseToken,
        awarded: bool,
        balance: u64,
    },
    /// Validation failed. Nothing was awarded or consumed.
    Rejected {
        token: PurchaseToken,
        reason: RejectReason,
    },
    /// The token is mid-pass or already consumed this session.
    Skipped {
        token: PurchaseToken,
        state: PurchaseState,
    },
}

impl PurchaseOutcome {
    #[must_use]
    pub fn token(&self) -> &PurchaseToken {
        match self {
            Self::Consumed { token, .. }
            | Self::ConsumeFailed { token, .. }
            | Self::Rejected { token, .. }
            | Self::Skipped { token, .. } => token,
        }
    }

    /// Whether this pass added seeds to the balance.
    #[must_use]
    pub fn awarded(&self) -> bool {
        matches!(
            self,
            Self::Consumed { awarded: true, .. } | Self::ConsumeFailed { awarded: true, .. }
        )
    }
}

/// Read-only view of the game state for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GardenSnapshot {
    pub balance: u64,
    /// Most recently grown flower this session.
    pub last_flower: Option<Flower>,
    /// Formatted seeds price, once the catalog has been fetched.
    pub seeds_price: Option<String>,
}

impl GardenSnapshot {
    /// Buy-button text: `base`, plus the price on a second line when known.
    #[must_use]
    pub fn buy_button_label(&self, base: &str) -> String {
        match &self.seeds_price {
            Some(price) => format!("{base}\n{price}"),
            None => base.to_string(),
        }
    }
}

struct SessionState {
    ledger: EntitlementLedger,
    awarded: AwardGuard,
    tracker: PurchaseTracker,
    catalog: ProductCatalog,
    last_flower: Option<Flower>,
}

impl SessionState {
    /// Transitions issued by the pipeline are legal by construction; a
    /// failure here is a bug worth logging, not a reason to stop the pass.
    fn advance(&mut self, token: &PurchaseToken, to: PurchaseState) {
        if let Err(err) = self.tracker.advance(token, to) {
            tracing::error!(%token, error = %err, "Purchase lifecycle out of sync");
        }
    }
}

/// Orchestrates detect → validate → award → consume → persist → notify.
pub struct PurchaseController {
    session: SessionId,
    config: GameConfig,
    validator: PurchaseValidator,
    picker: FlowerPicker,
    gateway: Arc<dyn BillingGateway>,
    store: Arc<dyn KeyValueStore>,
    presenter: Arc<dyn PresentationPort>,
    connected: AtomicBool,
    state: Mutex<SessionState>,
    /// Serializes store writes, which run outside the state lock.
    persist_io: Mutex<()>,
}

impl PurchaseController {
    /// Create a controller and load the persisted balance.
    ///
    /// # Errors
    /// Returns `Configuration` if `config` is invalid or the validator was
    /// built for a different SKU.
    pub fn new(
        config: GameConfig,
        validator: PurchaseValidator,
        gateway: Arc<dyn BillingGateway>,
        store: Arc<dyn KeyValueStore>,
        presenter: Arc<dyn PresentationPort>,
    ) -> Result<Self> {
        config.validate()?;
        if *validator.recognized_sku() != config.seeds_sku {
            return Err(FlowersError::Configuration(format!(
                "validator recognizes {} but the configured seeds SKU is {}",
                validator.recognized_sku(),
                config.seeds_sku
            )));
        }

        let ledger = EntitlementLedger::load(&*store, &config.balance_key, config.starting_seeds);
        let session = SessionId::new();
        tracing::info!(%session, balance = ledger.balance(), "Purchase controller created");

        Ok(Self {
            session,
            picker: FlowerPicker::from_config(&config),
            state: Mutex::new(SessionState {
                ledger,
                awarded: AwardGuard::new(),
                tracker: PurchaseTracker::new(),
                catalog: ProductCatalog::new(),
                last_flower: None,
            }),
            config,
            validator,
            gateway,
            store,
            presenter,
            connected: AtomicBool::new(false),
            persist_io: Mutex::new(()),
        })
    }

    /// Controller verifying purchases against the store key embedded in the
    /// game.
    ///
    /// # Errors
    /// As [`PurchaseController::new`], plus `Verification` if the embedded
    /// key is invalid.
    pub fn with_embedded_key(
        config: GameConfig,
        gateway: Arc<dyn BillingGateway>,
        store: Arc<dyn KeyValueStore>,
        presenter: Arc<dyn PresentationPort>,
    ) -> Result<Self> {
        let validator =
            PurchaseValidator::new(SignatureVerifier::embedded()?, config.seeds_sku.clone());
        Self::new(config, validator, gateway, store, presenter)
    }

    // -----------------------------------------------------------------
    // Connection and startup
    // -----------------------------------------------------------------

    /// Connect to the billing service. Must succeed before any query,
    /// purchase or consume is issued.
    pub async fn connect(&self) -> Result<()> {
        let result = self.gateway.start_connection().await;
        if !result.is_success(BillingOperation::Connect) {
            self.connected.store(false, Ordering::Release);
            return Err(self.complain(FlowersError::Connection {
                code: result.code,
                message: result.debug_message,
            }));
        }

        self.connected.store(true, Ordering::Release);
        tracing::info!(session = %self.session, "Billing service init success");
        self.presenter.notify_info("Billing service connected");
        Ok(())
    }

    /// The billing service dropped the connection. Operations fail with
    /// `NotConnected` until [`connect`](Self::connect) succeeds again.
    pub fn on_disconnected(&self) {
        self.connected.store(false, Ordering::Release);
        self.complain(FlowersError::Disconnected);
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Connect, then refresh the catalog and reconcile owned purchases
    /// concurrently. Returns the reconciliation outcomes.
    ///
    /// A catalog failure is reported but does not fail startup.
    pub async fn start(&self) -> Result<Vec<PurchaseOutcome>> {
        self.connect().await?;
        let (catalog, reconciled) = tokio::join!(self.refresh_catalog(), self.reconcile());
        if let Err(err) = catalog {
            tracing::debug!(error = %err, "Starting without product details");
        }
        reconciled
    }

    /// Refresh the cached product details for the seeds SKU. Returns the
    /// number of entries received.
    pub async fn refresh_catalog(&self) -> Result<usize> {
        self.ensure_connected()?;

        let skus = [self.config.seeds_sku.clone()];
        let response = self
            .gateway
            .query_product_details(&self.config.sku_type, &skus)
            .await;
        if !response.result.is_success(BillingOperation::QueryProductDetails) {
            return Err(self.complain(FlowersError::QueryCatalog {
                code: response.result.code,
                message: response.result.debug_message,
            }));
        }

        let count = response.value.len();
        let cached = {
            let mut state = self.lock_state();
            state.catalog.refresh(response.value);
            state.catalog.len()
        };
        tracing::info!(products = count, cached, "QueryProductDetails successful");
        Ok(count)
    }

    /// Run every owned-but-unconsumed purchase through the pipeline.
    ///
    /// Recovers purchases interrupted in this or an earlier session. Distinct
    /// tokens are processed concurrently and independently.
    pub async fn reconcile(&self) -> Result<Vec<PurchaseOutcome>> {
        self.ensure_connected()?;

        let response = self.gateway.query_purchases(&self.config.sku_type).await;
        if !response.result.is_success(BillingOperation::QueryPurchases) {
            return Err(self.complain(FlowersError::QueryPurchases {
                code: response.result.code,
                message: response.result.debug_message,
            }));
        }

        tracing::info!(owned = response.value.len(), "QueryPurchases successful");
        let outcomes = join_all(
            response
                .value
                .iter()
                .map(|purchase| self.process(purchase, PurchaseOrigin::Reconciliation)),
        )
        .await;
        Ok(outcomes)
    }

    // -----------------------------------------------------------------
    // Purchases
    // -----------------------------------------------------------------

    /// Launch the seeds purchase flow and process its result.
    pub async fn buy_seeds(&self) -> Result<PurchaseOutcome> {
        self.ensure_connected()?;

        tracing::info!("Launching purchase flow for seeds");
        let response = self
            .gateway
            .launch_billing_flow(&self.config.seeds_sku, &self.config.sku_type)
            .await;
        self.on_purchase_update(response.result, response.value)
            .await
    }

    /// Handle a purchase-flow completion delivered by the billing service.
    ///
    /// # Errors
    /// - `PurchaseCancelled` if the player backed out
    /// - `PurchaseFlow` if the store reported an error
    /// - `UnknownPurchaseStatus` for any other code
    pub async fn on_purchase_update(
        &self,
        result: BillingResult,
        purchase: Option<Purchase>,
    ) -> Result<PurchaseOutcome> {
        match result.code {
            codes::PURCHASE_SUCCESS => match purchase {
                Some(purchase) => Ok(self.process(&purchase, PurchaseOrigin::PurchaseFlow).await),
                None => Err(self.complain(FlowersError::PurchaseFlow {
                    message: "success reported without a purchase".into(),
                })),
            },
            codes::PURCHASE_USER_CANCELLED => Err(self.complain(FlowersError::PurchaseCancelled)),
            codes::PURCHASE_ERROR => Err(self.complain(FlowersError::PurchaseFlow {
                message: result.debug_message,
            })),
            code => Err(self.complain(FlowersError::UnknownPurchaseStatus { code })),
        }
    }

    /// One lifecycle pass over `purchase`.
    async fn process(&self, purchase: &Purchase, origin: PurchaseOrigin) -> PurchaseOutcome {
        let token = purchase.token.clone();

        // DETECTED → VALIDATING. A token already mid-pass or consumed is
        // turned away here, before anything else happens.
        {
            let mut state = self.lock_state();
            if let Err(err) = state.tracker.begin(&token, origin) {
                let current = state
                    .tracker
                    .state(&token)
                    .unwrap_or(PurchaseState::Detected);
                tracing::info!(%token, %origin, reason = %err, "Skipping purchase");
                return PurchaseOutcome::Skipped {
                    token,
                    state: current,
                };
            }
            state.advance(&token, PurchaseState::Validating);
        }

        let validation = self.validator.validate(purchase);
        let validated = validation.is_ok();

        // VALIDATED → AWARDING → CONSUMING, or REJECTED. The award is
        // persisted (below, outside the lock) before consumption is requested.
        let award = {
            let mut state = self.lock_state();
            match validation {
                Err(err) => {
                    state.advance(&token, PurchaseState::Rejected);
                    Err(err)
                }
                Ok(_) => {
                    state.advance(&token, PurchaseState::Validated);
                    let award = self.award_locked(&mut state, &token);
                    let next = if award.is_ok() {
                        PurchaseState::Consuming
                    } else {
                        PurchaseState::Rejected
                    };
                    state.advance(&token, next);
                    award
                }
            }
        };

        if validated {
            self.presenter.notify_info("Successful purchase validation");
        }

        let (awarded, balance) = match award {
            Ok(award) => award,
            Err(err) => {
                let reason = RejectReason::from(&err);
                self.complain(err);
                return PurchaseOutcome::Rejected { token, reason };
            }
        };
        if awarded {
            self.persist();
            self.presenter.notify_balance_changed(balance);
        }

        // CONSUMING → CONSUMED | CONSUME_FAILED. The guard marks the token
        // CONSUME_FAILED if this future is dropped mid-call.
        let result = {
            let mut pending = PendingConsume::new(self, &token);
            let result = self.gateway.consume(&token).await;
            pending.disarm();
            result
        };

        let consumed = result.is_success(BillingOperation::Consume);
        let balance = {
            let mut state = self.lock_state();
            let next = if consumed {
                PurchaseState::Consumed
            } else {
                PurchaseState::ConsumeFailed
            };
            state.advance(&token, next);
            state.ledger.balance()
        };

        if consumed {
            tracing::info!(%token, %origin, awarded, balance, "Consumption successful");
            self.presenter.notify_info(&format!(
                "You purchased {} seeds!\n\nYou now have {balance} seeds to grow flowers with!",
                self.config.seeds_per_purchase
            ));
            PurchaseOutcome::Consumed {
                token,
                awarded,
                balance,
            }
        } else {
            self.complain(FlowersError::Consume {
                code: result.code,
                message: result.debug_message,
            });
            PurchaseOutcome::ConsumeFailed {
                token,
                awarded,
                balance,
            }
        }
    }

    /// Award seeds for `token` unless this session already did. Returns
    /// whether seeds were added and the resulting balance.
    fn award_locked(&self, state: &mut SessionState, token: &PurchaseToken) -> Result<(bool, u64)> {
        if state.awarded.is_awarded(token) {
            tracing::info!(%token, "Already awarded this session, retrying consumption only");
            return Ok((false, state.ledger.balance()));
        }

        state.advance(token, PurchaseState::Awarding);
        let balance = state.ledger.award(self.config.seeds_per_purchase)?;
        state.awarded.mark_awarded(token)?;

        tracing::info!(
            %token,
            seeds = self.config.seeds_per_purchase,
            balance,
            awarded_this_session = state.awarded.len(),
            "Purchase is seeds, entitlement awarded"
        );
        Ok((true, balance))
    }

    // -----------------------------------------------------------------
    // Gameplay
    // -----------------------------------------------------------------

    /// Spend one seed to grow a random flower.
    pub fn grow_flower(&self) -> GrowOutcome {
        let grown = {
            let mut state = self.lock_state();
            match state.ledger.spend(1) {
                Ok(balance) => {
                    let flower = self.picker.pick(&mut rand::thread_rng());
                    state.last_flower = Some(flower);
                    Ok((flower, balance))
                }
                Err(err) => Err(err),
            }
        };

        match grown {
            Ok((flower, balance)) => {
                self.persist();
                tracing::info!(
                    top = flower.top,
                    bottom = flower.bottom,
                    balance,
                    "Flower grown"
                );
                self.presenter.notify_flower_grown(flower.top, flower.bottom);
                self.presenter.notify_balance_changed(balance);
                GrowOutcome::Grown { flower, balance }
            }
            Err(err) => {
                tracing::info!(error = %err, "Grow flower rejected");
                self.presenter.notify_error(OUT_OF_SEEDS_MESSAGE);
                GrowOutcome::NoSeedsAvailable
            }
        }
    }

    // -----------------------------------------------------------------
    // State access
    // -----------------------------------------------------------------

    /// Flush the balance to the store (host pause / shutdown).
    pub fn suspend(&self) -> Result<()> {
        self.save_balance().map_err(|err| self.complain(err))
    }

    #[must_use]
    pub fn balance(&self) -> u64 {
        self.lock_state().ledger.balance()
    }

    #[must_use]
    pub fn snapshot(&self) -> GardenSnapshot {
        let state = self.lock_state();
        GardenSnapshot {
            balance: state.ledger.balance(),
            last_flower: state.last_flower,
            seeds_price: state
                .catalog
                .price_of(&self.config.seeds_sku)
                .map(str::to_string),
        }
    }

    /// What this session knows about `token`.
    #[must_use]
    pub fn purchase_state(&self, token: &PurchaseToken) -> Option<TrackedPurchase> {
        self.lock_state().tracker.get(token).copied()
    }

    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.session
    }

    #[must_use]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    // -----------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------

    /// The session state lock. A panic while holding it cannot leave the
    /// ledger half-updated (every mutation is a single assignment), so a
    /// poisoned lock is recovered.
    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_connected(&self) -> Result<()> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(self.complain(FlowersError::NotConnected))
        }
    }

    /// Persist the balance. Failure is reported, not propagated; the
    /// in-memory ledger stays authoritative for the session.
    fn persist(&self) {
        if let Err(err) = self.save_balance() {
            tracing::warn!("Could not persist seed balance");
            self.complain(err);
        }
    }

    /// Write the current balance to the store without holding the state
    /// lock. The balance is read after `persist_io` is taken, so the last
    /// write to finish always carries the newest value.
    fn save_balance(&self) -> Result<()> {
        let _io = self.persist_io.lock().unwrap_or_else(PoisonError::into_inner);
        let ledger: EntitlementLedger = self.lock_state().ledger;
        ledger.save(&*self.store, &self.config.balance_key)
    }

    /// Log an error and show it to the player. Returns the error for
    /// propagation.
    fn complain(&self, err: FlowersError) -> FlowersError {
        tracing::error!(session = %self.session, error = %err, "**** Fun Flowers Error");
        self.presenter.notify_error(&format!("Error: {err}"));
        err
    }
}

/// Marks a token `CONSUME_FAILED` if the consume call is abandoned (the
/// host dropped the future, e.g. on timeout), so the next reconciliation
/// can pick it up again.
struct PendingConsume<'a> {
    controller: &'a PurchaseController,
    token: &'a PurchaseToken,
    armed: bool,
}

impl<'a> PendingConsume<'a> {
    fn new(controller: &'a PurchaseController, token: &'a PurchaseToken) -> Self {
        Self {
            controller,
            token,
            armed: true,
        }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for PendingConsume<'_> {
    fn drop(&mut self) {
        if self.armed {
            tracing::warn!(token = %self.token, "Consume abandoned before completion");
            self.controller
                .lock_state()
                .advance(self.token, PurchaseState::ConsumeFailed);
        }
    }
}
