//! Shared fixtures for controller integration tests.

#![allow(dead_code)]

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, OnceLock},
};

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use funflowers_core::{BillingGateway, BillingResponse, PresentationPort, PurchaseController};
use funflowers_ingress::{PurchaseValidator, SignatureVerifier};
use funflowers_settlement::{KeyValueStore, MemoryStore};
use funflowers_types::{
    BillingOperation, BillingResult, GameConfig, ProductDetails, ProductId, Purchase,
    PurchaseToken, codes, constants,
};
use rsa::{
    RsaPrivateKey, RsaPublicKey,
    pkcs1v15::SigningKey,
    signature::{SignatureEncoding, Signer},
};
use sha1::Sha1;
use tokio::sync::watch;

// =========================================================================
// Signing
// =========================================================================

fn test_key() -> &'static RsaPrivateKey {
    static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
    KEY.get_or_init(|| RsaPrivateKey::new(&mut rand::thread_rng(), 1024).unwrap())
}

pub fn test_validator() -> PurchaseValidator {
    let verifier = SignatureVerifier::from_public_key(RsaPublicKey::from(test_key()));
    PurchaseValidator::new(verifier, ProductId::from(constants::ITEM_ID_SEEDS))
}

pub fn sign_b64(payload: &[u8]) -> String {
    let signing_key = SigningKey::<Sha1>::new(test_key().clone());
    STANDARD.encode(signing_key.sign(payload).to_bytes())
}

/// A correctly signed purchase of `product`.
pub fn purchase_for(token: &str, product: &str) -> Purchase {
    let payload = format!(
        r#"{{"orderId":"GPA.{token}","productId":"{product}","purchaseToken":"{token}","purchaseState":0}}"#
    );
    let signature = sign_b64(payload.as_bytes());
    Purchase {
        token: PurchaseToken::from(token),
        product_ids: vec![ProductId::from(product)],
        payload,
        signature,
    }
}

/// A correctly signed seeds purchase.
pub fn seeds_purchase(token: &str) -> Purchase {
    purchase_for(token, constants::ITEM_ID_SEEDS)
}

/// A seeds purchase whose payload was changed after signing.
pub fn tampered_purchase(token: &str) -> Purchase {
    let mut purchase = seeds_purchase(token);
    purchase.payload = purchase.payload.replace("\"purchaseState\":0", "\"purchaseState\":1");
    purchase
}

pub fn flow_success(purchase: &Purchase) -> BillingResponse<Option<Purchase>> {
    BillingResponse::new(
        BillingResult::success(BillingOperation::Purchase),
        Some(purchase.clone()),
    )
}

pub fn flow_result(code: i32, message: &str) -> BillingResponse<Option<Purchase>> {
    BillingResponse::new(BillingResult::new(code, message), None)
}

// =========================================================================
// Scripted billing gateway
// =========================================================================

struct GatewayScript {
    connect_code: i32,
    catalog_code: i32,
    catalog: Vec<ProductDetails>,
    purchases_code: i32,
    owned: Vec<Purchase>,
    flows: VecDeque<BillingResponse<Option<Purchase>>>,
    consume_failures: u32,
    consume_calls: Vec<PurchaseToken>,
}

/// In-memory billing service driven by a script.
///
/// Owned purchases stay owned until consumed. Consume calls wait on a gate
/// that tests can close to hold a purchase mid-consume.
pub struct ScriptedGateway {
    script: Mutex<GatewayScript>,
    consume_gate: watch::Sender<bool>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        let (consume_gate, _) = watch::channel(true);
        Self {
            script: Mutex::new(GatewayScript {
                connect_code: codes::CONNECT_SUCCESS,
                catalog_code: codes::QUERY_PRODUCT_DETAILS_SUCCESS,
                catalog: Vec::new(),
                purchases_code: codes::QUERY_PURCHASES_SUCCESS,
                owned: Vec::new(),
                flows: VecDeque::new(),
                consume_failures: 0,
                consume_calls: Vec::new(),
            }),
            consume_gate,
        }
    }

    fn script(&self) -> std::sync::MutexGuard<'_, GatewayScript> {
        self.script.lock().unwrap()
    }

    pub fn set_connect_code(&self, code: i32) {
        self.script().connect_code = code;
    }

    pub fn set_catalog(&self, code: i32, catalog: Vec<ProductDetails>) {
        let mut script = self.script();
        script.catalog_code = code;
        script.catalog = catalog;
    }

    pub fn set_purchases_code(&self, code: i32) {
        self.script().purchases_code = code;
    }

    /// Make `purchase` owned and unconsumed, as if bought in an earlier
    /// session.
    pub fn add_owned(&self, purchase: Purchase) {
        let mut script = self.script();
        if !script.owned.iter().any(|p| p.token == purchase.token) {
            script.owned.push(purchase);
        }
    }

    pub fn owned_count(&self) -> usize {
        self.script().owned.len()
    }

    /// Queue the result of the next purchase flow.
    pub fn script_flow(&self, response: BillingResponse<Option<Purchase>>) {
        self.script().flows.push_back(response);
    }

    /// Fail the next `count` consume calls.
    pub fn fail_next_consumes(&self, count: u32) {
        self.script().consume_failures = count;
    }

    pub fn consume_calls(&self) -> Vec<PurchaseToken> {
        self.script().consume_calls.clone()
    }

    pub fn close_consume_gate(&self) {
        self.consume_gate.send_replace(false);
    }

    pub fn open_consume_gate(&self) {
        self.consume_gate.send_replace(true);
    }
}

#[async_trait]
impl BillingGateway for ScriptedGateway {
    async fn start_connection(&self) -> BillingResult {
        BillingResult::new(self.script().connect_code, "scripted connect")
    }

    async fn query_product_details(
        &self,
        _sku_type: &str,
        skus: &[ProductId],
    ) -> BillingResponse<Vec<ProductDetails>> {
        let script = self.script();
        let details = script
            .catalog
            .iter()
            .filter(|d| skus.contains(&d.id))
            .cloned()
            .collect();
        BillingResponse::new(
            BillingResult::new(script.catalog_code, "scripted catalog"),
            details,
        )
    }

    async fn query_purchases(&self, _sku_type: &str) -> BillingResponse<Vec<Purchase>> {
        let script = self.script();
        BillingResponse::new(
            BillingResult::new(script.purchases_code, "scripted purchases"),
            script.owned.clone(),
        )
    }

    async fn launch_billing_flow(
        &self,
        _sku: &ProductId,
        _sku_type: &str,
    ) -> BillingResponse<Option<Purchase>> {
        let mut script = self.script();
        let Some(response) = script.flows.pop_front() else {
            return flow_result(codes::PURCHASE_ERROR, "no scripted flow");
        };
        if response.result.code == codes::PURCHASE_SUCCESS {
            if let Some(purchase) = &response.value {
                if !script.owned.iter().any(|p| p.token == purchase.token) {
                    script.owned.push(purchase.clone());
                }
            }
        }
        response
    }

    async fn consume(&self, token: &PurchaseToken) -> BillingResult {
        let mut gate = self.consume_gate.subscribe();
        let _ = gate.wait_for(|open| *open).await;

        let mut script = self.script();
        script.consume_calls.push(token.clone());
        if script.consume_failures > 0 {
            script.consume_failures -= 1;
            return BillingResult::new(codes::CONSUME_ERROR, "service unavailable");
        }
        match script.owned.iter().position(|p| &p.token == token) {
            Some(index) => {
                script.owned.remove(index);
                BillingResult::success(BillingOperation::Consume)
            }
            None => BillingResult::new(codes::CONSUME_ERROR, "item not owned"),
        }
    }
}

// =========================================================================
// Recording presenter
// =========================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    Info(String),
    Error(String),
    Balance(u64),
    Flower(u32, u32),
}

#[derive(Default)]
pub struct RecordingPresenter {
    events: Mutex<Vec<UiEvent>>,
}

impl RecordingPresenter {
    pub fn events(&self) -> Vec<UiEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                UiEvent::Error(message) => Some(message),
                _ => None,
            })
            .collect()
    }

    pub fn infos(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                UiEvent::Info(message) => Some(message),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }

    fn record(&self, event: UiEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl PresentationPort for RecordingPresenter {
    fn notify_info(&self, message: &str) {
        self.record(UiEvent::Info(message.to_string()));
    }

    fn notify_error(&self, message: &str) {
        self.record(UiEvent::Error(message.to_string()));
    }

    fn notify_balance_changed(&self, balance: u64) {
        self.record(UiEvent::Balance(balance));
    }

    fn notify_flower_grown(&self, top: u32, bottom: u32) {
        self.record(UiEvent::Flower(top, bottom));
    }
}

// =========================================================================
// Harness
// =========================================================================

/// A controller wired to a scripted gateway, a recording presenter and a
/// store that survives [`Harness::restart`].
pub struct Harness {
    pub gateway: Arc<ScriptedGateway>,
    pub presenter: Arc<RecordingPresenter>,
    pub store: Arc<dyn KeyValueStore>,
    pub controller: PurchaseController,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()))
    }

    pub fn with_store(store: Arc<dyn KeyValueStore>) -> Self {
        Self::build(Arc::new(ScriptedGateway::new()), store)
    }

    /// A harness whose controller is already connected.
    pub async fn connected() -> Self {
        let harness = Self::new();
        harness.controller.connect().await.unwrap();
        harness
    }

    /// A fresh session against the same store and billing service, as after
    /// the process was killed and relaunched.
    pub fn restart(&self) -> Self {
        Self::build(self.gateway.clone(), self.store.clone())
    }

    /// The persisted balance record.
    pub fn stored_balance(&self) -> Option<i64> {
        self.store.get_i64(constants::KEY_PLAYER_SEEDS).unwrap()
    }

    fn build(gateway: Arc<ScriptedGateway>, store: Arc<dyn KeyValueStore>) -> Self {
        let presenter = Arc::new(RecordingPresenter::default());
        let controller = PurchaseController::new(
            GameConfig::default(),
            test_validator(),
            gateway.clone(),
            store.clone(),
            presenter.clone(),
        )
        .unwrap();
        Self {
            gateway,
            presenter,
            store,
            controller,
        }
    }
}
