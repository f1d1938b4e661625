#![allow(dead_code)]

use {
    async_trait::async_trait,
    chrono::Utc,
    std::{
        collections::HashMap,
        future::Future,
        pin::Pin,
        sync::{
            Arc, Mutex,
            atomic::{AtomicBool, AtomicUsize, Ordering},
        },
    },
    till_sync::{
        config::SettlementConfig,
        domain::{
            error::SettlementError,
            gateway::{CheckoutSession, GatewayClient, NewCheckout, VerifyOutcome},
            id::{BookingId, OrderId, TransactionId, TxRef},
            ledger::NewLedgerEntry,
            money::{Currency, Money, MoneyAmount},
            notify::{Notifier, PaymentEvent},
            order::{FulfillmentStatus, PaidOutcome, PaymentDetails},
            payment::{GatewayCharge, NewPaymentRecord, PaymentRecord, PaymentStatus, PaymentTarget},
            store::SettlementStore,
        },
        services::settlement::SettlementContext,
    },
};

// ── in-memory store double ─────────────────────────────────────────────────
//
// Mirrors the Postgres store's atomicity: create-if-absent under one lock,
// CAS on the pending→paid transition. Good enough to exercise every
// idempotency property without a database.

#[derive(Debug, Clone)]
pub struct OrderDoc {
    pub status: FulfillmentStatus,
    pub payment: Option<PaymentDetails>,
    pub canceled_reason: Option<String>,
    pub inventory_adjusted: bool,
}

#[derive(Default)]
struct Inner {
    records: HashMap<String, PaymentRecord>,
    ledger: HashMap<String, NewLedgerEntry>,
    orders: HashMap<String, OrderDoc>,
    bookings: HashMap<String, OrderDoc>,
    inventory_jobs: Vec<String>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    /// One-shot failure injection: the next ledger-gate check errors, as if
    /// the store went away mid-pass.
    pub fail_next_ledger_check: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn seed_order(&self, id: &str) {
        self.inner.lock().unwrap().orders.insert(
            id.to_string(),
            OrderDoc {
                status: FulfillmentStatus::Pending,
                payment: None,
                canceled_reason: None,
                inventory_adjusted: false,
            },
        );
    }

    pub fn seed_booking(&self, id: &str) {
        self.inner.lock().unwrap().bookings.insert(
            id.to_string(),
            OrderDoc {
                status: FulfillmentStatus::Pending,
                payment: None,
                canceled_reason: None,
                inventory_adjusted: false,
            },
        );
    }

    pub fn order(&self, id: &str) -> Option<OrderDoc> {
        self.inner.lock().unwrap().orders.get(id).cloned()
    }

    pub fn booking(&self, id: &str) -> Option<OrderDoc> {
        self.inner.lock().unwrap().bookings.get(id).cloned()
    }

    pub fn record(&self, tx_ref: &str) -> Option<PaymentRecord> {
        self.inner.lock().unwrap().records.get(tx_ref).cloned()
    }

    pub fn ledger_count(&self) -> usize {
        self.inner.lock().unwrap().ledger.len()
    }

    pub fn ledger_entry(&self, id: &str) -> Option<NewLedgerEntry> {
        self.inner.lock().unwrap().ledger.get(id).cloned()
    }

    pub fn inventory_jobs(&self) -> Vec<String> {
        self.inner.lock().unwrap().inventory_jobs.clone()
    }

    fn injected_failure() -> SettlementError {
        SettlementError::Database(sqlx::Error::PoolTimedOut)
    }
}

#[async_trait]
impl SettlementStore for MemoryStore {
    async fn create_payment_record(
        &self,
        record: &NewPaymentRecord,
    ) -> Result<bool, SettlementError> {
        let mut inner = self.inner.lock().unwrap();
        let key = record.tx_ref.as_str().to_string();
        if inner.records.contains_key(&key) {
            return Ok(false);
        }
        let now = Utc::now();
        inner.records.insert(
            key,
            PaymentRecord {
                tx_ref: record.tx_ref.clone(),
                transaction_id: record.transaction_id.clone(),
                recovered: record.recovered,
                target: record.target.clone(),
                money: record.money,
                status: record.status,
                payment_method: record.payment_method.clone(),
                customer_email: record.customer_email.clone(),
                customer_name: record.customer_name.clone(),
                metadata: record.metadata.clone(),
                created_at: now,
                updated_at: now,
                completed_at: match record.status {
                    PaymentStatus::Completed => Some(now),
                    _ => None,
                },
            },
        );
        Ok(true)
    }

    async fn find_payment_record(
        &self,
        tx_ref: &TxRef,
    ) -> Result<Option<PaymentRecord>, SettlementError> {
        Ok(self.inner.lock().unwrap().records.get(tx_ref.as_str()).cloned())
    }

    async fn complete_payment_record(
        &self,
        tx_ref: &TxRef,
        charge: &GatewayCharge,
    ) -> Result<(), SettlementError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(record) = inner.records.get_mut(tx_ref.as_str()) {
            record.status = PaymentStatus::Completed;
            if record.payment_method.is_none() {
                record.payment_method = charge.payment_method.clone();
            }
            if record.customer_email.is_none() {
                record.customer_email = charge.customer_email.clone();
            }
            record.completed_at.get_or_insert_with(Utc::now);
            record.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn fail_payment_record(&self, tx_ref: &TxRef) -> Result<(), SettlementError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(record) = inner.records.get_mut(tx_ref.as_str()) {
            record.status = PaymentStatus::Failed;
            record.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn ledger_entry_exists(
        &self,
        id: &till_sync::domain::ledger::LedgerEntryId,
    ) -> Result<bool, SettlementError> {
        if self.fail_next_ledger_check.swap(false, Ordering::SeqCst) {
            return Err(Self::injected_failure());
        }
        Ok(self.inner.lock().unwrap().ledger.contains_key(id.as_str()))
    }

    async fn create_ledger_entry(&self, entry: &NewLedgerEntry) -> Result<bool, SettlementError> {
        let mut inner = self.inner.lock().unwrap();
        let key = entry.id.as_str().to_string();
        if inner.ledger.contains_key(&key) {
            return Ok(false);
        }
        inner.ledger.insert(key, entry.clone());
        Ok(true)
    }

    async fn mark_order_paid(
        &self,
        id: &OrderId,
        details: &PaymentDetails,
    ) -> Result<PaidOutcome, SettlementError> {
        let mut inner = self.inner.lock().unwrap();
        match inner.orders.get_mut(id.as_str()) {
            None => Ok(PaidOutcome::NotFound),
            Some(order) if order.status == FulfillmentStatus::Pending => {
                order.status = FulfillmentStatus::Paid;
                order.payment = Some(details.clone());
                Ok(PaidOutcome::Transitioned)
            }
            Some(_) => Ok(PaidOutcome::AlreadyPaid),
        }
    }

    async fn mark_booking_paid(
        &self,
        id: &BookingId,
        details: &PaymentDetails,
    ) -> Result<PaidOutcome, SettlementError> {
        let mut inner = self.inner.lock().unwrap();
        match inner.bookings.get_mut(id.as_str()) {
            None => Ok(PaidOutcome::NotFound),
            Some(booking) if booking.status == FulfillmentStatus::Pending => {
                booking.status = FulfillmentStatus::Paid;
                booking.payment = Some(details.clone());
                Ok(PaidOutcome::Transitioned)
            }
            Some(_) => Ok(PaidOutcome::AlreadyPaid),
        }
    }

    async fn cancel_order(&self, id: &OrderId, reason: &str) -> Result<(), SettlementError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(order) = inner.orders.get_mut(id.as_str()) {
            if order.status == FulfillmentStatus::Pending {
                order.status = FulfillmentStatus::Canceled;
                order.canceled_reason = Some(reason.to_string());
            }
        }
        Ok(())
    }

    async fn cancel_booking(&self, id: &BookingId, reason: &str) -> Result<(), SettlementError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(booking) = inner.bookings.get_mut(id.as_str()) {
            if booking.status == FulfillmentStatus::Pending {
                booking.status = FulfillmentStatus::Canceled;
                booking.canceled_reason = Some(reason.to_string());
            }
        }
        Ok(())
    }

    async fn claim_inventory_adjustment(&self, id: &OrderId) -> Result<bool, SettlementError> {
        let mut inner = self.inner.lock().unwrap();
        match inner.orders.get_mut(id.as_str()) {
            Some(order) if !order.inventory_adjusted => {
                order.inventory_adjusted = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn adjust_inventory(&self, id: &OrderId) -> Result<(), SettlementError> {
        self.inner
            .lock()
            .unwrap()
            .inventory_jobs
            .push(id.as_str().to_string());
        Ok(())
    }
}

// ── mock gateway ───────────────────────────────────────────────────────────

pub struct MockGateway {
    verified: Mutex<Option<GatewayCharge>>,
    checkout_tx_ref: Mutex<String>,
    pub verify_calls: AtomicUsize,
}

impl MockGateway {
    /// Gateway that confirms the transaction and returns `charge` from its
    /// verify endpoint.
    pub fn verifying(charge: GatewayCharge) -> Arc<Self> {
        Arc::new(Self {
            verified: Mutex::new(Some(charge)),
            checkout_tx_ref: Mutex::new("TX_MOCK".to_string()),
            verify_calls: AtomicUsize::new(0),
        })
    }

    pub fn unverified() -> Arc<Self> {
        Arc::new(Self {
            verified: Mutex::new(None),
            checkout_tx_ref: Mutex::new("TX_MOCK".to_string()),
            verify_calls: AtomicUsize::new(0),
        })
    }

    pub fn set_verified(&self, charge: Option<GatewayCharge>) {
        *self.verified.lock().unwrap() = charge;
    }

    pub fn set_checkout_tx_ref(&self, tx_ref: &str) {
        *self.checkout_tx_ref.lock().unwrap() = tx_ref.to_string();
    }
}

impl GatewayClient for MockGateway {
    fn verify(&self, _tx_ref: &TxRef) -> Pin<Box<dyn Future<Output = VerifyOutcome> + Send + '_>> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        let outcome = match self.verified.lock().unwrap().clone() {
            Some(charge) => VerifyOutcome::Verified(charge),
            None => VerifyOutcome::Unverified,
        };
        Box::pin(async move { outcome })
    }

    fn create_checkout(
        &self,
        _checkout: &NewCheckout,
    ) -> Pin<Box<dyn Future<Output = Result<CheckoutSession, SettlementError>> + Send + '_>> {
        let tx_ref = self.checkout_tx_ref.lock().unwrap().clone();
        Box::pin(async move {
            Ok(CheckoutSession {
                tx_ref: TxRef::new(tx_ref)?,
                checkout_url: "https://gateway.test/checkout/session".to_string(),
            })
        })
    }
}

// ── recording notifier ─────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingNotifier {
    pub succeeded: AtomicUsize,
    pub failed: AtomicUsize,
    pub status_changes: AtomicUsize,
    pub emails: AtomicUsize,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn payment_succeeded(&self, _event: &PaymentEvent) -> Result<(), SettlementError> {
        self.succeeded.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn payment_failed(&self, _event: &PaymentEvent) -> Result<(), SettlementError> {
        self.failed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn status_changed(
        &self,
        _target: &PaymentTarget,
        _status: FulfillmentStatus,
    ) -> Result<(), SettlementError> {
        self.status_changes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn send_payment_email(
        &self,
        _event: &PaymentEvent,
        _source: &str,
    ) -> Result<(), SettlementError> {
        self.emails.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ── harness ────────────────────────────────────────────────────────────────

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub gateway: Arc<MockGateway>,
    pub notifier: Arc<RecordingNotifier>,
    pub ctx: SettlementContext,
}

pub fn harness(gateway: Arc<MockGateway>) -> Harness {
    harness_with_config(gateway, SettlementConfig::default())
}

pub fn harness_with_config(gateway: Arc<MockGateway>, config: SettlementConfig) -> Harness {
    let store = MemoryStore::new();
    let notifier = Arc::new(RecordingNotifier::default());
    let ctx = SettlementContext {
        store: store.clone(),
        gateway: gateway.clone(),
        notifier: notifier.clone(),
        config,
    };
    Harness {
        store,
        gateway,
        notifier,
        ctx,
    }
}

// ── builders ───────────────────────────────────────────────────────────────

pub fn mwk(amount: i64) -> Money {
    Money::new(MoneyAmount::new(amount).unwrap(), Currency::Mwk)
}

pub fn order_charge(tx_ref: &str, transaction_id: &str, order_id: &str, amount: i64) -> GatewayCharge {
    GatewayCharge {
        tx_ref: TxRef::new(tx_ref).unwrap(),
        transaction_id: Some(TransactionId::new(transaction_id).unwrap()),
        target: Some(PaymentTarget::Order(OrderId::new(order_id).unwrap())),
        money: mwk(amount),
        payment_method: Some("mobile_money".to_string()),
        customer_email: Some("customer@example.mw".to_string()),
        customer_name: Some("Test Customer".to_string()),
        metadata: serde_json::json!({}),
    }
}

pub fn booking_charge(
    tx_ref: &str,
    transaction_id: &str,
    booking_id: &str,
    amount: i64,
) -> GatewayCharge {
    GatewayCharge {
        tx_ref: TxRef::new(tx_ref).unwrap(),
        transaction_id: Some(TransactionId::new(transaction_id).unwrap()),
        target: Some(PaymentTarget::Booking(BookingId::new(booking_id).unwrap())),
        money: mwk(amount),
        payment_method: Some("card".to_string()),
        customer_email: Some("customer@example.mw".to_string()),
        customer_name: None,
        metadata: serde_json::json!({}),
    }
}

/// Charge with no correlation metadata at all, the way a minimal gateway
/// payload arrives.
pub fn bare_charge(tx_ref: &str, amount: i64) -> GatewayCharge {
    GatewayCharge {
        tx_ref: TxRef::new(tx_ref).unwrap(),
        transaction_id: None,
        target: None,
        money: mwk(amount),
        payment_method: None,
        customer_email: None,
        customer_name: None,
        metadata: serde_json::json!({}),
    }
}

/// Persist the pending record a session-creation call would have written.
pub async fn seed_session(harness: &Harness, charge: &GatewayCharge) {
    let record = NewPaymentRecord::pending(
        charge.tx_ref.clone(),
        charge.transaction_id.clone().unwrap(),
        charge.target.clone().unwrap(),
        charge.money,
        charge.customer_email.clone(),
        charge.customer_name.clone(),
        serde_json::json!({}),
    );
    assert!(harness.store.create_payment_record(&record).await.unwrap());
}
