use {
    super::{ledger_repo, order_repo, payment_repo},
    crate::domain::{
        error::SettlementError,
        id::{BookingId, OrderId, TxRef},
        ledger::{LedgerEntryId, NewLedgerEntry},
        order::{PaidOutcome, PaymentDetails},
        payment::{GatewayCharge, NewPaymentRecord, PaymentRecord},
        store::SettlementStore,
    },
    async_trait::async_trait,
    sqlx::PgPool,
};

/// Postgres-backed store. Idempotency comes from schema constraints
/// (primary key on the deterministic ledger id, unique tx_ref) and CAS
/// predicates, not from any in-process coordination.
pub struct PgSettlementStore {
    pool: PgPool,
}

impl PgSettlementStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SettlementStore for PgSettlementStore {
    async fn create_payment_record(
        &self,
        record: &NewPaymentRecord,
    ) -> Result<bool, SettlementError> {
        payment_repo::insert_if_absent(&self.pool, record).await
    }

    async fn find_payment_record(
        &self,
        tx_ref: &TxRef,
    ) -> Result<Option<PaymentRecord>, SettlementError> {
        payment_repo::find(&self.pool, tx_ref).await
    }

    async fn complete_payment_record(
        &self,
        tx_ref: &TxRef,
        charge: &GatewayCharge,
    ) -> Result<(), SettlementError> {
        payment_repo::complete(&self.pool, tx_ref, charge).await
    }

    async fn fail_payment_record(&self, tx_ref: &TxRef) -> Result<(), SettlementError> {
        payment_repo::fail(&self.pool, tx_ref).await
    }

    async fn ledger_entry_exists(&self, id: &LedgerEntryId) -> Result<bool, SettlementError> {
        ledger_repo::exists(&self.pool, id).await
    }

    async fn create_ledger_entry(&self, entry: &NewLedgerEntry) -> Result<bool, SettlementError> {
        ledger_repo::insert_if_absent(&self.pool, entry).await
    }

    async fn mark_order_paid(
        &self,
        id: &OrderId,
        details: &PaymentDetails,
    ) -> Result<PaidOutcome, SettlementError> {
        order_repo::mark_order_paid(&self.pool, id, details).await
    }

    async fn mark_booking_paid(
        &self,
        id: &BookingId,
        details: &PaymentDetails,
    ) -> Result<PaidOutcome, SettlementError> {
        order_repo::mark_booking_paid(&self.pool, id, details).await
    }

    async fn cancel_order(&self, id: &OrderId, reason: &str) -> Result<(), SettlementError> {
        order_repo::cancel_order(&self.pool, id, reason).await
    }

    async fn cancel_booking(&self, id: &BookingId, reason: &str) -> Result<(), SettlementError> {
        order_repo::cancel_booking(&self.pool, id, reason).await
    }

    async fn claim_inventory_adjustment(&self, id: &OrderId) -> Result<bool, SettlementError> {
        order_repo::claim_inventory_adjustment(&self.pool, id).await
    }

    async fn adjust_inventory(&self, id: &OrderId) -> Result<(), SettlementError> {
        order_repo::enqueue_inventory_adjustment(&self.pool, id).await
    }
}
