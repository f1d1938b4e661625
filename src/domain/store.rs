use {
    super::error::SettlementError,
    super::id::{BookingId, OrderId, TxRef},
    super::ledger::{LedgerEntryId, NewLedgerEntry},
    super::order::{PaidOutcome, PaymentDetails},
    super::payment::{GatewayCharge, NewPaymentRecord, PaymentRecord},
    async_trait::async_trait,
};

/// Shared mutable state both ingress paths converge on: payment records,
/// the ledger, and the payment-relevant slice of orders and bookings.
///
/// Settlement-critical writes are atomic at the store level:
/// create-if-absent for records and ledger entries, compare-and-swap for
/// the pending→paid transition. The core never does read-then-write for
/// anything the idempotency properties depend on.
#[async_trait]
pub trait SettlementStore: Send + Sync {
    // ── payment records ────────────────────────────────────────────────

    /// Insert a record if none exists for its tx_ref. Returns `false` when
    /// a record was already there (a concurrent pass or an earlier session
    /// creation won).
    async fn create_payment_record(
        &self,
        record: &NewPaymentRecord,
    ) -> Result<bool, SettlementError>;

    async fn find_payment_record(
        &self,
        tx_ref: &TxRef,
    ) -> Result<Option<PaymentRecord>, SettlementError>;

    /// Mark the record completed and fold in whatever the gateway payload
    /// carried (method, customer fields). No-op if the record is absent.
    async fn complete_payment_record(
        &self,
        tx_ref: &TxRef,
        charge: &GatewayCharge,
    ) -> Result<(), SettlementError>;

    async fn fail_payment_record(&self, tx_ref: &TxRef) -> Result<(), SettlementError>;

    // ── ledger ─────────────────────────────────────────────────────────

    async fn ledger_entry_exists(&self, id: &LedgerEntryId) -> Result<bool, SettlementError>;

    /// Atomic create-if-absent on the deterministic entry id. Returns
    /// `false` when the entry already existed — the idempotency gate.
    async fn create_ledger_entry(&self, entry: &NewLedgerEntry) -> Result<bool, SettlementError>;

    // ── orders / bookings ──────────────────────────────────────────────

    /// pending→paid compare-and-swap; writes the payment sub-object only
    /// when the swap succeeds.
    async fn mark_order_paid(
        &self,
        id: &OrderId,
        details: &PaymentDetails,
    ) -> Result<PaidOutcome, SettlementError>;

    async fn mark_booking_paid(
        &self,
        id: &BookingId,
        details: &PaymentDetails,
    ) -> Result<PaidOutcome, SettlementError>;

    async fn cancel_order(&self, id: &OrderId, reason: &str) -> Result<(), SettlementError>;

    async fn cancel_booking(&self, id: &BookingId, reason: &str) -> Result<(), SettlementError>;

    // ── inventory side effect ──────────────────────────────────────────

    /// Claim the order's one-shot inventory adjustment. Returns `false`
    /// when a previous pass already claimed it.
    async fn claim_inventory_adjustment(&self, id: &OrderId) -> Result<bool, SettlementError>;

    /// Collaborator boundary: decrement stock for a paid order. Idempotent
    /// given the claim above.
    async fn adjust_inventory(&self, id: &OrderId) -> Result<(), SettlementError>;
}
