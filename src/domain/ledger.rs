use {
    super::error::SettlementError,
    super::id::TransactionId,
    super::money::Money,
    super::payment::PaymentTarget,
    chrono::{DateTime, Utc},
    derive_more::Display,
    serde::{Deserialize, Serialize},
    std::fmt,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryType {
    OrderSale,
    BookingPayment,
    Reversal,
}

impl EntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OrderSale => "ORDER_SALE",
            Self::BookingPayment => "BOOKING_PAYMENT",
            Self::Reversal => "REVERSAL",
        }
    }

    pub fn for_target(target: &PaymentTarget) -> Self {
        match target {
            PaymentTarget::Order(_) => Self::OrderSale,
            PaymentTarget::Booking(_) => Self::BookingPayment,
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for EntryType {
    type Error = SettlementError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "ORDER_SALE" => Ok(Self::OrderSale),
            "BOOKING_PAYMENT" => Ok(Self::BookingPayment),
            "REVERSAL" => Ok(Self::Reversal),
            other => Err(SettlementError::Validation(format!(
                "unknown ledger entry type: {other}"
            ))),
        }
    }
}

/// Deterministic ledger identity — the idempotency gate for the whole
/// settlement subsystem. Derived, never generated, so every pass over the
/// same payment computes the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LedgerEntryId(String);

impl LedgerEntryId {
    pub fn for_settlement(transaction_id: &TransactionId, target: &PaymentTarget) -> Self {
        match target {
            PaymentTarget::Order(_) => Self(format!("payment_{}", transaction_id.as_str())),
            PaymentTarget::Booking(_) => {
                Self(format!("payment_{}_booking", transaction_id.as_str()))
            }
        }
    }

    /// Offsetting entry id for a cancellation. References the original,
    /// which is never mutated or deleted.
    pub fn reversal_of(original: &LedgerEntryId) -> Self {
        Self(format!("{}_reversal", original.0))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Immutable financial fact recorded once per settlement.
#[derive(Debug, Clone, Serialize)]
pub struct LedgerEntry {
    pub id: LedgerEntryId,
    pub entry_type: EntryType,
    pub money: Money,
    pub target: PaymentTarget,
    pub payment_id: TransactionId,
    pub description: String,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewLedgerEntry {
    pub id: LedgerEntryId,
    pub entry_type: EntryType,
    pub money: Money,
    pub target: PaymentTarget,
    pub payment_id: TransactionId,
    pub description: String,
    pub metadata: serde_json::Value,
}

impl NewLedgerEntry {
    pub fn settlement(
        transaction_id: TransactionId,
        target: PaymentTarget,
        money: Money,
        metadata: serde_json::Value,
    ) -> Self {
        let id = LedgerEntryId::for_settlement(&transaction_id, &target);
        let entry_type = EntryType::for_target(&target);
        let description = match &target {
            PaymentTarget::Order(oid) => format!("Payment for order {oid}"),
            PaymentTarget::Booking(bid) => format!("Payment for booking {bid}"),
        };
        Self {
            id,
            entry_type,
            money,
            target,
            payment_id: transaction_id,
            description,
            metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::id::{BookingId, OrderId};

    fn txn(s: &str) -> TransactionId {
        TransactionId::new(s).unwrap()
    }

    #[test]
    fn settlement_ids_match_ledger_key_scheme() {
        let order = PaymentTarget::Order(OrderId::new("ORD1").unwrap());
        let booking = PaymentTarget::Booking(BookingId::new("BKG1").unwrap());

        assert_eq!(
            LedgerEntryId::for_settlement(&txn("abc123"), &order).as_str(),
            "payment_abc123"
        );
        assert_eq!(
            LedgerEntryId::for_settlement(&txn("abc123"), &booking).as_str(),
            "payment_abc123_booking"
        );
    }

    #[test]
    fn order_and_booking_keys_never_collide() {
        let order = PaymentTarget::Order(OrderId::new("ORD1").unwrap());
        let booking = PaymentTarget::Booking(BookingId::new("BKG1").unwrap());
        assert_ne!(
            LedgerEntryId::for_settlement(&txn("t1"), &order),
            LedgerEntryId::for_settlement(&txn("t1"), &booking)
        );
    }

    #[test]
    fn reversal_references_original() {
        let order = PaymentTarget::Order(OrderId::new("ORD1").unwrap());
        let original = LedgerEntryId::for_settlement(&txn("abc123"), &order);
        assert_eq!(
            LedgerEntryId::reversal_of(&original).as_str(),
            "payment_abc123_reversal"
        );
    }
}
