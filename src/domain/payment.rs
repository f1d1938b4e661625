use {
    super::error::SettlementError,
    super::id::{BookingId, OrderId, TransactionId, TxRef},
    super::money::Money,
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
    std::fmt,
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for PaymentStatus {
    type Error = SettlementError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(SettlementError::Validation(format!(
                "unknown payment status: {other}"
            ))),
        }
    }
}

/// What a payment settles against. A tagged variant instead of an
/// order-id/booking-id pair of optionals, so "both set" and "neither set"
/// are unrepresentable past this constructor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentTarget {
    Order(OrderId),
    Booking(BookingId),
}

impl PaymentTarget {
    pub fn try_from_parts(
        order_id: Option<OrderId>,
        booking_id: Option<BookingId>,
    ) -> Result<Self, SettlementError> {
        match (order_id, booking_id) {
            (Some(id), None) => Ok(Self::Order(id)),
            (None, Some(id)) => Ok(Self::Booking(id)),
            (Some(_), Some(_)) => Err(SettlementError::Validation(
                "payment cannot target both an order and a booking".into(),
            )),
            (None, None) => Err(SettlementError::MissingCorrelation(
                "payment targets neither an order nor a booking".into(),
            )),
        }
    }

    /// Like `try_from_parts`, but "neither" is allowed and maps to `None`
    /// (webhook payloads may carry no correlation at all; the settlement
    /// core recovers the target from the stored record).
    pub fn try_from_optional_parts(
        order_id: Option<OrderId>,
        booking_id: Option<BookingId>,
    ) -> Result<Option<Self>, SettlementError> {
        match (order_id, booking_id) {
            (None, None) => Ok(None),
            (order, booking) => Self::try_from_parts(order, booking).map(Some),
        }
    }

    pub fn order_id(&self) -> Option<&OrderId> {
        match self {
            Self::Order(id) => Some(id),
            Self::Booking(_) => None,
        }
    }

    pub fn booking_id(&self) -> Option<&BookingId> {
        match self {
            Self::Booking(id) => Some(id),
            Self::Order(_) => None,
        }
    }
}

impl fmt::Display for PaymentTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Order(id) => write!(f, "order:{id}"),
            Self::Booking(id) => write!(f, "booking:{id}"),
        }
    }
}

/// Normalized gateway payload for a successful payment, as delivered by the
/// webhook envelope or reconstructed from the verify endpoint. Correlation
/// fields are optional here; the settlement core resolves them against the
/// stored PaymentRecord before anything is mutated.
#[derive(Debug, Clone)]
pub struct GatewayCharge {
    pub tx_ref: TxRef,
    pub transaction_id: Option<TransactionId>,
    pub target: Option<PaymentTarget>,
    pub money: Money,
    pub payment_method: Option<String>,
    pub customer_email: Option<String>,
    pub customer_name: Option<String>,
    pub metadata: serde_json::Value,
}

impl GatewayCharge {
    /// Fill correlation gaps from a previously stored record. Stored values
    /// win only where the gateway payload carried nothing.
    pub fn merge_record(mut self, record: &PaymentRecord) -> Self {
        if self.transaction_id.is_none() {
            self.transaction_id = record.transaction_id.clone();
        }
        if self.target.is_none() {
            self.target = record.target.clone();
        }
        if self.customer_email.is_none() {
            self.customer_email = record.customer_email.clone();
        }
        if self.customer_name.is_none() {
            self.customer_name = record.customer_name.clone();
        }
        self
    }
}

/// One row per payment attempt, keyed by tx_ref.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentRecord {
    pub tx_ref: TxRef,
    pub transaction_id: Option<TransactionId>,
    /// True when the record was created by the fallback path rather than at
    /// session creation — its transaction id is synthesized, best-effort.
    pub recovered: bool,
    pub target: Option<PaymentTarget>,
    pub money: Money,
    pub status: PaymentStatus,
    pub payment_method: Option<String>,
    pub customer_email: Option<String>,
    pub customer_name: Option<String>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// For insert — timestamps are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewPaymentRecord {
    pub tx_ref: TxRef,
    pub transaction_id: Option<TransactionId>,
    pub recovered: bool,
    pub target: Option<PaymentTarget>,
    pub money: Money,
    pub status: PaymentStatus,
    pub payment_method: Option<String>,
    pub customer_email: Option<String>,
    pub customer_name: Option<String>,
    pub metadata: serde_json::Value,
}

impl NewPaymentRecord {
    /// Record persisted at session creation, before any gateway callback.
    pub fn pending(
        tx_ref: TxRef,
        transaction_id: TransactionId,
        target: PaymentTarget,
        money: Money,
        customer_email: Option<String>,
        customer_name: Option<String>,
        metadata: serde_json::Value,
    ) -> Self {
        Self {
            tx_ref,
            transaction_id: Some(transaction_id),
            recovered: false,
            target: Some(target),
            money,
            status: PaymentStatus::Pending,
            payment_method: None,
            customer_email,
            customer_name,
            metadata,
        }
    }

    /// Degraded record created when a gateway callback arrives for a tx_ref
    /// the session-creation write never persisted. The transaction id is
    /// synthesized from the tx_ref so later passes agree on the ledger key.
    pub fn recovered(charge: &GatewayCharge) -> Self {
        let transaction_id = charge
            .transaction_id
            .clone()
            .unwrap_or_else(|| TransactionId::synthesize(&charge.tx_ref));
        Self {
            tx_ref: charge.tx_ref.clone(),
            transaction_id: Some(transaction_id),
            recovered: true,
            target: charge.target.clone(),
            money: charge.money,
            status: PaymentStatus::Completed,
            payment_method: charge.payment_method.clone(),
            customer_email: charge.customer_email.clone(),
            customer_name: charge.customer_name.clone(),
            metadata: charge.metadata.clone(),
        }
    }
}
