use {
    super::error::SettlementError,
    super::id::TransactionId,
    super::money::Money,
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
    std::fmt,
};

/// Order/booking lifecycle, restricted to the slice the settlement core
/// touches. Fulfillment states past `Paid` belong to other subsystems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FulfillmentStatus {
    Pending,
    Paid,
    Confirmed,
    Completed,
    Canceled,
}

impl FulfillmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Confirmed => "confirmed",
            Self::Completed => "completed",
            Self::Canceled => "canceled",
        }
    }
}

impl fmt::Display for FulfillmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for FulfillmentStatus {
    type Error = SettlementError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "confirmed" => Ok(Self::Confirmed),
            "completed" => Ok(Self::Completed),
            "canceled" => Ok(Self::Canceled),
            other => Err(SettlementError::Validation(format!(
                "unknown fulfillment status: {other}"
            ))),
        }
    }
}

/// Payment sub-object written onto the order/booking at settlement.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentDetails {
    pub payment_id: TransactionId,
    pub method: Option<String>,
    pub paid_at: DateTime<Utc>,
    pub money: Money,
}

/// Result of the pending→paid compare-and-swap. The store applies the
/// transition at most once; a second caller sees `AlreadyPaid`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaidOutcome {
    Transitioned,
    AlreadyPaid,
    NotFound,
}
