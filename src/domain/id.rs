use derive_more::Display;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::SettlementError;

/// Gateway-issued payment reference. Globally unique per payment attempt and
/// the lookup key for both the webhook and the verification-poll path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxRef(String);

impl TxRef {
    pub fn new(id: impl Into<String>) -> Result<Self, SettlementError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(SettlementError::Validation("TxRef cannot be empty".into()));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Locally generated transaction identifier, minted at session creation
/// before any gateway callback. The ledger idempotency key derives from it.
#[derive(Debug, Clone, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(String);

impl TransactionId {
    pub fn new(id: impl Into<String>) -> Result<Self, SettlementError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(SettlementError::Validation(
                "TransactionId cannot be empty".into(),
            ));
        }
        Ok(Self(id))
    }

    /// Fresh identifier for a new payment session.
    pub fn mint() -> Self {
        Self(format!("txn_{}", Uuid::now_v7().simple()))
    }

    /// Deterministic identifier for a record created by the fallback path,
    /// where the session-creation write never happened (or lost a race).
    /// Derived from the tx_ref so repeated fallback passes agree on the key.
    pub fn synthesize(tx_ref: &TxRef) -> Self {
        Self(format!("recovered_{}", tx_ref.as_str()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    pub fn new(id: impl Into<String>) -> Result<Self, SettlementError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(SettlementError::Validation("OrderId cannot be empty".into()));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookingId(String);

impl BookingId {
    pub fn new(id: impl Into<String>) -> Result<Self, SettlementError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(SettlementError::Validation(
                "BookingId cannot be empty".into(),
            ));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
