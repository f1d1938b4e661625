use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettlementError {
    #[error("validation: {0}")]
    Validation(String),

    #[error("database: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("webhook signature: {0}")]
    WebhookSignature(String),

    #[error("gateway: {0}")]
    Gateway(String),

    #[error("verification failed: {0}")]
    VerificationFailed(String),

    /// A completed payment with no usable correlation identifiers —
    /// nothing to key the ledger or the order update on.
    #[error("missing correlation: {0}")]
    MissingCorrelation(String),

    #[error("not found: {0}")]
    NotFound(String),
}
