use {
    super::id::TxRef,
    super::money::Money,
    super::order::FulfillmentStatus,
    super::payment::PaymentTarget,
    crate::domain::error::SettlementError,
    async_trait::async_trait,
};

/// Payload handed to the notification collaborators. Deliberately small —
/// delivery internals (templates, channels) are out of scope.
#[derive(Debug, Clone)]
pub struct PaymentEvent {
    pub tx_ref: TxRef,
    pub target: Option<PaymentTarget>,
    pub money: Money,
    pub customer_email: Option<String>,
    pub customer_name: Option<String>,
}

/// Black-box notification/email collaborator. Every call from the
/// settlement core is fire-and-forget: failures are logged by the caller
/// and never block or roll back a settlement.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn payment_succeeded(&self, event: &PaymentEvent) -> Result<(), SettlementError>;

    async fn payment_failed(&self, event: &PaymentEvent) -> Result<(), SettlementError>;

    async fn status_changed(
        &self,
        target: &PaymentTarget,
        status: FulfillmentStatus,
    ) -> Result<(), SettlementError>;

    async fn send_payment_email(
        &self,
        event: &PaymentEvent,
        source: &str,
    ) -> Result<(), SettlementError>;
}
