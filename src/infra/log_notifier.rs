use {
    crate::domain::{
        error::SettlementError,
        notify::{Notifier, PaymentEvent},
        order::FulfillmentStatus,
        payment::PaymentTarget,
    },
    async_trait::async_trait,
};

/// Stand-in for the notification/email delivery service. Emits structured
/// log lines with the same payloads a real delivery backend would receive.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn payment_succeeded(&self, event: &PaymentEvent) -> Result<(), SettlementError> {
        tracing::info!(tx_ref = %event.tx_ref, amount = %event.money.amount(),
            currency = %event.money.currency(), "notify: payment succeeded");
        Ok(())
    }

    async fn payment_failed(&self, event: &PaymentEvent) -> Result<(), SettlementError> {
        tracing::info!(tx_ref = %event.tx_ref, "notify: payment failed");
        Ok(())
    }

    async fn status_changed(
        &self,
        target: &PaymentTarget,
        status: FulfillmentStatus,
    ) -> Result<(), SettlementError> {
        tracing::info!(%target, %status, "notify: status changed");
        Ok(())
    }

    async fn send_payment_email(
        &self,
        event: &PaymentEvent,
        source: &str,
    ) -> Result<(), SettlementError> {
        tracing::info!(tx_ref = %event.tx_ref,
            to = event.customer_email.as_deref().unwrap_or("<unknown>"),
            source, "email: payment receipt");
        Ok(())
    }
}
