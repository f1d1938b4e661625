use {
    super::error::SettlementError,
    super::id::{TransactionId, TxRef},
    super::money::Money,
    super::payment::GatewayCharge,
    std::{future::Future, pin::Pin},
};

/// Outcome of the gateway's verify-transaction endpoint, normalized. There
/// is no error variant on purpose: transport failures, timeouts, non-2xx
/// responses and non-"success" bodies all collapse to `Unverified`, which
/// callers must read as "try again later", never as a hard error.
#[derive(Debug, Clone)]
pub enum VerifyOutcome {
    Verified(GatewayCharge),
    Unverified,
}

impl VerifyOutcome {
    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified(_))
    }
}

/// Checkout session request, originated by the session-creation endpoint.
#[derive(Debug, Clone)]
pub struct NewCheckout {
    pub transaction_id: TransactionId,
    pub money: Money,
    pub customer_email: String,
    pub customer_name: Option<String>,
    pub return_url: Option<String>,
}

/// What the gateway hands back for a created session. The tx_ref is issued
/// by the gateway and becomes the lookup key for every later callback.
#[derive(Debug, Clone)]
pub struct CheckoutSession {
    pub tx_ref: TxRef,
    pub checkout_url: String,
}

pub trait GatewayClient: Send + Sync {
    /// Verify a transaction by its gateway reference. Infallible by
    /// contract — retry policy lives in the callers.
    fn verify(
        &self,
        tx_ref: &TxRef,
    ) -> Pin<Box<dyn Future<Output = VerifyOutcome> + Send + '_>>;

    fn create_checkout(
        &self,
        checkout: &NewCheckout,
    ) -> Pin<Box<dyn Future<Output = Result<CheckoutSession, SettlementError>> + Send + '_>>;
}
