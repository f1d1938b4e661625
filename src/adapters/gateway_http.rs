use {
    crate::domain::{
        error::SettlementError,
        gateway::{CheckoutSession, GatewayClient, NewCheckout, VerifyOutcome},
        id::{BookingId, OrderId, TransactionId, TxRef},
        money::{Currency, Money, MoneyAmount},
        payment::{GatewayCharge, PaymentTarget},
    },
    serde::Deserialize,
    std::{future::Future, pin::Pin, time::Duration},
};

/// The gateway's verify call must never hang a settlement pass; a slow
/// gateway reads as `Unverified` and the caller polls again later.
const VERIFY_TIMEOUT: Duration = Duration::from_secs(10);

pub struct HttpGatewayClient {
    http: reqwest::Client,
    base_url: String,
    secret_key: String,
}

impl HttpGatewayClient {
    pub fn new(base_url: impl Into<String>, secret_key: impl Into<String>) -> Result<Self, SettlementError> {
        let http = reqwest::Client::builder()
            .timeout(VERIFY_TIMEOUT)
            .build()
            .map_err(|e| SettlementError::Gateway(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            secret_key: secret_key.into(),
        })
    }

    async fn verify_inner(&self, tx_ref: &TxRef) -> VerifyOutcome {
        let url = format!("{}/transactions/verify/{}", self.base_url, tx_ref.as_str());

        let response = match self
            .http
            .get(&url)
            .bearer_auth(&self.secret_key)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(%tx_ref, error = %e, "verify request failed");
                return VerifyOutcome::Unverified;
            }
        };

        if !response.status().is_success() {
            tracing::warn!(%tx_ref, status = %response.status(), "verify returned non-success status");
            return VerifyOutcome::Unverified;
        }

        let body: VerifyResponse = match response.json().await {
            Ok(b) => b,
            Err(e) => {
                tracing::warn!(%tx_ref, error = %e, "unparseable verify response");
                return VerifyOutcome::Unverified;
            }
        };

        // Both the envelope status and the nested transaction status must
        // say success before anything downstream may settle.
        if body.status != "success" {
            return VerifyOutcome::Unverified;
        }
        let Some(data) = body.data else {
            return VerifyOutcome::Unverified;
        };
        if data.status != "success" {
            return VerifyOutcome::Unverified;
        }

        match data.into_charge(tx_ref) {
            Ok(charge) => VerifyOutcome::Verified(charge),
            Err(e) => {
                tracing::warn!(%tx_ref, error = %e, "verify payload failed validation");
                VerifyOutcome::Unverified
            }
        }
    }

    async fn create_checkout_inner(
        &self,
        checkout: &NewCheckout,
    ) -> Result<CheckoutSession, SettlementError> {
        let url = format!("{}/checkout-sessions", self.base_url);
        let body = serde_json::json!({
            "amount": checkout.money.amount().minor_units(),
            "currency": checkout.money.currency().as_str(),
            "customer": {
                "email": checkout.customer_email,
                "name": checkout.customer_name,
            },
            "return_url": checkout.return_url,
            "meta": { "transaction_id": checkout.transaction_id.as_str() },
        });

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.secret_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| SettlementError::Gateway(format!("checkout request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SettlementError::Gateway(format!(
                "checkout returned {status}"
            )));
        }

        let body: CheckoutResponse = response
            .json()
            .await
            .map_err(|e| SettlementError::Gateway(format!("unparseable checkout response: {e}")))?;

        if body.status != "success" {
            return Err(SettlementError::Gateway(format!(
                "checkout rejected: {}",
                body.status
            )));
        }
        let data = body
            .data
            .ok_or_else(|| SettlementError::Gateway("checkout response missing data".into()))?;

        Ok(CheckoutSession {
            tx_ref: TxRef::new(data.tx_ref)?,
            checkout_url: data.checkout_url,
        })
    }
}

impl GatewayClient for HttpGatewayClient {
    fn verify(&self, tx_ref: &TxRef) -> Pin<Box<dyn Future<Output = VerifyOutcome> + Send + '_>> {
        let tx_ref = tx_ref.clone();
        Box::pin(async move { self.verify_inner(&tx_ref).await })
    }

    fn create_checkout(
        &self,
        checkout: &NewCheckout,
    ) -> Pin<Box<dyn Future<Output = Result<CheckoutSession, SettlementError>> + Send + '_>> {
        let checkout = checkout.clone();
        Box::pin(async move { self.create_checkout_inner(&checkout).await })
    }
}

// ── wire format ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    status: String,
    data: Option<VerifyData>,
}

#[derive(Debug, Deserialize)]
struct VerifyData {
    status: String,
    amount: i64,
    currency: String,
    payment_method: Option<String>,
    customer: Option<VerifyCustomer>,
    #[serde(default)]
    meta: VerifyMeta,
}

#[derive(Debug, Deserialize)]
struct VerifyCustomer {
    email: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct VerifyMeta {
    transaction_id: Option<String>,
    order_id: Option<String>,
    booking_id: Option<String>,
}

impl VerifyData {
    fn into_charge(self, tx_ref: &TxRef) -> Result<GatewayCharge, SettlementError> {
        let money = Money::new(
            MoneyAmount::new(self.amount)?,
            Currency::try_from(self.currency.as_str())?,
        );
        let transaction_id = self.meta.transaction_id.map(TransactionId::new).transpose()?;
        let target = PaymentTarget::try_from_optional_parts(
            self.meta.order_id.map(OrderId::new).transpose()?,
            self.meta.booking_id.map(BookingId::new).transpose()?,
        )?;
        let (customer_email, customer_name) = match self.customer {
            Some(c) => (c.email, c.name),
            None => (None, None),
        };

        Ok(GatewayCharge {
            tx_ref: tx_ref.clone(),
            transaction_id,
            target,
            money,
            payment_method: self.payment_method,
            customer_email,
            customer_name,
            metadata: serde_json::json!({}),
        })
    }
}

#[derive(Debug, Deserialize)]
struct CheckoutResponse {
    status: String,
    data: Option<CheckoutData>,
}

#[derive(Debug, Deserialize)]
struct CheckoutData {
    tx_ref: String,
    checkout_url: String,
}
