use {
    crate::{
        AppState,
        adapters::api_errors::ApiError,
        config::WebhookAuth,
        domain::{
            error::SettlementError,
            id::{BookingId, OrderId, TransactionId, TxRef},
            money::{Currency, Money, MoneyAmount},
            payment::{GatewayCharge, PaymentTarget},
        },
        services::settlement::{finalize_or_fallback, handle_failed_payment, verify_and_settle},
    },
    axum::{
        Json,
        extract::{Query, State},
        http::HeaderMap,
        response::Redirect,
    },
    hmac::{Hmac, Mac},
    serde::Deserialize,
    sha2::Sha256,
};

pub const SIGNATURE_HEADER: &str = "x-provider-signature";

type HmacSha256 = Hmac<Sha256>;

/// HMAC-SHA256 over the raw body, hex signature, constant-time comparison
/// (the hex is decoded and handed to `verify_slice`, never compared as
/// strings).
pub fn verify_signature(
    secret: &str,
    signature: Option<&str>,
    body: &[u8],
) -> Result<(), SettlementError> {
    let signature = signature.ok_or_else(|| {
        SettlementError::WebhookSignature(format!("missing {SIGNATURE_HEADER} header"))
    })?;
    let provided = hex::decode(signature.trim())
        .map_err(|_| SettlementError::WebhookSignature("signature is not valid hex".into()))?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| SettlementError::WebhookSignature("unusable webhook secret".into()))?;
    mac.update(body);
    mac.verify_slice(&provided)
        .map_err(|_| SettlementError::WebhookSignature("signature mismatch".into()))
}

// ── envelope ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct WebhookEnvelope {
    event: String,
    data: WebhookData,
}

#[derive(Debug, Deserialize)]
struct WebhookData {
    tx_ref: String,
    amount: i64,
    currency: String,
    payment_method: Option<String>,
    customer: Option<WebhookCustomer>,
    #[serde(default)]
    meta: WebhookMeta,
}

#[derive(Debug, Deserialize)]
struct WebhookCustomer {
    email: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct WebhookMeta {
    transaction_id: Option<String>,
    order_id: Option<String>,
    booking_id: Option<String>,
}

impl WebhookData {
    fn into_charge(self) -> Result<GatewayCharge, SettlementError> {
        let tx_ref = TxRef::new(self.tx_ref)?;
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
            tx_ref,
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

// ── POST handler ───────────────────────────────────────────────────────────

/// Webhook ingress. Always acknowledges with 200 once past authentication,
/// even when processing failed — the in-process fallback pass (and the
/// client's own poll) is the retry mechanism, not gateway redelivery.
#[tracing::instrument(
    name = "webhook",
    skip_all,
    fields(event = tracing::field::Empty, tx_ref = tracing::field::Empty)
)]
pub async fn webhook_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<serde_json::Value>, ApiError> {
    let signature = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());
    if let Err(e) = verify_signature(&state.webhook.secret, signature, body.as_bytes()) {
        match state.webhook.auth {
            WebhookAuth::Enforced => return Err(e.into()),
            WebhookAuth::Permissive => {
                tracing::warn!(error = %e, "signature check failed, permissive mode continues");
            }
        }
    }

    let raw: serde_json::Value = match serde_json::from_str(&body) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(error = %e, "unparseable webhook body, acknowledged");
            return Ok(Json(serde_json::json!({"status": "ignored_malformed"})));
        }
    };

    let envelope: WebhookEnvelope = match serde_json::from_value(raw.clone()) {
        Ok(env) => env,
        Err(e) => {
            // Salvage a tx_ref if there is one; a fallback verification pass
            // can still settle the payment the malformed envelope described.
            tracing::warn!(error = %e, "malformed webhook envelope");
            if let Some(tx_ref) = raw
                .pointer("/data/tx_ref")
                .and_then(|v| v.as_str())
                .and_then(|s| TxRef::new(s).ok())
            {
                match verify_and_settle(&state.ctx, &tx_ref, "fallback:webhook").await {
                    Ok(outcome) => tracing::info!(%tx_ref, ?outcome, "salvage verification finished"),
                    Err(e) => tracing::warn!(%tx_ref, error = %e, "salvage verification failed"),
                }
            }
            return Ok(Json(serde_json::json!({"status": "ignored_malformed"})));
        }
    };

    tracing::Span::current()
        .record("event", tracing::field::display(&envelope.event))
        .record("tx_ref", tracing::field::display(&envelope.data.tx_ref));

    match envelope.event.as_str() {
        "payment.success" => {
            let tx_ref = envelope.data.tx_ref.clone();
            match envelope.data.into_charge() {
                Ok(charge) => {
                    finalize_or_fallback(&state.ctx, charge, "webhook:gateway").await;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "invalid success payload, trying fallback");
                    if let Ok(tx_ref) = TxRef::new(tx_ref) {
                        match verify_and_settle(&state.ctx, &tx_ref, "fallback:webhook").await {
                            Ok(outcome) => tracing::info!(?outcome, "fallback finished"),
                            Err(e) => tracing::warn!(error = %e, "fallback failed"),
                        }
                    }
                }
            }
            Ok(Json(serde_json::json!({"status": "ok"})))
        }
        "payment.failed" => {
            let tx_ref = envelope.data.tx_ref.clone();
            match envelope.data.into_charge() {
                Ok(charge) => {
                    if let Err(e) = handle_failed_payment(&state.ctx, charge).await {
                        tracing::error!(error = %e, "failure handling errored, trying fallback");
                        if let Ok(tx_ref) = TxRef::new(tx_ref) {
                            if let Err(e) =
                                verify_and_settle(&state.ctx, &tx_ref, "fallback:webhook").await
                            {
                                tracing::warn!(error = %e, "fallback failed");
                            }
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "invalid failure payload, acknowledged");
                }
            }
            Ok(Json(serde_json::json!({"status": "ok"})))
        }
        other => {
            // Unknown events are acknowledged so the gateway never builds a
            // redelivery backlog for event types we do not handle.
            tracing::info!(event = other, "unhandled webhook event, acknowledged");
            Ok(Json(serde_json::json!({"status": "ignored"})))
        }
    }
}

// ── GET handler: browser redirect after payment ────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RedirectParams {
    pub tx_ref: Option<String>,
}

/// Gateway redirect-back target. Sends the customer to the confirmation
/// page for whatever the payment targeted, or to the generic status page
/// when the record cannot be resolved. The confirmation pages re-verify via
/// the poll endpoint on load, so landing here settles nothing.
pub async fn redirect_handler(
    State(state): State<AppState>,
    Query(params): Query<RedirectParams>,
) -> Redirect {
    let Some(tx_ref) = params.tx_ref.and_then(|raw| TxRef::new(raw).ok()) else {
        return Redirect::to("/payments/status");
    };

    let record = match state.ctx.store.find_payment_record(&tx_ref).await {
        Ok(record) => record,
        Err(e) => {
            tracing::warn!(%tx_ref, error = %e, "record lookup failed on redirect");
            None
        }
    };

    match record.and_then(|r| r.target) {
        Some(PaymentTarget::Order(id)) => {
            Redirect::to(&format!("/orders/{id}/confirmation?tx_ref={tx_ref}"))
        }
        Some(PaymentTarget::Booking(id)) => {
            Redirect::to(&format!("/bookings/{id}/confirmation?tx_ref={tx_ref}"))
        }
        None => Redirect::to(&format!("/payments/status?tx_ref={tx_ref}")),
    }
}
