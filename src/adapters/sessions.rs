use {
    crate::{
        AppState,
        adapters::api_errors::ApiError,
        domain::{
            gateway::NewCheckout,
            id::{BookingId, OrderId, TransactionId},
            money::{Currency, Money, MoneyAmount},
            payment::{NewPaymentRecord, PaymentTarget},
        },
    },
    axum::{Json, extract::State},
    serde::Deserialize,
};

#[derive(Debug, Deserialize)]
pub struct InitiateRequest {
    pub amount: i64,
    pub currency: String,
    pub customer_email: String,
    pub customer_name: Option<String>,
    pub order_id: Option<String>,
    pub booking_id: Option<String>,
    pub return_url: Option<String>,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// Payment-session creation. Mints the transaction id the ledger key will
/// later derive from, asks the gateway for a checkout session (which issues
/// the tx_ref), and persists the pending PaymentRecord. The finalize path
/// depends on this having run, but survives it never having run.
#[tracing::instrument(name = "initiate_payment", skip_all)]
pub async fn initiate_handler(
    State(state): State<AppState>,
    Json(req): Json<InitiateRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let money = Money::new(
        MoneyAmount::new(req.amount)?,
        Currency::try_from(req.currency.as_str())?,
    );
    // Unlike webhook payloads, a session must name its target up front.
    let target = PaymentTarget::try_from_parts(
        req.order_id.map(OrderId::new).transpose()?,
        req.booking_id.map(BookingId::new).transpose()?,
    )?;

    let transaction_id = TransactionId::mint();

    let session = state
        .ctx
        .gateway
        .create_checkout(&NewCheckout {
            transaction_id: transaction_id.clone(),
            money,
            customer_email: req.customer_email.clone(),
            customer_name: req.customer_name.clone(),
            return_url: req.return_url,
        })
        .await?;

    if state.ctx.config.record_payments {
        let record = NewPaymentRecord::pending(
            session.tx_ref.clone(),
            transaction_id.clone(),
            target.clone(),
            money,
            Some(req.customer_email),
            req.customer_name,
            req.metadata,
        );
        if !state.ctx.store.create_payment_record(&record).await? {
            // Gateway handed out a tx_ref we already hold a record for —
            // should not happen, worth a trace if it ever does.
            tracing::warn!(tx_ref = %session.tx_ref, "payment record already existed at session creation");
        }
    } else {
        tracing::debug!(tx_ref = %session.tx_ref, "payment records disabled, session not persisted");
    }

    tracing::info!(tx_ref = %session.tx_ref, %transaction_id, %target, "payment session created");

    Ok(Json(serde_json::json!({
        "success": true,
        "data": {
            "tx_ref": session.tx_ref.as_str(),
            "transaction_id": transaction_id.as_str(),
            "checkout_url": session.checkout_url,
        }
    })))
}
