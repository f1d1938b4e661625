use {
    crate::{
        AppState,
        adapters::api_errors::ApiError,
        domain::{id::TxRef, payment::PaymentStatus},
        services::settlement::{PollOutcome, SettleOutcome, verify_and_settle},
    },
    axum::{
        Json,
        extract::{Query, State},
    },
    serde::Deserialize,
};

#[derive(Debug, Deserialize)]
pub struct VerifyParams {
    #[serde(alias = "txRef")]
    pub tx_ref: String,
}

/// Verification-poll endpoint. Public (the confirmation page polls it after
/// redirect-back) and also the target of the webhook's in-process fallback.
/// Safe to call any number of times for the same tx_ref.
#[tracing::instrument(name = "verify_poll", skip_all, fields(tx_ref = %params.tx_ref))]
pub async fn verify_handler(
    State(state): State<AppState>,
    Query(params): Query<VerifyParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let tx_ref = TxRef::new(params.tx_ref)?;

    match verify_and_settle(&state.ctx, &tx_ref, "poll:client").await? {
        PollOutcome::Settled(outcome) => {
            let target = match &outcome {
                SettleOutcome::Settled { target, .. } => Some(target.to_string()),
                SettleOutcome::AlreadyProcessed => None,
            };
            Ok(Json(serde_json::json!({
                "success": true,
                "data": {
                    "status": PaymentStatus::Completed.as_str(),
                    "tx_ref": tx_ref.as_str(),
                    "target": target,
                }
            })))
        }
        PollOutcome::Unverified { status } => Ok(Json(serde_json::json!({
            "success": true,
            "data": {
                "status": status.as_str(),
                "tx_ref": tx_ref.as_str(),
                "verified": false,
            }
        }))),
    }
}
