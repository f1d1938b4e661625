use crate::domain::error::SettlementError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Newtype over the domain error so the HTTP mapping lives in the adapter
/// layer, not the core.
pub struct ApiError(pub SettlementError);

impl From<SettlementError> for ApiError {
    fn from(err: SettlementError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self.0 {
            SettlementError::Validation(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_error",
                msg.clone(),
            ),
            SettlementError::MissingCorrelation(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "missing_correlation",
                msg.clone(),
            ),
            SettlementError::WebhookSignature(_) => (
                StatusCode::UNAUTHORIZED,
                "invalid_signature",
                "invalid webhook signature".to_string(),
            ),
            SettlementError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            SettlementError::VerificationFailed(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "verification_failed",
                msg.clone(),
            ),
            SettlementError::Gateway(err) => {
                tracing::error!("gateway error: {err}");
                (
                    StatusCode::BAD_GATEWAY,
                    "gateway_error",
                    "payment gateway unavailable".to_string(),
                )
            }
            SettlementError::Database(err) => {
                tracing::error!("database error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal error".to_string(),
                )
            }
            SettlementError::Serialization(err) => {
                tracing::error!("serialization error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal error".to_string(),
                )
            }
        };

        let body = serde_json::json!({
            "success": false,
            "error_code": error_code,
            "message": message,
        });

        (status, Json(body)).into_response()
    }
}
