use {crate::domain::error::SettlementError, std::env, std::sync::Arc};

/// Feature toggles for the settlement write path, resolved once at startup
/// and passed in explicitly — the finalize routine never consults global
/// settings mid-flight.
#[derive(Debug, Clone, Copy)]
pub struct SettlementConfig {
    /// Gate for ledger writes. Disabled means settlements complete without
    /// an entry ("skipped, not an error" per the ledger collaborator
    /// contract).
    pub write_ledger: bool,
    /// Gate for persisting a PaymentRecord at session creation.
    pub record_payments: bool,
    pub send_notifications: bool,
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            write_ledger: true,
            record_payments: true,
            send_notifications: true,
        }
    }
}

/// Webhook signature policy. Permissive mode (signature failures logged,
/// processing continues) is a testing accommodation and must be switched on
/// explicitly — it is never inferred from an environment name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookAuth {
    Enforced,
    Permissive,
}

#[derive(Clone)]
pub struct WebhookConfig {
    pub secret: Arc<str>,
    pub auth: WebhookAuth,
}

pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: String,
    pub gateway_base_url: String,
    pub gateway_secret_key: String,
    pub webhook: WebhookConfig,
    pub settlement: SettlementConfig,
}

fn env_flag(name: &str, default: bool) -> bool {
    match env::var(name) {
        Ok(v) => matches!(v.as_str(), "1" | "true" | "yes"),
        Err(_) => default,
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, SettlementError> {
        let require = |name: &str| {
            env::var(name)
                .map_err(|_| SettlementError::Validation(format!("{name} must be set")))
        };

        let webhook_secret = require("WEBHOOK_SECRET")?;
        let auth = if env_flag("WEBHOOK_ALLOW_UNSIGNED", false) {
            WebhookAuth::Permissive
        } else {
            WebhookAuth::Enforced
        };

        Ok(Self {
            database_url: require("DATABASE_URL")?,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into()),
            gateway_base_url: require("GATEWAY_BASE_URL")?,
            gateway_secret_key: require("GATEWAY_SECRET_KEY")?,
            webhook: WebhookConfig {
                secret: webhook_secret.into(),
                auth,
            },
            settlement: SettlementConfig {
                write_ledger: env_flag("LEDGER_WRITES_ENABLED", true),
                record_payments: env_flag("PAYMENT_RECORDS_ENABLED", true),
                send_notifications: env_flag("NOTIFICATIONS_ENABLED", true),
            },
        })
    }
}
