use {
    crate::domain::{
        error::SettlementError,
        id::{BookingId, OrderId, TransactionId, TxRef},
        money::{Currency, Money, MoneyAmount},
        payment::{GatewayCharge, NewPaymentRecord, PaymentRecord, PaymentStatus, PaymentTarget},
    },
    chrono::{DateTime, Utc},
    sqlx::PgPool,
};

type PaymentRow = (
    String,                  // tx_ref
    Option<String>,          // transaction_id
    bool,                    // recovered
    Option<String>,          // order_id
    Option<String>,          // booking_id
    i64,                     // amount
    String,                  // currency
    String,                  // status
    Option<String>,          // payment_method
    Option<String>,          // customer_email
    Option<String>,          // customer_name
    serde_json::Value,       // metadata
    DateTime<Utc>,           // created_at
    DateTime<Utc>,           // updated_at
    Option<DateTime<Utc>>,   // completed_at
);

fn from_row(row: PaymentRow) -> Result<PaymentRecord, SettlementError> {
    let (
        tx_ref,
        transaction_id,
        recovered,
        order_id,
        booking_id,
        amount,
        currency,
        status,
        payment_method,
        customer_email,
        customer_name,
        metadata,
        created_at,
        updated_at,
        completed_at,
    ) = row;

    Ok(PaymentRecord {
        tx_ref: TxRef::new(tx_ref)?,
        transaction_id: transaction_id.map(TransactionId::new).transpose()?,
        recovered,
        target: PaymentTarget::try_from_optional_parts(
            order_id.map(OrderId::new).transpose()?,
            booking_id.map(BookingId::new).transpose()?,
        )?,
        money: Money::new(MoneyAmount::new(amount)?, Currency::try_from(currency.as_str())?),
        status: PaymentStatus::try_from(status.as_str())?,
        payment_method,
        customer_email,
        customer_name,
        metadata,
        created_at,
        updated_at,
        completed_at,
    })
}

/// Insert if no record holds this tx_ref yet. `ON CONFLICT DO NOTHING`
/// keeps the at-most-one-record-per-tx_ref invariant under concurrent
/// session creation and fallback creation.
pub async fn insert_if_absent(
    pool: &PgPool,
    record: &NewPaymentRecord,
) -> Result<bool, SettlementError> {
    let completed_at = match record.status {
        PaymentStatus::Completed => Some(Utc::now()),
        _ => None,
    };

    let inserted: Option<bool> = sqlx::query_scalar(
        r#"
        INSERT INTO payment_records
            (tx_ref, transaction_id, recovered, order_id, booking_id,
             amount, currency, status, payment_method,
             customer_email, customer_name, metadata, completed_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        ON CONFLICT (tx_ref) DO NOTHING
        RETURNING true
        "#,
    )
    .bind(record.tx_ref.as_str())
    .bind(record.transaction_id.as_ref().map(|t| t.as_str()))
    .bind(record.recovered)
    .bind(record.target.as_ref().and_then(|t| t.order_id()).map(|id| id.as_str()))
    .bind(record.target.as_ref().and_then(|t| t.booking_id()).map(|id| id.as_str()))
    .bind(record.money.amount().minor_units())
    .bind(record.money.currency().as_str())
    .bind(record.status.as_str())
    .bind(record.payment_method.as_deref())
    .bind(record.customer_email.as_deref())
    .bind(record.customer_name.as_deref())
    .bind(&record.metadata)
    .bind(completed_at)
    .fetch_optional(pool)
    .await?;

    Ok(inserted.is_some())
}

pub async fn find(pool: &PgPool, tx_ref: &TxRef) -> Result<Option<PaymentRecord>, SettlementError> {
    let row: Option<PaymentRow> = sqlx::query_as(
        r#"
        SELECT tx_ref, transaction_id, recovered, order_id, booking_id,
               amount, currency, status, payment_method,
               customer_email, customer_name, metadata,
               created_at, updated_at, completed_at
        FROM payment_records
        WHERE tx_ref = $1
        "#,
    )
    .bind(tx_ref.as_str())
    .fetch_optional(pool)
    .await?;

    row.map(from_row).transpose()
}

/// Fold gateway-payload details into the record and mark it completed.
pub async fn complete(
    pool: &PgPool,
    tx_ref: &TxRef,
    charge: &GatewayCharge,
) -> Result<(), SettlementError> {
    sqlx::query(
        r#"
        UPDATE payment_records
        SET status = 'completed',
            payment_method = COALESCE($2, payment_method),
            customer_email = COALESCE($3, customer_email),
            customer_name = COALESCE($4, customer_name),
            completed_at = COALESCE(completed_at, now()),
            updated_at = now()
        WHERE tx_ref = $1
        "#,
    )
    .bind(tx_ref.as_str())
    .bind(charge.payment_method.as_deref())
    .bind(charge.customer_email.as_deref())
    .bind(charge.customer_name.as_deref())
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn fail(pool: &PgPool, tx_ref: &TxRef) -> Result<(), SettlementError> {
    sqlx::query(
        "UPDATE payment_records SET status = 'failed', updated_at = now() WHERE tx_ref = $1",
    )
    .bind(tx_ref.as_str())
    .execute(pool)
    .await?;

    Ok(())
}
