use {
    crate::domain::{
        error::SettlementError,
        ledger::{LedgerEntryId, NewLedgerEntry},
    },
    sqlx::PgPool,
};

pub async fn exists(pool: &PgPool, id: &LedgerEntryId) -> Result<bool, SettlementError> {
    let found: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM ledger_entries WHERE entry_id = $1)")
            .bind(id.as_str())
            .fetch_one(pool)
            .await?;
    Ok(found)
}

/// The idempotency gate as a single atomic write: the primary key on the
/// deterministic entry id makes "check then create" one statement, so two
/// concurrent settlement passes cannot both book the same payment.
pub async fn insert_if_absent(
    pool: &PgPool,
    entry: &NewLedgerEntry,
) -> Result<bool, SettlementError> {
    let inserted: Option<bool> = sqlx::query_scalar(
        r#"
        INSERT INTO ledger_entries
            (entry_id, entry_type, amount, currency,
             order_id, booking_id, payment_id, description, metadata)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        ON CONFLICT (entry_id) DO NOTHING
        RETURNING true
        "#,
    )
    .bind(entry.id.as_str())
    .bind(entry.entry_type.as_str())
    .bind(entry.money.amount().minor_units())
    .bind(entry.money.currency().as_str())
    .bind(entry.target.order_id().map(|id| id.as_str()))
    .bind(entry.target.booking_id().map(|id| id.as_str()))
    .bind(entry.payment_id.as_str())
    .bind(&entry.description)
    .bind(&entry.metadata)
    .fetch_optional(pool)
    .await?;

    Ok(inserted.is_some())
}
