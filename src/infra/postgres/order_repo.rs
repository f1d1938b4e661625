use {
    crate::domain::{
        error::SettlementError,
        id::{BookingId, OrderId},
        order::{PaidOutcome, PaymentDetails},
    },
    sqlx::PgPool,
};

/// pending→paid as a compare-and-swap: the status predicate is part of the
/// UPDATE, so only one caller ever observes a transition.
pub async fn mark_order_paid(
    pool: &PgPool,
    id: &OrderId,
    details: &PaymentDetails,
) -> Result<PaidOutcome, SettlementError> {
    let result = sqlx::query(
        r#"
        UPDATE orders
        SET status = 'paid', payment_id = $2, payment_method = $3,
            paid_at = $4, paid_amount = $5, paid_currency = $6, updated_at = now()
        WHERE id = $1 AND status = 'pending'
        "#,
    )
    .bind(id.as_str())
    .bind(details.payment_id.as_str())
    .bind(details.method.as_deref())
    .bind(details.paid_at)
    .bind(details.money.amount().minor_units())
    .bind(details.money.currency().as_str())
    .execute(pool)
    .await?;

    if result.rows_affected() > 0 {
        return Ok(PaidOutcome::Transitioned);
    }

    let status: Option<String> = sqlx::query_scalar("SELECT status FROM orders WHERE id = $1")
        .bind(id.as_str())
        .fetch_optional(pool)
        .await?;

    match status {
        None => Ok(PaidOutcome::NotFound),
        Some(s) => {
            if s != "paid" {
                tracing::warn!(order_id = %id, status = %s, "paid CAS lost against non-paid status");
            }
            Ok(PaidOutcome::AlreadyPaid)
        }
    }
}

pub async fn mark_booking_paid(
    pool: &PgPool,
    id: &BookingId,
    details: &PaymentDetails,
) -> Result<PaidOutcome, SettlementError> {
    let result = sqlx::query(
        r#"
        UPDATE bookings
        SET status = 'paid', payment_id = $2, payment_method = $3,
            paid_at = $4, paid_amount = $5, paid_currency = $6, updated_at = now()
        WHERE id = $1 AND status = 'pending'
        "#,
    )
    .bind(id.as_str())
    .bind(details.payment_id.as_str())
    .bind(details.method.as_deref())
    .bind(details.paid_at)
    .bind(details.money.amount().minor_units())
    .bind(details.money.currency().as_str())
    .execute(pool)
    .await?;

    if result.rows_affected() > 0 {
        return Ok(PaidOutcome::Transitioned);
    }

    let status: Option<String> = sqlx::query_scalar("SELECT status FROM bookings WHERE id = $1")
        .bind(id.as_str())
        .fetch_optional(pool)
        .await?;

    match status {
        None => Ok(PaidOutcome::NotFound),
        Some(_) => Ok(PaidOutcome::AlreadyPaid),
    }
}

/// Cancel a pending order. Paid orders are deliberately untouched here —
/// a stale failure event must not claw back a settled order.
pub async fn cancel_order(pool: &PgPool, id: &OrderId, reason: &str) -> Result<(), SettlementError> {
    let result = sqlx::query(
        r#"
        UPDATE orders
        SET status = 'canceled', canceled_at = now(), canceled_reason = $2, updated_at = now()
        WHERE id = $1 AND status = 'pending'
        "#,
    )
    .bind(id.as_str())
    .bind(reason)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        tracing::info!(order_id = %id, "cancel skipped, order not pending");
    }
    Ok(())
}

pub async fn cancel_booking(
    pool: &PgPool,
    id: &BookingId,
    reason: &str,
) -> Result<(), SettlementError> {
    let result = sqlx::query(
        r#"
        UPDATE bookings
        SET status = 'canceled', canceled_at = now(), canceled_reason = $2, updated_at = now()
        WHERE id = $1 AND status = 'pending'
        "#,
    )
    .bind(id.as_str())
    .bind(reason)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        tracing::info!(booking_id = %id, "cancel skipped, booking not pending");
    }
    Ok(())
}

/// One-shot claim on the order's inventory adjustment flag.
pub async fn claim_inventory_adjustment(
    pool: &PgPool,
    id: &OrderId,
) -> Result<bool, SettlementError> {
    let result = sqlx::query(
        "UPDATE orders SET inventory_adjusted = TRUE, updated_at = now()
         WHERE id = $1 AND inventory_adjusted = FALSE",
    )
    .bind(id.as_str())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Hand the stock decrement to the catalog collaborator via its job table.
/// The unique key on order_id makes redelivery harmless.
pub async fn enqueue_inventory_adjustment(
    pool: &PgPool,
    id: &OrderId,
) -> Result<(), SettlementError> {
    sqlx::query(
        "INSERT INTO inventory_jobs (order_id) VALUES ($1) ON CONFLICT (order_id) DO NOTHING",
    )
    .bind(id.as_str())
    .execute(pool)
    .await?;

    Ok(())
}
