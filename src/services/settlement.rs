use {
    crate::config::SettlementConfig,
    crate::domain::{
        error::SettlementError,
        gateway::{GatewayClient, VerifyOutcome},
        id::TxRef,
        ledger::{LedgerEntryId, NewLedgerEntry},
        notify::{Notifier, PaymentEvent},
        order::{FulfillmentStatus, PaidOutcome, PaymentDetails},
        payment::{GatewayCharge, NewPaymentRecord, PaymentStatus, PaymentTarget},
        store::SettlementStore,
    },
    chrono::Utc,
    std::future::Future,
    std::sync::Arc,
};

/// Everything the settlement routines need, bundled so both transport
/// adapters (webhook and poll) drive the identical code path and tests can
/// run it against doubles.
#[derive(Clone)]
pub struct SettlementContext {
    pub store: Arc<dyn SettlementStore>,
    pub gateway: Arc<dyn GatewayClient>,
    pub notifier: Arc<dyn Notifier>,
    pub config: SettlementConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettleOutcome {
    /// This pass performed the settlement. `ledger_entry` is `None` when
    /// ledger writes are disabled by configuration.
    Settled {
        target: PaymentTarget,
        ledger_entry: Option<LedgerEntryId>,
    },
    /// The idempotency gate was already closed — a successful no-op.
    AlreadyProcessed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Settled(SettleOutcome),
    /// The gateway does not (yet) confirm the transaction; the stored
    /// record's status is reported so the caller can keep showing a
    /// "verifying" state and poll again.
    Unverified { status: PaymentStatus },
}

async fn best_effort<F>(what: &str, fut: F)
where
    F: Future<Output = Result<(), SettlementError>>,
{
    if let Err(e) = fut.await {
        tracing::warn!(error = %e, "{what} failed, continuing");
    }
}

/// Shared finalize path for a gateway-confirmed payment. Safe to invoke any
/// number of times, sequentially or concurrently, for the same tx_ref: the
/// deterministic ledger id gates every downstream mutation.
pub async fn finalize_success(
    ctx: &SettlementContext,
    charge: GatewayCharge,
    actor: &str,
) -> Result<SettleOutcome, SettlementError> {
    let tx_ref = charge.tx_ref.clone();

    // 1. Upsert the payment record to completed, creating a recovered one
    //    when the session-creation write never landed.
    let charge = match ctx.store.find_payment_record(&tx_ref).await? {
        Some(record) => {
            let merged = charge.merge_record(&record);
            ctx.store.complete_payment_record(&tx_ref, &merged).await?;
            merged
        }
        None => {
            let recovered = NewPaymentRecord::recovered(&charge);
            if ctx.store.create_payment_record(&recovered).await? {
                tracing::warn!(tx_ref = %tx_ref, actor,
                    "no payment record for confirmed transaction, created recovered record");
                let mut charge = charge;
                if charge.transaction_id.is_none() {
                    charge.transaction_id = recovered.transaction_id.clone();
                }
                charge
            } else {
                // Lost the insert race — someone else's record is now there.
                match ctx.store.find_payment_record(&tx_ref).await? {
                    Some(record) => {
                        let merged = charge.merge_record(&record);
                        ctx.store.complete_payment_record(&tx_ref, &merged).await?;
                        merged
                    }
                    None => charge,
                }
            }
        }
    };

    // 2–3. Resolve the correlation identifiers. A confirmed payment without
    //      them cannot be keyed and must not silently settle.
    let transaction_id = charge.transaction_id.clone().ok_or_else(|| {
        SettlementError::MissingCorrelation(format!("no transaction id for {tx_ref}"))
    })?;
    let target = charge.target.clone().ok_or_else(|| {
        SettlementError::MissingCorrelation(format!("no order or booking for {tx_ref}"))
    })?;

    // 4. Idempotency gate, fast path.
    let ledger_id = LedgerEntryId::for_settlement(&transaction_id, &target);
    if ctx.store.ledger_entry_exists(&ledger_id).await? {
        tracing::info!(tx_ref = %tx_ref, ledger_id = %ledger_id, actor, "already settled, no-op");
        return Ok(SettleOutcome::AlreadyProcessed);
    }

    // 5. Never mark anything paid on an unverified payload.
    if !ctx.gateway.verify(&tx_ref).await.is_verified() {
        return Err(SettlementError::VerificationFailed(format!(
            "gateway did not confirm {tx_ref}"
        )));
    }

    // 6. pending→paid, at most once (store-level CAS).
    let details = PaymentDetails {
        payment_id: transaction_id.clone(),
        method: charge.payment_method.clone(),
        paid_at: Utc::now(),
        money: charge.money,
    };
    let paid = match &target {
        PaymentTarget::Order(id) => ctx.store.mark_order_paid(id, &details).await?,
        PaymentTarget::Booking(id) => ctx.store.mark_booking_paid(id, &details).await?,
    };
    match paid {
        PaidOutcome::Transitioned => {}
        PaidOutcome::AlreadyPaid => {
            tracing::info!(tx_ref = %tx_ref, %target, "already paid, continuing to ledger gate");
        }
        PaidOutcome::NotFound => {
            return Err(SettlementError::NotFound(format!(
                "{target} referenced by {tx_ref} does not exist"
            )));
        }
    }

    if let PaymentTarget::Order(order_id) = &target {
        if ctx.store.claim_inventory_adjustment(order_id).await? {
            if let Err(e) = ctx.store.adjust_inventory(order_id).await {
                tracing::error!(order_id = %order_id, error = %e, "inventory adjustment failed");
            }
        }
    }

    // 7. The settlement fact itself: create-if-absent on the deterministic
    //    id. A concurrent pass that beat us here owns the settlement.
    let ledger_entry = if ctx.config.write_ledger {
        let entry = NewLedgerEntry::settlement(
            transaction_id.clone(),
            target.clone(),
            charge.money,
            charge.metadata.clone(),
        );
        if ctx.store.create_ledger_entry(&entry).await? {
            Some(entry.id)
        } else {
            tracing::info!(tx_ref = %tx_ref, ledger_id = %ledger_id, "lost ledger race, already settled");
            return Ok(SettleOutcome::AlreadyProcessed);
        }
    } else {
        tracing::debug!(tx_ref = %tx_ref, "ledger writes disabled, entry skipped");
        None
    };

    // 8. Downstream side effects: logged on failure, never propagated.
    if ctx.config.send_notifications {
        let event = PaymentEvent {
            tx_ref: tx_ref.clone(),
            target: Some(target.clone()),
            money: charge.money,
            customer_email: charge.customer_email.clone(),
            customer_name: charge.customer_name.clone(),
        };
        best_effort("success notification", ctx.notifier.payment_succeeded(&event)).await;
        best_effort(
            "status-change notification",
            ctx.notifier.status_changed(&target, FulfillmentStatus::Paid),
        )
        .await;
        best_effort("payment email", ctx.notifier.send_payment_email(&event, actor)).await;
    }

    tracing::info!(tx_ref = %tx_ref, %target, actor, "payment settled");
    Ok(SettleOutcome::Settled {
        target,
        ledger_entry,
    })
}

/// Failure path for a `payment.failed` event. No ledger action: nothing was
/// ever booked, so there is nothing to reverse.
pub async fn handle_failed_payment(
    ctx: &SettlementContext,
    charge: GatewayCharge,
) -> Result<(), SettlementError> {
    let tx_ref = charge.tx_ref.clone();

    let charge = match ctx.store.find_payment_record(&tx_ref).await? {
        Some(record) => charge.merge_record(&record),
        None => charge,
    };

    ctx.store.fail_payment_record(&tx_ref).await?;

    // Double-check before canceling: a gateway that verifies the
    // transaction means this failure event is stale — leave the order for
    // the success path.
    if ctx.gateway.verify(&tx_ref).await.is_verified() {
        tracing::warn!(tx_ref = %tx_ref,
            "failed event for a transaction the gateway verifies, not canceling");
        return Ok(());
    }

    let Some(target) = charge.target.clone() else {
        tracing::warn!(tx_ref = %tx_ref, "failed payment with no order or booking to cancel");
        return Ok(());
    };

    const REASON: &str = "payment failed at gateway";
    match &target {
        PaymentTarget::Order(id) => ctx.store.cancel_order(id, REASON).await?,
        PaymentTarget::Booking(id) => ctx.store.cancel_booking(id, REASON).await?,
    }

    if ctx.config.send_notifications {
        let event = PaymentEvent {
            tx_ref: tx_ref.clone(),
            target: Some(target.clone()),
            money: charge.money,
            customer_email: charge.customer_email.clone(),
            customer_name: charge.customer_name.clone(),
        };
        best_effort("failure notification", ctx.notifier.payment_failed(&event)).await;
        best_effort(
            "status-change notification",
            ctx.notifier.status_changed(&target, FulfillmentStatus::Canceled),
        )
        .await;
        best_effort(
            "payment email",
            ctx.notifier.send_payment_email(&event, "payment_failed"),
        )
        .await;
    }

    tracing::info!(tx_ref = %tx_ref, %target, "payment failure recorded, target canceled");
    Ok(())
}

/// Core of the verification-poll endpoint, and the system's only retry
/// primitive: the webhook handler re-enters here after any processing
/// error. Looks up the stored record to recover correlation state the
/// caller may not have (the browser redirect only carries the tx_ref),
/// verifies with the gateway, and on confirmation runs the same finalize
/// path as the webhook success case.
pub async fn verify_and_settle(
    ctx: &SettlementContext,
    tx_ref: &TxRef,
    actor: &str,
) -> Result<PollOutcome, SettlementError> {
    let record = ctx.store.find_payment_record(tx_ref).await?;

    match ctx.gateway.verify(tx_ref).await {
        VerifyOutcome::Verified(charge) => {
            let charge = match &record {
                Some(r) => charge.merge_record(r),
                None => charge,
            };
            let outcome = finalize_success(ctx, charge, actor).await?;
            Ok(PollOutcome::Settled(outcome))
        }
        VerifyOutcome::Unverified => match record {
            Some(record) => Ok(PollOutcome::Unverified {
                status: record.status,
            }),
            None => Err(SettlementError::NotFound(format!(
                "no payment record for {tx_ref} and gateway verification failed"
            ))),
        },
    }
}

/// Webhook-side wrapper: run the finalize pass and, on any failure, fall
/// back to one in-process verification pass. Nothing escalates past here —
/// the webhook must acknowledge regardless, and the fallback (or the next
/// client poll) is the retry mechanism.
pub async fn finalize_or_fallback(ctx: &SettlementContext, charge: GatewayCharge, actor: &str) {
    let tx_ref = charge.tx_ref.clone();

    match finalize_success(ctx, charge, actor).await {
        Ok(outcome) => {
            tracing::debug!(tx_ref = %tx_ref, ?outcome, "settlement pass finished");
        }
        Err(e) => {
            tracing::error!(tx_ref = %tx_ref, error = %e,
                "settlement pass failed, falling back to verification");
            match verify_and_settle(ctx, &tx_ref, "fallback:webhook").await {
                Ok(outcome) => {
                    tracing::info!(tx_ref = %tx_ref, ?outcome, "fallback verification finished");
                }
                Err(e) => {
                    tracing::error!(tx_ref = %tx_ref, error = %e,
                        "fallback verification failed, awaiting next trigger");
                }
            }
        }
    }
}
