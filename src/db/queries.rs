use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Result};
use uuid::Uuid;

use crate::db::models::{ClaimRow, ReminderTaskRow};
use crate::domain::{ClaimStatus, PaymentClaim, ReminderTask};

const CLAIM_COLUMNS: &str = "id, client_id, invoice_id, amount, currency, method, status, \
     reported_at, destination_handle, reference_note, confirmed_by, confirmed_at, \
     external_transaction_id, not_received_reason, created_by, created_at, updated_at";

// --- Claim queries ---

pub async fn insert_claim(executor: impl sqlx::PgExecutor<'_>, claim: &PaymentClaim) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO payment_claims (
            id, client_id, invoice_id, amount, currency, method, status,
            reported_at, destination_handle, reference_note,
            created_by, created_at, updated_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        "#,
    )
    .bind(claim.id)
    .bind(claim.client_id)
    .bind(&claim.invoice_id)
    .bind(&claim.amount)
    .bind(&claim.currency)
    .bind(claim.method.as_str())
    .bind(claim.status.as_str())
    .bind(claim.reported_at)
    .bind(&claim.destination_handle)
    .bind(&claim.reference_note)
    .bind(&claim.created_by)
    .bind(claim.created_at)
    .bind(claim.updated_at)
    .execute(executor)
    .await?;

    Ok(())
}

pub async fn get_claim(pool: &PgPool, id: Uuid) -> Result<Option<ClaimRow>> {
    sqlx::query_as::<_, ClaimRow>(&format!(
        "SELECT {} FROM payment_claims WHERE id = $1",
        CLAIM_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Keyset-paginated listing, newest first. The cursor is the
/// (created_at, id) of the last row on the previous page.
pub async fn list_claims(
    pool: &PgPool,
    statuses: &[ClaimStatus],
    limit: i64,
    cursor: Option<(DateTime<Utc>, Uuid)>,
) -> Result<Vec<ClaimRow>> {
    let status_strs: Vec<String> = statuses.iter().map(|s| s.as_str().to_string()).collect();

    match cursor {
        Some((created_at, id)) => {
            sqlx::query_as::<_, ClaimRow>(&format!(
                r#"
                SELECT {} FROM payment_claims
                WHERE status = ANY($1) AND (created_at, id) < ($2, $3)
                ORDER BY created_at DESC, id DESC
                LIMIT $4
                "#,
                CLAIM_COLUMNS
            ))
            .bind(&status_strs)
            .bind(created_at)
            .bind(id)
            .bind(limit)
            .fetch_all(pool)
            .await
        }
        None => {
            sqlx::query_as::<_, ClaimRow>(&format!(
                r#"
                SELECT {} FROM payment_claims
                WHERE status = ANY($1)
                ORDER BY created_at DESC, id DESC
                LIMIT $2
                "#,
                CLAIM_COLUMNS
            ))
            .bind(&status_strs)
            .bind(limit)
            .fetch_all(pool)
            .await
        }
    }
}

/// Snapshot of every claim a bank transaction may still be matched against,
/// oldest first so the matcher's tie-break falls out of the ordering.
pub async fn open_claims_snapshot(pool: &PgPool) -> Result<Vec<ClaimRow>> {
    let open: Vec<String> = ClaimStatus::OPEN
        .iter()
        .map(|s| s.as_str().to_string())
        .collect();

    sqlx::query_as::<_, ClaimRow>(&format!(
        r#"
        SELECT {} FROM payment_claims
        WHERE status = ANY($1)
        ORDER BY created_at ASC, id ASC
        "#,
        CLAIM_COLUMNS
    ))
    .bind(&open)
    .fetch_all(pool)
    .await
}

pub async fn recent_duplicate_exists(
    pool: &PgPool,
    client_id: Uuid,
    amount: &BigDecimal,
    since: DateTime<Utc>,
) -> Result<bool> {
    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        SELECT id FROM payment_claims
        WHERE client_id = $1 AND amount = $2 AND created_at >= $3
        LIMIT 1
        "#,
    )
    .bind(client_id)
    .bind(amount)
    .bind(since)
    .fetch_optional(pool)
    .await?;

    Ok(row.is_some())
}

pub async fn claim_id_for_external_txn(
    pool: &PgPool,
    external_transaction_id: &str,
) -> Result<Option<Uuid>> {
    let row: Option<(Uuid,)> = sqlx::query_as(
        "SELECT id FROM payment_claims WHERE external_transaction_id = $1 LIMIT 1",
    )
    .bind(external_transaction_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|(id,)| id))
}

// --- Guarded transitions ---
//
// Every transition is a single compare-and-swap UPDATE conditioned on the
// status the caller expects. Zero rows back means someone else already moved
// the claim; the caller maps that to a conflict.

pub async fn confirm_claim(
    pool: &PgPool,
    id: Uuid,
    confirmed_by: &str,
    external_ref: Option<&str>,
) -> Result<Option<ClaimRow>> {
    sqlx::query_as::<_, ClaimRow>(&format!(
        r#"
        UPDATE payment_claims
        SET status = 'completed',
            confirmed_by = $2,
            confirmed_at = NOW(),
            external_transaction_id = COALESCE($3, external_transaction_id),
            updated_at = NOW()
        WHERE id = $1 AND status = 'pending-confirmation'
        RETURNING {}
        "#,
        CLAIM_COLUMNS
    ))
    .bind(id)
    .bind(confirmed_by)
    .bind(external_ref)
    .fetch_optional(pool)
    .await
}

pub async fn mark_claim_not_received(
    pool: &PgPool,
    id: Uuid,
    marked_by: &str,
    reason: &str,
) -> Result<Option<ClaimRow>> {
    sqlx::query_as::<_, ClaimRow>(&format!(
        r#"
        UPDATE payment_claims
        SET status = 'not-received',
            confirmed_by = $2,
            not_received_reason = $3,
            updated_at = NOW()
        WHERE id = $1 AND status = 'pending-confirmation'
        RETURNING {}
        "#,
        CLAIM_COLUMNS
    ))
    .bind(id)
    .bind(marked_by)
    .bind(reason)
    .fetch_optional(pool)
    .await
}

pub async fn complete_claim_from_match(
    pool: &PgPool,
    id: Uuid,
    external_transaction_id: &str,
) -> Result<Option<ClaimRow>> {
    sqlx::query_as::<_, ClaimRow>(&format!(
        r#"
        UPDATE payment_claims
        SET status = 'completed',
            external_transaction_id = $2,
            confirmed_at = NOW(),
            updated_at = NOW()
        WHERE id = $1
          AND status IN ('pending', 'scheduled', 'pending-confirmation')
        RETURNING {}
        "#,
        CLAIM_COLUMNS
    ))
    .bind(id)
    .bind(external_transaction_id)
    .fetch_optional(pool)
    .await
}

// --- Reminder task queries ---

pub async fn insert_reminder_task(
    executor: impl sqlx::PgExecutor<'_>,
    task: &ReminderTask,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO reminder_tasks (id, claim_id, scheduled_for, sent, created_at)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(task.id)
    .bind(task.claim_id)
    .bind(task.scheduled_for)
    .bind(task.sent)
    .bind(task.created_at)
    .execute(executor)
    .await?;

    Ok(())
}

pub async fn due_reminder_tasks(
    pool: &PgPool,
    now: DateTime<Utc>,
    limit: i64,
) -> Result<Vec<ReminderTaskRow>> {
    sqlx::query_as::<_, ReminderTaskRow>(
        r#"
        SELECT id, claim_id, scheduled_for, sent, created_at
        FROM reminder_tasks
        WHERE sent = FALSE AND scheduled_for <= $1
        ORDER BY scheduled_for ASC
        LIMIT $2
        "#,
    )
    .bind(now)
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// Claims a due task. `sent` is monotonic, so whichever scanner flips it first
/// wins and everyone else sees zero rows affected.
pub async fn mark_reminder_sent(pool: &PgPool, task_id: Uuid) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE reminder_tasks SET sent = TRUE WHERE id = $1 AND sent = FALSE",
    )
    .bind(task_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}
