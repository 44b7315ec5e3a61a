//! Manual payment reporter: turns a client self-report into an open claim
//! plus its follow-up reminder task.

use bigdecimal::BigDecimal;
use chrono::{Duration, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::queries;
use crate::domain::{PaymentClaim, ReminderTask};
use crate::error::AppError;
use crate::ports::DirectoryStore;
use crate::validation;

#[derive(Debug, Clone)]
pub struct ReportClaimInput {
    pub client_id: Uuid,
    pub amount: BigDecimal,
    pub invoice_id: Option<String>,
    pub destination_handle: Option<String>,
    pub reference_note: Option<String>,
    pub created_by: Option<String>,
}

#[derive(Clone)]
pub struct ManualPaymentReporter {
    pool: PgPool,
    directory: Arc<dyn DirectoryStore>,
    duplicate_window_minutes: i64,
    reminder_delay_minutes: i64,
}

impl ManualPaymentReporter {
    pub fn new(
        pool: PgPool,
        directory: Arc<dyn DirectoryStore>,
        duplicate_window_minutes: i64,
        reminder_delay_minutes: i64,
    ) -> Self {
        Self {
            pool,
            directory,
            duplicate_window_minutes,
            reminder_delay_minutes,
        }
    }

    pub async fn report(&self, input: ReportClaimInput) -> Result<Uuid, AppError> {
        validation::validate_positive_amount(&input.amount)?;

        if !self.directory.client_exists(input.client_id).await? {
            return Err(AppError::Validation(format!(
                "unknown client {}",
                input.client_id
            )));
        }

        // A window of 0 disables the duplicate guard.
        if self.duplicate_window_minutes > 0 {
            let since = Utc::now() - Duration::minutes(self.duplicate_window_minutes);
            if queries::recent_duplicate_exists(&self.pool, input.client_id, &input.amount, since)
                .await?
            {
                return Err(AppError::Validation(format!(
                    "a report for this amount from client {} already exists within the last {} minutes",
                    input.client_id, self.duplicate_window_minutes
                )));
            }
        }

        let claim = PaymentClaim::self_reported(
            input.client_id,
            input.amount,
            input.invoice_id,
            input.destination_handle.map(|h| validation::sanitize_string(&h)),
            input.reference_note.map(|n| validation::sanitize_string(&n)),
            input
                .created_by
                .unwrap_or_else(|| "client-portal".to_string()),
        );

        let task = ReminderTask::for_claim(
            claim.id,
            claim.reported_at.unwrap_or(claim.created_at),
            self.reminder_delay_minutes,
        );

        // The claim and its follow-up task land together or not at all; a
        // claim without a task would never get a reminder.
        let mut tx = self.pool.begin().await?;
        queries::insert_claim(&mut *tx, &claim).await?;
        queries::insert_reminder_task(&mut *tx, &task).await?;
        tx.commit().await?;

        tracing::info!(
            claim_id = %claim.id,
            client_id = %claim.client_id,
            amount = %claim.amount,
            "claim reported, reminder scheduled for {}",
            task.scheduled_for
        );

        Ok(claim.id)
    }
}
