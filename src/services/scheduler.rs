//! Reminder scheduler.
//!
//! All scheduling state lives in the `reminder_tasks` table, so a scan can
//! run from a cold process. Claiming a task is a CAS on its monotonic `sent`
//! flag; the notification itself carries the task id as dedup key, which
//! keeps a crash between claim and send from ever producing two user-visible
//! reminders.

use chrono::Utc;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

use crate::db::queries;
use crate::domain::ClaimStatus;
use crate::error::AppError;
use crate::ports::NotificationGateway;

const SCAN_BATCH_SIZE: i64 = 500;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub due: usize,
    pub notified: usize,
    pub skipped_resolved: usize,
    pub lost_race: usize,
}

#[derive(Clone)]
pub struct ReminderScheduler {
    pool: PgPool,
    gateway: Arc<dyn NotificationGateway>,
    staff_channel: String,
    scan_interval: Duration,
}

impl ReminderScheduler {
    pub fn new(
        pool: PgPool,
        gateway: Arc<dyn NotificationGateway>,
        staff_channel: String,
        scan_interval_minutes: u64,
    ) -> Self {
        Self {
            pool,
            gateway,
            staff_channel,
            scan_interval: Duration::from_secs(scan_interval_minutes * 60),
        }
    }

    /// Periodic scan loop, intended to be spawned next to the HTTP server.
    pub async fn run_loop(self) {
        let mut interval = tokio::time::interval(self.scan_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            interval.tick().await;
            match self.scan_once().await {
                Ok(summary) => {
                    if summary.due > 0 {
                        tracing::info!(
                            due = summary.due,
                            notified = summary.notified,
                            skipped_resolved = summary.skipped_resolved,
                            lost_race = summary.lost_race,
                            "reminder scan finished"
                        );
                    }
                }
                Err(e) => tracing::error!("reminder scan failed: {}", e),
            }
        }
    }

    /// One pass over due tasks. Safe to call concurrently with other
    /// scanners: the `sent` CAS hands each task to exactly one of them.
    pub async fn scan_once(&self) -> Result<ScanSummary, AppError> {
        let now = Utc::now();
        let due = queries::due_reminder_tasks(&self.pool, now, SCAN_BATCH_SIZE).await?;

        let mut summary = ScanSummary {
            due: due.len(),
            ..Default::default()
        };

        for task in due {
            let task = task.into_domain();

            if !queries::mark_reminder_sent(&self.pool, task.id).await? {
                summary.lost_race += 1;
                continue;
            }

            let still_pending = match queries::get_claim(&self.pool, task.claim_id).await? {
                Some(row) => {
                    let claim = row.into_domain()?;
                    claim.status == ClaimStatus::PendingConfirmation
                }
                None => false,
            };

            if !still_pending {
                // Resolved (or vanished) claim: the task is simply retired.
                summary.skipped_resolved += 1;
                continue;
            }

            match self
                .gateway
                .send_reminder(&self.staff_channel, task.claim_id, task.id)
                .await
            {
                Ok(()) => summary.notified += 1,
                Err(e) => {
                    // Fire-and-forget: the task stays retired either way.
                    tracing::error!(claim_id = %task.claim_id, task_id = %task.id, "reminder send failed: {}", e);
                }
            }
        }

        Ok(summary)
    }
}
