//! Payment record store: the single owner of claim lifecycle state.
//!
//! Every mutation is a compare-and-swap transition in the database, so a
//! claim can enter `completed` exactly once no matter how many workers race
//! for it. Completion side effects (invoice, history, past-due flag, receipt)
//! are only run by the CAS winner.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::queries;
use crate::domain::{ClaimStatus, PaymentClaim};
use crate::error::AppError;
use crate::ports::{DirectoryStore, NotificationGateway, Receipt};
use crate::utils::cursor;

pub const DEFAULT_PAGE_SIZE: i64 = 50;
pub const MAX_PAGE_SIZE: i64 = 200;

#[derive(Debug, serde::Serialize)]
pub struct ClaimPage {
    pub claims: Vec<PaymentClaim>,
    pub next_cursor: Option<String>,
}

#[derive(Clone)]
pub struct PaymentRecordStore {
    pool: PgPool,
    directory: Arc<dyn DirectoryStore>,
    gateway: Arc<dyn NotificationGateway>,
}

impl PaymentRecordStore {
    pub fn new(
        pool: PgPool,
        directory: Arc<dyn DirectoryStore>,
        gateway: Arc<dyn NotificationGateway>,
    ) -> Self {
        Self {
            pool,
            directory,
            gateway,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn insert(&self, claim: &PaymentClaim) -> Result<(), AppError> {
        queries::insert_claim(&self.pool, claim).await?;
        Ok(())
    }

    pub async fn get(&self, id: Uuid) -> Result<PaymentClaim, AppError> {
        let row = queries::get_claim(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("claim {} not found", id)))?;

        row.into_domain()
    }

    pub async fn list_by_status(
        &self,
        statuses: &[ClaimStatus],
        limit: i64,
        cursor: Option<(DateTime<Utc>, Uuid)>,
    ) -> Result<ClaimPage, AppError> {
        let limit = limit.clamp(1, MAX_PAGE_SIZE);
        let rows = queries::list_claims(&self.pool, statuses, limit, cursor).await?;

        let mut claims = Vec::with_capacity(rows.len());
        for row in rows {
            claims.push(row.into_domain()?);
        }

        let next_cursor = if claims.len() as i64 == limit {
            claims
                .last()
                .map(|claim| cursor::encode(claim.created_at, claim.id))
        } else {
            None
        };

        Ok(ClaimPage {
            claims,
            next_cursor,
        })
    }

    /// All claims a bank transaction may still consume, oldest first.
    pub async fn open_snapshot(&self) -> Result<Vec<PaymentClaim>, AppError> {
        let rows = queries::open_claims_snapshot(&self.pool).await?;
        rows.into_iter().map(|row| row.into_domain()).collect()
    }

    /// Staff confirmation: `pending-confirmation` -> `completed`.
    pub async fn confirm(
        &self,
        id: Uuid,
        confirmed_by: &str,
        external_ref: Option<&str>,
    ) -> Result<PaymentClaim, AppError> {
        let row = queries::confirm_claim(&self.pool, id, confirmed_by, external_ref).await?;

        match row {
            Some(row) => {
                let claim = row.into_domain()?;
                self.apply_completion_effects(&claim).await;
                Ok(claim)
            }
            None => Err(self.transition_failure(id).await?),
        }
    }

    /// Staff rejection: `pending-confirmation` -> `not-received`.
    pub async fn mark_not_received(
        &self,
        id: Uuid,
        marked_by: &str,
        reason: &str,
    ) -> Result<PaymentClaim, AppError> {
        let row = queries::mark_claim_not_received(&self.pool, id, marked_by, reason).await?;

        match row {
            Some(row) => row.into_domain(),
            None => Err(self.transition_failure(id).await?),
        }
    }

    /// Automatic reconciliation match: any open status -> `completed`.
    pub async fn complete_from_match(
        &self,
        id: Uuid,
        external_transaction_id: &str,
    ) -> Result<PaymentClaim, AppError> {
        let row =
            queries::complete_claim_from_match(&self.pool, id, external_transaction_id).await?;

        match row {
            Some(row) => {
                let claim = row.into_domain()?;
                self.apply_completion_effects(&claim).await;
                Ok(claim)
            }
            None => Err(self.transition_failure(id).await?),
        }
    }

    /// Zero rows from a guarded UPDATE is either a missing claim or a lost
    /// race; a second read tells the two apart.
    async fn transition_failure(&self, id: Uuid) -> Result<AppError, AppError> {
        match queries::get_claim(&self.pool, id).await? {
            Some(row) => Ok(AppError::Conflict(format!(
                "claim {} is {}, not eligible for this transition",
                id, row.status
            ))),
            None => Ok(AppError::NotFound(format!("claim {} not found", id))),
        }
    }

    /// Side effects of entering `completed`. The transition has already
    /// committed; collaborator failures are logged and never unwound.
    async fn apply_completion_effects(&self, claim: &PaymentClaim) {
        if let Some(invoice_id) = &claim.invoice_id {
            if let Err(e) = self.directory.mark_invoice_paid(invoice_id, claim.id).await {
                tracing::error!(claim_id = %claim.id, invoice_id, "failed to mark invoice paid: {}", e);
            }
        }

        if let Err(e) = self
            .directory
            .append_payment_history(claim.client_id, &claim.amount, claim.method)
            .await
        {
            tracing::error!(claim_id = %claim.id, "failed to append payment history: {}", e);
        }

        if let Err(e) = self.directory.clear_past_due(claim.client_id).await {
            tracing::error!(claim_id = %claim.id, "failed to clear past-due flag: {}", e);
        }

        match self.directory.client_email(claim.client_id).await {
            Ok(Some(email)) => {
                let receipt = Receipt {
                    claim_id: claim.id,
                    amount: claim.amount.clone(),
                    method: claim.method,
                    date: claim.confirmed_at.unwrap_or(claim.updated_at),
                };
                if let Err(e) = self.gateway.send_receipt(&email, &receipt).await {
                    tracing::error!(claim_id = %claim.id, "receipt send failed: {}", e);
                }
            }
            Ok(None) => {
                tracing::warn!(claim_id = %claim.id, client_id = %claim.client_id, "no email on file, skipping receipt");
            }
            Err(e) => {
                tracing::error!(claim_id = %claim.id, "client email lookup failed: {}", e);
            }
        }
    }
}
