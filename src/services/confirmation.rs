//! Staff-facing confirmation transitions.
//!
//! Authorization happens at the HTTP layer; this service takes the already
//! authenticated actor and enforces the optimistic-concurrency contract:
//! exactly one caller wins, everyone else gets a conflict and must not retry
//! blindly.

use uuid::Uuid;

use crate::domain::PaymentClaim;
use crate::error::AppError;
use crate::services::store::PaymentRecordStore;
use crate::validation;

#[derive(Clone)]
pub struct ConfirmationService {
    store: PaymentRecordStore,
}

impl ConfirmationService {
    pub fn new(store: PaymentRecordStore) -> Self {
        Self { store }
    }

    pub async fn confirm(
        &self,
        actor: &str,
        claim_id: Uuid,
        external_ref: Option<String>,
    ) -> Result<PaymentClaim, AppError> {
        let external_ref = match external_ref {
            Some(r) => {
                let r = validation::validate_external_ref(&r)?;
                (!r.is_empty()).then_some(r)
            }
            None => None,
        };

        let claim = self
            .store
            .confirm(claim_id, actor, external_ref.as_deref())
            .await?;

        tracing::info!(claim_id = %claim.id, actor, "claim confirmed");
        Ok(claim)
    }

    pub async fn mark_not_received(
        &self,
        actor: &str,
        claim_id: Uuid,
        reason: &str,
    ) -> Result<PaymentClaim, AppError> {
        let reason = validation::validate_reason(reason)?;

        let claim = self
            .store
            .mark_not_received(claim_id, actor, &reason)
            .await?;

        tracing::info!(claim_id = %claim.id, actor, "claim marked not received");
        Ok(claim)
    }
}
