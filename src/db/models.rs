use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::domain::{ClaimStatus, PaymentClaim, PaymentMethod, ReminderTask};
use crate::error::AppError;

/// Raw `payment_claims` row. Status and method live as TEXT in the database;
/// conversion into the closed domain enums happens in `into_domain` so an
/// invalid stored value surfaces as an error instead of a phantom state.
#[derive(Debug, FromRow)]
pub struct ClaimRow {
    pub id: Uuid,
    pub client_id: Uuid,
    pub invoice_id: Option<String>,
    pub amount: BigDecimal,
    pub currency: String,
    pub method: String,
    pub status: String,
    pub reported_at: Option<DateTime<Utc>>,
    pub destination_handle: Option<String>,
    pub reference_note: Option<String>,
    pub confirmed_by: Option<String>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub external_transaction_id: Option<String>,
    pub not_received_reason: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ClaimRow {
    pub fn into_domain(self) -> Result<PaymentClaim, AppError> {
        let status: ClaimStatus = self
            .status
            .parse()
            .map_err(|e: String| AppError::Internal(e))?;
        let method: PaymentMethod = self
            .method
            .parse()
            .map_err(|e: String| AppError::Internal(e))?;

        Ok(PaymentClaim {
            id: self.id,
            client_id: self.client_id,
            invoice_id: self.invoice_id,
            amount: self.amount,
            currency: self.currency,
            method,
            status,
            reported_at: self.reported_at,
            destination_handle: self.destination_handle,
            reference_note: self.reference_note,
            confirmed_by: self.confirmed_by,
            confirmed_at: self.confirmed_at,
            external_transaction_id: self.external_transaction_id,
            not_received_reason: self.not_received_reason,
            created_by: self.created_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub struct ReminderTaskRow {
    pub id: Uuid,
    pub claim_id: Uuid,
    pub scheduled_for: DateTime<Utc>,
    pub sent: bool,
    pub created_at: DateTime<Utc>,
}

impl ReminderTaskRow {
    pub fn into_domain(self) -> ReminderTask {
        ReminderTask {
            id: self.id,
            claim_id: self.claim_id,
            scheduled_for: self.scheduled_for,
            sent: self.sent,
            created_at: self.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(status: &str, method: &str) -> ClaimRow {
        ClaimRow {
            id: Uuid::new_v4(),
            client_id: Uuid::new_v4(),
            invoice_id: None,
            amount: "89.00".parse().unwrap(),
            currency: "USD".to_string(),
            method: method.to_string(),
            status: status.to_string(),
            reported_at: None,
            destination_handle: None,
            reference_note: None,
            confirmed_by: None,
            confirmed_at: None,
            external_transaction_id: None,
            not_received_reason: None,
            created_by: "test".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn valid_row_converts() {
        let claim = row("pending-confirmation", "self-report-transfer")
            .into_domain()
            .unwrap();
        assert_eq!(claim.status, ClaimStatus::PendingConfirmation);
        assert_eq!(claim.method, PaymentMethod::SelfReportTransfer);
    }

    #[test]
    fn corrupt_status_is_an_internal_error() {
        let err = row("processing", "card").into_domain().unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }
}
